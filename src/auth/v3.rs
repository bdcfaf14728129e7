use super::{identity_path, AuthConfig, IdentityGrant, IdentityStrategy};
use crate::config::RequestOptions;
use crate::constants::{headers, identity};
use crate::containers::{HttpMethod, RequestContext};
use crate::errors::{ClientError, Result};
use crate::middlewares::MiddlewareStack;
use async_trait::async_trait;
use serde_json::Value;

pub struct V3Identity;

impl V3Identity {
    /// Request for `conf`: a bare token without scope is validated with GET,
    /// everything else posts an identity document.
    pub fn build_request(conf: &AuthConfig, options: &RequestOptions) -> RequestContext {
        let path = identity_path(&conf.url, identity::V3_TOKENS_PATH);
        let base = RequestContext::new(identity::SERVICE_TYPE, conf.url.clone(), HttpMethod::Get, path)
            .with_options(options.clone());

        match conf.token() {
            Some(token) if conf.scope().is_none() => {
                let mut ctx = base;
                ctx.set_header(headers::AUTH_TOKEN, token);
                ctx.set_header(headers::SUBJECT_TOKEN, token);
                ctx
            }
            _ => {
                let document = conf
                    .application_credential_document()
                    .unwrap_or_else(|| conf.credentials());
                let mut ctx = base.with_data(Some(document));
                ctx.http_method = HttpMethod::Post;
                ctx
            }
        }
    }
}

#[async_trait]
impl IdentityStrategy for V3Identity {
    fn version(&self) -> &'static str {
        "V3"
    }

    async fn authenticate(
        &self,
        conf: &AuthConfig,
        stack: &MiddlewareStack,
        options: &RequestOptions,
    ) -> Result<IdentityGrant> {
        let mut ctx = Self::build_request(conf, options);
        let response = stack.execute(&mut ctx).await?;
        let token = response
            .header
            .get(identity::SUBJECT_TOKEN_HEADER)
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::BadTokenContext(format!(
                    "identity response carried no {} header",
                    identity::SUBJECT_TOKEN_HEADER
                ))
            })?;
        let payload = match response.body.into_value() {
            Value::String(text) => serde_json::from_str(&text).map_err(|err| {
                ClientError::BadTokenContext(format!("identity body is not JSON: {}", err))
            })?,
            other => other,
        };
        Ok(IdentityGrant { payload, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> RequestOptions {
        RequestOptions::default()
    }

    #[test]
    fn bare_token_is_validated_with_get() {
        let conf = AuthConfig {
            url: "https://keystone:5000/v3".to_string(),
            token: Some("tok".to_string()),
            ..AuthConfig::default()
        };
        let ctx = V3Identity::build_request(&conf, &options());
        assert_eq!(ctx.http_method, HttpMethod::Get);
        assert_eq!(ctx.path, "/v3/auth/tokens");
        assert_eq!(ctx.options.headers[headers::AUTH_TOKEN], "tok");
        assert_eq!(ctx.options.headers[headers::SUBJECT_TOKEN], "tok");
        assert!(ctx.data.is_none());
    }

    #[test]
    fn scoped_token_posts_identity_document() {
        let conf = AuthConfig {
            url: "https://keystone:5000/v3".to_string(),
            token: Some("tok".to_string()),
            scope_project_id: Some("p-1".to_string()),
            ..AuthConfig::default()
        };
        let ctx = V3Identity::build_request(&conf, &options());
        assert_eq!(ctx.http_method, HttpMethod::Post);
        let data = ctx.data.unwrap();
        assert_eq!(data["auth"]["identity"]["methods"], json!(["token"]));
        assert_eq!(data["auth"]["scope"], json!({"project": {"id": "p-1"}}));
        assert!(!ctx.options.headers.contains_key(headers::AUTH_TOKEN));
    }

    #[test]
    fn application_credential_takes_precedence_over_password() {
        let conf = AuthConfig {
            url: "https://keystone".to_string(),
            application_credential: Some(json!({"id": "ac-1", "secret": "s"})),
            user_name: Some("admin".to_string()),
            password: Some("pw".to_string()),
            ..AuthConfig::default()
        };
        let data = V3Identity::build_request(&conf, &options()).data.unwrap();
        assert_eq!(data["auth"]["identity"]["methods"], json!(["application_credential"]));
        assert_eq!(data["auth"]["identity"]["application_credential"]["id"], "ac-1");
    }
}
