use super::{identity_path, AuthConfig, IdentityGrant, IdentityStrategy};
use crate::config::RequestOptions;
use crate::constants::identity;
use crate::containers::{HttpMethod, RequestContext};
use crate::errors::{ClientError, Result};
use crate::middlewares::MiddlewareStack;
use crate::utils::data_path::get_path_str;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Legacy `/v2.0/tokens` dialect; results are reshaped into the V3 layout.
pub struct V2Identity;

const V2_INTERFACES: [(&str, &str); 3] = [
    ("publicURL", "public"),
    ("internalURL", "internal"),
    ("adminURL", "admin"),
];

impl V2Identity {
    pub fn credentials(conf: &AuthConfig) -> Result<Value> {
        let mut auth = Map::new();
        match conf.token() {
            Some(token) => {
                auth.insert("token".to_string(), json!({ "id": token }));
            }
            None => {
                let username = conf
                    .user_name
                    .as_deref()
                    .or(conf.user_id.as_deref())
                    .ok_or_else(|| ClientError::invalid_config("V2 authentication needs user_name"))?;
                let password = conf
                    .password
                    .as_deref()
                    .ok_or_else(|| ClientError::invalid_config("V2 authentication needs password"))?;
                auth.insert(
                    "passwordCredentials".to_string(),
                    json!({ "username": username, "password": password }),
                );
            }
        }
        if let Some(id) = conf.tenant_id.as_deref().or(conf.scope_project_id.as_deref()) {
            auth.insert("tenantId".to_string(), json!(id));
        } else if let Some(name) = conf
            .tenant_name
            .as_deref()
            .or(conf.scope_project_name.as_deref())
        {
            auth.insert("tenantName".to_string(), json!(name));
        }
        Ok(json!({ "auth": auth }))
    }

    /// Maps a V2 `access` document onto the V3 token layout.
    pub fn normalize(access: &Value) -> Value {
        let token = access.get("token").cloned().unwrap_or(Value::Null);
        let user = access.get("user").cloned().unwrap_or(Value::Null);
        let roles = user.get("roles").cloned().unwrap_or_else(|| json!([]));

        let catalog: Vec<Value> = access
            .get("serviceCatalog")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(normalize_catalog_entry).collect())
            .unwrap_or_default();

        let mut out = json!({
            "methods": ["password"],
            "expires_at": token.get("expires").cloned().unwrap_or(Value::Null),
            "issued_at": token.get("issued_at").cloned().unwrap_or(Value::Null),
            "user": {
                "id": user.get("id").cloned().unwrap_or(Value::Null),
                "name": user.get("name").cloned().unwrap_or(Value::Null),
            },
            "roles": roles,
            "catalog": catalog,
        });
        if let Some(tenant) = token.get("tenant").filter(|t| t.is_object()) {
            out["project"] = json!({
                "id": tenant.get("id").cloned().unwrap_or(Value::Null),
                "name": tenant.get("name").cloned().unwrap_or(Value::Null),
            });
        }
        out
    }
}

fn normalize_catalog_entry(entry: &Value) -> Value {
    let mut endpoints = Vec::new();
    for endpoint in entry
        .get("endpoints")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let region = endpoint.get("region").cloned().unwrap_or(Value::Null);
        for (key, interface) in V2_INTERFACES {
            if let Some(url) = endpoint.get(key).and_then(Value::as_str) {
                endpoints.push(json!({
                    "id": endpoint.get("id").cloned().unwrap_or(Value::Null),
                    "interface": interface,
                    "region": region,
                    "region_id": region,
                    "url": url,
                }));
            }
        }
    }
    json!({
        "type": entry.get("type").and_then(Value::as_str).unwrap_or(""),
        "name": entry.get("name").cloned().unwrap_or(Value::Null),
        "endpoints": endpoints,
    })
}

#[async_trait]
impl IdentityStrategy for V2Identity {
    fn version(&self) -> &'static str {
        "V2"
    }

    async fn authenticate(
        &self,
        conf: &AuthConfig,
        stack: &MiddlewareStack,
        options: &RequestOptions,
    ) -> Result<IdentityGrant> {
        let path = identity_path(&conf.url, identity::V2_TOKENS_PATH);
        let mut ctx = RequestContext::new(identity::SERVICE_TYPE, conf.url.clone(), HttpMethod::Post, path)
            .with_options(options.clone())
            .with_data(Some(Self::credentials(conf)?));
        let response = stack.execute(&mut ctx).await?;
        let body = response.body.into_value();
        let access = body
            .get("access")
            .ok_or_else(|| ClientError::BadTokenContext("V2 response has no access document".to_string()))?;
        let token = get_path_str(access, "token.id")
            .ok_or_else(|| ClientError::BadTokenContext("V2 response has no token id".to_string()))?;
        Ok(IdentityGrant {
            payload: Self::normalize(access),
            token,
        })
    }
}
