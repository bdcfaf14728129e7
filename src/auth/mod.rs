mod credentials;
mod session;
mod token_context;
mod v2;
mod v3;

pub use credentials::AuthConfig;
pub use session::AuthSession;
pub use token_context::{parse_timestamp, Endpoint, Role, ServiceCatalogEntry, TokenContext};
pub use v2::V2Identity;
pub use v3::V3Identity;

use crate::config::{ClientOptions, RequestOptions};
use crate::constants::identity::VERSIONS;
use crate::errors::{ClientError, Result};
use crate::middlewares::MiddlewareStack;
use crate::utils::uri::{endpoint_path, join_path_parts};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Raw outcome of one identity exchange.
#[derive(Debug, Clone)]
pub struct IdentityGrant {
    /// Token document in the V3 shape.
    pub payload: Value,
    pub token: String,
}

/// One identity API dialect.
#[async_trait]
pub trait IdentityStrategy: Send + Sync {
    fn version(&self) -> &'static str;

    async fn authenticate(
        &self,
        conf: &AuthConfig,
        stack: &MiddlewareStack,
        options: &RequestOptions,
    ) -> Result<IdentityGrant>;
}

/// Explicit `version` option, else `V2` for legacy tenant fields, else `V3`.
pub fn select_version(conf: &AuthConfig, options: &ClientOptions) -> Result<&'static str> {
    if let Some(raw) = options.version.as_deref() {
        let wanted = raw.trim().to_uppercase();
        return VERSIONS
            .iter()
            .copied()
            .find(|version| *version == wanted)
            .ok_or_else(|| ClientError::UnknownIdentityVersion(raw.to_string()));
    }
    if conf.has_legacy_tenant() {
        return Ok("V2");
    }
    Ok("V3")
}

pub fn strategy_for(version: &str) -> Result<Arc<dyn IdentityStrategy>> {
    match version {
        "V3" => Ok(Arc::new(V3Identity)),
        "V2" => Ok(Arc::new(V2Identity)),
        other => Err(ClientError::UnknownIdentityVersion(other.to_string())),
    }
}

/// `tokens_path` under the identity base path. A trailing API version
/// segment (`/v3`, `/v2.0`) on the auth URL is dropped first.
pub(crate) fn identity_path(auth_url: &str, tokens_path: &str) -> String {
    let base = endpoint_path(auth_url);
    let base = base.trim_end_matches('/');
    let base = ["/v3", "/v2.0"]
        .iter()
        .find_map(|suffix| base.strip_suffix(suffix))
        .unwrap_or(base);
    join_path_parts(&[base, tokens_path])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_selection() {
        let conf = AuthConfig::with_url("https://keystone");
        let mut options = ClientOptions::default();
        assert_eq!(select_version(&conf, &options).unwrap(), "V3");

        let legacy = AuthConfig {
            tenant_name: Some("demo".to_string()),
            ..conf.clone()
        };
        assert_eq!(select_version(&legacy, &options).unwrap(), "V2");

        options.version = Some("v3".to_string());
        assert_eq!(select_version(&legacy, &options).unwrap(), "V3");

        options.version = Some("V4".to_string());
        assert!(matches!(
            select_version(&conf, &options),
            Err(ClientError::UnknownIdentityVersion(v)) if v == "V4"
        ));
    }

    #[test]
    fn identity_path_drops_version_suffix() {
        assert_eq!(identity_path("https://k:5000/v3", "/v3/auth/tokens"), "/v3/auth/tokens");
        assert_eq!(identity_path("https://k:5000", "/v3/auth/tokens"), "/v3/auth/tokens");
        assert_eq!(
            identity_path("https://h/identity/v3/", "/v3/auth/tokens"),
            "/identity/v3/auth/tokens"
        );
        assert_eq!(identity_path("https://h/v2.0", "/v2.0/tokens"), "/v2.0/tokens");
    }
}
