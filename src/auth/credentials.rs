use crate::errors::{ClientError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Authentication input, keyed like the upstream `auth_conf` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub url: String,
    pub token: Option<String>,
    pub token_context: Option<Value>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub password: Option<String>,
    pub application_credential: Option<Value>,
    pub scope_project_id: Option<String>,
    pub scope_project_name: Option<String>,
    pub scope_project_domain_id: Option<String>,
    pub scope_project_domain_name: Option<String>,
    pub scope_domain_id: Option<String>,
    pub scope_domain_name: Option<String>,
    pub unscoped: bool,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AuthConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn token(&self) -> Option<&str> {
        present(&self.token)
    }

    pub fn has_legacy_tenant(&self) -> bool {
        present(&self.tenant_id).is_some() || present(&self.tenant_name).is_some()
    }

    /// A session built from an external token and context cannot renew itself.
    pub fn is_prebuilt(&self) -> bool {
        self.token().is_some() && self.token_context.is_some()
    }

    /// Scope document, the string `"unscoped"`, or `None` for no scope.
    pub fn scope(&self) -> Option<Value> {
        if let Some(id) = present(&self.scope_project_id) {
            return Some(json!({"project": {"id": id}}));
        }
        if let Some(name) = present(&self.scope_project_name) {
            let mut project = Map::new();
            project.insert("name".to_string(), json!(name));
            if let Some(domain) = present(&self.scope_project_domain_name) {
                project.insert("domain".to_string(), json!({"name": domain}));
            } else if let Some(domain) = present(&self.scope_project_domain_id) {
                project.insert("domain".to_string(), json!({"id": domain}));
            }
            return Some(json!({"project": project}));
        }
        if let Some(name) = present(&self.scope_domain_name) {
            return Some(json!({"domain": {"name": name}}));
        }
        if let Some(id) = present(&self.scope_domain_id) {
            return Some(json!({"domain": {"id": id}}));
        }
        if self.unscoped {
            return Some(Value::String("unscoped".to_string()));
        }
        None
    }

    /// Password-method user object: name or id, domain name or id.
    pub fn user(&self) -> Value {
        let mut user = Map::new();
        if let Some(name) = present(&self.user_name) {
            user.insert("name".to_string(), json!(name));
        } else if let Some(id) = present(&self.user_id) {
            user.insert("id".to_string(), json!(id));
        }
        if let Some(domain) = present(&self.user_domain_name) {
            user.insert("domain".to_string(), json!({"name": domain}));
        } else if let Some(domain) = present(&self.user_domain_id) {
            user.insert("domain".to_string(), json!({"id": domain}));
        }
        if let Some(password) = self.password.as_deref() {
            user.insert("password".to_string(), json!(password));
        }
        Value::Object(user)
    }

    /// Checks the fields the identity document of `version` needs. V2
    /// identities carry no user domain.
    pub fn validate(&self, version: &str) -> Result<()> {
        if self.is_prebuilt() {
            return Ok(());
        }
        if self.url.trim().is_empty() {
            return Err(ClientError::invalid_config("auth url is required"));
        }
        if self.token().is_none() && self.application_credential.is_none() {
            let has_user = present(&self.user_name).is_some() || present(&self.user_id).is_some();
            let has_domain = version != "V3"
                || present(&self.user_domain_name).is_some()
                || present(&self.user_domain_id).is_some()
                || present(&self.user_id).is_some();
            let has_password = self.password.as_deref().map(|p| !p.is_empty()).unwrap_or(false);
            if !(has_user && has_domain && has_password) {
                return Err(ClientError::invalid_config(
                    "password authentication needs user_id or user_name, user_domain_name or user_domain_id, and password",
                ));
            }
        }
        if present(&self.scope_project_id).is_none()
            && present(&self.scope_project_name).is_some()
            && present(&self.scope_project_domain_name).is_none()
            && present(&self.scope_project_domain_id).is_none()
        {
            return Err(ClientError::invalid_config(
                "scope_project_name needs scope_project_domain_name or scope_project_domain_id",
            ));
        }
        Ok(())
    }

    /// `{auth: {identity, scope?}}` for token or password authentication.
    pub fn credentials(&self) -> Value {
        let identity = match self.token() {
            Some(token) => json!({"methods": ["token"], "token": {"id": token}}),
            None => json!({"methods": ["password"], "password": {"user": self.user()}}),
        };
        let mut auth = Map::new();
        auth.insert("identity".to_string(), identity);
        if let Some(scope) = self.scope() {
            auth.insert("scope".to_string(), scope);
        }
        json!({ "auth": auth })
    }

    pub fn application_credential_document(&self) -> Option<Value> {
        let credential = self.application_credential.as_ref()?;
        Some(json!({
            "auth": {
                "identity": {
                    "methods": ["application_credential"],
                    "application_credential": credential,
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_conf() -> AuthConfig {
        AuthConfig {
            url: "https://keystone:5000/v3".to_string(),
            user_name: Some("admin".to_string()),
            user_id: Some("u-1".to_string()),
            user_domain_name: Some("Default".to_string()),
            user_domain_id: Some("default".to_string()),
            password: Some("secret".to_string()),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn password_identity_prefers_names() {
        let creds = password_conf().credentials();
        let identity = &creds["auth"]["identity"];
        assert_eq!(identity["methods"], json!(["password"]));
        let user = &identity["password"]["user"];
        assert_eq!(user["name"], "admin");
        assert!(user.get("id").is_none());
        assert_eq!(user["domain"], json!({"name": "Default"}));
        assert_eq!(user["password"], "secret");
        assert!(creds["auth"].get("scope").is_none());
    }

    #[test]
    fn user_id_and_domain_id_fallbacks() {
        let conf = AuthConfig {
            user_name: None,
            user_domain_name: None,
            ..password_conf()
        };
        let user = conf.user();
        assert_eq!(user["id"], "u-1");
        assert_eq!(user["domain"], json!({"id": "default"}));
    }

    #[test]
    fn project_id_wins_over_every_other_scope_field() {
        let conf = AuthConfig {
            scope_project_id: Some("p-1".to_string()),
            scope_project_name: Some("demo".to_string()),
            scope_project_domain_name: Some("Default".to_string()),
            scope_domain_id: Some("d-1".to_string()),
            unscoped: true,
            ..password_conf()
        };
        assert_eq!(conf.scope(), Some(json!({"project": {"id": "p-1"}})));
    }

    #[test]
    fn scope_precedence_chain() {
        let mut conf = AuthConfig {
            scope_project_name: Some("demo".to_string()),
            scope_project_domain_name: Some("Default".to_string()),
            scope_project_domain_id: Some("default".to_string()),
            scope_domain_name: Some("acme".to_string()),
            scope_domain_id: Some("d-1".to_string()),
            unscoped: true,
            ..password_conf()
        };
        assert_eq!(
            conf.scope(),
            Some(json!({"project": {"name": "demo", "domain": {"name": "Default"}}}))
        );
        conf.scope_project_name = None;
        assert_eq!(conf.scope(), Some(json!({"domain": {"name": "acme"}})));
        conf.scope_domain_name = None;
        assert_eq!(conf.scope(), Some(json!({"domain": {"id": "d-1"}})));
        conf.scope_domain_id = None;
        assert_eq!(conf.scope(), Some(json!("unscoped")));
        conf.unscoped = false;
        assert_eq!(conf.scope(), None);
    }

    #[test]
    fn token_identity_carries_scope() {
        let conf = AuthConfig {
            url: "https://keystone".to_string(),
            token: Some("tok".to_string()),
            scope_domain_id: Some("d-1".to_string()),
            ..AuthConfig::default()
        };
        let creds = conf.credentials();
        assert_eq!(creds["auth"]["identity"], json!({"methods": ["token"], "token": {"id": "tok"}}));
        assert_eq!(creds["auth"]["scope"], json!({"domain": {"id": "d-1"}}));
    }

    #[test]
    fn validation_rejects_incomplete_password_identity() {
        let missing_password = AuthConfig {
            password: None,
            ..password_conf()
        };
        assert!(matches!(
            missing_password.validate("V3"),
            Err(ClientError::InvalidConfig(_))
        ));
        let missing_domain = AuthConfig {
            user_id: None,
            user_domain_id: None,
            user_domain_name: None,
            ..password_conf()
        };
        assert!(missing_domain.validate("V3").is_err());
        assert!(missing_domain.validate("V2").is_ok());
        let project_without_domain = AuthConfig {
            scope_project_name: Some("demo".to_string()),
            ..password_conf()
        };
        assert!(project_without_domain.validate("V3").is_err());
        assert!(password_conf().validate("V3").is_ok());
    }

    #[test]
    fn deserializes_from_snake_case_document() {
        let conf: AuthConfig = serde_json::from_value(json!({
            "url": "https://keystone",
            "user_name": "admin",
            "user_domain_name": "Default",
            "password": "secret",
            "scope_project_id": "p-1"
        }))
        .unwrap();
        assert_eq!(conf.user_name.as_deref(), Some("admin"));
        assert!(!conf.unscoped);
        assert!(conf.validate("V3").is_ok());
    }
}
