use crate::config::Interface;
use crate::constants::identity;
use crate::errors::{ClientError, Result};
use crate::utils::data_path::{get_path_str, get_path_value};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl Endpoint {
    fn in_region(&self, region: &str) -> bool {
        self.region.as_deref() == Some(region) || self.region_id.as_deref() == Some(region)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    #[serde(rename = "type", default)]
    pub service_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl ServiceCatalogEntry {
    pub fn matches(&self, type_or_name: &str) -> bool {
        self.service_type == type_or_name || self.name.as_deref() == Some(type_or_name)
    }

    fn synthetic_identity(url: &str, region: Option<&str>) -> Self {
        Self {
            service_type: identity::SERVICE_TYPE.to_string(),
            name: Some(identity::SERVICE_NAME.to_string()),
            id: None,
            endpoints: Interface::ALL
                .iter()
                .map(|interface| Endpoint {
                    id: None,
                    interface: interface.as_str().to_string(),
                    region: region.map(str::to_string),
                    region_id: region.map(str::to_string),
                    url: url.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// Parses identity timestamps. Offsets are honoured; naive values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Immutable view over one authentication result. A new context is built
/// for every authentication.
#[derive(Debug, Clone)]
pub struct TokenContext {
    token: String,
    payload: Value,
    catalog: Vec<ServiceCatalogEntry>,
    regions: Vec<String>,
    roles: Vec<Role>,
    expires_at: DateTime<Utc>,
    issued_at: Option<DateTime<Utc>>,
}

impl TokenContext {
    /// Builds a context from an identity payload (optionally wrapped in
    /// `{"token": ...}`). An identity catalog entry pointing at `auth_url`
    /// is added when the catalog has none.
    pub fn new(
        payload: Value,
        token: impl Into<String>,
        auth_url: &str,
        region: Option<&str>,
    ) -> Result<Self> {
        let mut payload = match payload {
            Value::Object(mut map) => match map.remove("token") {
                Some(inner @ Value::Object(_)) => inner,
                Some(other) => {
                    map.insert("token".to_string(), other);
                    Value::Object(map)
                }
                None => Value::Object(map),
            },
            _ => {
                return Err(ClientError::BadTokenContext(
                    "token context must be a JSON object".to_string(),
                ))
            }
        };

        let raw_catalog = payload
            .get("catalog")
            .or_else(|| payload.get("serviceCatalog"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        let mut catalog: Vec<ServiceCatalogEntry> = serde_json::from_value(raw_catalog)
            .map_err(|err| ClientError::BadTokenContext(format!("invalid catalog: {}", err)))?;
        if !catalog.iter().any(|entry| entry.matches(identity::SERVICE_TYPE)) {
            catalog.push(ServiceCatalogEntry::synthetic_identity(auth_url, region));
        }
        if let Value::Object(map) = &mut payload {
            map.insert("catalog".to_string(), serde_json::to_value(&catalog)?);
        }

        let mut regions: Vec<String> = Vec::new();
        for entry in catalog
            .iter()
            .filter(|entry| entry.service_type != identity::SERVICE_TYPE)
        {
            for endpoint in &entry.endpoints {
                let region = endpoint.region.as_ref().or(endpoint.region_id.as_ref());
                if let Some(region) = region {
                    if !regions.contains(region) {
                        regions.push(region.clone());
                    }
                }
            }
        }

        let raw_roles = payload
            .get("roles")
            .or_else(|| get_path_value(&payload, "user.roles"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        let roles = parse_roles(&raw_roles);

        let expires_at = payload
            .get("expires_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                ClientError::BadTokenContext("missing or unparsable expires_at".to_string())
            })?;
        let issued_at = payload
            .get("issued_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        Ok(Self {
            token: token.into(),
            payload,
            catalog,
            regions,
            roles,
            expires_at,
            issued_at,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Reads a dotted path such as `user.domain.id`.
    pub fn read_value(&self, path: &str) -> Option<&Value> {
        get_path_value(&self.payload, path)
    }

    fn read_str(&self, path: &str) -> Option<String> {
        get_path_str(&self.payload, path)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn expired(&self) -> bool {
        self.expired_at(Utc::now())
    }

    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn user_id(&self) -> Option<String> {
        self.read_str("user.id")
    }

    pub fn user_name(&self) -> Option<String> {
        self.read_str("user.name")
    }

    pub fn user_description(&self) -> Option<String> {
        self.read_str("user.description")
    }

    pub fn user_domain_id(&self) -> Option<String> {
        self.read_str("user.domain.id")
    }

    pub fn user_domain_name(&self) -> Option<String> {
        self.read_str("user.domain.name")
    }

    pub fn domain_id(&self) -> Option<String> {
        self.read_str("domain.id")
    }

    pub fn domain_name(&self) -> Option<String> {
        self.read_str("domain.name")
    }

    pub fn project_id(&self) -> Option<String> {
        self.read_str("project.id")
    }

    pub fn project_name(&self) -> Option<String> {
        self.read_str("project.name")
    }

    pub fn project_parent_id(&self) -> Option<String> {
        self.read_str("project.parent_id")
    }

    pub fn project_domain_id(&self) -> Option<String> {
        self.read_str("project.domain.id")
    }

    pub fn project_domain_name(&self) -> Option<String> {
        self.read_str("project.domain.name")
    }

    pub fn is_admin_project(&self) -> bool {
        self.read_value("is_admin_project")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|role| role.name.as_str()).collect()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    pub fn catalog(&self) -> &[ServiceCatalogEntry] {
        &self.catalog
    }

    pub fn has_service(&self, type_or_name: &str) -> bool {
        self.catalog.iter().any(|entry| entry.matches(type_or_name))
    }

    /// Regions of every non-identity endpoint, first-seen order, no duplicates.
    pub fn available_services_regions(&self) -> &[String] {
        &self.regions
    }

    /// Endpoint URL of `type_or_name` for `region` (default: first available
    /// region) and `interface`. `None` when nothing matches.
    pub fn service_url(
        &self,
        type_or_name: &str,
        region: Option<&str>,
        interface: Interface,
    ) -> Option<&str> {
        let region = region.or_else(|| self.regions.first().map(String::as_str));
        let entry = self.catalog.iter().find(|entry| entry.matches(type_or_name))?;
        entry
            .endpoints
            .iter()
            .find(|endpoint| {
                endpoint.interface == interface.as_str()
                    && region.map(|r| endpoint.in_region(r)).unwrap_or(true)
            })
            .map(|endpoint| endpoint.url.as_str())
    }

    pub fn summary(&self) -> Value {
        json!({
            "user_id": self.user_id(),
            "project_id": self.project_id(),
            "domain_id": self.domain_id(),
            "expires_at": self.expires_at.to_rfc3339(),
            "services": self.catalog.len(),
            "regions": self.regions,
        })
    }
}

fn parse_roles(raw: &Value) -> Vec<Role> {
    raw.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(Role {
                        id: None,
                        name: name.clone(),
                    }),
                    Value::Object(_) => serde_json::from_value(item.clone()).ok(),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
