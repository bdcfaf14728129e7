use crate::constants::network::{CONNECT_TIMEOUT_MS, READ_TIMEOUT_MS};
use crate::errors::ClientError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    #[default]
    Public,
    Internal,
    Admin,
}

impl Interface {
    pub const ALL: [Interface; 3] = [Interface::Public, Interface::Internal, Interface::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Interface::Public => "public",
            Interface::Internal => "internal",
            Interface::Admin => "admin",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interface {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "public" => Ok(Interface::Public),
            "internal" => Ok(Interface::Internal),
            "admin" => Ok(Interface::Admin),
            other => Err(ClientError::invalid_config(format!(
                "unknown interface '{}', expected public, internal or admin",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub verify_ssl: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            read_timeout_ms: READ_TIMEOUT_MS,
            verify_ssl: true,
        }
    }
}

/// Process-level defaults shared by the session and every service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub region: Option<String>,
    pub interface: Interface,
    pub version: Option<String>,
    pub headers: HashMap<String, String>,
    pub debug: bool,
    /// Defer the first identity exchange until a token is needed.
    pub lazy: bool,
    pub http: HttpOptions,
}

impl ClientOptions {
    /// Options applied to identity requests.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            region: self.region.clone(),
            interface: self.interface,
            headers: self.headers.clone(),
            path_prefix: None,
            debug: self.debug,
            http: self.http.clone(),
        }
    }
}

/// Partial options given per service or per call. `None` inherits.
///
/// `path_prefix: Some("")` explicitly selects "no prefix", while `None`
/// derives the prefix from the resolved endpoint URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceOptions {
    pub region: Option<String>,
    pub interface: Option<Interface>,
    pub headers: HashMap<String, String>,
    pub path_prefix: Option<String>,
    pub debug: Option<bool>,
    pub http: Option<HttpOptions>,
}

pub type CallOptions = ServiceOptions;

impl ServiceOptions {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn interface(mut self, interface: Interface) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// `self` over `base`: set fields win, headers merge key-wise.
    pub fn over(&self, base: &ServiceOptions) -> ServiceOptions {
        let mut headers = base.headers.clone();
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        ServiceOptions {
            region: self.region.clone().or_else(|| base.region.clone()),
            interface: self.interface.or(base.interface),
            headers,
            path_prefix: self
                .path_prefix
                .clone()
                .or_else(|| base.path_prefix.clone()),
            debug: self.debug.or(base.debug),
            http: self.http.clone().or_else(|| base.http.clone()),
        }
    }

    pub fn resolve(&self, defaults: &ClientOptions) -> RequestOptions {
        let mut headers = defaults.headers.clone();
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        RequestOptions {
            region: self.region.clone().or_else(|| defaults.region.clone()),
            interface: self.interface.unwrap_or(defaults.interface),
            headers,
            path_prefix: self.path_prefix.clone(),
            debug: self.debug.unwrap_or(defaults.debug),
            http: self.http.clone().unwrap_or_else(|| defaults.http.clone()),
        }
    }

    /// Stable key used by the client's service cache.
    pub fn cache_key(&self) -> String {
        let mut headers: Vec<_> = self.headers.iter().collect();
        headers.sort();
        format!(
            "{:?}|{:?}|{:?}|{:?}|{:?}|{:?}",
            self.region, self.interface, headers, self.path_prefix, self.debug, self.http
        )
    }
}

/// Fully merged options of a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub region: Option<String>,
    pub interface: Interface,
    pub headers: HashMap<String, String>,
    pub path_prefix: Option<String>,
    pub debug: bool,
    pub http: HttpOptions,
}
