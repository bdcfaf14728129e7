use super::api_response::ApiResponseError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Auth,
    NotFound,
    Transport,
    Api,
    Internal,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("unknown identity API version: {0}")]
    UnknownIdentityVersion(String),

    #[error("token has expired and cannot be renewed without credentials")]
    TokenExpired,

    #[error("session is not authenticated")]
    NotAuthenticated,

    #[error("bad token context: {0}")]
    BadTokenContext(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("service {0} is not available in the service catalog")]
    ServiceUnavailable(String),

    #[error("service {service} has no endpoint (region: {}, interface: {interface})", .region.as_deref().unwrap_or("default"))]
    ServiceEndpointUnavailable {
        service: String,
        region: Option<String>,
        interface: String,
    },

    #[error("{method} {url} failed: {message}")]
    RequestFailure {
        service: String,
        method: String,
        url: String,
        message: String,
        timeout: bool,
    },

    #[error(transparent)]
    ApiResponse(#[from] ApiResponseError),

    #[error("cannot map response: {0}")]
    Mapping(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::UnknownIdentityVersion(_) | ClientError::InvalidConfig(_) => {
                ErrorKind::Config
            }
            ClientError::TokenExpired
            | ClientError::NotAuthenticated
            | ClientError::BadTokenContext(_) => ErrorKind::Auth,
            ClientError::ServiceUnavailable(_) | ClientError::ServiceEndpointUnavailable { .. } => {
                ErrorKind::NotFound
            }
            ClientError::RequestFailure { .. } => ErrorKind::Transport,
            ClientError::ApiResponse(_) => ErrorKind::Api,
            ClientError::Mapping(_) | ClientError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        ClientError::InvalidConfig(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ClientError::Internal(message.into())
    }

    pub fn endpoint_unavailable(
        service: impl Into<String>,
        region: Option<&str>,
        interface: impl Into<String>,
    ) -> Self {
        ClientError::ServiceEndpointUnavailable {
            service: service.into(),
            region: region.map(str::to_string),
            interface: interface.into(),
        }
    }

    /// HTTP status of an API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ApiResponse(err) => Some(err.status),
            _ => None,
        }
    }

    pub fn details(&self) -> Value {
        let mut out = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        let extra = match self {
            ClientError::ServiceEndpointUnavailable {
                service,
                region,
                interface,
            } => serde_json::json!({
                "service": service,
                "region": region,
                "interface": interface,
            }),
            ClientError::RequestFailure {
                service,
                method,
                url,
                timeout,
                ..
            } => serde_json::json!({
                "service": service,
                "method": method,
                "url": url,
                "timeout": timeout,
            }),
            ClientError::ApiResponse(err) => serde_json::json!({
                "service": err.service_name,
                "method": err.http_method,
                "url": err.url,
                "status": err.status,
                "messages": err.messages,
            }),
            ClientError::ServiceUnavailable(service) => serde_json::json!({ "service": service }),
            _ => Value::Null,
        };
        if let (Value::Object(out_map), Value::Object(extra_map)) = (&mut out, extra) {
            out_map.extend(extra_map);
        }
        out
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Mapping(err.to_string())
    }
}
