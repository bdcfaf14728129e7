use super::{Transport, TransportError, TransportRequest, TransportResponse};
use crate::constants;
use crate::containers::Headers;
use crate::services::logger::Logger;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct ReqwestTransport {
    logger: Logger,
    clients: Arc<Mutex<HashMap<(bool, u64), Client>>>,
}

impl ReqwestTransport {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("http"),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn get_client(&self, request: &TransportRequest) -> Result<Client, TransportError> {
        let key = (request.verify_ssl, request.connect_timeout.as_millis() as u64);
        let mut guard = self
            .clients
            .lock()
            .map_err(|_| TransportError::new("Failed to access HTTP client cache"))?;
        if let Some(existing) = guard.get(&key) {
            return Ok(existing.clone());
        }
        let mut builder = Client::builder()
            .user_agent(constants::USER_AGENT)
            .connect_timeout(request.connect_timeout);
        if !request.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::new(format!("Failed to build HTTP client: {}", err)))?;
        guard.insert(key, client.clone());
        Ok(client)
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::new(format!("Invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::new(format!("Invalid value for header {}", name)))?;
        out.insert(name, value);
    }
    Ok(out)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = self.get_client(&request)?;
        let headers = build_headers(&request.headers)?;
        let mut builder = client
            .request(request.method.to_reqwest(), request.url.as_str())
            .headers(headers)
            .timeout(request.read_timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::timeout(format!("request timed out: {}", err))
            } else {
                TransportError::new(format!("request failed: {}", err))
            }
        })?;

        let status = response.status().as_u16();
        let mut response_headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.as_str(), value);
            }
        }
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::timeout(format!("reading response timed out: {}", err))
            } else {
                TransportError::new(format!("failed to read response body: {}", err))
            }
        })?;
        self.logger.debug(
            "response received",
            Some(&serde_json::json!({ "status": status, "bytes": body.len() })),
        );

        Ok(TransportResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_header_names_are_rejected() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(build_headers(&headers).is_err());
    }

    #[test]
    fn clients_are_reused_per_tls_and_timeout() {
        let transport = ReqwestTransport::new(Logger::new("test"));
        let request = TransportRequest {
            method: crate::containers::HttpMethod::Get,
            url: "https://example.invalid/".to_string(),
            headers: HashMap::new(),
            body: None,
            connect_timeout: std::time::Duration::from_millis(500),
            read_timeout: std::time::Duration::from_millis(500),
            verify_ssl: true,
        };
        transport.get_client(&request).unwrap();
        transport.get_client(&request).unwrap();
        let insecure = TransportRequest {
            verify_ssl: false,
            ..request
        };
        transport.get_client(&insecure).unwrap();
        assert_eq!(transport.clients.lock().unwrap().len(), 2);
    }
}
