#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use skygate::containers::{Headers, HttpMethod};
use skygate::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const AUTH_URL: &str = "https://identity.example.com:5000/v3";
pub const COMPUTE_URL: &str = "https://compute.example.com/v2/e914d86f5c0e4bb5b9e9e2c5d1f0a123/";
pub const PROJECT_ID: &str = "e914d86f5c0e4bb5b9e9e2c5d1f0a123";
pub const TOKEN: &str = "gAAAAABaFpJqriWo7PNyuiaMp_first";
pub const FRESH_TOKEN: &str = "gAAAAABaFpJqriWo7PNyuiaMp_second";
pub const FUTURE: &str = "2099-01-01T00:00:00.000000Z";
pub const PAST: &str = "2015-11-06T15:32:17.893769Z";

type Scripted = Result<TransportResponse, TransportError>;

struct Route {
    method: HttpMethod,
    path: String,
    responses: VecDeque<Scripted>,
}

/// Transport double: answers from scripted routes and records every request.
/// The last response of a route repeats.
#[derive(Default)]
pub struct MockTransport {
    routes: StdMutex<Vec<Route>>,
    requests: StdMutex<Vec<TransportRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn on(self, method: HttpMethod, path: &str, response: Scripted) -> Self {
        {
            let mut routes = self.routes.lock().unwrap();
            match routes
                .iter_mut()
                .find(|route| route.method == method && route.path == path)
            {
                Some(route) => route.responses.push_back(response),
                None => routes.push(Route {
                    method,
                    path: path.to_string(),
                    responses: VecDeque::from(vec![response]),
                }),
            }
        }
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && url_path(&request.url) == path)
            .collect()
    }
}

pub fn url_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_default()
}

pub fn header<'a>(request: &'a TransportRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let path = url_path(&request.url);
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|route| route.method == request.method && route.path == path);
        match route {
            Some(route) if route.responses.len() > 1 => route.responses.pop_front().unwrap(),
            Some(route) => route.responses.front().cloned().unwrap(),
            None => Ok(json_response(404, json!({"error": {"message": "no route", "code": 404}}))),
        }
    }
}

pub fn json_response(status: u16, body: Value) -> TransportResponse {
    let mut headers = Headers::new();
    headers.insert("Content-Type", "application/json");
    TransportResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

pub fn text_response(status: u16, body: &str) -> TransportResponse {
    let mut headers = Headers::new();
    headers.insert("Content-Type", "text/plain");
    TransportResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

pub fn token_payload(expires_at: &str) -> Value {
    json!({
        "token": {
            "methods": ["password"],
            "expires_at": expires_at,
            "issued_at": "2015-11-06T14:32:17.893797Z",
            "user": {
                "id": "423f19a4ac1e4f48bbb4180756e6eb6c",
                "name": "admin",
                "domain": {"id": "default", "name": "Default"}
            },
            "project": {
                "id": PROJECT_ID,
                "name": "demo",
                "domain": {"id": "default", "name": "Default"}
            },
            "roles": [{"id": "r-1", "name": "admin"}, {"id": "r-2", "name": "member"}],
            "catalog": [
                {
                    "type": "identity",
                    "name": "keystone",
                    "endpoints": [
                        {"interface": "public", "region": "RegionOne", "region_id": "RegionOne", "url": AUTH_URL},
                        {"interface": "admin", "region": "RegionOne", "region_id": "RegionOne", "url": AUTH_URL}
                    ]
                },
                {
                    "type": "compute",
                    "name": "nova",
                    "endpoints": [
                        {"interface": "public", "region": "RegionOne", "region_id": "RegionOne", "url": COMPUTE_URL},
                        {"interface": "internal", "region": "RegionOne", "region_id": "RegionOne", "url": "http://compute.internal:8774/v2.1"}
                    ]
                }
            ]
        }
    })
}

pub fn token_response(token: &str, expires_at: &str) -> TransportResponse {
    let mut response = json_response(201, token_payload(expires_at));
    response.headers.insert("X-Subject-Token", token);
    response
}

pub fn password_conf() -> skygate::AuthConfig {
    skygate::AuthConfig {
        url: AUTH_URL.to_string(),
        user_name: Some("admin".to_string()),
        user_domain_name: Some("Default".to_string()),
        password: Some("secret".to_string()),
        scope_project_id: Some(PROJECT_ID.to_string()),
        ..skygate::AuthConfig::default()
    }
}

pub fn test_logger() -> skygate::Logger {
    skygate::Logger::new("test")
}
