use super::HttpMethod;
use crate::config::RequestOptions;
use crate::services::cache::ServiceCache;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Per-call data threaded by mutable reference through the middleware chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub service_name: String,
    pub service_url: String,
    pub http_method: HttpMethod,
    pub path: String,
    pub params: Map<String, Value>,
    pub options: RequestOptions,
    pub data: Option<Value>,
    pub cache: Option<Arc<ServiceCache>>,
}

impl RequestContext {
    pub fn new(
        service_name: impl Into<String>,
        service_url: impl Into<String>,
        http_method: HttpMethod,
        path: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            service_name: service_name.into(),
            service_url: service_url.into(),
            http_method,
            path: path.into(),
            params: Map::new(),
            options: RequestOptions::default(),
            data: None,
            cache: None,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ServiceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.options.headers.insert(name.into(), value.into());
    }
}
