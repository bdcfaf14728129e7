use super::{Middleware, Next};
use crate::constants::{self, content_types, headers};
use crate::containers::{RequestContext, ResponseBody, ResponseContext};
use crate::errors::{ClientError, Result};
use crate::services::logger::Logger;
use crate::transport::{Transport, TransportRequest};
use crate::utils::redact::{redact_headers, redact_text};
use crate::utils::uri::{resolve_url, to_url};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const NAME: &str = "HttpRequestPerformer";

/// Terminal stage: turns the context into one HTTP exchange.
pub struct HttpRequestPerformer {
    transport: Arc<dyn Transport>,
    logger: Logger,
}

impl HttpRequestPerformer {
    pub fn new(transport: Arc<dyn Transport>, logger: &Logger) -> Self {
        Self {
            transport,
            logger: logger.child("http_request_performer"),
        }
    }

    fn build_headers(ctx: &RequestContext, has_body: bool) -> HashMap<String, String> {
        let mut out: HashMap<String, String> = HashMap::new();
        out.insert(headers::ACCEPT.to_string(), content_types::JSON.to_string());
        out.insert(headers::USER_AGENT.to_string(), constants::USER_AGENT.to_string());
        if has_body {
            out.insert(headers::CONTENT_TYPE.to_string(), content_types::JSON.to_string());
        }
        for (name, value) in &ctx.options.headers {
            // Caller headers replace defaults regardless of case.
            out.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            out.insert(name.clone(), value.clone());
        }
        out
    }

    fn encode_body(ctx: &RequestContext) -> Result<Option<String>> {
        if !ctx.http_method.carries_body() {
            return Ok(None);
        }
        match &ctx.data {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => Ok(Some(raw.clone())),
            Some(other) => serde_json::to_string(other).map(Some).map_err(|err| {
                ClientError::invalid_config(format!("cannot encode request body: {}", err))
            }),
        }
    }
}

#[async_trait]
impl Middleware for HttpRequestPerformer {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(&self, ctx: &mut RequestContext, _next: Next<'_>) -> Result<ResponseContext> {
        let url = resolve_url(&ctx.service_url, &to_url(&ctx.path, &ctx.params)?)?.to_string();
        let body = Self::encode_body(ctx)?;
        let request_headers = Self::build_headers(ctx, body.is_some());

        if let Some(cache) = &ctx.cache {
            let token = request_headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(headers::AUTH_TOKEN))
                .map(|(_, value)| value.as_str())
                .unwrap_or("");
            if cache.remember(&ctx.service_url, token) {
                self.logger.debug(
                    "endpoint or token changed",
                    Some(&serde_json::json!({ "service": ctx.service_name })),
                );
            }
        }

        let logger = self.logger.clone().with_debug(ctx.options.debug);
        logger.debug(
            &format!("{} {}", ctx.http_method, redact_text(&url)),
            Some(&serde_json::json!({
                "request_id": ctx.request_id.to_string(),
                "service": ctx.service_name,
                "headers": redact_headers(&request_headers),
            })),
        );

        let request = TransportRequest {
            method: ctx.http_method,
            url: url.clone(),
            headers: request_headers,
            body,
            connect_timeout: Duration::from_millis(ctx.options.http.connect_timeout_ms),
            read_timeout: Duration::from_millis(ctx.options.http.read_timeout_ms),
            verify_ssl: ctx.options.http.verify_ssl,
        };
        let response = self.transport.perform(request).await.map_err(|err| {
            logger.warn(
                "transport failure",
                Some(&serde_json::json!({
                    "service": ctx.service_name,
                    "url": redact_text(&url),
                    "timeout": err.timeout,
                })),
            );
            ClientError::RequestFailure {
                service: ctx.service_name.clone(),
                method: ctx.http_method.to_string(),
                url: url.clone(),
                message: err.message,
                timeout: err.timeout,
            }
        })?;

        logger.debug(
            &format!("{} {} -> {}", ctx.http_method, redact_text(&url), response.status),
            Some(&serde_json::json!({ "request_id": ctx.request_id.to_string() })),
        );

        Ok(ResponseContext {
            status: response.status,
            header: response.headers,
            body: ResponseBody::from_text(response.body),
            service_name: ctx.service_name.clone(),
            http_method: ctx.http_method,
            url,
        })
    }
}
