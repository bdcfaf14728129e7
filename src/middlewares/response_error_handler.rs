use super::{Middleware, Next};
use crate::containers::{RequestContext, ResponseContext};
use crate::errors::{ApiResponseError, Result};
use crate::services::logger::Logger;
use crate::utils::redact::redact_text;
use async_trait::async_trait;

pub const NAME: &str = "ResponseErrorHandler";

/// Raises `ApiResponse` errors for statuses >= 400.
pub struct ResponseErrorHandler {
    logger: Logger,
}

impl ResponseErrorHandler {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.child("response_error_handler"),
        }
    }
}

#[async_trait]
impl Middleware for ResponseErrorHandler {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<ResponseContext> {
        let response = next.run(ctx).await?;
        if response.is_success() {
            return Ok(response);
        }
        let err = ApiResponseError::new(
            response.status,
            response.body.to_value(),
            &response.service_name,
            response.http_method.as_str(),
            &response.url,
        );
        self.logger.warn(
            "api error",
            Some(&serde_json::json!({
                "service": err.service_name,
                "method": err.http_method,
                "url": redact_text(&err.url),
                "status": err.status,
                "messages": err.messages,
            })),
        );
        Err(err.into())
    }
}
