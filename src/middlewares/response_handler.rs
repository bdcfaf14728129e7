use super::{Middleware, Next};
use crate::constants::content_types;
use crate::containers::{RequestContext, ResponseBody, ResponseContext};
use crate::errors::Result;
use crate::services::logger::Logger;
use async_trait::async_trait;

pub const NAME: &str = "ResponseHandler";

/// Decodes JSON bodies. Undecodable payloads stay as text.
pub struct ResponseHandler {
    logger: Logger,
}

impl ResponseHandler {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.child("response_handler"),
        }
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|value| {
            let value = value.to_lowercase();
            value.starts_with(content_types::JSON) || value.contains("+json")
        })
        .unwrap_or(false)
}

pub(crate) fn decode(response: &mut ResponseContext, logger: &Logger) {
    if !is_json(response.header.content_type()) {
        return;
    }
    if let ResponseBody::Text(text) = &response.body {
        match serde_json::from_str(text) {
            Ok(value) => response.body = ResponseBody::Json(value),
            Err(err) => logger.warn(
                "response declared JSON but could not be parsed",
                Some(&serde_json::json!({
                    "service": response.service_name,
                    "status": response.status,
                    "error": err.to_string(),
                })),
            ),
        }
    }
}

#[async_trait]
impl Middleware for ResponseHandler {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<ResponseContext> {
        let mut response = next.run(ctx).await?;
        decode(&mut response, &self.logger);
        Ok(response)
    }
}
