mod http_request_performer;
mod response_error_handler;
mod response_handler;
mod stack;

pub use http_request_performer::HttpRequestPerformer;
pub use response_error_handler::ResponseErrorHandler;
pub use response_handler::ResponseHandler;
pub use stack::{MiddlewareStack, Placement};

use crate::containers::{RequestContext, ResponseContext};
use crate::errors::{ClientError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// One stage of the request pipeline. A stage may edit the context, hand it
/// to `next`, and post-process whatever comes back.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Identity used by `MiddlewareStack::{add, remove, replace}`.
    fn name(&self) -> &str;

    async fn call(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<ResponseContext>;
}

/// The remainder of the chain after the running stage.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self { chain }
    }

    pub fn is_terminal(&self) -> bool {
        self.chain.is_empty()
    }

    pub async fn run(self, ctx: &mut RequestContext) -> Result<ResponseContext> {
        match self.chain.split_first() {
            Some((head, rest)) => head.call(ctx, Next::new(rest)).await,
            None => Err(ClientError::internal(format!(
                "middleware chain for {} ended without a response",
                ctx.service_name
            ))),
        }
    }
}
