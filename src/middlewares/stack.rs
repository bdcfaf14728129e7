use super::{HttpRequestPerformer, Middleware, Next, ResponseErrorHandler, ResponseHandler};
use crate::containers::{RequestContext, ResponseContext};
use crate::errors::Result;
use crate::services::logger::Logger;
use crate::transport::Transport;
use std::fmt;
use std::sync::Arc;

/// Where `MiddlewareStack::add` puts a new stage. A reference to a name that
/// is not in the stack appends at the end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    End,
    After(String),
    Before(String),
}

impl Placement {
    pub fn after(name: impl Into<String>) -> Self {
        Placement::After(name.into())
    }

    pub fn before(name: impl Into<String>) -> Self {
        Placement::Before(name.into())
    }
}

/// Ordered stages; the first entry runs first and sees the response last.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    entries: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response decoding, error mapping and the HTTP call, outermost first.
    pub fn default_stack(transport: Arc<dyn Transport>, logger: &Logger) -> Self {
        let mut stack = Self::new();
        stack.add(Arc::new(ResponseHandler::new(logger)), Placement::End);
        stack.add(Arc::new(ResponseErrorHandler::new(logger)), Placement::End);
        stack.add(
            Arc::new(HttpRequestPerformer::new(transport, logger)),
            Placement::End,
        );
        stack
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name() == name)
    }

    pub fn add(&mut self, middleware: Arc<dyn Middleware>, placement: Placement) -> &mut Self {
        let index = match &placement {
            Placement::End => None,
            Placement::After(name) => self.position(name).map(|idx| idx + 1),
            Placement::Before(name) => self.position(name),
        };
        match index {
            Some(idx) => self.entries.insert(idx, middleware),
            None => self.entries.push(middleware),
        }
        self
    }

    /// Removes the stage called `name`; `false` when absent.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Swaps the stage called `name` in place; `false` when absent.
    pub fn replace(&mut self, name: &str, middleware: Arc<dyn Middleware>) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.entries[idx] = middleware;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn execute(&self, ctx: &mut RequestContext) -> Result<ResponseContext> {
        Next::new(&self.entries).run(ctx).await
    }

    pub fn describe(&self) -> String {
        let mut out = String::from("Request");
        for name in self.names() {
            out.push_str(" -> ");
            out.push_str(name);
        }
        out
    }
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("entries", &self.names())
            .finish()
    }
}
