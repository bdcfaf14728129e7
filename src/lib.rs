pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod containers;
pub mod errors;
pub mod middlewares;
pub mod service;
pub mod services;
pub mod transport;
pub mod utils;

pub use auth::{AuthConfig, AuthSession, TokenContext};
pub use client::Client;
pub use config::{CallOptions, ClientOptions, HttpOptions, Interface, RequestOptions, ServiceOptions};
pub use containers::{ApiResponse, HttpMethod, Mapped, RequestContext, ResponseContext};
pub use errors::{ApiResponseError, ClientError, ErrorKind, Result};
pub use middlewares::{Middleware, MiddlewareStack, Next, Placement};
pub use service::Service;
pub use services::logger::Logger;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};
