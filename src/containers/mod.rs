mod http_method;
mod request_context;
mod response;

pub use http_method::HttpMethod;
pub use request_context::RequestContext;
pub use response::{ApiResponse, Headers, Mapped, ResponseBody, ResponseContext};
