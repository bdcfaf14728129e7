mod api_response;
mod client_error;

pub use api_response::{read_error_messages, ApiResponseError};
pub use client_error::{ClientError, ErrorKind};

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
