pub mod cache;
pub mod logger;
