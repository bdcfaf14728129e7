pub mod data_path;
pub mod merge;
pub mod redact;
pub mod uri;
