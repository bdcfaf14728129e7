pub mod identity {
    pub const V3_TOKENS_PATH: &str = "/v3/auth/tokens";
    pub const V2_TOKENS_PATH: &str = "/v2.0/tokens";
    pub const SERVICE_TYPE: &str = "identity";
    pub const SERVICE_NAME: &str = "keystone";
    pub const SUBJECT_TOKEN_HEADER: &str = "x-subject-token";
    pub const VERSIONS: &[&str] = &["V2", "V3"];
}

pub mod headers {
    pub const AUTH_TOKEN: &str = "X-Auth-Token";
    pub const SUBJECT_TOKEN: &str = "X-Subject-Token";
    pub const ACCEPT: &str = "Accept";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const USER_AGENT: &str = "User-Agent";
}

pub mod content_types {
    pub const JSON: &str = "application/json";
    pub const FORM: &str = "application/x-www-form-urlencoded";
}

pub mod network {
    pub const CONNECT_TIMEOUT_MS: u64 = 10_000;
    pub const READ_TIMEOUT_MS: u64 = 60_000;
    pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];
}

pub mod path_placeholders {
    pub const PROJECT_ID: &str = ":project_id";
    pub const TENANT_ID: &str = ":tenant_id";
}

pub mod errors {
    /// Keys checked, in order, on every object of an error body.
    pub const ERROR_MESSAGE_KEYS: &[&str] = &["message", "description", "type"];
}

pub mod logging {
    pub const LEVEL_ENV: &str = "SKYGATE_LOG_LEVEL";
    pub const ROOT_CONTEXT: &str = "skygate";
}

pub const USER_AGENT: &str = concat!("skygate/", env!("CARGO_PKG_VERSION"));
