use crate::constants::network::ALLOWED_SCHEMES;
use crate::constants::path_placeholders::{PROJECT_ID, TENANT_ID};
use crate::errors::{ClientError, Result};
use serde_json::{Map, Value};
use url::Url;

pub fn is_absolute_url(path: &str) -> bool {
    Url::parse(path)
        .map(|url| scheme_allowed(url.scheme()))
        .unwrap_or(false)
}

pub fn scheme_allowed(scheme: &str) -> bool {
    ALLOWED_SCHEMES.iter().any(|allowed| *allowed == scheme)
}

/// Joins path parts with exactly one `/` between them. Unless the first
/// part is an absolute URL, the result is rooted with a single `/`, so it
/// can never be read as a protocol-relative `//host` reference.
pub fn join_path_parts(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts.iter().filter(|part| !part.is_empty()) {
        if out.is_empty() {
            out.push_str(part);
        } else {
            out = format!(
                "{}/{}",
                out.trim_end_matches('/'),
                part.trim_start_matches('/')
            );
        }
    }
    if is_absolute_url(&out) {
        return out;
    }
    format!("/{}", out.trim_start_matches('/'))
}

pub fn substitute_placeholders(path: &str, project_id: Option<&str>) -> String {
    match project_id.filter(|id| !id.is_empty()) {
        Some(id) => path.replace(PROJECT_ID, id).replace(TENANT_ID, id),
        None => path.to_string(),
    }
}

/// Query string for `params`; arrays repeat their key, nulls are skipped.
pub fn encode_query(params: &Map<String, Value>) -> Result<String> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    pairs.push((key.clone(), render_param(item)));
                }
            }
            other => pairs.push((key.clone(), render_param(other))),
        }
    }
    serde_urlencoded::to_string(pairs)
        .map_err(|err| ClientError::invalid_config(format!("cannot encode query: {}", err)))
}

fn render_param(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

pub fn to_url(path: &str, params: &Map<String, Value>) -> Result<String> {
    let query = encode_query(params)?;
    if query.is_empty() {
        return Ok(path.to_string());
    }
    let separator = if path.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}{}", path, separator, query))
}

/// Resolves `path` (which may carry a query) against the origin of
/// `service_url`. Absolute URLs are returned as they are; anything else
/// must stay on the origin of `service_url`.
pub fn resolve_url(service_url: &str, path: &str) -> Result<Url> {
    if is_absolute_url(path) {
        return Url::parse(path).map_err(|_| ClientError::invalid_config("Invalid request URL"));
    }
    let mut base = Url::parse(service_url).map_err(|_| {
        ClientError::invalid_config(format!("Invalid service URL: {}", service_url))
    })?;
    if !scheme_allowed(base.scheme()) {
        return Err(ClientError::invalid_config(
            "Only http/https service URLs are supported",
        ));
    }
    base.set_query(None);
    base.set_fragment(None);
    let joined = base
        .join(path)
        .map_err(|_| ClientError::invalid_config(format!("Invalid request path: {}", path)))?;
    if joined.origin() != base.origin() {
        return Err(ClientError::invalid_config(format!(
            "Request path {} leaves the service origin",
            path
        )));
    }
    Ok(joined)
}

/// Path component of an endpoint URL, `""` when it has none.
pub fn endpoint_path(service_url: &str) -> String {
    match Url::parse(service_url) {
        Ok(url) if url.path() != "/" => url.path().to_string(),
        Ok(_) => String::new(),
        Err(_) => String::new(),
    }
}
