use crate::constants::errors::ERROR_MESSAGE_KEYS;
use serde_json::Value;
use std::fmt;

/// Failed HTTP exchange (status >= 400) with the messages found in its body.
#[derive(Debug, Clone)]
pub struct ApiResponseError {
    pub status: u16,
    pub messages: Vec<String>,
    pub service_name: String,
    pub http_method: String,
    pub url: String,
    pub body: Value,
}

impl ApiResponseError {
    pub fn new(
        status: u16,
        body: Value,
        service_name: impl Into<String>,
        http_method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let body = match body {
            Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            other => other,
        };
        Self {
            status,
            messages: read_error_messages(&body),
            service_name: service_name.into(),
            http_method: http_method.into(),
            url: url.into(),
            body,
        }
    }
}

impl fmt::Display for ApiResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join(", "))
    }
}

impl std::error::Error for ApiResponseError {}

/// Collects error messages from an arbitrary body.
///
/// Each object contributes the first of its `message`, `description` or `type`
/// values, then nested objects (directly or inside arrays) are visited in
/// document order. When nothing is found the body itself is rendered.
pub fn read_error_messages(body: &Value) -> Vec<String> {
    let mut messages = Vec::new();
    match body {
        Value::Object(_) | Value::Array(_) => collect_messages(body, &mut messages),
        _ => {}
    }
    if messages.is_empty() {
        messages.push(render_scalar(body));
    }
    messages
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            let found = ERROR_MESSAGE_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|candidate| is_message_scalar(candidate));
            if let Some(found) = found {
                out.push(render_scalar(found));
            }
            for entry in map.values() {
                match entry {
                    Value::Object(_) => collect_messages(entry, out),
                    Value::Array(items) => items
                        .iter()
                        .filter(|item| item.is_object())
                        .for_each(|item| collect_messages(item, out)),
                    _ => {}
                }
            }
        }
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .for_each(|item| collect_messages(item, out)),
        _ => {}
    }
}

fn is_message_scalar(value: &Value) -> bool {
    match value {
        Value::String(text) => !text.is_empty(),
        Value::Number(_) | Value::Bool(_) => true,
        _ => false,
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_error_message_is_found() {
        let body = json!({"error": {"message": "bad request", "code": 400}});
        assert_eq!(read_error_messages(&body), vec!["bad request"]);
    }

    #[test]
    fn array_body_yields_one_message_per_object() {
        let body = json!([
            {"error": {"message": "first", "code": 400}},
            {"error": {"message": "second", "code": 409}}
        ]);
        assert_eq!(read_error_messages(&body), vec!["first", "second"]);
    }

    #[test]
    fn message_wins_over_description_and_type() {
        let body = json!({"badRequest": {"type": "Invalid", "description": "desc", "message": "msg"}});
        assert_eq!(read_error_messages(&body), vec!["msg"]);
        let body = json!({"badRequest": {"type": "Invalid", "description": "desc"}});
        assert_eq!(read_error_messages(&body), vec!["desc"]);
    }

    #[test]
    fn plain_text_body_is_its_own_message() {
        let err = ApiResponseError::new(
            502,
            Value::String("Bad Gateway".to_string()),
            "compute",
            "GET",
            "https://nova/servers",
        );
        assert_eq!(err.messages, vec!["Bad Gateway"]);
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[test]
    fn json_text_body_is_parsed_before_scanning() {
        let err = ApiResponseError::new(
            404,
            Value::String(r#"{"itemNotFound": {"message": "Server not found", "code": 404}}"#.to_string()),
            "compute",
            "GET",
            "https://nova/servers/1",
        );
        assert_eq!(err.messages, vec!["Server not found"]);
        assert!(err.body.is_object());
    }

    #[test]
    fn object_without_known_keys_falls_back_to_rendered_body() {
        let body = json!({"code": 500});
        assert_eq!(read_error_messages(&body), vec![r#"{"code":500}"#]);
    }
}
