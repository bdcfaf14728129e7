use super::HttpMethod;
use crate::errors::{ClientError, Result};
use crate::utils::data_path::{get_segments, parse_path, PathSegment};
use crate::utils::merge::merge_deep;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Response headers with lower-cased names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.0
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value);
        }
        headers
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    Json(Value),
}

impl ResponseBody {
    pub fn from_text(text: String) -> Self {
        if text.is_empty() {
            ResponseBody::Empty
        } else {
            ResponseBody::Text(text)
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, ResponseBody::Json(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            ResponseBody::Empty => Value::Null,
            ResponseBody::Text(text) => Value::String(text.clone()),
            ResponseBody::Json(value) => value.clone(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ResponseBody::Empty => Value::Null,
            ResponseBody::Text(text) => Value::String(text),
            ResponseBody::Json(value) => value,
        }
    }
}

/// What travels back up the middleware chain.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub status: u16,
    pub header: Headers,
    pub body: ResponseBody,
    pub service_name: String,
    pub http_method: HttpMethod,
    pub url: String,
}

impl ResponseContext {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

pub enum Mapped<T> {
    Many(Vec<T>),
    One(T),
    /// The path points at a scalar; returned untouched.
    Raw(Value),
    Missing,
}

impl<T> Mapped<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Mapped::Many(items) => items,
            Mapped::One(item) => vec![item],
            Mapped::Raw(_) | Mapped::Missing => Vec::new(),
        }
    }

    pub fn into_one(self) -> Option<T> {
        match self {
            Mapped::One(item) => Some(item),
            Mapped::Many(items) => items.into_iter().next(),
            Mapped::Raw(_) | Mapped::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Mapped::Missing)
    }
}

/// Read-only result of a service call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    header: Headers,
    body: Value,
    service_name: String,
    http_method: HttpMethod,
    url: String,
}

impl From<ResponseContext> for ApiResponse {
    fn from(response: ResponseContext) -> Self {
        Self {
            status: response.status,
            header: response.header,
            body: response.body.into_value(),
            service_name: response.service_name,
            http_method: response.http_method,
            url: response.url,
        }
    }
}

impl ApiResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn header(&self) -> &Headers {
        &self.header
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = parse_path(path);
        if matches!(segments.first(), Some(PathSegment::Key(key)) if key == "body") {
            segments.remove(0);
        }
        get_segments(&self.body, &segments)
    }

    /// Projects `path` (e.g. `body.servers`) onto `T`: one `T` per array
    /// element, or a single `T` for an object.
    pub fn map_to<T: DeserializeOwned>(&self, path: &str) -> Result<Mapped<T>> {
        self.map_to_with(path, &Map::new())
    }

    /// Like [`ApiResponse::map_to`], merging `extra` into every object first.
    pub fn map_to_with<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &Map<String, Value>,
    ) -> Result<Mapped<T>> {
        let extra = Value::Object(extra.clone());
        let build = |item: &Value| -> Result<T> {
            serde_json::from_value(merge_deep(item, &extra)).map_err(|err| {
                ClientError::Mapping(format!("{} (path: {})", err, path))
            })
        };
        match self.lookup(path) {
            None | Some(Value::Null) => Ok(Mapped::Missing),
            Some(Value::Array(items)) => items
                .iter()
                .map(build)
                .collect::<Result<Vec<T>>>()
                .map(Mapped::Many),
            Some(object @ Value::Object(_)) => build(object).map(Mapped::One),
            Some(scalar) => Ok(Mapped::Raw(scalar.clone())),
        }
    }

    /// Closure form of [`ApiResponse::map_to`].
    pub fn map_with<T, F>(&self, path: &str, mut f: F) -> Mapped<T>
    where
        F: FnMut(Value) -> T,
    {
        match self.lookup(path) {
            None | Some(Value::Null) => Mapped::Missing,
            Some(Value::Array(items)) => Mapped::Many(items.iter().cloned().map(&mut f).collect()),
            Some(object @ Value::Object(_)) => Mapped::One(f(object.clone())),
            Some(scalar) => Mapped::Raw(scalar.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct User {
        id: u64,
        name: String,
        #[serde(default)]
        region: Option<String>,
    }

    fn users_response() -> ApiResponse {
        ApiResponse::from(ResponseContext {
            status: 200,
            header: Headers::new(),
            body: ResponseBody::Json(json!({
                "users": [
                    {"id": 1, "name": "test1"},
                    {"id": 2, "name": "test2"}
                ],
                "user": {"id": 3, "name": "solo"},
                "count": 2
            })),
            service_name: "identity".to_string(),
            http_method: HttpMethod::Get,
            url: "https://keystone/v3/users".to_string(),
        })
    }

    #[test]
    fn array_path_maps_to_many() {
        let users: Vec<User> = users_response().map_to("body.users").unwrap().into_vec();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[1].name, "test2");
    }

    #[test]
    fn object_path_maps_to_one_and_merges_extra() {
        let mut extra = Map::new();
        extra.insert("region".to_string(), json!("RegionOne"));
        let user: User = users_response()
            .map_to_with("user", &extra)
            .unwrap()
            .into_one()
            .unwrap();
        assert_eq!(user.name, "solo");
        assert_eq!(user.region.as_deref(), Some("RegionOne"));
    }

    #[test]
    fn missing_and_scalar_paths() {
        let response = users_response();
        assert!(response.map_to::<User>("body.bad_key").unwrap().is_missing());
        match response.map_to::<User>("count").unwrap() {
            Mapped::Raw(value) => assert_eq!(value, json!(2)),
            _ => panic!("expected raw scalar"),
        }
    }

    #[test]
    fn closure_mapping_receives_each_item() {
        let names = users_response()
            .map_with("body.users", |item| item["name"].as_str().unwrap_or("").to_string())
            .into_vec();
        assert_eq!(names, vec!["test1", "test2"]);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers: Headers = [("X-Subject-Token", "abc")].into_iter().collect();
        assert_eq!(headers.get("x-subject-token"), Some("abc"));
    }
}
