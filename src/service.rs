use crate::auth::AuthSession;
use crate::config::{CallOptions, ClientOptions, ServiceOptions};
use crate::constants::headers;
use crate::containers::{ApiResponse, HttpMethod, RequestContext};
use crate::errors::{ClientError, Result};
use crate::middlewares::MiddlewareStack;
use crate::services::cache::ServiceCache;
use crate::services::logger::Logger;
use crate::utils::uri::{endpoint_path, is_absolute_url, join_path_parts, substitute_placeholders};
use serde_json::{Map, Value};
use std::sync::Arc;

pub type Params = Map<String, Value>;

/// Rewrites `(params, options, data)` before a call is dispatched.
pub type Transformer = Arc<
    dyn Fn(Params, CallOptions, Option<Value>) -> Result<(Params, CallOptions, Option<Value>)>
        + Send
        + Sync,
>;

/// Calls against one catalog service type.
///
/// Clones share the session but get their own stack copy and
/// [`ServiceCache`].
pub struct Service {
    name: String,
    session: Arc<AuthSession>,
    options: ServiceOptions,
    stack: MiddlewareStack,
    transformers: Vec<Transformer>,
    cache: Arc<ServiceCache>,
    logger: Logger,
}

fn params_from(value: Value) -> Result<Params> {
    match value {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(ClientError::invalid_config(format!(
            "query params must be an object, got {}",
            other
        ))),
    }
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        session: Arc<AuthSession>,
        options: ServiceOptions,
        stack: MiddlewareStack,
        logger: &Logger,
    ) -> Self {
        let name = name.into();
        let debug = options.debug.unwrap_or(session.options().debug);
        Self {
            logger: logger.child(&name).with_debug(debug),
            name,
            session,
            options,
            stack,
            transformers: Vec::new(),
            cache: Arc::new(ServiceCache::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service_options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn cache(&self) -> &Arc<ServiceCache> {
        &self.cache
    }

    pub fn middlewares(&self) -> &MiddlewareStack {
        &self.stack
    }

    /// This service's own copy of the stack.
    pub fn middlewares_mut(&mut self) -> &mut MiddlewareStack {
        &mut self.stack
    }

    /// Appends a transformer; transformers run in insertion order.
    pub fn add_middleware<F>(&mut self, transformer: F) -> &mut Self
    where
        F: Fn(Params, CallOptions, Option<Value>) -> Result<(Params, CallOptions, Option<Value>)>
            + Send
            + Sync
            + 'static,
    {
        self.transformers.push(Arc::new(transformer));
        self
    }

    fn defaults(&self) -> &ClientOptions {
        self.session.options()
    }

    /// Endpoint URL for the merged region and interface.
    pub async fn endpoint_url(&self, call: &CallOptions) -> Result<String> {
        let resolved = call.over(&self.options).resolve(self.defaults());
        self.session
            .service_url(&self.name, resolved.region.as_deref(), resolved.interface)
            .await?
            .ok_or_else(|| {
                ClientError::endpoint_unavailable(
                    &self.name,
                    resolved.region.as_deref(),
                    resolved.interface.as_str(),
                )
            })
    }

    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        data: Option<Value>,
        call: CallOptions,
    ) -> Result<ApiResponse> {
        let (params, call, data) = self
            .transformers
            .iter()
            .try_fold((params, call, data), |(params, call, data), transformer| {
                (transformer.as_ref())(params, call, data)
            })?;

        let mut resolved = call.over(&self.options).resolve(self.defaults());
        let context = self.session.valid_context().await?;
        let service_url = context
            .service_url(&self.name, resolved.region.as_deref(), resolved.interface)
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::endpoint_unavailable(
                    &self.name,
                    resolved.region.as_deref(),
                    resolved.interface.as_str(),
                )
            })?;

        let full_path = if is_absolute_url(path) {
            path.to_string()
        } else {
            let prefix = resolved
                .path_prefix
                .clone()
                .unwrap_or_else(|| endpoint_path(&service_url));
            if is_absolute_url(&prefix) {
                return Err(ClientError::invalid_config(format!(
                    "path_prefix must be a path, got {}",
                    prefix
                )));
            }
            join_path_parts(&[prefix.as_str(), path])
        };
        let full_path = substitute_placeholders(&full_path, context.project_id().as_deref());

        // The session token replaces any caller-supplied token header.
        resolved
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case(headers::AUTH_TOKEN));
        resolved
            .headers
            .insert(headers::AUTH_TOKEN.to_string(), context.token().to_string());

        self.logger.debug(
            &format!("{} {}", method, full_path),
            Some(&serde_json::json!({ "endpoint": service_url })),
        );

        let mut ctx = RequestContext::new(&self.name, service_url, method, full_path)
            .with_params(params)
            .with_options(resolved)
            .with_data(data)
            .with_cache(self.cache.clone());
        let response = self.stack.execute(&mut ctx).await?;
        Ok(ApiResponse::from(response))
    }

    pub async fn get(&self, path: &str, params: Value, call: CallOptions) -> Result<ApiResponse> {
        self.request(HttpMethod::Get, path, params_from(params)?, None, call)
            .await
    }

    pub async fn head(&self, path: &str, params: Value, call: CallOptions) -> Result<ApiResponse> {
        self.request(HttpMethod::Head, path, params_from(params)?, None, call)
            .await
    }

    pub async fn options(
        &self,
        path: &str,
        params: Value,
        call: CallOptions,
    ) -> Result<ApiResponse> {
        self.request(HttpMethod::Options, path, params_from(params)?, None, call)
            .await
    }

    pub async fn delete(
        &self,
        path: &str,
        params: Value,
        call: CallOptions,
    ) -> Result<ApiResponse> {
        self.request(HttpMethod::Delete, path, params_from(params)?, None, call)
            .await
    }

    pub async fn post(
        &self,
        path: &str,
        params: Value,
        data: Value,
        call: CallOptions,
    ) -> Result<ApiResponse> {
        self.request(HttpMethod::Post, path, params_from(params)?, Some(data), call)
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        params: Value,
        data: Value,
        call: CallOptions,
    ) -> Result<ApiResponse> {
        self.request(HttpMethod::Put, path, params_from(params)?, Some(data), call)
            .await
    }

    pub async fn patch(
        &self,
        path: &str,
        params: Value,
        data: Value,
        call: CallOptions,
    ) -> Result<ApiResponse> {
        self.request(HttpMethod::Patch, path, params_from(params)?, Some(data), call)
            .await
    }
}

impl Clone for Service {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            session: self.session.clone(),
            options: self.options.clone(),
            stack: self.stack.clone(),
            transformers: self.transformers.clone(),
            cache: Arc::new(ServiceCache::new()),
            logger: self.logger.clone(),
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("stack", &self.stack)
            .field("transformers", &self.transformers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_must_be_objects() {
        assert!(params_from(Value::Null).unwrap().is_empty());
        assert_eq!(params_from(json!({"limit": 1})).unwrap()["limit"], 1);
        assert!(matches!(params_from(json!([1])), Err(ClientError::InvalidConfig(_))));
    }
}
