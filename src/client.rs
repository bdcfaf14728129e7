use crate::auth::{AuthConfig, AuthSession, TokenContext};
use crate::config::{ClientOptions, ServiceOptions};
use crate::errors::{ClientError, Result};
use crate::middlewares::MiddlewareStack;
use crate::service::Service;
use crate::services::logger::Logger;
use crate::transport::{ReqwestTransport, Transport};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Entry point: one authenticated session plus per-service facades.
pub struct Client {
    session: Arc<AuthSession>,
    stack: MiddlewareStack,
    services: Mutex<HashMap<String, Arc<Service>>>,
    logger: Logger,
}

impl Client {
    pub async fn new(auth_conf: AuthConfig, options: ClientOptions, logger: &Logger) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(logger.clone()));
        Self::with_transport(auth_conf, options, transport, logger).await
    }

    pub async fn with_transport(
        auth_conf: AuthConfig,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
        logger: &Logger,
    ) -> Result<Self> {
        let logger = logger.child("client").with_debug(options.debug);
        let stack = MiddlewareStack::default_stack(transport, &logger);
        let session = AuthSession::connect(auth_conf, options, stack.clone(), &logger).await?;
        Ok(Self {
            session: Arc::new(session),
            stack,
            services: Mutex::new(HashMap::new()),
            logger,
        })
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Current token context; never triggers authentication.
    pub fn context(&self) -> Option<Arc<TokenContext>> {
        self.session.current()
    }

    pub async fn token(&self) -> Result<String> {
        self.session.token().await
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await
    }

    pub fn middlewares(&self) -> &MiddlewareStack {
        &self.stack
    }

    /// Stack for services created from now on.
    pub fn middlewares_mut(&mut self) -> &mut MiddlewareStack {
        self.services
            .get_mut()
            .unwrap_or_else(|err| err.into_inner())
            .clear();
        &mut self.stack
    }

    fn check_catalog(&self, context: &TokenContext, name: &str) -> Result<()> {
        if context.has_service(name) {
            return Ok(());
        }
        self.logger.warn(
            "service not in catalog",
            Some(&serde_json::json!({ "service": name })),
        );
        Err(ClientError::ServiceUnavailable(name.to_string()))
    }

    /// Facade for the catalog service `name` (type or name). Services are
    /// cached per name and options and shared; use
    /// [`Client::build_service`] for one whose stack or transformers will
    /// be changed.
    pub async fn service(&self, name: &str, options: ServiceOptions) -> Result<Arc<Service>> {
        let context = self.session.valid_context().await?;
        self.check_catalog(&context, name)?;

        let key = format!("{}|{}", name, options.cache_key());
        let mut services = self
            .services
            .lock()
            .map_err(|_| ClientError::internal("Failed to access service cache"))?;
        if let Some(existing) = services.get(&key) {
            return Ok(existing.clone());
        }
        let service = Arc::new(Service::new(
            name,
            self.session.clone(),
            options,
            self.stack.clone(),
            &self.logger,
        ));
        services.insert(key, service.clone());
        Ok(service)
    }

    /// Uncached, caller-owned facade with its own copy of the client stack.
    pub async fn build_service(&self, name: &str, options: ServiceOptions) -> Result<Service> {
        let context = self.session.valid_context().await?;
        self.check_catalog(&context, name)?;
        Ok(Service::new(
            name,
            self.session.clone(),
            options,
            self.stack.clone(),
            &self.logger,
        ))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .field("stack", &self.stack)
            .finish()
    }
}
