use super::{select_version, strategy_for, AuthConfig, IdentityStrategy, TokenContext};
use crate::config::{ClientOptions, Interface};
use crate::constants::{headers, identity};
use crate::containers::{HttpMethod, RequestContext};
use crate::errors::{ClientError, Result};
use crate::middlewares::MiddlewareStack;
use crate::services::logger::Logger;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Owns the credentials and the current [`TokenContext`].
///
/// Authentication is single flight: callers that queue behind a running
/// exchange reuse its result. The context is swapped as one `Arc`, so
/// readers never observe a half-updated token.
pub struct AuthSession {
    config: AuthConfig,
    options: ClientOptions,
    stack: MiddlewareStack,
    strategy: Option<Arc<dyn IdentityStrategy>>,
    context: RwLock<Option<Arc<TokenContext>>>,
    auth_gate: Mutex<()>,
    generation: AtomicU64,
    logger: Logger,
}

impl AuthSession {
    /// Builds the session without network I/O. A config carrying both
    /// `token` and `token_context` yields an authenticated, non-renewable
    /// session.
    pub fn new(
        config: AuthConfig,
        options: ClientOptions,
        stack: MiddlewareStack,
        logger: &Logger,
    ) -> Result<Self> {
        let logger = logger.child("auth").with_debug(options.debug);

        let (strategy, context) = match (&config.token_context, config.token()) {
            (Some(token_context), Some(token)) => {
                let context = TokenContext::new(
                    token_context.clone(),
                    token,
                    &config.url,
                    options.region.as_deref(),
                )?;
                logger.debug("session restored from token context", Some(&context.summary()));
                (None, Some(Arc::new(context)))
            }
            _ => {
                let version = select_version(&config, &options)?;
                config.validate(version)?;
                (Some(strategy_for(version)?), None)
            }
        };

        Ok(Self {
            config,
            options,
            stack,
            strategy,
            context: RwLock::new(context),
            auth_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            logger,
        })
    }

    /// [`AuthSession::new`] followed by authentication unless `lazy` is set.
    pub async fn connect(
        config: AuthConfig,
        options: ClientOptions,
        stack: MiddlewareStack,
        logger: &Logger,
    ) -> Result<Self> {
        let lazy = options.lazy;
        let session = Self::new(config, options, stack, logger)?;
        if !lazy && session.current().is_none() {
            session.authenticate().await?;
        }
        Ok(session)
    }

    pub fn version(&self) -> Option<&'static str> {
        self.strategy.as_ref().map(|strategy| strategy.version())
    }

    pub fn can_reauthenticate(&self) -> bool {
        self.strategy.is_some()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn auth_url(&self) -> &str {
        &self.config.url
    }

    /// Current context, without authenticating or checking expiry.
    pub fn current(&self) -> Option<Arc<TokenContext>> {
        self.context
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    fn publish(&self, context: Option<Arc<TokenContext>>) {
        *self.context.write().unwrap_or_else(|err| err.into_inner()) = context;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Runs one identity exchange and replaces the context. A caller that
    /// waited for a concurrent exchange gets that exchange's context.
    pub async fn authenticate(&self) -> Result<Arc<TokenContext>> {
        let observed = self.generation.load(Ordering::Acquire);
        self.authenticate_gated(Some(observed)).await
    }

    /// With `observed`, an exchange finished since that generation is reused;
    /// without it, any valid context found behind the gate is.
    async fn authenticate_gated(&self, observed: Option<u64>) -> Result<Arc<TokenContext>> {
        let _gate = self.auth_gate.lock().await;

        let reuse = match observed {
            Some(generation) => self.generation.load(Ordering::Acquire) != generation,
            None => true,
        };
        if reuse {
            if let Some(context) = self.current().filter(|ctx| !ctx.expired()) {
                self.logger.debug("reusing context from concurrent authentication", None);
                return Ok(context);
            }
        }

        let strategy = self.strategy.as_ref().ok_or_else(|| {
            ClientError::invalid_config("session was built from a token context and has no credentials")
        })?;
        self.logger.debug(
            "authenticating",
            Some(&serde_json::json!({ "version": strategy.version(), "url": self.config.url })),
        );
        let grant = strategy
            .authenticate(&self.config, &self.stack, &self.options.request_options())
            .await
            .map_err(|err| {
                self.logger.warn("authentication failed", Some(&err.details()));
                err
            })?;
        let context = Arc::new(TokenContext::new(
            grant.payload,
            grant.token,
            &self.config.url,
            self.options.region.as_deref(),
        )?);
        self.publish(Some(context.clone()));
        self.logger.info("authenticated", Some(&context.summary()));
        Ok(context)
    }

    /// A non-expired context, authenticating at most once to get it.
    pub async fn valid_context(&self) -> Result<Arc<TokenContext>> {
        match self.current() {
            Some(context) if !context.expired() => Ok(context),
            Some(_) if self.strategy.is_none() => Err(ClientError::TokenExpired),
            None if self.strategy.is_none() => Err(ClientError::NotAuthenticated),
            _ => self.authenticate_gated(None).await,
        }
    }

    pub async fn token(&self) -> Result<String> {
        Ok(self.valid_context().await?.token().to_string())
    }

    /// Endpoint lookup; authenticates first when needed.
    pub async fn service_url(
        &self,
        type_or_name: &str,
        region: Option<&str>,
        interface: Interface,
    ) -> Result<Option<String>> {
        let context = self.valid_context().await?;
        Ok(context
            .service_url(type_or_name, region, interface)
            .map(str::to_string))
    }

    /// Revokes the current token and forgets the context.
    pub async fn logout(&self) -> Result<()> {
        let Some(context) = self.current() else {
            return Ok(());
        };
        let path = super::identity_path(&self.config.url, identity::V3_TOKENS_PATH);
        let mut ctx = RequestContext::new(
            identity::SERVICE_TYPE,
            self.config.url.clone(),
            HttpMethod::Delete,
            path,
        )
        .with_options(self.options.request_options());
        ctx.set_header(headers::AUTH_TOKEN, context.token());
        ctx.set_header(headers::SUBJECT_TOKEN, context.token());
        self.stack.execute(&mut ctx).await?;
        self.publish(None);
        self.logger.info("logged out", None);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&TokenContext) -> T) -> Option<T> {
        self.current().map(|context| f(&context))
    }

    pub fn expired(&self) -> bool {
        self.read(TokenContext::expired).unwrap_or(true)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.read(TokenContext::expires_at)
    }

    pub fn user_id(&self) -> Option<String> {
        self.read(TokenContext::user_id).flatten()
    }

    pub fn user_name(&self) -> Option<String> {
        self.read(TokenContext::user_name).flatten()
    }

    pub fn user_domain_id(&self) -> Option<String> {
        self.read(TokenContext::user_domain_id).flatten()
    }

    pub fn user_domain_name(&self) -> Option<String> {
        self.read(TokenContext::user_domain_name).flatten()
    }

    pub fn domain_id(&self) -> Option<String> {
        self.read(TokenContext::domain_id).flatten()
    }

    pub fn domain_name(&self) -> Option<String> {
        self.read(TokenContext::domain_name).flatten()
    }

    pub fn project_id(&self) -> Option<String> {
        self.read(TokenContext::project_id).flatten()
    }

    pub fn project_name(&self) -> Option<String> {
        self.read(TokenContext::project_name).flatten()
    }

    pub fn project_domain_id(&self) -> Option<String> {
        self.read(TokenContext::project_domain_id).flatten()
    }

    pub fn project_domain_name(&self) -> Option<String> {
        self.read(TokenContext::project_domain_name).flatten()
    }

    pub fn role_names(&self) -> Vec<String> {
        self.read(|ctx| ctx.role_names().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.read(|ctx| ctx.has_role(name)).unwrap_or(false)
    }

    pub fn has_service(&self, type_or_name: &str) -> bool {
        self.read(|ctx| ctx.has_service(type_or_name)).unwrap_or(false)
    }

    pub fn available_services_regions(&self) -> Vec<String> {
        self.read(|ctx| ctx.available_services_regions().to_vec())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("url", &self.config.url)
            .field("version", &self.version())
            .field("authenticated", &self.current().is_some())
            .finish()
    }
}
