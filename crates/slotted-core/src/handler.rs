//! Request handler service interface.
//!
//! The serving layer owns a [`Dispatcher`] and drives it explicitly: it runs
//! the install and activate hooks once, then hands every intercepted request
//! to [`Dispatcher::dispatch`]. Nothing here registers itself globally.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{Method, RequestContext};
use crate::error::{ChunkStream, RenderError};

/// A path a handler responds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Exact path, or a prefix ending in `*`.
    pub pattern: String,
    /// Methods this route accepts.
    pub methods: Vec<Method>,
}

impl Route {
    /// Create a GET route.
    pub fn get(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            methods: vec![Method::Get],
        }
    }

    /// Set allowed methods.
    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = methods;
        self
    }

    /// Check whether a request matches this route.
    pub fn matches(&self, method: Method, path: &str) -> bool {
        if !self.methods.contains(&method) {
            return false;
        }
        match self.pattern.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == self.pattern,
        }
    }
}

/// Renders responses for the requests it accepts.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handler name, used in logs.
    fn name(&self) -> &str;

    /// Routes this handler serves.
    fn routes(&self) -> Vec<Route>;

    /// Whether this handler takes the request.
    fn accepts(&self, ctx: &RequestContext) -> bool {
        self.routes()
            .iter()
            .any(|route| route.matches(ctx.method, &ctx.path))
    }

    /// Produce the chunk sequence for an accepted request.
    async fn render(&self, ctx: &RequestContext) -> Result<ChunkStream, RenderError>;

    /// Called once when the handler is installed.
    async fn on_install(&self) -> Result<(), RenderError> {
        Ok(())
    }

    /// Called once when the handler starts taking requests.
    async fn on_activate(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Lifecycle state of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Handlers registered, hooks not run.
    Registered,
    /// Install hooks have run.
    Installed,
    /// Activate hooks have run; requests are dispatched.
    Active,
}

/// Routes requests to registered handlers.
pub struct Dispatcher {
    handlers: Vec<Arc<dyn RequestHandler>>,
    state: DispatcherState,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            state: DispatcherState::Registered,
        }
    }

    /// Register a handler. Earlier handlers take precedence.
    pub fn register(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Run every handler's install hook.
    pub async fn install(&mut self) -> Result<(), RenderError> {
        for handler in &self.handlers {
            handler.on_install().await?;
        }
        self.state = DispatcherState::Installed;
        Ok(())
    }

    /// Run every handler's activate hook, installing first if needed.
    pub async fn activate(&mut self) -> Result<(), RenderError> {
        if self.state == DispatcherState::Registered {
            self.install().await?;
        }
        for handler in &self.handlers {
            handler.on_activate().await?;
        }
        self.state = DispatcherState::Active;
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Find the handler for a request.
    pub fn route(&self, ctx: &RequestContext) -> Option<&Arc<dyn RequestHandler>> {
        self.handlers.iter().find(|handler| handler.accepts(ctx))
    }

    /// Render a request with the first handler that accepts it.
    pub async fn dispatch(&self, ctx: &RequestContext) -> Result<ChunkStream, RenderError> {
        match self.route(ctx) {
            Some(handler) => handler.render(ctx).await,
            None => Err(RenderError::NoHandler(ctx.path.clone())),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
