//! Services and the decorator chain.
//!
//! A [`Service`] is an ordered, path/method-scoped unit of handlers plus a
//! parameter schema and an optional security domain. Services are built
//! once via [`ServiceBuilder`] and immutable afterwards.
//!
//! Any service can be wrapped by a decorator implementing [`ServiceUnit`]:
//! the wrapper holds its delegate, forwards the read-only accessors, and
//! intercepts [`ServiceUnit::serve`]. Wrapping nests arbitrarily and stays
//! introspectable — [`ServiceUnit::delegate`] walks one layer in, and
//! `find_as` walks the whole chain to recover any ancestor by concrete
//! type. Chains are acyclic by construction: a decorator can only wrap an
//! already-built, strictly inner service.

use std::any::Any;
use std::sync::Arc;

use http::Method;

use portunus_core::{PortunusError, PortunusResult, Request};

use crate::context::RouterContext;
use crate::handler::{run_chain, BoxFuture, Handler};
use crate::params::ParamDef;
use crate::path::PathSpec;
use crate::security::SecurityDomain;

/// The service contract: read-only accessors plus the executable
/// operation, [`ServiceUnit::serve`].
pub trait ServiceUnit: Send + Sync + 'static {
    /// Returns the path template this service is mounted at.
    fn path_spec(&self) -> &PathSpec;

    /// Returns the methods this service accepts.
    fn methods(&self) -> &[Method];

    /// Returns the typed parameter schema.
    fn parameter_definitions(&self) -> &[ParamDef];

    /// Returns the security domain gating this service, if any.
    fn security_domain(&self) -> Option<&SecurityDomain>;

    /// Returns the service's own handler chain.
    fn handlers(&self) -> &[Arc<dyn Handler>];

    /// Executes the service: runs the handler chain in declared order.
    ///
    /// Decorators override this to run their own logic before, after, or
    /// instead of delegating.
    fn serve<'a>(
        &'a self,
        ctx: &'a mut RouterContext,
        request: &'a Request,
    ) -> BoxFuture<'a, PortunusResult<()>> {
        Box::pin(async move {
            run_chain(self.handlers(), ctx, request).await?;
            Ok(())
        })
    }

    /// Returns the immediately-wrapped delegate, or `None` for an
    /// undecorated service.
    fn delegate(&self) -> Option<&dyn ServiceUnit> {
        None
    }

    /// Trait-query hook for `find_as`.
    fn as_any(&self) -> &dyn Any;
}

impl dyn ServiceUnit {
    /// Returns the immediately-wrapped delegate, or `self` if undecorated.
    #[must_use]
    pub fn unwrap_layer(&self) -> &dyn ServiceUnit {
        self.delegate().unwrap_or(self)
    }

    /// Walks the delegate chain and returns the first layer of concrete
    /// type `T`, or `None` if no layer matches.
    #[must_use]
    pub fn find_as<T: ServiceUnit>(&self) -> Option<&T> {
        let mut current: &dyn ServiceUnit = self;
        loop {
            if let Some(found) = current.as_any().downcast_ref::<T>() {
                return Some(found);
            }
            current = current.delegate()?;
        }
    }
}

/// An ordered, path/method-scoped unit of handlers.
///
/// # Example
///
/// ```
/// use portunus_router::{handler_fn, Flow, Service, ServiceUnit};
/// use http::Method;
///
/// let service = Service::builder()
///     .path("/demo")
///     .method(Method::DELETE)
///     .handler(handler_fn("drop", |ctx, _request| {
///         Box::pin(async move {
///             ctx.response_mut().body_text("dropped");
///             Ok(Flow::Done)
///         })
///     }))
///     .build()
///     .unwrap();
///
/// assert_eq!(service.path_spec().as_str(), "/demo");
/// assert_eq!(service.methods(), [Method::DELETE]);
/// ```
pub struct Service {
    path_spec: PathSpec,
    methods: Vec<Method>,
    parameter_definitions: Vec<ParamDef>,
    security_domain: Option<SecurityDomain>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("path_spec", &self.path_spec.as_str())
            .field("methods", &self.methods)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl Service {
    /// Creates a new service builder.
    #[must_use]
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::default()
    }
}

impl ServiceUnit for Service {
    fn path_spec(&self) -> &PathSpec {
        &self.path_spec
    }

    fn methods(&self) -> &[Method] {
        &self.methods
    }

    fn parameter_definitions(&self) -> &[ParamDef] {
        &self.parameter_definitions
    }

    fn security_domain(&self) -> Option<&SecurityDomain> {
        self.security_domain.as_ref()
    }

    fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One-shot builder producing an immutable [`Service`].
#[derive(Default)]
pub struct ServiceBuilder {
    prefix: String,
    path: Option<String>,
    methods: Vec<Method>,
    parameter_definitions: Vec<ParamDef>,
    security_domain: Option<SecurityDomain>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl ServiceBuilder {
    /// Sets a prefix prepended to the path template.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the path template. Defaults to the catch-all `/**`.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds an accepted method. Defaults to `GET` if none are added.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Adds a typed parameter definition.
    #[must_use]
    pub fn parameter(mut self, definition: ParamDef) -> Self {
        self.parameter_definitions.push(definition);
        self
    }

    /// Attaches a security domain gating this service.
    #[must_use]
    pub fn security_domain(mut self, security_domain: SecurityDomain) -> Self {
        self.security_domain = Some(security_domain);
        self
    }

    /// Appends a handler to the chain. At least one is required.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Builds the immutable service.
    ///
    /// # Errors
    ///
    /// Returns [`PortunusError::Configuration`] if no handler was added or
    /// the path template is malformed.
    pub fn build(mut self) -> PortunusResult<Service> {
        if self.handlers.is_empty() {
            return Err(PortunusError::configuration(
                "a service requires at least one handler",
            ));
        }
        let spec = match self.path {
            Some(path) => PathSpec::parse(&format!("{}/{}", self.prefix, path))?,
            None if self.prefix.is_empty() => PathSpec::catch_all(),
            None => PathSpec::parse(&format!("{}/**", self.prefix))?,
        };
        if self.methods.is_empty() {
            self.methods.push(Method::GET);
        }
        Ok(Service {
            path_spec: spec,
            methods: self.methods,
            parameter_definitions: self.parameter_definitions,
            security_domain: self.security_domain,
            handlers: self.handlers,
        })
    }
}

/// A decorator that prepends cross-cutting handlers to a service.
///
/// Read-only accessors forward to the delegate unchanged; `serve` runs the
/// prepended handlers first and delegates only if none of them terminated
/// the chain.
pub struct DecoratingService {
    inner: Arc<dyn ServiceUnit>,
    before: Vec<Arc<dyn Handler>>,
}

impl DecoratingService {
    /// Wraps `inner`, running `handler` ahead of its chain.
    #[must_use]
    pub fn prepend(inner: Arc<dyn ServiceUnit>, handler: Arc<dyn Handler>) -> Self {
        Self {
            inner,
            before: vec![handler],
        }
    }

    /// Adds another prepended handler, after those already present.
    #[must_use]
    pub fn and(mut self, handler: Arc<dyn Handler>) -> Self {
        self.before.push(handler);
        self
    }
}

impl ServiceUnit for DecoratingService {
    fn path_spec(&self) -> &PathSpec {
        self.inner.path_spec()
    }

    fn methods(&self) -> &[Method] {
        self.inner.methods()
    }

    fn parameter_definitions(&self) -> &[ParamDef] {
        self.inner.parameter_definitions()
    }

    fn security_domain(&self) -> Option<&SecurityDomain> {
        self.inner.security_domain()
    }

    fn handlers(&self) -> &[Arc<dyn Handler>] {
        self.inner.handlers()
    }

    fn serve<'a>(
        &'a self,
        ctx: &'a mut RouterContext,
        request: &'a Request,
    ) -> BoxFuture<'a, PortunusResult<()>> {
        Box::pin(async move {
            if run_chain(&self.before, ctx, request).await? == crate::handler::Flow::Done {
                return Ok(());
            }
            self.inner.serve(ctx, request).await
        })
    }

    fn delegate(&self) -> Option<&dyn ServiceUnit> {
        Some(self.inner.as_ref())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
