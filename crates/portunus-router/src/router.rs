//! The router: host → domain → service resolution and dispatch.
//!
//! Router state (domains, catchers, validator) is built once and immutable
//! afterwards, safe for concurrent lookup without locking. Matching is a
//! pure function of the registered domains plus the request's host, path,
//! and method — registration order only ever breaks exact specificity
//! ties.

use std::net::SocketAddr;
use std::slice;
use std::sync::Arc;

use tracing::{debug, error, warn};

use portunus_core::{
    request_host, ErrorKind, PortunusError, PortunusResult, Request, Response,
};

use crate::catchers::{Catcher, Catchers};
use crate::context::RouterContext;
use crate::domain::Domain;
use crate::handler::{run_chain, Flow, Handler};
use crate::params::bind_parameters;
use crate::service::ServiceUnit;
use crate::validator::HttpRequestValidator;

/// The request router.
///
/// # Example
///
/// ```
/// use portunus_router::{handler_fn, Domain, Flow, Router, Service};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let address = "127.0.0.1:8080".parse().unwrap();
/// let router = Router::builder()
///     .domain(
///         Domain::builder(address)
///             .name("example.com")
///             .service(
///                 Service::builder()
///                     .path("/hello")
///                     .handler(handler_fn("hello", |ctx, _request| {
///                         Box::pin(async move {
///                             ctx.response_mut().body_text("hello");
///                             Ok(Flow::Done)
///                         })
///                     }))
///                     .build()
///                     .unwrap(),
///             )
///             .build()
///             .unwrap(),
///     )
///     .build()
///     .unwrap();
///
/// let request = http::Request::builder()
///     .uri("/hello")
///     .header(http::header::HOST, "example.com")
///     .body(http_body_util::Full::default())
///     .unwrap();
///
/// let response = router.handle(&request, address).await;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// # }
/// ```
pub struct Router {
    domains: Vec<Arc<Domain>>,
    validator: Arc<dyn Handler>,
    catchers: Catchers,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("domains", &self.domains)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates a new router builder.
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder {
            domains: Vec::new(),
            validator: Arc::new(HttpRequestValidator::new()),
            catchers: Catchers::with_defaults(),
        }
    }

    /// Returns the registered domains.
    #[must_use]
    pub fn domains(&self) -> &[Arc<Domain>] {
        &self.domains
    }

    /// Resolves a request to a per-request context: domain by host,
    /// service by path and method, parameters bound against the service's
    /// schema.
    ///
    /// `address` is the local address the transport accepted the request
    /// on; it scopes which domains are candidates.
    ///
    /// # Errors
    ///
    /// `DomainNotFound`, `ServiceNotFound`, `MethodNotAllowed`, or
    /// `ParameterValidation` — callers map these to catchers (or use
    /// [`Router::handle`], which does).
    pub fn route(&self, request: &Request, address: SocketAddr) -> PortunusResult<RouterContext> {
        let host = request_host(request);
        let domain = self.select_domain(host.as_deref(), address)?;

        let path = request.uri().path();
        let (service, mut params) = domain.resolve(path, request.method())?;
        bind_parameters(
            service.parameter_definitions(),
            &mut params,
            request.uri().query(),
        )?;

        debug!(
            host = host.as_deref().unwrap_or("<none>"),
            path,
            method = %request.method(),
            template = service.path_spec().as_str(),
            "request routed"
        );
        Ok(RouterContext::new(domain, service, params))
    }

    /// Executes the resolved handler chain: validator, security gates,
    /// service handlers, finalization. Handler errors resolve to the
    /// registered catchers.
    pub async fn dispatch(&self, mut ctx: RouterContext, request: &Request) -> Response {
        match self.run(&mut ctx, request).await {
            Ok(()) => ctx.finish(),
            Err(err) => {
                self.log_failure(&err);
                self.catchers.render(&err)
            }
        }
    }

    /// Routes and dispatches in one step, resolving routing-phase errors
    /// through the catchers as well.
    pub async fn handle(&self, request: &Request, address: SocketAddr) -> Response {
        match self.route(request, address) {
            Ok(ctx) => self.dispatch(ctx, request).await,
            Err(err) => {
                self.log_failure(&err);
                self.catchers.render(&err)
            }
        }
    }

    fn select_domain(
        &self,
        host: Option<&str>,
        address: SocketAddr,
    ) -> PortunusResult<Arc<Domain>> {
        let candidates = self.domains.iter().filter(|d| d.address() == address);

        if let Some(host) = host {
            if let Some(domain) = candidates.clone().find(|d| d.matches_host(host)) {
                return Ok(Arc::clone(domain));
            }
        }
        // Address-only fallback: the unnamed domain bound to this address.
        candidates
            .clone()
            .find(|d| d.is_default())
            .map(Arc::clone)
            .ok_or_else(|| PortunusError::domain_not_found(host.unwrap_or("<none>")))
    }

    async fn run(&self, ctx: &mut RouterContext, request: &Request) -> PortunusResult<()> {
        if run_chain(slice::from_ref(&self.validator), ctx, request).await? == Flow::Done {
            return Ok(());
        }

        let service = ctx.service_arc();
        if let Some(security) = service.security_domain() {
            debug!(realm = security.realm(), "running security gates");
            if run_chain(security.handlers(), ctx, request).await? == Flow::Done {
                return Ok(());
            }
        }

        service.serve(ctx, request).await
    }

    fn log_failure(&self, err: &PortunusError) {
        match err.kind() {
            ErrorKind::Internal => error!(error = %err, "request failed"),
            _ => warn!(error = %err, "request rejected"),
        }
    }
}

/// One-shot builder producing an immutable [`Router`].
pub struct RouterBuilder {
    domains: Vec<Arc<Domain>>,
    validator: Arc<dyn Handler>,
    catchers: Catchers,
}

impl RouterBuilder {
    /// Registers a domain.
    #[must_use]
    pub fn domain(mut self, domain: Domain) -> Self {
        self.domains.push(Arc::new(domain));
        self
    }

    /// Replaces the request validator run ahead of every dispatch.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn Handler>) -> Self {
        self.validator = validator;
        self
    }

    /// Replaces the catcher for one error kind.
    #[must_use]
    pub fn catcher(mut self, kind: ErrorKind, catcher: Arc<dyn Catcher>) -> Self {
        self.catchers.set(kind, catcher);
        self
    }

    /// Builds the immutable router.
    ///
    /// # Errors
    ///
    /// Returns [`PortunusError::Configuration`] if two domains bound to
    /// the same address share a host alias, or if an address carries two
    /// unnamed fallback domains — either would make some (host, address)
    /// pair ambiguous.
    pub fn build(self) -> PortunusResult<Router> {
        for (index, domain) in self.domains.iter().enumerate() {
            for earlier in &self.domains[..index] {
                if earlier.address() != domain.address() {
                    continue;
                }
                if let Some(shared) = domain
                    .names()
                    .iter()
                    .find(|name| earlier.matches_host(name))
                {
                    return Err(PortunusError::configuration(format!(
                        "host {shared:?} on {} is claimed by two domains",
                        domain.address()
                    )));
                }
                if domain.is_default() && earlier.is_default() {
                    return Err(PortunusError::configuration(format!(
                        "two fallback domains bound to {}",
                        domain.address()
                    )));
                }
            }
        }
        Ok(Router {
            domains: self.domains,
            validator: self.validator,
            catchers: self.catchers,
        })
    }
}
