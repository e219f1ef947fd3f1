//! Security domains.
//!
//! A security domain is a named realm plus an ordered list of gating
//! handlers the router runs before a service's own chain. A gate admits
//! the request by returning [`Flow::Continue`], short-circuits it by
//! finalizing the response (or returning [`Flow::Done`]), or fails it with
//! an error — typically [`PortunusError::Http`] carrying 401 or 403.
//!
//! [`Flow::Continue`]: crate::Flow::Continue
//! [`Flow::Done`]: crate::Flow::Done
//! [`PortunusError::Http`]: portunus_core::PortunusError::Http

use std::sync::Arc;

use crate::handler::Handler;

/// A named realm with ordered gating handlers.
///
/// # Example
///
/// ```
/// use portunus_router::{handler_fn, Flow, SecurityDomain};
/// use portunus_core::PortunusError;
/// use http::StatusCode;
///
/// let admin = SecurityDomain::new("admin").gate(handler_fn(
///     "require-token",
///     |_ctx, request| {
///         let authorized = request.headers().contains_key("authorization");
///         Box::pin(async move {
///             if authorized {
///                 Ok(Flow::Continue)
///             } else {
///                 Err(PortunusError::http(StatusCode::UNAUTHORIZED, "token required"))
///             }
///         })
///     },
/// ));
/// assert_eq!(admin.realm(), "admin");
/// ```
#[derive(Clone)]
pub struct SecurityDomain {
    realm: String,
    handlers: Vec<Arc<dyn Handler>>,
}

impl std::fmt::Debug for SecurityDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityDomain")
            .field("realm", &self.realm)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl SecurityDomain {
    /// Creates a security domain for the given realm.
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            handlers: Vec::new(),
        }
    }

    /// Appends a gating handler, after those already present.
    #[must_use]
    pub fn gate(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Returns the realm identifier.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Returns the ordered gating handlers.
    #[must_use]
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }
}
