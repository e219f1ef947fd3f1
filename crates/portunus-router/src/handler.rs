//! The handler trait and chain execution.
//!
//! Handlers are the units a service (and a security domain) composes in
//! order. A handler reads the request, may write to the context's response
//! sink, and tells the chain whether to continue. Errors propagate to the
//! router's dispatch boundary, where they are resolved to an error catcher.
//!
//! # Example
//!
//! ```
//! use portunus_router::{handler_fn, Flow, Handler};
//!
//! let hello = handler_fn("hello", |ctx, _request| {
//!     Box::pin(async move {
//!         ctx.response_mut().body_text("hello");
//!         Ok(Flow::Done)
//!     })
//! });
//! assert_eq!(hello.name(), "hello");
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use portunus_core::{PortunusResult, Request};

use crate::context::RouterContext;

/// A boxed future that returns `T`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What the chain should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Proceed to the next handler in the chain.
    Continue,
    /// The response is terminal; skip the remaining handlers.
    Done,
}

/// A unit of request-processing behavior.
///
/// Handlers run in declared order. A handler short-circuits the chain by
/// returning [`Flow::Done`] (or by finalizing the response sink), and
/// fails it by returning an error — which the router resolves to the
/// catcher for that error's category.
pub trait Handler: Send + Sync + 'static {
    /// The handler's name, used for logging and diagnostics.
    fn name(&self) -> &str {
        "handler"
    }

    /// Processes the request.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RouterContext,
        request: &'a Request,
    ) -> BoxFuture<'a, PortunusResult<Flow>>;
}

/// A function-based handler.
///
/// Created through [`handler_fn`]; lets closures and async functions act
/// as handlers without a named type.
pub struct FnHandler<F> {
    name: String,
    func: F,
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RouterContext, &'a Request) -> BoxFuture<'a, PortunusResult<Flow>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RouterContext,
        request: &'a Request,
    ) -> BoxFuture<'a, PortunusResult<Flow>> {
        (self.func)(ctx, request)
    }
}

/// Wraps a closure as a named [`Handler`].
pub fn handler_fn<F>(name: impl Into<String>, func: F) -> Arc<dyn Handler>
where
    F: for<'a> Fn(&'a mut RouterContext, &'a Request) -> BoxFuture<'a, PortunusResult<Flow>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        func,
    })
}

/// Runs a handler chain in order, honoring short-circuits and the abort
/// checkpoint between handlers.
///
/// Returns [`Flow::Done`] if any handler terminated the chain, and
/// [`Flow::Continue`] if the whole chain ran through.
pub(crate) async fn run_chain(
    handlers: &[Arc<dyn Handler>],
    ctx: &mut RouterContext,
    request: &Request,
) -> PortunusResult<Flow> {
    for handler in handlers {
        if ctx.is_aborted() {
            debug!(request_id = %ctx.request_id(), "request aborted, abandoning chain");
            return Ok(Flow::Done);
        }
        if ctx.response().is_done() {
            return Ok(Flow::Done);
        }
        if handler.handle(ctx, request).await? == Flow::Done {
            return Ok(Flow::Done);
        }
    }
    Ok(Flow::Continue)
}
