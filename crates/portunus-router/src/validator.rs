//! Request validation.
//!
//! The validator runs first in every dispatch, before security gates and
//! service handlers. It enforces the `Expect` header contract: the only
//! expectation this engine understands is `100-continue`; anything else
//! fails with an expectation error the catchers map to HTTP 417.

use http::header::EXPECT;

use portunus_core::{PortunusError, PortunusResult, Request};

use crate::context::RouterContext;
use crate::handler::{BoxFuture, Flow, Handler};

/// Validates structural request properties before dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRequestValidator;

impl HttpRequestValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn check(request: &Request) -> PortunusResult<()> {
        for value in request.headers().get_all(EXPECT) {
            let raw = value
                .to_str()
                .map_err(|_| PortunusError::unknown_expect("<non-ascii>"))?;
            if !raw.eq_ignore_ascii_case("100-continue") {
                return Err(PortunusError::unknown_expect(raw));
            }
        }
        Ok(())
    }
}

impl Handler for HttpRequestValidator {
    fn name(&self) -> &str {
        "http-request-validator"
    }

    fn handle<'a>(
        &'a self,
        _ctx: &'a mut RouterContext,
        request: &'a Request,
    ) -> BoxFuture<'a, PortunusResult<Flow>> {
        let result = Self::check(request);
        Box::pin(async move { result.map(|()| Flow::Continue) })
    }
}
