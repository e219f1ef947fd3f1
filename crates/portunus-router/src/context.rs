//! The per-request router context.
//!
//! Created by [`Router::route`](crate::Router::route) once the domain,
//! service, and parameters are resolved; destroyed when the response is
//! finalized. Handlers communicate through the attribute bag and write the
//! response through the sink.

use std::sync::Arc;

use portunus_core::{AbortHandle, Attributes, RequestId, Response, ResponseSink};

use crate::domain::Domain;
use crate::params::Params;
use crate::service::ServiceUnit;

/// Per-request state threaded through the handler chain.
pub struct RouterContext {
    request_id: RequestId,
    domain: Arc<Domain>,
    service: Arc<dyn ServiceUnit>,
    params: Params,
    attributes: Attributes,
    response: ResponseSink,
    abort: AbortHandle,
}

impl std::fmt::Debug for RouterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterContext")
            .field("request_id", &self.request_id)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl RouterContext {
    pub(crate) fn new(domain: Arc<Domain>, service: Arc<dyn ServiceUnit>, params: Params) -> Self {
        Self {
            request_id: RequestId::new(),
            domain,
            service,
            params,
            attributes: Attributes::new(),
            response: ResponseSink::new(),
            abort: AbortHandle::new(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the resolved domain.
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the resolved service.
    #[must_use]
    pub fn service(&self) -> &dyn ServiceUnit {
        self.service.as_ref()
    }

    /// Returns a shared handle to the resolved service.
    #[must_use]
    pub fn service_arc(&self) -> Arc<dyn ServiceUnit> {
        Arc::clone(&self.service)
    }

    /// Returns the matched parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a single matched parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the attribute bag.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the attribute bag mutably.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns the in-flight response.
    #[must_use]
    pub fn response(&self) -> &ResponseSink {
        &self.response
    }

    /// Returns the in-flight response mutably.
    pub fn response_mut(&mut self) -> &mut ResponseSink {
        &mut self.response
    }

    /// Returns the abort handle the transport uses to signal a dropped
    /// request. Clone it out before dispatching.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Returns true once the transport has signalled an abort.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    /// Finalizes the context into the response handed back to the
    /// transport collaborator.
    #[must_use]
    pub fn finish(mut self) -> Response {
        self.response.done();
        self.response.into_response()
    }
}
