//! Error catchers.
//!
//! A small fixed set of handlers outside the main dispatch chain: one per
//! well-known failure category. Each catcher is pure with respect to the
//! request — given the recorded error it sets status, content type, and a
//! textual body, then finalizes. Catchers never re-enter the dispatch
//! chain, and stack traces never reach the client.

use std::collections::HashMap;
use std::sync::Arc;

use portunus_core::{ErrorKind, PortunusError, Response, ResponseSink};

/// Renders a recorded error into the response.
pub trait Catcher: Send + Sync + 'static {
    /// Sets status, content type, and body for the error, then finalizes.
    fn catch(&self, error: &PortunusError, response: &mut ResponseSink);
}

/// The default catcher: status line plus the error's own message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatcher;

impl Catcher for DefaultCatcher {
    fn catch(&self, error: &PortunusError, response: &mut ResponseSink) {
        let status = error.status_code();
        let reason = status.canonical_reason().unwrap_or("Error");
        response
            .status(status)
            .body_text(&format!("{} {}\n{}", status.as_u16(), reason, error));
        response.done();
    }
}

/// The catcher registry: one catcher per [`ErrorKind`], with the
/// internal-error catcher as the final fallback.
#[derive(Clone)]
pub(crate) struct Catchers {
    map: HashMap<ErrorKind, Arc<dyn Catcher>>,
}

impl Catchers {
    /// Creates a registry with the default catcher for every kind.
    pub(crate) fn with_defaults() -> Self {
        let default: Arc<dyn Catcher> = Arc::new(DefaultCatcher);
        let map = ErrorKind::all()
            .into_iter()
            .map(|kind| (kind, Arc::clone(&default)))
            .collect();
        Self { map }
    }

    /// Replaces the catcher for a kind.
    pub(crate) fn set(&mut self, kind: ErrorKind, catcher: Arc<dyn Catcher>) {
        self.map.insert(kind, catcher);
    }

    /// Renders an error through its registered catcher.
    pub(crate) fn render(&self, error: &PortunusError) -> Response {
        let catcher = self
            .map
            .get(&error.kind())
            .or_else(|| self.map.get(&ErrorKind::Internal))
            .expect("registry always carries the internal catcher");

        let mut sink = ResponseSink::new();
        catcher.catch(error, &mut sink);
        if !sink.is_done() {
            sink.done();
        }
        sink.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;

    async fn body_text(response: Response) -> String {
        let collected = response.into_body().collect().await.unwrap();
        String::from_utf8(collected.to_bytes().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_default_catcher_sets_status_and_text_body() {
        let catchers = Catchers::with_defaults();
        let response = catchers.render(&PortunusError::service_not_found("/missing"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get(http::header::CONTENT_TYPE)
                .unwrap(),
            "text/plain; charset=utf-8"
        );
        let body = body_text(response).await;
        assert!(body.contains("404"));
        assert!(body.contains("/missing"));
    }

    #[test]
    fn test_http_error_status_is_honored() {
        let catchers = Catchers::with_defaults();
        let error = PortunusError::http(StatusCode::IM_A_TEAPOT, "short and stout");
        let response = catchers.render(&error);
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_override_catcher_for_one_kind() {
        struct Quiet;
        impl Catcher for Quiet {
            fn catch(&self, error: &PortunusError, response: &mut ResponseSink) {
                response.status(error.status_code()).body_text("nothing here");
                response.done();
            }
        }

        let mut catchers = Catchers::with_defaults();
        catchers.set(ErrorKind::NotFound, Arc::new(Quiet));

        let response = catchers.render(&PortunusError::service_not_found("/missing"));
        assert_eq!(body_text(response).await, "nothing here");

        // Other kinds still use the default.
        let response = catchers.render(&PortunusError::internal("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
