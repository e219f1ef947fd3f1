//! Per-request context primitives.
//!
//! These types are transport-agnostic building blocks assembled by the
//! router into its per-request context: a time-ordered [`RequestId`], the
//! [`Attributes`] bag handlers use to pass state to each other, the
//! [`ResponseSink`] that accumulates the in-flight response, and the
//! [`AbortHandle`] the transport uses to signal a dropped request.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

use crate::types::Response;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string-keyed bag of typed values threaded through the handler chain.
///
/// Handlers, security gates, and application modules publish state here
/// without the router knowing their types. Values are retrieved by key and
/// concrete type; a type mismatch behaves like an absent key.
///
/// # Example
///
/// ```
/// use portunus_core::Attributes;
///
/// let mut attrs = Attributes::new();
/// attrs.insert("user.name", "alice".to_string());
/// attrs.insert("user.visits", 7_u32);
///
/// assert_eq!(attrs.get::<String>("user.name").map(String::as_str), Some("alice"));
/// assert_eq!(attrs.get::<u32>("user.visits"), Some(&7));
/// assert_eq!(attrs.get::<u32>("user.name"), None);
/// ```
#[derive(Debug, Default)]
pub struct Attributes {
    inner: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Attributes {
    /// Creates an empty attribute bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under the given key, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.inner.insert(key.into(), Box::new(value));
    }

    /// Returns the value stored under `key`, if present and of type `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.inner.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Returns a mutable reference to the value under `key`, if present and
    /// of type `T`.
    pub fn get_mut<T: Any + Send + Sync>(&mut self, key: &str) -> Option<&mut T> {
        self.inner.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Removes and returns the value under `key`, if present and of type `T`.
    pub fn remove<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
        let value = self.inner.remove(key)?;
        match value.downcast::<T>() {
            Ok(boxed) => Some(*boxed),
            Err(original) => {
                // Wrong type requested: put the value back untouched.
                self.inner.insert(key.to_string(), original);
                None
            }
        }
    }

    /// Returns true if a value of any type is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns the number of stored attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// The in-flight response under construction.
///
/// Handlers set status, headers, and body through this sink; calling
/// [`ResponseSink::done`] finalizes it. Once finalized, further mutations
/// are ignored and the dispatch chain stops at the next checkpoint.
#[derive(Debug)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    done: bool,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink {
    /// Creates an empty sink with status 200.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            done: false,
        }
    }

    /// Sets the response status. Ignored after [`ResponseSink::done`].
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if !self.done {
            self.status = status;
        }
        self
    }

    /// Returns the current status.
    #[must_use]
    pub fn current_status(&self) -> StatusCode {
        self.status
    }

    /// Appends a response header. Invalid names or values are dropped with
    /// a warning rather than failing the request.
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        if self.done {
            return self;
        }
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.to_string()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                tracing::warn!(header = name, "dropping invalid response header");
            }
        }
        self
    }

    /// Replaces the response body with the given text and sets a plain-text
    /// content type if none was set.
    pub fn body_text(&mut self, text: &str) -> &mut Self {
        if self.done {
            return self;
        }
        if !self.headers.contains_key(http::header::CONTENT_TYPE) {
            self.headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        self.body = text.as_bytes().to_vec();
        self
    }

    /// Replaces the response body with raw bytes.
    pub fn body_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
        if !self.done {
            self.body = bytes.into();
        }
        self
    }

    /// Appends bytes to the response body.
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        if !self.done {
            self.body.extend_from_slice(bytes);
        }
        self
    }

    /// Finalizes the response. Idempotent; later mutations are ignored.
    pub fn done(&mut self) {
        self.done = true;
    }

    /// Returns true once the response has been finalized.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consumes the sink and produces the response to hand back to the
    /// transport collaborator.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Transport-facing abort signal for an in-flight request.
///
/// When the transport collaborator learns the request was aborted (the
/// connection dropped, the client went away), it calls
/// [`AbortHandle::abort`]; the dispatch chain observes the flag at handler
/// boundaries and stops there rather than at arbitrary points.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Creates a fresh, un-aborted handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the request as aborted. Idempotent.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Returns true once the request has been aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}
