//! Request and response types used throughout the engine.
//!
//! Portunus does not implement wire parsing; the transport collaborator
//! hands the router an already-parsed [`Request`] and receives a finalized
//! [`Response`] back.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type consumed by the router.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by the router.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building plain responses.
pub trait ResponseExt {
    /// Creates a textual error response with the given status code.
    fn error(status: http::StatusCode, message: &str) -> Response;

    /// Creates an empty response with the given status code.
    fn empty(status: http::StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn error(status: http::StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build error response")
    }

    fn empty(status: http::StatusCode) -> Response {
        http::Response::builder()
            .status(status)
            .body(Full::default())
            .expect("failed to build empty response")
    }
}

/// Returns the request host, without any port suffix, lowercased.
///
/// Prefers the URI authority (HTTP/2 style) and falls back to the `Host`
/// header. Returns `None` when neither is present or the header is not
/// valid UTF-8.
#[must_use]
pub fn request_host(request: &Request) -> Option<String> {
    let raw = request
        .uri()
        .authority()
        .map(|a| a.host().to_string())
        .or_else(|| {
            request
                .headers()
                .get(http::header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        })?;

    let host = raw.rsplit_once(':').map_or(raw.as_str(), |(h, port)| {
        // Only strip a real port suffix; IPv6 literals contain colons too.
        if port.chars().all(|c| c.is_ascii_digit()) {
            h
        } else {
            raw.as_str()
        }
    });

    Some(host.trim_end_matches('.').to_ascii_lowercase())
}
