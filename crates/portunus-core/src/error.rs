//! Error types for Portunus.
//!
//! This module provides the [`PortunusError`] type, the standard error type
//! used throughout the Portunus routing engine, together with the
//! [`ErrorKind`] classification used to select error catchers.
//!
//! Routing-phase errors (`DomainNotFound`, `ServiceNotFound`,
//! `MethodNotAllowed`, `ParameterValidation`) are produced before any
//! handler runs and resolve directly to a catcher. Handler-phase errors are
//! caught at the dispatch boundary; an explicit [`PortunusError::Http`]
//! carries its own status code and is honored as-is.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`PortunusError`].
pub type PortunusResult<T> = Result<T, PortunusError>;

/// Categories of errors used to select an error catcher.
///
/// Every [`PortunusError`] maps onto exactly one kind; the router holds one
/// catcher per kind, with the internal-error catcher as the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request input (parameter violations and the like).
    BadRequest,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated but not permitted.
    Forbidden,
    /// No domain or service matches the request.
    NotFound,
    /// A service matches the path but not the method.
    MethodNotAllowed,
    /// An `Expect` header carried an unsupported expectation.
    ExpectationFailed,
    /// The executor refused the work (admission control).
    Overloaded,
    /// Everything else: persistence failures, handler panics, bugs.
    Internal,
}

impl ErrorKind {
    /// Returns the default HTTP status code for this error kind.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::ExpectationFailed => StatusCode::EXPECTATION_FAILED,
            Self::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// All kinds, in catcher-registration order.
    #[must_use]
    pub const fn all() -> [Self; 8] {
        [
            Self::BadRequest,
            Self::Unauthorized,
            Self::Forbidden,
            Self::NotFound,
            Self::MethodNotAllowed,
            Self::ExpectationFailed,
            Self::Overloaded,
            Self::Internal,
        ]
    }
}

/// Standard error type for Portunus.
///
/// # Example
///
/// ```
/// use portunus_core::{PortunusError, PortunusResult};
///
/// fn lookup(host: &str) -> PortunusResult<()> {
///     Err(PortunusError::domain_not_found(host))
/// }
///
/// let err = lookup("unknown.example").unwrap_err();
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Error, Debug)]
pub enum PortunusError {
    /// Invalid router, domain, or service configuration. Fatal at build time.
    #[error("configuration error: {message}")]
    Configuration {
        /// What was misconfigured.
        message: String,
    },

    /// No registered domain matches the request's host and address.
    #[error("no domain matches host {host:?}")]
    DomainNotFound {
        /// The unmatched host value.
        host: String,
    },

    /// No service in the resolved domain matches the request path.
    #[error("no service matches path {path:?}")]
    ServiceNotFound {
        /// The unmatched path.
        path: String,
    },

    /// A service matches the path, but none accepts the request method.
    #[error("method {method} not allowed for {path:?}")]
    MethodNotAllowed {
        /// The rejected method.
        method: String,
        /// The matched path.
        path: String,
    },

    /// A path or query value violated a parameter definition.
    #[error("invalid parameter {name:?}: {message}")]
    ParameterValidation {
        /// Name of the offending parameter.
        name: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The request carried an `Expect` header with an unsupported value.
    #[error("unknown expectation {value:?}")]
    UnknownExpect {
        /// The unsupported expectation value.
        value: String,
    },

    /// The executor refused the submission (queue full or shutting down).
    #[error("execution rejected: {message}")]
    Rejected {
        /// Why admission was refused.
        message: String,
    },

    /// A persistence backend failed.
    #[error("persistence error: {message}")]
    Persistence {
        /// Human-readable failure description.
        message: String,
        /// The underlying failure, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An uncaught handler failure.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable failure description.
        message: String,
    },

    /// An explicit HTTP error carrying its own status code.
    ///
    /// Handlers raise this to short-circuit with a specific status; dispatch
    /// honors the status as-is instead of mapping to the internal catcher.
    #[error("http {status}: {message}")]
    Http {
        /// The status code to respond with.
        status: StatusCode,
        /// The textual body for the client.
        message: String,
    },
}

impl PortunusError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a domain-not-found error.
    pub fn domain_not_found(host: impl Into<String>) -> Self {
        Self::DomainNotFound { host: host.into() }
    }

    /// Creates a service-not-found error.
    pub fn service_not_found(path: impl Into<String>) -> Self {
        Self::ServiceNotFound { path: path.into() }
    }

    /// Creates a method-not-allowed error.
    pub fn method_not_allowed(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Creates a parameter-validation error for the named parameter.
    pub fn parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParameterValidation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown-expectation error.
    pub fn unknown_expect(value: impl Into<String>) -> Self {
        Self::UnknownExpect {
            value: value.into(),
        }
    }

    /// Creates a rejected-execution error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates a persistence error without an underlying cause.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a persistence error wrapping an underlying cause.
    pub fn persistence_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an explicit HTTP error with the given status.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Returns the catcher kind for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParameterValidation { .. } => ErrorKind::BadRequest,
            Self::DomainNotFound { .. } | Self::ServiceNotFound { .. } => ErrorKind::NotFound,
            Self::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            Self::UnknownExpect { .. } => ErrorKind::ExpectationFailed,
            Self::Rejected { .. } => ErrorKind::Overloaded,
            Self::Http { status, .. } => match status.as_u16() {
                400 => ErrorKind::BadRequest,
                401 => ErrorKind::Unauthorized,
                403 => ErrorKind::Forbidden,
                404 => ErrorKind::NotFound,
                405 => ErrorKind::MethodNotAllowed,
                417 => ErrorKind::ExpectationFailed,
                503 => ErrorKind::Overloaded,
                _ => ErrorKind::Internal,
            },
            Self::Configuration { .. } | Self::Persistence { .. } | Self::Internal { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// [`PortunusError::Http`] returns its explicit status; every other
    /// variant maps through its [`ErrorKind`].
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            other => other.kind().status_code(),
        }
    }
}
