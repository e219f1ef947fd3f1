//! # Portunus Core
//!
//! Core types and errors for the Portunus routing engine.
//!
//! This crate provides the foundational types used throughout Portunus:
//!
//! - [`PortunusError`] / [`ErrorKind`] - the standard error taxonomy
//! - [`Request`] / [`Response`] - the parsed-request and response types
//!   exchanged with the transport collaborator
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Attributes`] - string-keyed typed attribute bag for cross-handler
//!   communication
//! - [`ResponseSink`] - the in-flight response builder
//! - [`AbortHandle`] - transport-driven request cancellation
//! - [`cookie::Cookie`] - the cookie value model

#![doc(html_root_url = "https://docs.rs/portunus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod cookie;
mod error;
mod types;

pub use context::{AbortHandle, Attributes, RequestId, ResponseSink};
pub use error::{ErrorKind, PortunusError, PortunusResult};
pub use types::{request_host, Request, Response, ResponseExt};
