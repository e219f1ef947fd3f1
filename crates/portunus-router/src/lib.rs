//! # Portunus Router
//!
//! Virtual-host routing and service dispatch.
//!
//! A [`Router`] owns a set of [`Domain`]s (named virtual hosts bound to one
//! network address each), every domain owns ordered [`Service`]s, and every
//! service owns an ordered handler chain behind an optional
//! [`SecurityDomain`] gate. On each inbound request the router selects a
//! domain by host, a service by path template and method, binds parameters,
//! and drives the chain: validator, security gates, service handlers,
//! finalization — with routing and handler failures resolved through
//! per-category error [`Catcher`]s.
//!
//! Services compose through decoration: wrap any [`ServiceUnit`] to
//! intercept `serve` while the read-only accessors forward to the
//! delegate, and unwrap back to any ancestor with
//! [`ServiceUnit::delegate`] or `find_as`.

#![doc(html_root_url = "https://docs.rs/portunus-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catchers;
mod context;
mod domain;
mod handler;
mod params;
mod path;
mod router;
mod security;
mod service;
mod validator;

pub use catchers::{Catcher, DefaultCatcher};
pub use context::RouterContext;
pub use domain::{Domain, DomainBuilder};
pub use handler::{handler_fn, BoxFuture, Flow, FnHandler, Handler};
pub use params::{ParamDef, ParamKind, ParamSource, Params};
pub use path::PathSpec;
pub use router::{Router, RouterBuilder};
pub use security::SecurityDomain;
pub use service::{DecoratingService, Service, ServiceBuilder, ServiceUnit};
pub use validator::HttpRequestValidator;
