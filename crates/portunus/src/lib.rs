//! # Portunus
//!
//! **Virtual-host request routing and service dispatch engine**
//!
//! Portunus maps an inbound request (host, path, method) to one or more
//! ordered handlers and drives the chain to a finalized response:
//!
//! - **Domains** – named virtual hosts bound to one network address
//! - **Services** – path/method-scoped handler chains with typed parameter
//!   schemas, composable through introspectable decorators
//! - **Security domains** – realm-scoped gates run ahead of a service
//! - **Sessions** – time-bounded attribute bags over pluggable persistence
//!   codecs (in-memory, filesystem, embedded table)
//! - **Executor** – bounded worker pool with explicit admission control
//!
//! Transport, TLS, and wire codecs are external collaborators: the engine
//! consumes an already-parsed request plus the local address it arrived
//! on, and hands back a finalized response.
//!
//! ## Quick Start
//!
//! ```rust
//! use portunus::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let address = "127.0.0.1:8080".parse().unwrap();
//! let router = Router::builder()
//!     .domain(
//!         Domain::builder(address)
//!             .name("example.com")
//!             .service(
//!                 Service::builder()
//!                     .path("/greet/{name}")
//!                     .handler(handler_fn("greet", |ctx, _request| {
//!                         Box::pin(async move {
//!                             let name = ctx.param("name").unwrap_or("world").to_string();
//!                             ctx.response_mut().body_text(&format!("hello, {name}"));
//!                             Ok(Flow::Done)
//!                         })
//!                     }))
//!                     .build()
//!                     .unwrap(),
//!             )
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let request = http::Request::builder()
//!     .uri("/greet/port")
//!     .header(http::header::HOST, "example.com")
//!     .body(http_body_util::Full::default())
//!     .unwrap();
//! let response = router.handle(&request, address).await;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request ──► Router ──► Domain (host) ──► Service (path, method)
//!                │
//!                ▼
//!   validator ► security gates ► service handlers ► finalize
//!                │ (any failure)
//!                ▼
//!          error catchers ──► textual status response
//! ```

#![doc(html_root_url = "https://docs.rs/portunus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use portunus_core as core;

// Re-export router types
pub use portunus_router as router;

// Re-export executor types
pub use portunus_executor as executor;

// Re-export session types
pub use portunus_session as session;

pub mod logging;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use portunus::prelude::*;
/// ```
pub mod prelude {
    pub use portunus_core::{
        request_host, AbortHandle, Attributes, ErrorKind, PortunusError, PortunusResult,
        Request, RequestId, Response, ResponseExt, ResponseSink,
    };

    pub use portunus_core::cookie::{Cookie, SameSite};

    pub use portunus_router::{
        handler_fn, BoxFuture, Catcher, DecoratingService, DefaultCatcher, Domain, Flow,
        Handler, HttpRequestValidator, ParamDef, ParamKind, ParamSource, Params, PathSpec,
        Router, RouterContext, SecurityDomain, Service, ServiceUnit,
    };

    pub use portunus_executor::{
        Executor, ExecutorConfig, QueuePolicy, ShutdownReport, ShutdownSignal, TaskId,
    };

    pub use portunus_session::{
        Codec, Document, FileCodec, MemoryCodec, Session, SessionConfig, SessionStore,
        TableCodec,
    };

    pub use crate::logging::{init_logging, LogConfig};
}
