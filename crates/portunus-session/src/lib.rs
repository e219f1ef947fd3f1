//! # Portunus Session
//!
//! Session lifecycle and pluggable persistence codecs.
//!
//! A [`Codec`] stores keyed documents behind a per-key reader/writer lock
//! discipline; a [`SessionStore`] layers time-bounded [`Session`]s over any
//! codec, with a bounded read cache and a background expiry sweep driven by
//! the executor.
//!
//! Backends:
//!
//! - [`MemoryCodec`] - in-process, non-durable
//! - [`FileCodec`] - one JSON file per key
//! - [`TableCodec`] - embedded redb table, durable

#![doc(html_root_url = "https://docs.rs/portunus-session/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod codec;
mod error;
mod file;
mod session;
mod store;
mod table;

pub use codec::{Codec, Document, MemoryCodec};
pub use error::{SessionError, SessionResult};
pub use file::FileCodec;
pub use session::Session;
pub use store::{SessionConfig, SessionStore};
pub use table::TableCodec;
