//! The session store: session lifecycle over any codec backend.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, warn};

use portunus_core::PortunusResult;
use portunus_executor::{Executor, ShutdownSignal, TaskId};

use crate::codec::Codec;
use crate::error::{SessionError, SessionResult};
use crate::session::Session;

/// Session store configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Time-to-live applied to every session.
    pub duration: Duration,
    /// Maximum number of sessions held in the in-process read cache.
    pub cache_size: usize,
    /// How often the background sweep purges expired sessions.
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30 * 60),
            cache_size: 1024,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session time-to-live.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the read-cache capacity.
    #[must_use]
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size.max(1);
        self
    }

    /// Sets the sweep interval.
    #[must_use]
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }
}

/// Session lifecycle layered over a [`Codec`].
///
/// The store owns its sessions between creation and removal or expiry:
/// `read` refuses expired sessions, a bounded LRU cache fronts the codec,
/// and an optional background sweep reclaims expired entries. The codec is
/// an injected value — the store takes no position on where documents live.
///
/// # Example
///
/// ```
/// use portunus_session::{MemoryCodec, SessionConfig, SessionStore};
/// use std::sync::Arc;
///
/// let store = SessionStore::new(Arc::new(MemoryCodec::new()), SessionConfig::default());
///
/// let mut session = store.create("k1").unwrap();
/// session.set("a", "b");
/// store.write(&session).unwrap();
///
/// let read = store.read("k1").unwrap().unwrap();
/// assert_eq!(read.get("a"), Some("b"));
/// ```
pub struct SessionStore {
    codec: Arc<dyn Codec>,
    config: SessionConfig,
    cache: Mutex<LruCache<String, Session>>,
    stop: ShutdownSignal,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a store over the given codec.
    #[must_use]
    pub fn new(codec: Arc<dyn Codec>, config: SessionConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            codec,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
            stop: ShutdownSignal::new(),
        }
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Allocates a fresh session under `id`, marked new, and persists it.
    ///
    /// # Errors
    ///
    /// Fails if the codec cannot persist the session.
    pub fn create(&self, id: impl Into<String>) -> SessionResult<Session> {
        let id = id.into();
        let session = Session::new(id.clone(), self.config.duration);
        self.codec.create(&id)?;
        self.codec.write(&id, &session.to_document())?;
        self.cache.lock().put(id, session.clone());
        Ok(session)
    }

    /// Returns the session under `id`, or `None` if absent or expired.
    ///
    /// A successful read marks the session active, refreshes its
    /// last-access time, and writes the refreshed state back through the
    /// codec (sliding expiry).
    pub fn read(&self, id: &str) -> SessionResult<Option<Session>> {
        let cached = self.cache.lock().get(id).cloned();
        let mut session = match cached {
            Some(session) => session,
            None => match self.codec.read(id)? {
                Some(document) => Session::from_document(id, &document)?,
                None => return Ok(None),
            },
        };

        if session.is_expired() {
            self.cache.lock().pop(id);
            return Ok(None);
        }

        session.mark_active();
        session.touch();
        self.codec.write(id, &session.to_document())?;
        self.cache.lock().put(id.to_string(), session.clone());
        Ok(Some(session))
    }

    /// Persists the session's full attribute map.
    pub fn write(&self, session: &Session) -> SessionResult<()> {
        self.codec.write(session.id(), &session.to_document())?;
        self.cache
            .lock()
            .put(session.id().to_string(), session.clone());
        Ok(())
    }

    /// Removes the session under `id`. Terminal.
    pub fn remove(&self, id: &str) -> SessionResult<()> {
        self.cache.lock().pop(id);
        self.codec.remove(id)
    }

    /// Purges expired sessions from the codec and the read cache.
    ///
    /// Backends without timestamp metadata report purge as unsupported;
    /// that is treated as a no-op here, per the best-effort contract.
    pub fn purge_expired(&self) -> SessionResult<usize> {
        {
            let mut cache = self.cache.lock();
            let expired: Vec<String> = cache
                .iter()
                .filter(|(_, session)| session.is_expired())
                .map(|(id, _)| id.clone())
                .collect();
            for id in expired {
                cache.pop(&id);
            }
        }

        match self.codec.purge(self.config.duration) {
            Ok(removed) => Ok(removed),
            Err(SessionError::Unsupported(what)) => {
                debug!(what, "codec does not support purge, skipping sweep");
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    /// Starts the background expiry sweep on the given executor.
    ///
    /// The sweep runs until [`SessionStore::close`] is called (or the store
    /// is dropped), then stops deterministically.
    ///
    /// # Errors
    ///
    /// Returns [`portunus_core::PortunusError::Rejected`] if the executor
    /// refuses the task.
    pub async fn start_sweeper(self: &Arc<Self>, executor: &Executor) -> PortunusResult<TaskId> {
        // A weak handle: the sweeper must never keep a closed store alive.
        let store = Arc::downgrade(self);
        let stop = self.stop.clone();
        let sweep_interval = self.config.sweep_interval;
        executor
            .execute(async move {
                let mut interval = tokio::time::interval(sweep_interval);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                // The first tick completes immediately; skip it.
                interval.tick().await;
                loop {
                    tokio::select! {
                        () = stop.recv() => break,
                        _ = interval.tick() => {
                            let Some(store) = store.upgrade() else { break };
                            match store.purge_expired() {
                                Ok(0) => {}
                                Ok(removed) => debug!(removed, "session sweep reclaimed sessions"),
                                Err(err) => warn!(error = %err, "session sweep failed"),
                            }
                        },
                    }
                }
                debug!("session sweeper stopped");
            })
            .await
    }

    /// Stops the background sweep. Idempotent.
    pub fn close(&self) {
        self.stop.trigger();
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.stop.trigger();
    }
}
