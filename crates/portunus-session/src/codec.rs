//! The persistence codec contract and the in-memory backend.
//!
//! A codec stores keyed documents: string key to string-keyed value map,
//! stamped with a created-at timestamp. Mutations on a given key follow a
//! reader/writer lock discipline — concurrent readers share, writers are
//! exclusive, and unrelated keys never serialize against each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SessionResult;

/// A keyed document: a string-keyed value map plus creation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// When this document was created (or last re-stamped by its writer).
    pub created_at: DateTime<Utc>,
    /// The stored values.
    pub values: HashMap<String, String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            values: HashMap::new(),
        }
    }

    /// Returns the document's age relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Returns true if the document is older than `max_age` at `now`.
    #[must_use]
    pub fn is_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) > max_age
    }
}

/// A pluggable keyed-document persistence backend.
///
/// Implementations must serialize mutations per key (writers exclusive,
/// readers shared) and must never let `write` interleave with a concurrent
/// `read` of the same key. `purge` is best-effort: backends without
/// timestamp metadata return [`SessionError::Unsupported`] and callers
/// tolerate that.
///
/// [`SessionError::Unsupported`]: crate::SessionError::Unsupported
pub trait Codec: Send + Sync + 'static {
    /// Creates and stores an empty document under `key`, returning it.
    fn create(&self, key: &str) -> SessionResult<Document>;

    /// Returns the document stored under `key`, or `None`.
    fn read(&self, key: &str) -> SessionResult<Option<Document>>;

    /// Persists `document` under `key`, replacing any previous document.
    fn write(&self, key: &str, document: &Document) -> SessionResult<()>;

    /// Deletes the document under `key`. Removing an absent key is not an
    /// error.
    fn remove(&self, key: &str) -> SessionResult<()>;

    /// Deletes every document older than `max_age`, returning how many were
    /// removed.
    fn purge(&self, max_age: Duration) -> SessionResult<usize>;
}

/// Non-durable in-process backend.
///
/// Documents live for the lifetime of the owning instance — there is no
/// process-wide static store; inject the instance wherever it is needed.
/// Entries are sharded by key with a reader/writer lock per document.
#[derive(Debug, Default)]
pub struct MemoryCodec {
    entries: DashMap<String, Arc<RwLock<Document>>>,
}

impl MemoryCodec {
    /// Creates an empty in-memory codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot(&self, key: &str) -> Option<Arc<RwLock<Document>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }
}

impl Codec for MemoryCodec {
    fn create(&self, key: &str) -> SessionResult<Document> {
        let document = Document::new();
        self.entries
            .insert(key.to_string(), Arc::new(RwLock::new(document.clone())));
        Ok(document)
    }

    fn read(&self, key: &str) -> SessionResult<Option<Document>> {
        Ok(self.slot(key).map(|slot| slot.read().clone()))
    }

    fn write(&self, key: &str, document: &Document) -> SessionResult<()> {
        match self.slot(key) {
            Some(slot) => *slot.write() = document.clone(),
            None => {
                self.entries
                    .insert(key.to_string(), Arc::new(RwLock::new(document.clone())));
            }
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn purge(&self, max_age: Duration) -> SessionResult<usize> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| !slot.read().is_older_than(max_age, now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "purged expired documents");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(key: &str, value: &str) -> Document {
        let mut document = Document::new();
        document.values.insert(key.to_string(), value.to_string());
        document
    }

    fn backdated(age: Duration) -> Document {
        let mut document = Document::new();
        document.created_at = Utc::now() - chrono::Duration::from_std(age).unwrap();
        document
    }

    #[test]
    fn test_create_stores_empty_document() {
        let codec = MemoryCodec::new();
        let created = codec.create("k1").unwrap();
        assert!(created.values.is_empty());
        assert_eq!(codec.read("k1").unwrap(), Some(created));
    }

    #[test]
    fn test_read_absent_key() {
        let codec = MemoryCodec::new();
        assert_eq!(codec.read("missing").unwrap(), None);
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let codec = MemoryCodec::new();
        let document = doc_with("a", "b");
        codec.write("k1", &document).unwrap();
        assert_eq!(codec.read("k1").unwrap(), Some(document));
    }

    #[test]
    fn test_last_write_wins_on_same_key() {
        let codec = MemoryCodec::new();
        codec.write("k1", &doc_with("a", "first")).unwrap();
        codec.write("k1", &doc_with("a", "second")).unwrap();
        let read = codec.read("k1").unwrap().unwrap();
        assert_eq!(read.values.get("a").map(String::as_str), Some("second"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let codec = MemoryCodec::new();
        codec.create("k1").unwrap();
        codec.remove("k1").unwrap();
        codec.remove("k1").unwrap();
        assert_eq!(codec.read("k1").unwrap(), None);
    }

    #[test]
    fn test_purge_removes_only_old_documents() {
        let codec = MemoryCodec::new();
        codec
            .write("old", &backdated(Duration::from_secs(120)))
            .unwrap();
        codec.write("fresh", &Document::new()).unwrap();

        let removed = codec.purge(Duration::from_secs(60)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(codec.read("old").unwrap(), None);
        assert!(codec.read("fresh").unwrap().is_some());
    }

    #[test]
    fn test_concurrent_writers_on_distinct_keys() {
        let codec = Arc::new(MemoryCodec::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let codec = Arc::clone(&codec);
                std::thread::spawn(move || {
                    let key = format!("k{i}");
                    for round in 0..100 {
                        codec
                            .write(&key, &doc_with("round", &round.to_string()))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for i in 0..8 {
            let read = codec.read(&format!("k{i}")).unwrap().unwrap();
            assert_eq!(read.values.get("round").map(String::as_str), Some("99"));
        }
    }

    #[test]
    fn test_concurrent_writers_on_same_key_serialize() {
        let codec = Arc::new(MemoryCodec::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let codec = Arc::clone(&codec);
                std::thread::spawn(move || {
                    codec.write("shared", &doc_with("writer", &i.to_string()))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        // Read-after-write sees the value of some completed write, intact.
        let read = codec.read("shared").unwrap().unwrap();
        let winner: usize = read.values.get("writer").unwrap().parse().unwrap();
        assert!(winner < 4);
    }
}
