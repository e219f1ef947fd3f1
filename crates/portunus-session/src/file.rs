//! Filesystem-per-key codec backend.
//!
//! Each document is one JSON file under the configured root directory,
//! named `<key>.json`. Per-key reader/writer locks preserve the codec
//! locking discipline across concurrent in-process callers; the files
//! themselves carry the created-at stamp inside the JSON envelope, so purge
//! works without relying on filesystem metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::codec::{Codec, Document};
use crate::error::{SessionError, SessionResult};

/// Keys are used as file stems; restrict them to a portable character set.
fn validate_key(key: &str) -> SessionResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid && !key.starts_with('.') {
        Ok(())
    } else {
        Err(SessionError::InvalidKey(key.to_string()))
    }
}

/// One-JSON-file-per-key persistence backend.
#[derive(Debug)]
pub struct FileCodec {
    root: PathBuf,
    locks: DashMap<String, Arc<RwLock<()>>>,
}

impl FileCodec {
    /// Opens (creating if needed) a file codec rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the root directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> SessionResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    /// Returns the root directory documents are stored under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> SessionResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }

    fn lock_for(&self, key: &str) -> Arc<RwLock<()>> {
        Arc::clone(
            self.locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(())))
                .value(),
        )
    }

    fn read_file(path: &Path) -> SessionResult<Option<Document>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl Codec for FileCodec {
    fn create(&self, key: &str) -> SessionResult<Document> {
        let document = Document::new();
        self.write(key, &document)?;
        Ok(document)
    }

    fn read(&self, key: &str) -> SessionResult<Option<Document>> {
        let path = self.path_for(key)?;
        let lock = self.lock_for(key);
        let _guard = lock.read();
        Self::read_file(&path)
    }

    fn write(&self, key: &str, document: &Document) -> SessionResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock_for(key);
        let _guard = lock.write();
        let bytes = serde_json::to_vec_pretty(document)?;
        std::fs::write(&path, bytes)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock_for(key);
        let _guard = lock.write();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn purge(&self, max_age: Duration) -> SessionResult<usize> {
        let now = Utc::now();
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let Some(key) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
                .map(ToString::to_string)
            else {
                continue;
            };

            let lock = self.lock_for(&key);
            let _guard = lock.write();
            let expired = match Self::read_file(&path)? {
                Some(document) => document.is_older_than(max_age, now),
                None => continue,
            };
            if expired {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => warn!(key, error = %err, "failed to purge document"),
                }
            }
        }
        if removed > 0 {
            debug!(removed, root = %self.root.display(), "purged expired documents");
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

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let codec = FileCodec::open(dir.path()).unwrap();
        codec.write("k1", &doc_with("a", "b")).unwrap();
        let read = codec.read("k1").unwrap().unwrap();
        assert_eq!(read.values.get("a").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_read_absent_key() {
        let dir = tempfile::tempdir().unwrap();
        let codec = FileCodec::open(dir.path()).unwrap();
        assert_eq!(codec.read("missing").unwrap(), None);
    }

    #[test]
    fn test_create_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let codec = FileCodec::open(dir.path()).unwrap();
        codec.create("k1").unwrap();
        assert!(codec.read("k1").unwrap().is_some());
        codec.remove("k1").unwrap();
        codec.remove("k1").unwrap();
        assert_eq!(codec.read("k1").unwrap(), None);
    }

    #[test]
    fn test_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let codec = FileCodec::open(dir.path()).unwrap();
        assert!(matches!(
            codec.read("../escape"),
            Err(SessionError::InvalidKey(_))
        ));
        assert!(matches!(
            codec.write("a/b", &Document::new()),
            Err(SessionError::InvalidKey(_))
        ));
        assert!(matches!(codec.read(""), Err(SessionError::InvalidKey(_))));
    }

    #[test]
    fn test_purge_removes_only_old_documents() {
        let dir = tempfile::tempdir().unwrap();
        let codec = FileCodec::open(dir.path()).unwrap();

        let mut old = doc_with("a", "b");
        old.created_at = Utc::now() - chrono::Duration::seconds(120);
        codec.write("old", &old).unwrap();
        codec.write("fresh", &doc_with("a", "b")).unwrap();

        let removed = codec.purge(Duration::from_secs(60)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(codec.read("old").unwrap(), None);
        assert!(codec.read("fresh").unwrap().is_some());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let codec = FileCodec::open(dir.path()).unwrap();
            codec.write("k1", &doc_with("a", "b")).unwrap();
        }
        let codec = FileCodec::open(dir.path()).unwrap();
        assert!(codec.read("k1").unwrap().is_some());
    }
}
