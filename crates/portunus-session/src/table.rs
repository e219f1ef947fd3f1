//! Embedded-table codec backend.
//!
//! Documents live as rows in a single redb table keyed by the document key,
//! with the JSON envelope (created-at plus values) as the row value. redb
//! gives single-writer/multi-reader transactions, which satisfies the codec
//! locking discipline at the storage layer; purge is a table scan over the
//! created-at stamps.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::codec::{Codec, Document};
use crate::error::{SessionError, SessionResult};

const DOCUMENTS: TableDefinition<&str, Vec<u8>> = TableDefinition::new("portunus_documents");

/// Durable keyed-document backend on a single redb file.
pub struct TableCodec {
    db: Database,
}

impl std::fmt::Debug for TableCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCodec").finish_non_exhaustive()
    }
}

impl TableCodec {
    /// Opens (creating if needed) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the database cannot be opened
    /// or the table cannot be created.
    pub fn open(path: impl AsRef<Path>) -> SessionResult<Self> {
        let db = Database::create(path).map_err(SessionError::storage)?;
        // Ensure the table exists so later reads never race its creation.
        let tx = db.begin_write().map_err(SessionError::storage)?;
        tx.open_table(DOCUMENTS).map_err(SessionError::storage)?;
        tx.commit().map_err(SessionError::storage)?;
        Ok(Self { db })
    }
}

impl Codec for TableCodec {
    fn create(&self, key: &str) -> SessionResult<Document> {
        let document = Document::new();
        self.write(key, &document)?;
        Ok(document)
    }

    fn read(&self, key: &str) -> SessionResult<Option<Document>> {
        let tx = self.db.begin_read().map_err(SessionError::storage)?;
        let table = tx.open_table(DOCUMENTS).map_err(SessionError::storage)?;
        let row = table.get(key).map_err(SessionError::storage)?;
        match row {
            Some(guard) => Ok(Some(serde_json::from_slice(&guard.value())?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, document: &Document) -> SessionResult<()> {
        let bytes = serde_json::to_vec(document)?;
        let tx = self.db.begin_write().map_err(SessionError::storage)?;
        {
            let mut table = tx.open_table(DOCUMENTS).map_err(SessionError::storage)?;
            table.insert(key, bytes).map_err(SessionError::storage)?;
        }
        tx.commit().map_err(SessionError::storage)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let tx = self.db.begin_write().map_err(SessionError::storage)?;
        {
            let mut table = tx.open_table(DOCUMENTS).map_err(SessionError::storage)?;
            table.remove(key).map_err(SessionError::storage)?;
        }
        tx.commit().map_err(SessionError::storage)?;
        Ok(())
    }

    fn purge(&self, max_age: Duration) -> SessionResult<usize> {
        let now = Utc::now();
        let tx = self.db.begin_write().map_err(SessionError::storage)?;
        let removed;
        {
            let mut table = tx.open_table(DOCUMENTS).map_err(SessionError::storage)?;
            let mut expired = Vec::new();
            for item in table.iter().map_err(SessionError::storage)? {
                let (key, value) = item.map_err(SessionError::storage)?;
                let document: Document = serde_json::from_slice(&value.value())?;
                if document.is_older_than(max_age, now) {
                    expired.push(key.value().to_string());
                }
            }
            removed = expired.len();
            for key in expired {
                table
                    .remove(key.as_str())
                    .map_err(SessionError::storage)?;
            }
        }
        tx.commit().map_err(SessionError::storage)?;
        if removed > 0 {
            debug!(removed, "purged expired documents");
        }
        Ok(removed)
    }
}
