//! The session value type.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::codec::Document;
use crate::error::{SessionError, SessionResult};

/// Reserved document keys carrying session metadata alongside attributes.
const META_CREATED_AT: &str = "__created_at";
const META_DURATION_SECS: &str = "__duration_secs";

/// A time-bounded, keyed attribute bag.
///
/// Lifecycle: a freshly created session is *new*; the first successful read
/// through the store marks it active; once `now - last_access` exceeds the
/// duration it is expired (terminal for reads, still removable); explicit
/// removal or a purge sweep is terminal.
///
/// Attribute keys starting with `__` are reserved for metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
    duration: Duration,
    attributes: HashMap<String, String>,
    is_new: bool,
}

impl Session {
    /// Creates a new session with the given id and time-to-live.
    pub fn new(id: impl Into<String>, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            last_access: now,
            duration,
            attributes: HashMap::new(),
            is_new: true,
        }
    }

    /// Returns the session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session was last accessed.
    #[must_use]
    pub fn last_access(&self) -> DateTime<Utc> {
        self.last_access
    }

    /// Returns the session's time-to-live.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns true until the first successful read after creation.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Marks the session active. Called by the store on a successful read.
    pub(crate) fn mark_active(&mut self) {
        self.is_new = false;
    }

    /// Returns the attribute stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Stores an attribute, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.attributes.insert(key.into(), value.into())
    }

    /// Removes an attribute, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    /// Returns the full attribute map.
    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Returns true once the session has outlived its duration.
    ///
    /// A session is expired iff `now - last_access > duration`.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_access)
            .to_std()
            .map_or(false, |age| age > self.duration)
    }

    /// Refreshes the last-access time to now.
    pub fn touch(&mut self) {
        self.last_access = Utc::now();
    }

    #[cfg(test)]
    pub(crate) fn backdate_last_access(&mut self, age: Duration) {
        self.last_access = Utc::now() - chrono::Duration::from_std(age).unwrap();
    }

    /// Serializes the session into a codec document.
    ///
    /// The document is stamped with the last-access time, so a codec-level
    /// purge at the session duration removes exactly the expired sessions.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut values = self.attributes.clone();
        values.insert(META_CREATED_AT.to_string(), self.created_at.to_rfc3339());
        values.insert(
            META_DURATION_SECS.to_string(),
            self.duration.as_secs().to_string(),
        );
        Document {
            created_at: self.last_access,
            values,
        }
    }

    /// Deserializes a session from a codec document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the metadata keys are missing
    /// or malformed.
    pub fn from_document(id: impl Into<String>, document: &Document) -> SessionResult<Self> {
        let created_at = document
            .values
            .get(META_CREATED_AT)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| SessionError::storage("document is missing a creation stamp"))?;
        let duration = document
            .values
            .get(META_DURATION_SECS)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .ok_or_else(|| SessionError::storage("document is missing a duration"))?;

        let attributes = document
            .values
            .iter()
            .filter(|(key, _)| !key.starts_with("__"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            id: id.into(),
            created_at,
            last_access: document.created_at,
            duration,
            attributes,
            is_new: false,
        })
    }
}
