//! Persistence boundary: named drawings and the auto-saved current state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The scene store treats persistence as an external collaborator reached
//! through the [`Repository`] trait. The bundled implementation,
//! [`KvRepository`], keeps every drawing as one JSON array under a single
//! key of a [`KeyValueBackend`] and the auto-saved scene under a second key.
//! In the browser the backend is `localStorage` (see [`crate::storage`]);
//! tests and native hosts use [`MemoryBackend`].
//!
//! Every failure is returned as a [`PersistError`]. Callers inside the crate
//! log it and carry on: an unavailable store never costs the in-memory scene.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Point;
use crate::object::{DrawingObject, ObjectKind};
use crate::settings::DrawingSettings;

/// Identifier of a named drawing.
pub type DrawingId = Uuid;

/// Wire value used for drawings saved without a signed-in user.
const ANONYMOUS: &str = "anonymous";

// =============================================================
// Errors
// =============================================================

/// Failure at the persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("drawing not found: {0}")]
    NotFound(DrawingId),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

// =============================================================
// Records
// =============================================================

/// Who a drawing belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Owner {
    /// No identity available.
    #[default]
    Anonymous,
    /// A signed-in user, by identifier.
    User(String),
}

impl From<String> for Owner {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ANONYMOUS { Self::Anonymous } else { Self::User(value) }
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        match owner {
            Owner::Anonymous => ANONYMOUS.to_owned(),
            Owner::User(id) => id,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str(ANONYMOUS),
            Self::User(id) => f.write_str(id),
        }
    }
}

/// A named drawing as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRecord {
    pub id: DrawingId,
    pub title: String,
    pub lines: Vec<DrawingObject>,
    pub settings: DrawingSettings,
    #[serde(rename = "userId", default)]
    pub owner: Owner,
    /// Milliseconds since the Unix epoch.
    pub created_at: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
}

impl DrawingRecord {
    /// Last modification time, falling back to creation time.
    #[must_use]
    pub fn last_modified(&self) -> f64 {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// The auto-saved working scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentState {
    pub lines: Vec<DrawingObject>,
    pub settings: DrawingSettings,
    pub timestamp: f64,
}

/// Arguments to [`Repository::save`].
#[derive(Debug, Clone)]
pub struct SaveRequest {
    /// Existing drawing to overwrite; `None` creates a new one.
    pub id: Option<DrawingId>,
    pub title: String,
    pub lines: Vec<DrawingObject>,
    pub settings: DrawingSettings,
    pub owner: Owner,
    /// Save time in milliseconds since the Unix epoch.
    pub now: f64,
}

// =============================================================
// Traits
// =============================================================

/// Record store for named drawings plus the auto-save slot.
pub trait Repository {
    /// Insert or overwrite a drawing. Returns its id.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the backend cannot be read or written.
    fn save(&mut self, request: SaveRequest) -> Result<DrawingId, PersistError>;

    /// # Errors
    ///
    /// Returns `PersistError::NotFound` for an unknown id.
    fn load(&self, id: DrawingId) -> Result<DrawingRecord, PersistError>;

    /// Drawings owned by `owner`, most recently modified first.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the backend cannot be read.
    fn list_by_owner(&self, owner: &Owner) -> Result<Vec<DrawingRecord>, PersistError>;

    /// Remove a drawing. `Ok(false)` when no drawing had that id.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the backend cannot be read or written.
    fn delete(&mut self, id: DrawingId) -> Result<bool, PersistError>;

    /// Number of stored drawings across all owners.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the backend cannot be read.
    fn count(&self) -> Result<usize, PersistError>;

    /// # Errors
    ///
    /// Returns `PersistError` if the state cannot be written.
    fn save_current(&mut self, state: &CurrentState) -> Result<(), PersistError>;

    /// # Errors
    ///
    /// Returns `PersistError` if the slot exists but cannot be read or parsed.
    fn load_current(&self) -> Result<Option<CurrentState>, PersistError>;

    /// # Errors
    ///
    /// Returns `PersistError` if the slot cannot be removed.
    fn clear_current(&mut self) -> Result<(), PersistError>;
}

/// String key-value storage, shaped after the browser `Storage` interface.
pub trait KeyValueBackend {
    /// # Errors
    ///
    /// Returns `PersistError::Backend` if the store is unavailable.
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// # Errors
    ///
    /// Returns `PersistError::Backend` if the store is unavailable or full.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;

    /// # Errors
    ///
    /// Returns `PersistError::Backend` if the store is unavailable.
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

// =============================================================
// In-memory backend
// =============================================================

/// Process-local backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

// =============================================================
// Key-value repository
// =============================================================

/// [`Repository`] over any [`KeyValueBackend`].
///
/// Keys are `{prefix}_drawings` (JSON array of [`DrawingRecord`]) and
/// `{prefix}_current_drawing` (one [`CurrentState`]).
#[derive(Debug, Clone)]
pub struct KvRepository<B> {
    backend: B,
    drawings_key: String,
    current_key: String,
}

impl<B: KeyValueBackend> KvRepository<B> {
    #[must_use]
    pub fn new(backend: B, prefix: &str) -> Self {
        Self {
            backend,
            drawings_key: format!("{prefix}_drawings"),
            current_key: format!("{prefix}_current_drawing"),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn read_all(&self) -> Result<Vec<DrawingRecord>, PersistError> {
        match self.backend.get(&self.drawings_key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_all(&mut self, records: &[DrawingRecord]) -> Result<(), PersistError> {
        let raw = serde_json::to_string(records)?;
        self.backend.set(&self.drawings_key, &raw)
    }
}

impl<B: KeyValueBackend> Repository for KvRepository<B> {
    fn save(&mut self, request: SaveRequest) -> Result<DrawingId, PersistError> {
        let mut records = self.read_all()?;
        let SaveRequest { id, title, lines, settings, owner, now } = request;

        let existing = id.and_then(|id| records.iter().position(|r| r.id == id));
        let id = if let Some(index) = existing {
            let record = &mut records[index];
            record.title = title;
            record.lines = lines;
            record.settings = settings;
            record.updated_at = Some(now);
            record.id
        } else {
            let id = id.unwrap_or_else(Uuid::new_v4);
            records.push(DrawingRecord {
                id,
                title,
                lines,
                settings,
                owner,
                created_at: now,
                updated_at: Some(now),
            });
            id
        };

        self.write_all(&records)?;
        Ok(id)
    }

    fn load(&self, id: DrawingId) -> Result<DrawingRecord, PersistError> {
        self.read_all()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(PersistError::NotFound(id))
    }

    fn list_by_owner(&self, owner: &Owner) -> Result<Vec<DrawingRecord>, PersistError> {
        let mut records: Vec<DrawingRecord> = self.read_all()?.into_iter().filter(|r| &r.owner == owner).collect();
        records.sort_by(|a, b| b.last_modified().total_cmp(&a.last_modified()));
        Ok(records)
    }

    fn delete(&mut self, id: DrawingId) -> Result<bool, PersistError> {
        let mut records = self.read_all()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_all(&records)?;
        Ok(true)
    }

    fn count(&self) -> Result<usize, PersistError> {
        Ok(self.read_all()?.len())
    }

    fn save_current(&mut self, state: &CurrentState) -> Result<(), PersistError> {
        let raw = serde_json::to_string(state)?;
        self.backend.set(&self.current_key, &raw)
    }

    fn load_current(&self) -> Result<Option<CurrentState>, PersistError> {
        match self.backend.get(&self.current_key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn clear_current(&mut self) -> Result<(), PersistError> {
        self.backend.remove(&self.current_key)
    }
}

// =============================================================
// Sample content
// =============================================================

/// Title of the example drawing created by [`seed_sample_if_empty`].
pub const SAMPLE_TITLE: &str = "Sample drawing";

/// Store one example drawing when the repository holds none.
///
/// Returns the id of the created drawing, or `None` if drawings already
/// existed.
///
/// # Errors
///
/// Returns `PersistError` if the repository cannot be read or written.
pub fn seed_sample_if_empty(
    repo: &mut dyn Repository,
    owner: Owner,
    now: f64,
) -> Result<Option<DrawingId>, PersistError> {
    if repo.count()? > 0 {
        return Ok(None);
    }
    let stroke = DrawingObject::new(
        ObjectKind::Brush,
        "#FF0000",
        5.0,
        vec![Point::new(100.0, 100.0), Point::new(200.0, 200.0), Point::new(300.0, 100.0)],
    );
    let id = repo.save(SaveRequest {
        id: None,
        title: SAMPLE_TITLE.to_owned(),
        lines: vec![stroke],
        settings: DrawingSettings::default(),
        owner,
        now,
    })?;
    tracing::debug!(%id, "seeded sample drawing");
    Ok(Some(id))
}
