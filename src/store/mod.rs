//! File-backed record store
//!
//! One JSON file per resource at `<root>/<kind>/<id>.json`, written with
//! write-then-rename so readers see either the old or the new record.
//! Specs are write-once: nothing here updates a stored spec.

mod record;

pub use record::{StoredRecord, SCHEMA_ID, SCHEMA_VERSION};

use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rstatus_model::{AnyResource, ResourceKind};

/// Get current UTC timestamp
pub fn now_rfc3339() -> DateTime<Utc> {
    Utc::now()
}

/// Errors for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("{kind} {id} already exists")]
    Duplicate { kind: ResourceKind, id: String },

    #[error("record {id} holds a {found}, expected a {expected}")]
    KindMismatch {
        id: String,
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("invalid resource id: {0}")]
    InvalidId(String),

    #[error("new {0} records must not carry a status; status comes from observations")]
    StatusOnCreate(ResourceKind),

    #[error("{kind} {id} was written by someone else (read at seq {expected}, stored seq {found})")]
    Conflict {
        kind: ResourceKind,
        id: String,
        expected: u64,
        found: u64,
    },

    #[error("spec of {kind} {id} is write-once")]
    SpecChanged { kind: ResourceKind, id: String },

    #[error("unsupported record schema version {found}, expected {expected}")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Mint a new resource id: `<prefix>-<ulid>` (sortable, filesystem-safe)
pub fn generate_id(kind: ResourceKind) -> String {
    format!(
        "{}-{}",
        kind.id_prefix(),
        ulid::Ulid::new().to_string().to_lowercase()
    )
}

/// Validate a resource id before it becomes a file name.
///
/// Ids MUST be filesystem-safe: ^[A-Za-z0-9][A-Za-z0-9_-]{0,127}$
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id.len() > 128 {
        return Err(StoreError::InvalidId(format!(
            "id must be 1-128 characters, got {}",
            id.len()
        )));
    }

    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => {
            return Err(StoreError::InvalidId(format!(
                "{:?} must start with an alphanumeric character",
                id
            )))
        }
    }

    if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-') {
        return Err(StoreError::InvalidId(format!(
            "{:?} contains invalid character {:?}",
            id, c
        )));
    }

    Ok(())
}

/// Record store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened record store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: ResourceKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    fn record_path(&self, kind: ResourceKind, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.kind_dir(kind).join(format!("{}.json", id)))
    }

    /// Store a new resource, minting an id when it has none.
    ///
    /// The resource must not carry a status yet. Version and timestamps
    /// supplied by the caller are discarded.
    pub fn create(&self, mut resource: AnyResource) -> Result<StoredRecord, StoreError> {
        let kind = resource.kind();
        if resource.has_status() {
            return Err(StoreError::StatusOnCreate(kind));
        }

        let metadata = resource.metadata_mut();
        let id = metadata
            .id
            .get_or_insert_with(|| generate_id(kind))
            .clone();
        metadata.clear_bookkeeping();
        metadata.touch(now_rfc3339());

        let path = self.record_path(kind, &id)?;
        if path.exists() {
            return Err(StoreError::Duplicate { kind, id });
        }

        fs::create_dir_all(self.kind_dir(kind))?;
        let record = StoredRecord::new(resource);
        record.write_to_file(&path)?;

        tracing::debug!(kind = %kind, id = %id, seq = record.seq, "created record");
        Ok(record)
    }

    /// Load one record
    pub fn get(&self, kind: ResourceKind, id: &str) -> Result<StoredRecord, StoreError> {
        let path = self.record_path(kind, id)?;
        if !path.exists() {
            return Err(StoreError::NotFound {
                kind,
                id: id.to_string(),
            });
        }

        let record = StoredRecord::from_file(&path)?;
        let found = record.resource.kind();
        if found != kind {
            return Err(StoreError::KindMismatch {
                id: id.to_string(),
                expected: kind,
                found,
            });
        }

        tracing::debug!(kind = %kind, id = %id, seq = record.seq, "loaded record");
        Ok(record)
    }

    /// All records of a kind, ordered by id
    pub fn list(&self, kind: ResourceKind) -> Result<Vec<StoredRecord>, StoreError> {
        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();

        ids.iter().map(|id| self.get(kind, id)).collect()
    }

    /// Replace a stored record with an updated copy.
    ///
    /// The record must already exist, its spec must be unchanged and the
    /// stored copy must still be the one `record` was read from.
    pub fn put(&self, record: &mut StoredRecord) -> Result<(), StoreError> {
        let kind = record.resource.kind();
        let id = record
            .resource
            .id()
            .ok_or_else(|| StoreError::InvalidId("record has no id".to_string()))?
            .to_owned();
        let id = id.as_str();

        let existing = self.get(kind, id)?;
        if existing.seq != record.loaded_seq() {
            return Err(StoreError::Conflict {
                kind,
                id: id.to_string(),
                expected: record.loaded_seq(),
                found: existing.seq,
            });
        }
        if existing.resource.spec_json()? != record.resource.spec_json()? {
            return Err(StoreError::SpecChanged {
                kind,
                id: id.to_string(),
            });
        }

        record.write_to_file(&self.record_path(kind, id)?)?;
        record.mark_stored();
        tracing::debug!(kind = %kind, id = %id, seq = record.seq, "replaced record");
        Ok(())
    }

    /// Remove a record, returning its last stored version
    pub fn delete(&self, kind: ResourceKind, id: &str) -> Result<StoredRecord, StoreError> {
        let record = self.get(kind, id)?;
        fs::remove_file(self.record_path(kind, id)?)?;
        tracing::debug!(kind = %kind, id = %id, "deleted record");
        Ok(record)
    }
}
