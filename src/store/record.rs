//! On-disk envelope of one stored resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use rstatus_model::AnyResource;

use super::{now_rfc3339, StoreError};

/// Schema version for stored records
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "rstatus/record@1";

/// Stored record (`<root>/<kind>/<id>.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Per-record write counter, 1 on creation and bumped on every replace
    pub seq: u64,

    /// Seq of the stored copy this record was read from
    #[serde(skip)]
    loaded_seq: u64,

    /// When the record was last written
    pub updated_at: DateTime<Utc>,

    /// The resource itself, tagged with its kind
    pub resource: AnyResource,
}

impl StoredRecord {
    /// Wrap a resource in a fresh envelope
    pub fn new(resource: AnyResource) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            seq: 1,
            loaded_seq: 1,
            updated_at: now_rfc3339(),
            resource,
        }
    }

    /// Replace the resource, bumping seq and timestamps
    pub fn replace(&mut self, resource: AnyResource) {
        let now = now_rfc3339();
        self.resource = resource;
        self.resource.metadata_mut().touch(now);
        self.updated_at = now;
        self.seq = self.seq.saturating_add(1);
    }

    /// Seq the stored copy had when this record was read
    pub fn loaded_seq(&self) -> u64 {
        self.loaded_seq
    }

    /// Mark the current contents as the stored copy
    pub(super) fn mark_stored(&mut self) {
        self.loaded_seq = self.seq;
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON, rejecting other schema versions
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let mut record: Self = serde_json::from_str(json)?;
        if record.schema_version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: record.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        record.mark_stored();
        Ok(record)
    }

    /// Write atomically to file (write-then-rename)
    pub fn write_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.to_json()?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &json)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Load from file
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
