//! Audit event export operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rstatus_fieldmask::Mask;

use crate::lifecycle::proto_enum;
use crate::metadata::ResourceMetadata;
use crate::reset::{FullUpdateResetMask, ResetMaskBuilder};
use crate::resource::{impl_resource, ObservedStatus, ResourceKind};
use crate::sanitize::Credential;
use crate::state::AuditEventExportState;

proto_enum! {
    /// Output format of exported events
    pub enum ExportFormat {
        Unspecified = 0 => "FORMAT_UNSPECIFIED",
        Jsonl = 1 => "JSONL",
        Csv = 2 => "CSV",
    }
}

/// One export of audit events to an object storage bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditEventExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<AuditEventExportSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AuditEventExportStatus>,
}

impl_resource!(
    AuditEventExport,
    ResourceKind::AuditEventExport,
    AuditEventExportSpec,
    AuditEventExportStatus
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditEventExportSpec {
    /// Start of the exported period, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// End of the exported period, exclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Event filter expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ExportFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<ExportDestination>,
}

impl FullUpdateResetMask for AuditEventExportSpec {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("start_time", &self.start_time)
            .scalar("end_time", &self.end_time)
            .scalar("filter", &self.filter)
            .scalar("format", &self.format)
            .message("destination", &self.destination)
            .build()
    }
}

/// S3-compatible bucket receiving the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Object key prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<Credential>,
}

impl FullUpdateResetMask for ExportDestination {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("bucket", &self.bucket)
            .scalar("prefix", &self.prefix)
            .scalar("region", &self.region)
            .scalar("access_key_id", &self.access_key_id)
            .scalar("secret_access_key", &self.secret_access_key)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditEventExportStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AuditEventExportState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_events: Option<i64>,

    /// Keys of the objects written so far
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_objects: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl ObservedStatus for AuditEventExportStatus {
    type State = AuditEventExportState;

    fn state(&self) -> AuditEventExportState {
        self.state.unwrap_or_default()
    }
}
