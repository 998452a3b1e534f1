//! Resource status model
//!
//! Plain records for the resources of an AI/compute control plane. Each
//! record has a `metadata`, `spec` and `status` section; `status` carries
//! a lifecycle enum whose transitions are described by [`Lifecycle`].
//!
//! Specs are written by the client once. Statuses are only ever replaced
//! through [`apply_observation`], which enforces the lifecycle rules:
//! terminal states are absorbing and `UNSPECIFIED` exists only before the
//! first observation.

pub mod audit;
pub mod capacity;
pub mod common;
pub mod endpoint;
pub mod instance;
pub mod job;
pub mod lifecycle;
pub mod metadata;
pub mod observe;
pub mod reset;
pub mod resource;
pub mod sanitize;
pub mod state;

pub use audit::{AuditEventExport, AuditEventExportSpec, AuditEventExportStatus, ExportDestination, ExportFormat};
pub use capacity::{
    CapacityBlockGroup, CapacityBlockGroupSpec, CapacityBlockGroupStatus, CapacityInterval,
    CapacityIntervalSpec, CapacityIntervalStatus,
};
pub use common::{
    ContainerPort, DiskSpec, DiskType, NetworkSpec, PortProtocol, RegistryCredentials, VolumeMode,
    VolumeMount,
};
pub use endpoint::{Endpoint, EndpointSpec, EndpointStatus};
pub use instance::InstanceStatus;
pub use job::{Job, JobSpec, JobStatus};
pub use lifecycle::{EnumError, Lifecycle, ProtoEnum};
pub use metadata::ResourceMetadata;
pub use observe::{
    apply_observation, check_transition, InstanceTransition, ObserveError, Transition,
    TransitionPolicy,
};
pub use reset::{FullUpdateResetMask, ResetMaskBuilder};
pub use resource::{AnyResource, ObservedStatus, Resource, ResourceKind, StateInfo};
pub use sanitize::{Credential, TokenSanitizer};
pub use state::{
    AuditEventExportState, CapacityBlockGroupState, CapacityIntervalState, EndpointState,
    InstanceState, JobState,
};

/// Errors crossing the untyped (JSON) boundary of the model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Observe(#[from] ObserveError),

    #[error(transparent)]
    Enum(#[from] EnumError),
}
