//! Traits over the resource records and the kind-tagged union.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use rstatus_fieldmask::Mask;

use crate::audit::AuditEventExport;
use crate::capacity::{CapacityBlockGroup, CapacityInterval};
use crate::endpoint::Endpoint;
use crate::instance::InstanceStatus;
use crate::job::Job;
use crate::lifecycle::{Lifecycle, ProtoEnum};
use crate::metadata::ResourceMetadata;
use crate::observe::{apply_observation, Transition, TransitionPolicy};
use crate::reset::FullUpdateResetMask;
use crate::state::{
    AuditEventExportState, CapacityBlockGroupState, CapacityIntervalState, EndpointState,
    InstanceState, JobState,
};
use crate::ModelError;

/// Status section of a record.
pub trait ObservedStatus {
    type State: Lifecycle;

    fn state(&self) -> Self::State;

    /// Per-replica statuses, for kinds that have replicas.
    fn instances(&self) -> &[InstanceStatus] {
        &[]
    }

    /// Mutable replica list; `None` for kinds without replicas.
    fn instances_mut(&mut self) -> Option<&mut Vec<InstanceStatus>> {
        None
    }
}

/// One resource record: `metadata`, `spec` and `status`.
pub trait Resource: Clone + Serialize + DeserializeOwned {
    const KIND: ResourceKind;

    type Spec: FullUpdateResetMask + Clone + Serialize + DeserializeOwned;
    type Status: ObservedStatus + Clone + Serialize + DeserializeOwned;

    /// Fresh record with an empty status.
    fn from_parts(metadata: ResourceMetadata, spec: Self::Spec) -> Self;

    fn metadata(&self) -> Option<&ResourceMetadata>;

    fn metadata_mut(&mut self) -> &mut ResourceMetadata;

    fn spec(&self) -> Option<&Self::Spec>;

    fn status(&self) -> Option<&Self::Status>;

    /// Install a new status, returning the old one. Callers outside this
    /// crate go through [`apply_observation`].
    fn replace_status(&mut self, status: Self::Status) -> Option<Self::Status>;

    fn id(&self) -> Option<&str> {
        self.metadata().and_then(|m| m.id.as_deref())
    }

    /// Current lifecycle state; `UNSPECIFIED` until the first observation.
    fn state(&self) -> <Self::Status as ObservedStatus>::State {
        self.status().map(ObservedStatus::state).unwrap_or_default()
    }
}

/// Implements [`Resource`] for a `{metadata, spec, status}` record.
macro_rules! impl_resource {
    ($record:ty, $kind:expr, $spec:ty, $status:ty) => {
        impl $crate::resource::Resource for $record {
            const KIND: $crate::resource::ResourceKind = $kind;

            type Spec = $spec;
            type Status = $status;

            fn from_parts(metadata: $crate::metadata::ResourceMetadata, spec: $spec) -> Self {
                Self {
                    metadata: Some(metadata),
                    spec: Some(spec),
                    status: None,
                }
            }

            fn metadata(&self) -> Option<&$crate::metadata::ResourceMetadata> {
                self.metadata.as_ref()
            }

            fn metadata_mut(&mut self) -> &mut $crate::metadata::ResourceMetadata {
                self.metadata.get_or_insert_with(Default::default)
            }

            fn spec(&self) -> Option<&$spec> {
                self.spec.as_ref()
            }

            fn status(&self) -> Option<&$status> {
                self.status.as_ref()
            }

            fn replace_status(&mut self, status: $status) -> Option<$status> {
                self.status.replace(status)
            }
        }
    };
}

pub(crate) use impl_resource;

/// The five resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Job,
    Endpoint,
    CapacityBlockGroup,
    CapacityInterval,
    AuditEventExport,
}

impl ResourceKind {
    pub const ALL: &'static [ResourceKind] = &[
        ResourceKind::Job,
        ResourceKind::Endpoint,
        ResourceKind::CapacityBlockGroup,
        ResourceKind::CapacityInterval,
        ResourceKind::AuditEventExport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Job => "job",
            ResourceKind::Endpoint => "endpoint",
            ResourceKind::CapacityBlockGroup => "capacity_block_group",
            ResourceKind::CapacityInterval => "capacity_interval",
            ResourceKind::AuditEventExport => "audit_event_export",
        }
    }

    /// Prefix of minted resource ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            ResourceKind::Job => "aijob",
            ResourceKind::Endpoint => "aiendpoint",
            ResourceKind::CapacityBlockGroup => "capacityblockgroup",
            ResourceKind::CapacityInterval => "capacityinterval",
            ResourceKind::AuditEventExport => "auditexport",
        }
    }

    /// Lifecycle table of this kind's state enum.
    pub fn states(self) -> Vec<StateInfo> {
        match self {
            ResourceKind::Job => StateInfo::table::<JobState>(),
            ResourceKind::Endpoint => StateInfo::table::<EndpointState>(),
            ResourceKind::CapacityBlockGroup => StateInfo::table::<CapacityBlockGroupState>(),
            ResourceKind::CapacityInterval => StateInfo::table::<CapacityIntervalState>(),
            ResourceKind::AuditEventExport => StateInfo::table::<AuditEventExportState>(),
        }
    }

    /// Lifecycle table of replicas, for kinds that have them.
    pub fn instance_states(self) -> Option<Vec<StateInfo>> {
        match self {
            ResourceKind::Job | ResourceKind::Endpoint => {
                Some(StateInfo::table::<InstanceState>())
            }
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ModelError;

    /// Accepts the snake_case name, its kebab-case form or the id prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized || k.id_prefix() == normalized)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

/// One row of a lifecycle table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    pub value: i32,
    pub name: &'static str,
    pub terminal: bool,
    pub transient: bool,
    pub successors: Vec<&'static str>,
}

impl StateInfo {
    pub fn table<S: Lifecycle>() -> Vec<StateInfo> {
        S::ALL
            .iter()
            .map(|&state| StateInfo {
                value: state.as_i32(),
                name: state.as_str_name(),
                terminal: state.is_terminal(),
                transient: state.is_transient(),
                successors: S::ALL
                    .iter()
                    .filter(|&&to| state.can_transition_to(to))
                    .map(|to| to.as_str_name())
                    .collect(),
            })
            .collect()
    }
}

/// Any resource record, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnyResource {
    Job(Job),
    Endpoint(Endpoint),
    CapacityBlockGroup(CapacityBlockGroup),
    CapacityInterval(CapacityInterval),
    AuditEventExport(AuditEventExport),
}

/// Evaluates `$body` with `$r` bound to the inner record.
macro_rules! each_kind {
    ($value:expr, $r:ident => $body:expr) => {
        match $value {
            AnyResource::Job($r) => $body,
            AnyResource::Endpoint($r) => $body,
            AnyResource::CapacityBlockGroup($r) => $body,
            AnyResource::CapacityInterval($r) => $body,
            AnyResource::AuditEventExport($r) => $body,
        }
    };
}

fn from_json<R: Resource>(
    metadata: ResourceMetadata,
    spec: serde_json::Value,
) -> Result<R, serde_json::Error> {
    let spec: R::Spec = serde_json::from_value(spec)?;
    Ok(R::from_parts(metadata, spec))
}

fn observe_json<R: Resource>(
    resource: &mut R,
    status: serde_json::Value,
    policy: TransitionPolicy,
) -> Result<Transition, ModelError> {
    let status: R::Status = serde_json::from_value(status)?;
    Ok(apply_observation(resource, status, policy)?)
}

fn info<R: Resource>(resource: &R) -> (&'static str, bool) {
    let state = resource.state();
    (state.as_str_name(), state.is_terminal())
}

impl AnyResource {
    /// New record of `kind` from a JSON spec, status left empty.
    pub fn from_spec_json(
        kind: ResourceKind,
        metadata: ResourceMetadata,
        spec: serde_json::Value,
    ) -> Result<Self, ModelError> {
        Ok(match kind {
            ResourceKind::Job => AnyResource::Job(from_json(metadata, spec)?),
            ResourceKind::Endpoint => AnyResource::Endpoint(from_json(metadata, spec)?),
            ResourceKind::CapacityBlockGroup => {
                AnyResource::CapacityBlockGroup(from_json(metadata, spec)?)
            }
            ResourceKind::CapacityInterval => {
                AnyResource::CapacityInterval(from_json(metadata, spec)?)
            }
            ResourceKind::AuditEventExport => {
                AnyResource::AuditEventExport(from_json(metadata, spec)?)
            }
        })
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            AnyResource::Job(_) => ResourceKind::Job,
            AnyResource::Endpoint(_) => ResourceKind::Endpoint,
            AnyResource::CapacityBlockGroup(_) => ResourceKind::CapacityBlockGroup,
            AnyResource::CapacityInterval(_) => ResourceKind::CapacityInterval,
            AnyResource::AuditEventExport(_) => ResourceKind::AuditEventExport,
        }
    }

    pub fn id(&self) -> Option<&str> {
        each_kind!(self, r => r.id())
    }

    pub fn metadata(&self) -> Option<&ResourceMetadata> {
        each_kind!(self, r => r.metadata())
    }

    pub fn metadata_mut(&mut self) -> &mut ResourceMetadata {
        each_kind!(self, r => r.metadata_mut())
    }

    /// Wire name of the current state.
    pub fn state_name(&self) -> &'static str {
        each_kind!(self, r => info(r).0)
    }

    pub fn is_terminal(&self) -> bool {
        each_kind!(self, r => info(r).1)
    }

    /// Replica statuses, empty for kinds without replicas.
    pub fn instances(&self) -> &[InstanceStatus] {
        each_kind!(self, r => r.status().map(ObservedStatus::instances).unwrap_or(&[]))
    }

    pub fn has_status(&self) -> bool {
        each_kind!(self, r => r.status().is_some())
    }

    /// Spec as untyped JSON, `null` when absent.
    pub fn spec_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        each_kind!(self, r => serde_json::to_value(r.spec()))
    }

    /// Full-update reset mask of the record's spec; `None` when it has none.
    pub fn spec_reset_mask(&self) -> Option<Mask> {
        each_kind!(self, r => r.spec().map(FullUpdateResetMask::full_update_reset_mask))
    }

    /// Parse `status` as this kind's status and apply it.
    pub fn observe_json(
        &mut self,
        status: serde_json::Value,
        policy: TransitionPolicy,
    ) -> Result<Transition, ModelError> {
        each_kind!(self, r => observe_json(r, status, policy))
    }
}

macro_rules! impl_from_record {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for AnyResource {
                fn from(record: $variant) -> Self {
                    AnyResource::$variant(record)
                }
            }
        )+
    };
}

impl_from_record!(
    Job,
    Endpoint,
    CapacityBlockGroup,
    CapacityInterval,
    AuditEventExport
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobSpec, JobStatus};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("job", ResourceKind::Job)]
    #[case("capacity-block-group", ResourceKind::CapacityBlockGroup)]
    #[case("Audit_Event_Export", ResourceKind::AuditEventExport)]
    #[case("aiendpoint", ResourceKind::Endpoint)]
    #[case("capacityinterval", ResourceKind::CapacityInterval)]
    fn test_kind_from_str(#[case] input: &str, #[case] kind: ResourceKind) {
        assert_eq!(input.parse::<ResourceKind>().unwrap(), kind);
    }

    #[test]
    fn test_kind_from_str_unknown() {
        assert!("bucket".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_state_table_marks_terminal() {
        let table = ResourceKind::Job.states();
        assert_eq!(table.len(), 10);
        assert_eq!(table[0].name, "STATE_UNSPECIFIED");
        let completed = table.iter().find(|s| s.name == "COMPLETED").unwrap();
        assert!(completed.terminal);
        assert!(completed.successors.is_empty());
        let cancelling = table.iter().find(|s| s.name == "CANCELLING").unwrap();
        assert!(cancelling.transient);
        assert!(cancelling.successors.contains(&"CANCELLED"));
    }

    #[test]
    fn test_instance_states_only_for_replicated_kinds() {
        assert!(ResourceKind::Job.instance_states().is_some());
        assert!(ResourceKind::CapacityInterval.instance_states().is_none());
    }

    #[test]
    fn test_any_resource_tagged_json() {
        let job = Job::from_parts(
            ResourceMetadata::named("project-e00", "train"),
            JobSpec {
                image: Some("nvcr.io/nvidia/pytorch:24.01".to_string()),
                ..Default::default()
            },
        );
        let any = AnyResource::from(job);
        let value = serde_json::to_value(&any).unwrap();
        assert_eq!(value["kind"], "job");
        assert_eq!(value["spec"]["image"], "nvcr.io/nvidia/pytorch:24.01");
        assert!(value.get("status").is_none());

        let back: AnyResource = serde_json::from_value(value).unwrap();
        assert_eq!(back, any);
        assert_eq!(back.state_name(), "STATE_UNSPECIFIED");
        assert!(!back.is_terminal());
    }

    #[test]
    fn test_from_spec_json_rejects_bad_enum() {
        let err = AnyResource::from_spec_json(
            ResourceKind::AuditEventExport,
            ResourceMetadata::default(),
            json!({"format": "XML"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ExportFormat"));
    }

    #[test]
    fn test_observe_json_dispatches() {
        let mut any = AnyResource::from_spec_json(
            ResourceKind::Job,
            ResourceMetadata::default(),
            json!({"image": "busybox"}),
        )
        .unwrap();
        let transition = any
            .observe_json(json!({"state": "RUNNING"}), TransitionPolicy::Strict)
            .unwrap();
        assert_eq!(transition.from, "STATE_UNSPECIFIED");
        assert_eq!(transition.to, "RUNNING");
        assert_eq!(any.state_name(), "RUNNING");

        if let AnyResource::Job(job) = &any {
            let status: &JobStatus = job.status().unwrap();
            assert_eq!(status.state, Some(JobState::Running));
        } else {
            panic!("expected a job");
        }
    }

    #[test]
    fn test_spec_reset_mask() {
        let any = AnyResource::from_spec_json(
            ResourceKind::CapacityInterval,
            ResourceMetadata::default(),
            json!({"capacity_block_group_id": "capacityblockgroup-1", "quantity": 8}),
        )
        .unwrap();
        assert_eq!(any.spec_reset_mask().unwrap().marshal(), "end_time,start_time");
    }
}
