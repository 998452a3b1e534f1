//! Serverless AI job.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rstatus_fieldmask::Mask;

use crate::common::{ContainerPort, DiskSpec, NetworkSpec, RegistryCredentials, VolumeMount};
use crate::instance::InstanceStatus;
use crate::metadata::ResourceMetadata;
use crate::reset::{FullUpdateResetMask, ResetMaskBuilder};
use crate::resource::{impl_resource, ObservedStatus, ResourceKind};
use crate::state::JobState;

/// A batch workload run to completion on one or more instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<JobSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl_resource!(Job, ResourceKind::Job, JobSpec, JobStatus);

/// Desired configuration of a job. Write-once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    /// Container image reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Overrides the image entrypoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_command: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeMount>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_credentials: Option<RegistryCredentials>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<DiskSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSpec>,

    /// Compute platform, e.g. `gpu-h100-sxm`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Resource preset within the platform, e.g. `8gpu-128vcpu-1600gb`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_attempts: Option<i32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,
}

impl FullUpdateResetMask for JobSpec {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("image", &self.image)
            .scalar("container_command", &self.container_command)
            .list("args", &self.args)
            .map("environment", &self.environment)
            .messages("ports", &self.ports)
            .messages("volumes", &self.volumes)
            .message("registry_credentials", &self.registry_credentials)
            .message("disk", &self.disk)
            .message("network", &self.network)
            .scalar("platform", &self.platform)
            .scalar("preset", &self.preset)
            .scalar("instance_count", &self.instance_count)
            .scalar("working_dir", &self.working_dir)
            .scalar("timeout_seconds", &self.timeout_seconds)
            .scalar("restart_attempts", &self.restart_attempts)
            .list("ssh_authorized_keys", &self.ssh_authorized_keys)
            .build()
    }
}

/// Observed status of a job. Written by the control plane only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,

    /// Human-readable reason for the current state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_details: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl ObservedStatus for JobStatus {
    type State = JobState;

    fn state(&self) -> JobState {
        self.state.unwrap_or_default()
    }

    fn instances(&self) -> &[InstanceStatus] {
        &self.instances
    }

    fn instances_mut(&mut self) -> Option<&mut Vec<InstanceStatus>> {
        Some(&mut self.instances)
    }
}
