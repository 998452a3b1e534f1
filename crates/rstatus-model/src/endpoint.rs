//! Serverless AI endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rstatus_fieldmask::Mask;

use crate::common::{ContainerPort, DiskSpec, NetworkSpec, RegistryCredentials, VolumeMount};
use crate::instance::InstanceStatus;
use crate::metadata::ResourceMetadata;
use crate::reset::{FullUpdateResetMask, ResetMaskBuilder};
use crate::resource::{impl_resource, ObservedStatus, ResourceKind};
use crate::sanitize::Credential;
use crate::state::EndpointState;

/// A long-running serving workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<EndpointSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EndpointStatus>,
}

impl_resource!(Endpoint, ResourceKind::Endpoint, EndpointSpec, EndpointStatus);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

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

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Bearer token clients must present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<Credential>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,
}

impl FullUpdateResetMask for EndpointSpec {
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
            .scalar("auth_token", &self.auth_token)
            .list("ssh_authorized_keys", &self.ssh_authorized_keys)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<EndpointState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_details: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceStatus>,

    /// Addresses reachable from the internet
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub public_endpoints: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub private_endpoints: Vec<String>,
}

impl ObservedStatus for EndpointStatus {
    type State = EndpointState;

    fn state(&self) -> EndpointState {
        self.state.unwrap_or_default()
    }

    fn instances(&self) -> &[InstanceStatus] {
        &self.instances
    }

    fn instances_mut(&mut self) -> Option<&mut Vec<InstanceStatus>> {
        Some(&mut self.instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{apply_observation, TransitionPolicy};
    use crate::resource::Resource;

    #[test]
    fn test_auth_token_hidden_in_debug() {
        let spec = EndpointSpec {
            auth_token: Some(Credential::new("plain-secret-value")),
            ..Default::default()
        };
        let debug = format!("{:?}", spec);
        assert!(!debug.contains("plain-secret-value"));
        assert!(debug.contains("**HIDDEN**"));

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["auth_token"], "plain-secret-value");
    }

    #[test]
    fn test_stop_and_restart() {
        let mut endpoint = Endpoint::from_parts(ResourceMetadata::default(), EndpointSpec::default());
        for state in [
            EndpointState::Provisioning,
            EndpointState::Starting,
            EndpointState::Running,
            EndpointState::Stopping,
            EndpointState::Stopped,
            EndpointState::Starting,
            EndpointState::Running,
        ] {
            let status = EndpointStatus {
                state: Some(state),
                ..Default::default()
            };
            apply_observation(&mut endpoint, status, TransitionPolicy::Strict).unwrap();
        }
        assert_eq!(endpoint.state(), EndpointState::Running);
    }

    #[test]
    fn test_reset_mask_includes_auth_token_when_unset() {
        let spec = EndpointSpec {
            image: Some("vllm/vllm-openai".to_string()),
            ..Default::default()
        };
        let mask = spec.full_update_reset_mask();
        assert!(mask.field_parts.contains_key("auth_token"));
        assert!(!mask.field_parts.contains_key("image"));
    }
}
