//! Spec building blocks shared by jobs and endpoints.

use serde::{Deserialize, Serialize};

use rstatus_fieldmask::Mask;

use crate::lifecycle::proto_enum;
use crate::reset::{FullUpdateResetMask, ResetMaskBuilder};
use crate::sanitize::Credential;

proto_enum! {
    /// Transport of an exposed container port
    pub enum PortProtocol {
        Unspecified = 0 => "PROTOCOL_UNSPECIFIED",
        Tcp = 1 => "TCP",
        Udp = 2 => "UDP",
        Http = 3 => "HTTP",
    }
}

proto_enum! {
    /// Access mode of a mounted volume
    pub enum VolumeMode {
        Unspecified = 0 => "MODE_UNSPECIFIED",
        ReadOnly = 1 => "READ_ONLY",
        ReadWrite = 2 => "READ_WRITE",
    }
}

proto_enum! {
    /// Boot disk type
    pub enum DiskType {
        Unspecified = 0 => "DISK_TYPE_UNSPECIFIED",
        NetworkSsd = 1 => "NETWORK_SSD",
        NetworkHdd = 2 => "NETWORK_HDD",
        NetworkSsdNonReplicated = 3 => "NETWORK_SSD_NON_REPLICATED",
        NetworkSsdIoM3 = 4 => "NETWORK_SSD_IO_M3",
    }
}

/// Port exposed by the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerPort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_port: Option<u32>,

    /// Port on the host; defaults to `container_port` on the server side
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<PortProtocol>,
}

impl FullUpdateResetMask for ContainerPort {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("container_port", &self.container_port)
            .scalar("host_port", &self.host_port)
            .scalar("protocol", &self.protocol)
            .build()
    }
}

/// Filesystem or bucket mounted into the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeMount {
    /// Source resource ID or bucket URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<VolumeMode>,
}

impl FullUpdateResetMask for VolumeMount {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("source", &self.source)
            .scalar("container_path", &self.container_path)
            .scalar("mode", &self.mode)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<DiskType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
}

impl FullUpdateResetMask for DiskSpec {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("type", &self.disk_type)
            .scalar("size_bytes", &self.size_bytes)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,

    /// Request a public address for each instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<bool>,
}

impl FullUpdateResetMask for NetworkSpec {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("subnet_id", &self.subnet_id)
            .scalar("public_ip", &self.public_ip)
            .build()
    }
}

/// Credentials for a private image registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Credential>,
}

impl FullUpdateResetMask for RegistryCredentials {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("username", &self.username)
            .scalar("password", &self.password)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_type_serializes_as_type() {
        let disk = DiskSpec {
            disk_type: Some(DiskType::NetworkSsd),
            size_bytes: Some(1 << 30),
        };
        let json = serde_json::to_value(&disk).unwrap();
        assert_eq!(json["type"], "NETWORK_SSD");
        assert_eq!(json["size_bytes"], 1073741824);
    }

    #[test]
    fn test_unset_fields_are_skipped() {
        let port = ContainerPort {
            container_port: Some(8080),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&port).unwrap(), r#"{"container_port":8080}"#);
    }

    #[test]
    fn test_registry_password_hidden_in_debug() {
        let creds = RegistryCredentials {
            username: Some("robot".to_string()),
            password: Some(Credential::new("hunter2")),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("robot"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_port_protocol_accepts_number() {
        let port: ContainerPort =
            serde_json::from_str(r#"{"container_port": 53, "protocol": 2}"#).unwrap();
        assert_eq!(port.protocol, Some(PortProtocol::Udp));
    }
}
