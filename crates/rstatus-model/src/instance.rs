//! Per-replica status reported for jobs and endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::InstanceState;

/// Observed status of one replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<InstanceState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,

    /// Exit code of the main container, once it has exited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl InstanceStatus {
    pub fn new(id: impl Into<String>, state: InstanceState) -> Self {
        Self {
            id: Some(id.into()),
            state: Some(state),
            ..Default::default()
        }
    }

    pub fn state(&self) -> InstanceState {
        self.state.unwrap_or_default()
    }
}
