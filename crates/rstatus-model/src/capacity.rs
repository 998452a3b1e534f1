//! Capacity block groups and their reservation intervals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rstatus_fieldmask::Mask;

use crate::metadata::ResourceMetadata;
use crate::reset::{FullUpdateResetMask, ResetMaskBuilder};
use crate::resource::{impl_resource, ObservedStatus, ResourceKind};
use crate::state::{CapacityBlockGroupState, CapacityIntervalState};

/// Reserved compute capacity in one zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityBlockGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<CapacityBlockGroupSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CapacityBlockGroupStatus>,
}

impl_resource!(
    CapacityBlockGroup,
    ResourceKind::CapacityBlockGroup,
    CapacityBlockGroupSpec,
    CapacityBlockGroupStatus
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityBlockGroupSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FullUpdateResetMask for CapacityBlockGroupSpec {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("region", &self.region)
            .scalar("zone", &self.zone)
            .scalar("platform", &self.platform)
            .scalar("preset", &self.preset)
            .scalar("description", &self.description)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityBlockGroupStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CapacityBlockGroupState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_details: Option<String>,

    /// Instances reserved across all active intervals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_quantity: Option<i64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interval_ids: Vec<String>,
}

impl ObservedStatus for CapacityBlockGroupStatus {
    type State = CapacityBlockGroupState;

    fn state(&self) -> CapacityBlockGroupState {
        self.state.unwrap_or_default()
    }
}

/// Time window of a reservation inside a capacity block group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityInterval {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<CapacityIntervalSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CapacityIntervalStatus>,
}

impl_resource!(
    CapacityInterval,
    ResourceKind::CapacityInterval,
    CapacityIntervalSpec,
    CapacityIntervalStatus
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityIntervalSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_block_group_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl FullUpdateResetMask for CapacityIntervalSpec {
    fn full_update_reset_mask(&self) -> Mask {
        ResetMaskBuilder::new()
            .scalar("capacity_block_group_id", &self.capacity_block_group_id)
            .scalar("start_time", &self.start_time)
            .scalar("end_time", &self.end_time)
            .scalar("quantity", &self.quantity)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityIntervalStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CapacityIntervalState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_details: Option<String>,
}

impl ObservedStatus for CapacityIntervalStatus {
    type State = CapacityIntervalState;

    fn state(&self) -> CapacityIntervalState {
        self.state.unwrap_or_default()
    }
}
