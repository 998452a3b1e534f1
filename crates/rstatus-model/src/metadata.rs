//! Resource metadata common to every kind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity and bookkeeping fields of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceMetadata {
    /// Server-assigned identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Container (project) the resource lives in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Bumped on every stored change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ResourceMetadata {
    pub fn named(parent_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Forget server-assigned bookkeeping (version and timestamps).
    pub fn clear_bookkeeping(&mut self) {
        self.resource_version = None;
        self.created_at = None;
        self.updated_at = None;
    }

    /// Increment the resource version and stamp `updated_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.resource_version = Some(self.resource_version.unwrap_or(0).saturating_add(1));
        self.updated_at = Some(now);
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
    }
}
