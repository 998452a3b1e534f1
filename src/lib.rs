//! Resource status - lifecycle tracking for AI/compute resources
//!
//! This crate keeps records of control-plane resources (jobs, endpoints,
//! capacity block groups and intervals, audit event exports) in a local
//! file store and applies status observations to them under the lifecycle
//! rules of [`rstatus_model`].

pub mod config;
pub mod error;
pub mod headers;
pub mod logging;
pub mod observer;
pub mod store;

pub use config::{EffectiveConfig, Settings};
pub use error::Error;
pub use headers::{ensure_reset_mask, Metadata, RESET_MASK_HEADER};
pub use observer::Observer;
pub use store::{FileStore, StoreError, StoredRecord};

pub use rstatus_fieldmask as fieldmask;
pub use rstatus_model as model;
