//! Applies control-plane status observations to stored records

use serde_json::Value;

use rstatus_model::{ResourceKind, Transition, TransitionPolicy};

use crate::error::Error;
use crate::store::{FileStore, StoredRecord};

/// Loads a record, validates an observed status against it and persists
/// the result.
#[derive(Debug, Clone)]
pub struct Observer {
    store: FileStore,
    policy: TransitionPolicy,
}

impl Observer {
    pub fn new(store: FileStore, policy: TransitionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Apply `status` (the kind's status JSON) to the record `kind`/`id`.
    ///
    /// A rejected observation leaves the stored record untouched.
    pub fn observe(
        &self,
        kind: ResourceKind,
        id: &str,
        status: Value,
    ) -> Result<(Transition, StoredRecord), Error> {
        let mut record = self.store.get(kind, id)?;
        let mut resource = record.resource.clone();

        let transition = match resource.observe_json(status, self.policy) {
            Ok(transition) => transition,
            Err(e) => {
                tracing::warn!(
                    kind = %kind,
                    id = %id,
                    state = resource.state_name(),
                    policy = %self.policy,
                    error = %e,
                    "rejected observation"
                );
                return Err(e.into());
            }
        };

        record.replace(resource);
        self.store.put(&mut record)?;

        for instance in &transition.instances {
            tracing::debug!(
                kind = %kind,
                id = %id,
                instance = %instance.id,
                from = instance.from.unwrap_or("NEW"),
                to = instance.to,
                "instance state"
            );
        }
        if !transition.dropped.is_empty() {
            tracing::debug!(kind = %kind, id = %id, dropped = ?transition.dropped, "instances no longer reported");
        }
        if !transition.retained.is_empty() {
            tracing::debug!(kind = %kind, id = %id, retained = ?transition.retained, "terminal instances retained");
        }

        if transition.changed() {
            tracing::info!(
                kind = %kind,
                id = %id,
                from = transition.from,
                to = transition.to,
                seq = record.seq,
                terminal = record.resource.is_terminal(),
                "state transition"
            );
        } else {
            tracing::debug!(kind = %kind, id = %id, state = transition.to, "state unchanged");
        }

        Ok((transition, record))
    }
}
