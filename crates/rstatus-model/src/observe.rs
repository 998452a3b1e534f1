//! Validating status observations
//!
//! Status is written by the control plane only. An observation is a full
//! status snapshot; it is checked against the lifecycle rules before it
//! replaces the stored status.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::instance::InstanceStatus;
use crate::lifecycle::{Lifecycle, ProtoEnum};
use crate::resource::{ObservedStatus, Resource};
use crate::state::InstanceState;

/// How strictly observed transitions are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Only transitions in the lifecycle table are accepted
    #[default]
    Strict,
    /// Any specified state is accepted from a non-terminal one; the
    /// control plane may skip states between two observations
    Absorbing,
}

impl TransitionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionPolicy::Strict => "strict",
            TransitionPolicy::Absorbing => "absorbing",
        }
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(TransitionPolicy::Strict),
            "absorbing" => Ok(TransitionPolicy::Absorbing),
            other => Err(format!(
                "unknown transition policy '{}', expected strict or absorbing",
                other
            )),
        }
    }
}

/// Errors for rejected observations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserveError {
    #[error("Observed state is {0}; an observation must carry a specified state")]
    UnspecifiedState(&'static str),

    #[error("Resource is in terminal state {current}, cannot move to {observed}")]
    TerminalState {
        current: &'static str,
        observed: &'static str,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("Instance {id} observed in state {observed}; instances must carry a specified state")]
    InstanceUnspecified { id: String, observed: &'static str },

    #[error("Instance {id} is in terminal state {current}, cannot move to {observed}")]
    InstanceTerminal {
        id: String,
        current: &'static str,
        observed: &'static str,
    },

    #[error("Invalid transition of instance {id} from {from} to {to}")]
    InstanceTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Instance {id} is reported more than once")]
    DuplicateInstance { id: String },
}

/// State change of one replica within an observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceTransition {
    pub id: String,
    /// `None` for a replica seen for the first time
    pub from: Option<&'static str>,
    pub to: &'static str,
}

/// Report of an applied observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: &'static str,
    pub to: &'static str,
    /// Replicas whose state changed or that appeared
    pub instances: Vec<InstanceTransition>,
    /// Replicas no longer reported
    pub dropped: Vec<String>,
    /// Terminal replicas missing from the observation, kept as they were
    pub retained: Vec<String>,
}

impl Transition {
    /// True if the resource state itself changed.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

enum Fault {
    Unspecified,
    Terminal,
    Invalid,
}

fn check<S: Lifecycle>(current: S, observed: S, policy: TransitionPolicy) -> Result<(), Fault> {
    if observed.is_unspecified() {
        return Err(Fault::Unspecified);
    }
    if current == observed {
        return Ok(());
    }
    if current.is_terminal() {
        return Err(Fault::Terminal);
    }
    if policy == TransitionPolicy::Strict && !current.can_transition_to(observed) {
        return Err(Fault::Invalid);
    }
    Ok(())
}

/// Check a single state change without touching any record.
pub fn check_transition<S: Lifecycle>(
    current: S,
    observed: S,
    policy: TransitionPolicy,
) -> Result<(), ObserveError> {
    let (from, to) = (current.as_str_name(), observed.as_str_name());
    check(current, observed, policy).map_err(|fault| match fault {
        Fault::Unspecified => ObserveError::UnspecifiedState(to),
        Fault::Terminal => ObserveError::TerminalState {
            current: from,
            observed: to,
        },
        Fault::Invalid => ObserveError::InvalidTransition { from, to },
    })
}

fn check_instance(
    id: &str,
    current: InstanceState,
    observed: InstanceState,
    policy: TransitionPolicy,
) -> Result<(), ObserveError> {
    let (from, to) = (current.as_str_name(), observed.as_str_name());
    check(current, observed, policy).map_err(|fault| match fault {
        Fault::Unspecified => ObserveError::InstanceUnspecified {
            id: id.to_string(),
            observed: to,
        },
        Fault::Terminal => ObserveError::InstanceTerminal {
            id: id.to_string(),
            current: from,
            observed: to,
        },
        Fault::Invalid => ObserveError::InstanceTransition {
            id: id.to_string(),
            from,
            to,
        },
    })
}

struct InstanceReport {
    changes: Vec<InstanceTransition>,
    dropped: Vec<String>,
    retained: Vec<InstanceStatus>,
}

/// Match replicas by id and check each one's own lifecycle.
///
/// Every replica must carry a specified state. Replicas without an id
/// cannot be tracked across observations; they are named by position in
/// errors. Terminal replicas that are no longer reported are retained.
fn check_instances(
    previous: &[InstanceStatus],
    observed: &[InstanceStatus],
    policy: TransitionPolicy,
) -> Result<InstanceReport, ObserveError> {
    let known: HashMap<&str, InstanceState> = previous
        .iter()
        .filter_map(|i| Some((i.id.as_deref()?, i.state())))
        .collect();

    let mut seen = HashSet::new();
    let mut changes = Vec::new();
    for (index, instance) in observed.iter().enumerate() {
        let state = instance.state();
        let Some(id) = instance.id.as_deref() else {
            if state.is_unspecified() {
                return Err(ObserveError::InstanceUnspecified {
                    id: format!("#{}", index),
                    observed: state.as_str_name(),
                });
            }
            continue;
        };
        if !seen.insert(id) {
            return Err(ObserveError::DuplicateInstance { id: id.to_string() });
        }
        let current = known.get(id).copied().unwrap_or_default();
        check_instance(id, current, state, policy)?;
        if current != state {
            changes.push(InstanceTransition {
                id: id.to_string(),
                from: known.get(id).map(|s| s.as_str_name()),
                to: state.as_str_name(),
            });
        }
    }

    let mut dropped = Vec::new();
    let mut retained = Vec::new();
    for instance in previous {
        let Some(id) = instance.id.as_deref() else {
            continue;
        };
        if seen.contains(id) {
            continue;
        }
        if instance.state().is_terminal() {
            retained.push(instance.clone());
        } else {
            dropped.push(id.to_string());
        }
    }
    dropped.sort();

    Ok(InstanceReport {
        changes,
        dropped,
        retained,
    })
}

/// Validate `next` against the resource's current status and install it.
///
/// Nothing is changed when an error is returned.
pub fn apply_observation<R: Resource>(
    resource: &mut R,
    mut next: R::Status,
    policy: TransitionPolicy,
) -> Result<Transition, ObserveError> {
    let current = resource.state();
    let observed = next.state();
    check_transition(current, observed, policy)?;

    let previous = resource
        .status()
        .map(ObservedStatus::instances)
        .unwrap_or(&[]);
    let report = check_instances(previous, next.instances(), policy)?;

    let retained: Vec<String> = report
        .retained
        .iter()
        .filter_map(|i| i.id.clone())
        .collect();
    if let Some(instances) = next.instances_mut() {
        instances.extend(report.retained);
    }

    resource.replace_status(next);
    Ok(Transition {
        from: current.as_str_name(),
        to: observed.as_str_name(),
        instances: report.changes,
        dropped: report.dropped,
        retained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Job, JobStatus};
    use crate::metadata::ResourceMetadata;
    use crate::state::JobState;

    fn job() -> Job {
        Job::from_parts(ResourceMetadata::named("project-e00", "train"), Default::default())
    }

    fn status(state: JobState) -> JobStatus {
        JobStatus {
            state: Some(state),
            ..Default::default()
        }
    }

    fn status_with(state: JobState, instances: Vec<InstanceStatus>) -> JobStatus {
        JobStatus {
            state: Some(state),
            instances,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_record_is_unspecified() {
        assert_eq!(job().state(), JobState::Unspecified);
    }

    #[test]
    fn test_first_observation_lands_anywhere() {
        let mut job = job();
        let t = apply_observation(&mut job, status(JobState::Running), TransitionPolicy::Strict)
            .unwrap();
        assert_eq!(t.from, "STATE_UNSPECIFIED");
        assert_eq!(t.to, "RUNNING");
        assert!(t.changed());
    }

    #[test]
    fn test_unspecified_observation_rejected() {
        let mut job = job();
        let err = apply_observation(&mut job, JobStatus::default(), TransitionPolicy::Strict)
            .unwrap_err();
        assert_eq!(err, ObserveError::UnspecifiedState("STATE_UNSPECIFIED"));
        assert!(job.status.is_none());
    }

    #[test]
    fn test_terminal_is_absorbing() {
        let mut job = job();
        apply_observation(&mut job, status(JobState::Completed), TransitionPolicy::Strict)
            .unwrap();

        let err = apply_observation(&mut job, status(JobState::Running), TransitionPolicy::Absorbing)
            .unwrap_err();
        assert_eq!(
            err,
            ObserveError::TerminalState {
                current: "COMPLETED",
                observed: "RUNNING"
            }
        );
        assert_eq!(job.state(), JobState::Completed);
    }

    #[test]
    fn test_same_state_reread_is_not_an_error() {
        let mut job = job();
        apply_observation(&mut job, status(JobState::Failed), TransitionPolicy::Strict).unwrap();
        let t = apply_observation(&mut job, status(JobState::Failed), TransitionPolicy::Strict)
            .unwrap();
        assert!(!t.changed());
    }

    #[test]
    fn test_strict_rejects_backwards_move() {
        let mut job = job();
        apply_observation(&mut job, status(JobState::Running), TransitionPolicy::Strict).unwrap();
        let err =
            apply_observation(&mut job, status(JobState::Provisioning), TransitionPolicy::Strict)
                .unwrap_err();
        assert_eq!(
            err,
            ObserveError::InvalidTransition {
                from: "RUNNING",
                to: "PROVISIONING"
            }
        );
    }

    #[test]
    fn test_absorbing_accepts_skipped_states() {
        let mut job = job();
        apply_observation(&mut job, status(JobState::Provisioning), TransitionPolicy::Strict)
            .unwrap();
        // PROVISIONING -> COMPLETED skips STARTING and RUNNING
        assert!(apply_observation(
            &mut job,
            status(JobState::Completed),
            TransitionPolicy::Strict
        )
        .is_err());
        apply_observation(&mut job, status(JobState::Completed), TransitionPolicy::Absorbing)
            .unwrap();
        assert_eq!(job.state(), JobState::Completed);
    }

    #[test]
    fn test_instances_tracked_by_id() {
        let mut job = job();
        apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![
                    InstanceStatus::new("i-0", InstanceState::Running),
                    InstanceStatus::new("i-1", InstanceState::Running),
                ],
            ),
            TransitionPolicy::Strict,
        )
        .unwrap();

        let t = apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![
                    InstanceStatus::new("i-0", InstanceState::Failed),
                    InstanceStatus::new("i-2", InstanceState::Starting),
                ],
            ),
            TransitionPolicy::Strict,
        )
        .unwrap();

        assert!(!t.changed());
        assert_eq!(
            t.instances,
            vec![
                InstanceTransition {
                    id: "i-0".to_string(),
                    from: Some("RUNNING"),
                    to: "FAILED"
                },
                InstanceTransition {
                    id: "i-2".to_string(),
                    from: None,
                    to: "STARTING"
                },
            ]
        );
        assert_eq!(t.dropped, vec!["i-1".to_string()]);
    }

    #[test]
    fn test_terminal_instance_cannot_revive() {
        let mut job = job();
        apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![InstanceStatus::new("i-0", InstanceState::Failed)],
            ),
            TransitionPolicy::Strict,
        )
        .unwrap();

        let err = apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![InstanceStatus::new("i-0", InstanceState::Running)],
            ),
            TransitionPolicy::Absorbing,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ObserveError::InstanceTerminal {
                id: "i-0".to_string(),
                current: "FAILED",
                observed: "RUNNING"
            }
        );
        // rejected observation leaves the old status in place
        assert_eq!(job.status().unwrap().instances[0].state(), InstanceState::Failed);
    }

    #[test]
    fn test_terminal_instance_survives_omission() {
        let mut job = job();
        apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![
                    InstanceStatus::new("i-0", InstanceState::Failed),
                    InstanceStatus::new("i-1", InstanceState::Running),
                ],
            ),
            TransitionPolicy::Strict,
        )
        .unwrap();

        let t = apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![InstanceStatus::new("i-1", InstanceState::Running)],
            ),
            TransitionPolicy::Strict,
        )
        .unwrap();
        assert!(t.dropped.is_empty());
        assert_eq!(t.retained, vec!["i-0".to_string()]);
        assert_eq!(job.status().unwrap().instances.len(), 2);

        // the retained replica still blocks a later revival
        let err = apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![
                    InstanceStatus::new("i-0", InstanceState::Running),
                    InstanceStatus::new("i-1", InstanceState::Running),
                ],
            ),
            TransitionPolicy::Absorbing,
        )
        .unwrap_err();
        assert!(matches!(err, ObserveError::InstanceTerminal { ref id, .. } if id == "i-0"));
    }

    #[test]
    fn test_instance_without_id_needs_a_state() {
        let mut job = job();
        let err = apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![
                    InstanceStatus::new("i-0", InstanceState::Running),
                    InstanceStatus::default(),
                ],
            ),
            TransitionPolicy::Strict,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ObserveError::InstanceUnspecified {
                id: "#1".to_string(),
                observed: "STATE_UNSPECIFIED"
            }
        );
        assert!(job.status.is_none());

        // an untracked replica with a state is passed through
        let anonymous = InstanceStatus {
            state: Some(InstanceState::Starting),
            ..Default::default()
        };
        let t = apply_observation(
            &mut job,
            status_with(JobState::Running, vec![anonymous]),
            TransitionPolicy::Strict,
        )
        .unwrap();
        assert!(t.instances.is_empty());
        assert_eq!(job.status().unwrap().instances.len(), 1);
    }

    #[test]
    fn test_duplicate_instance_ids_rejected() {
        let mut job = job();
        let err = apply_observation(
            &mut job,
            status_with(
                JobState::Running,
                vec![
                    InstanceStatus::new("i-0", InstanceState::Running),
                    InstanceStatus::new("i-0", InstanceState::Failed),
                ],
            ),
            TransitionPolicy::Absorbing,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ObserveError::DuplicateInstance {
                id: "i-0".to_string()
            }
        );
        assert!(job.status.is_none());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("absorbing".parse::<TransitionPolicy>(), Ok(TransitionPolicy::Absorbing));
        assert!("lenient".parse::<TransitionPolicy>().is_err());
        assert_eq!(TransitionPolicy::default(), TransitionPolicy::Strict);
    }
}
