//! Lifecycle states of every resource kind
//!
//! Each enum lists its terminal and transient subsets and the allowed
//! successors of every specified, non-terminal state.

use crate::lifecycle::{proto_enum, Lifecycle};

proto_enum! {
    /// Serverless AI job state
    pub enum JobState {
        Unspecified = 0 => "STATE_UNSPECIFIED",
        /// Capacity is being allocated
        Provisioning = 1 => "PROVISIONING",
        /// Containers are being pulled and started
        Starting = 2 => "STARTING",
        /// Workload is executing
        Running = 3 => "RUNNING",
        /// Cancellation requested, not yet finished
        Cancelling = 4 => "CANCELLING",
        /// Workload exited successfully
        Completed = 5 => "COMPLETED",
        /// Workload exited with a failure
        Failed = 6 => "FAILED",
        /// Cancelled by the user
        Cancelled = 7 => "CANCELLED",
        /// Platform-side error
        Error = 8 => "ERROR",
        /// Being removed
        Deleting = 9 => "DELETING",
    }
}

impl Lifecycle for JobState {
    const TERMINAL: &'static [Self] = &[
        JobState::Completed,
        JobState::Failed,
        JobState::Cancelled,
        JobState::Error,
    ];

    const TRANSIENT: &'static [Self] = &[JobState::Cancelling, JobState::Deleting];

    fn successors(self) -> &'static [Self] {
        use JobState::*;
        match self {
            Provisioning => &[Starting, Cancelling, Failed, Cancelled, Error, Deleting],
            Starting => &[Running, Cancelling, Failed, Cancelled, Error, Deleting],
            Running => &[Completed, Failed, Cancelling, Cancelled, Error, Deleting],
            // Work may still finish while a cancel is in flight
            Cancelling => &[Cancelled, Completed, Failed, Error],
            Deleting => &[Error],
            Unspecified | Completed | Failed | Cancelled | Error => &[],
        }
    }
}

proto_enum! {
    /// Serverless AI endpoint state
    pub enum EndpointState {
        Unspecified = 0 => "STATE_UNSPECIFIED",
        Provisioning = 1 => "PROVISIONING",
        Starting = 2 => "STARTING",
        /// Serving traffic
        Running = 3 => "RUNNING",
        Stopping = 4 => "STOPPING",
        /// Stopped by the user; may be started again
        Stopped = 5 => "STOPPED",
        Error = 6 => "ERROR",
        Deleting = 7 => "DELETING",
    }
}

impl Lifecycle for EndpointState {
    const TERMINAL: &'static [Self] = &[EndpointState::Error];

    const TRANSIENT: &'static [Self] = &[EndpointState::Stopping, EndpointState::Deleting];

    fn successors(self) -> &'static [Self] {
        use EndpointState::*;
        match self {
            Provisioning => &[Starting, Error, Deleting],
            Starting => &[Running, Stopping, Error, Deleting],
            Running => &[Stopping, Error, Deleting],
            Stopping => &[Stopped, Error, Deleting],
            Stopped => &[Starting, Error, Deleting],
            Deleting => &[Error],
            Unspecified | Error => &[],
        }
    }
}

proto_enum! {
    /// State of one replica of a job or endpoint
    pub enum InstanceState {
        Unspecified = 0 => "STATE_UNSPECIFIED",
        Provisioning = 1 => "PROVISIONING",
        Starting = 2 => "STARTING",
        Running = 3 => "RUNNING",
        Stopping = 4 => "STOPPING",
        Stopped = 5 => "STOPPED",
        Completed = 6 => "COMPLETED",
        Failed = 7 => "FAILED",
        Error = 8 => "ERROR",
    }
}

impl Lifecycle for InstanceState {
    const TERMINAL: &'static [Self] = &[
        InstanceState::Stopped,
        InstanceState::Completed,
        InstanceState::Failed,
        InstanceState::Error,
    ];

    const TRANSIENT: &'static [Self] = &[InstanceState::Stopping];

    fn successors(self) -> &'static [Self] {
        use InstanceState::*;
        match self {
            Provisioning => &[Starting, Failed, Error],
            Starting => &[Running, Failed, Error],
            Running => &[Stopping, Completed, Failed, Error],
            Stopping => &[Stopped, Completed, Failed, Error],
            Unspecified | Stopped | Completed | Failed | Error => &[],
        }
    }
}

proto_enum! {
    /// Capacity block group state
    pub enum CapacityBlockGroupState {
        Unspecified = 0 => "STATE_UNSPECIFIED",
        Provisioning = 1 => "PROVISIONING",
        /// Capacity is reserved and usable
        Active = 2 => "ACTIVE",
        Deleting = 3 => "DELETING",
        /// Reservation window has ended
        Expired = 4 => "EXPIRED",
        Error = 5 => "ERROR",
    }
}

impl Lifecycle for CapacityBlockGroupState {
    const TERMINAL: &'static [Self] = &[
        CapacityBlockGroupState::Expired,
        CapacityBlockGroupState::Error,
    ];

    const TRANSIENT: &'static [Self] = &[CapacityBlockGroupState::Deleting];

    fn successors(self) -> &'static [Self] {
        use CapacityBlockGroupState::*;
        match self {
            Provisioning => &[Active, Error],
            Active => &[Expired, Deleting, Error],
            Deleting => &[Error],
            Unspecified | Expired | Error => &[],
        }
    }
}

proto_enum! {
    /// Capacity interval state
    pub enum CapacityIntervalState {
        Unspecified = 0 => "STATE_UNSPECIFIED",
        /// Interval has not started yet
        Scheduled = 1 => "SCHEDULED",
        Active = 2 => "ACTIVE",
        Expired = 3 => "EXPIRED",
        Cancelled = 4 => "CANCELLED",
        Error = 5 => "ERROR",
    }
}

impl Lifecycle for CapacityIntervalState {
    const TERMINAL: &'static [Self] = &[
        CapacityIntervalState::Expired,
        CapacityIntervalState::Cancelled,
        CapacityIntervalState::Error,
    ];

    const TRANSIENT: &'static [Self] = &[];

    fn successors(self) -> &'static [Self] {
        use CapacityIntervalState::*;
        match self {
            Scheduled => &[Active, Cancelled, Error],
            Active => &[Expired, Error],
            Unspecified | Expired | Cancelled | Error => &[],
        }
    }
}

proto_enum! {
    /// Audit event export operation state
    pub enum AuditEventExportState {
        Unspecified = 0 => "STATE_UNSPECIFIED",
        Provisioning = 1 => "PROVISIONING",
        /// Events are being written to the destination
        Running = 2 => "RUNNING",
        Cancelling = 3 => "CANCELLING",
        Completed = 4 => "COMPLETED",
        Failed = 5 => "FAILED",
        Cancelled = 6 => "CANCELLED",
        Error = 7 => "ERROR",
    }
}

impl Lifecycle for AuditEventExportState {
    const TERMINAL: &'static [Self] = &[
        AuditEventExportState::Completed,
        AuditEventExportState::Failed,
        AuditEventExportState::Cancelled,
        AuditEventExportState::Error,
    ];

    const TRANSIENT: &'static [Self] = &[AuditEventExportState::Cancelling];

    fn successors(self) -> &'static [Self] {
        use AuditEventExportState::*;
        match self {
            Provisioning => &[Running, Cancelling, Failed, Error],
            Running => &[Completed, Failed, Cancelling, Error],
            Cancelling => &[Cancelled, Completed, Failed, Error],
            Unspecified | Completed | Failed | Cancelled | Error => &[],
        }
    }
}
