//! Top-level error type of the library and the `rstatus` binary

use rstatus_model::{ModelError, ObserveError};

use crate::config::ConfigError;
use crate::store::StoreError;

/// Exit code for general failures
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for bad usage or invalid configuration
pub const EXIT_USAGE: i32 = 2;

/// Exit code for an observation rejected by the lifecycle rules
pub const EXIT_REJECTED: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid field mask: {0}")]
    Mask(#[from] rstatus_fieldmask::Error),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<ObserveError> for Error {
    fn from(err: ObserveError) -> Self {
        Error::Model(ModelError::Observe(err))
    }
}

impl Error {
    /// True when the lifecycle rules refused an observation
    pub fn is_rejected_observation(&self) -> bool {
        matches!(self, Error::Model(ModelError::Observe(_)))
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Model(ModelError::Observe(_)) => EXIT_REJECTED,
            Error::Config(_) | Error::Usage(_) | Error::Model(ModelError::UnknownKind(_)) => {
                EXIT_USAGE
            }
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let rejected: Error = ObserveError::UnspecifiedState("job").into();
        assert!(rejected.is_rejected_observation());
        assert_eq!(rejected.exit_code(), EXIT_REJECTED);

        let config: Error = ConfigError::ValidationError("log.level".to_string()).into();
        assert_eq!(config.exit_code(), EXIT_USAGE);

        let kind: Error = "bucket".parse::<rstatus_model::ResourceKind>().unwrap_err().into();
        assert_eq!(kind.exit_code(), EXIT_USAGE);

        let store: Error = StoreError::InvalidId("..".to_string()).into();
        assert_eq!(store.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_observe_error_message_is_transparent() {
        let err: Error = ObserveError::UnspecifiedState("job").into();
        assert_eq!(err.to_string(), ObserveError::UnspecifiedState("job").to_string());
    }
}
