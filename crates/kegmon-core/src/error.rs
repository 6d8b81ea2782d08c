// ── Core error types ──
//
// Remote failures stay as the funnel produced them (`DataError`); the
// other variants cover what can go wrong before or around a call.

use thiserror::Error;

use kegmon_api::{ClientBuildError, DataError, ErrorKind};

use crate::calibration::CalibrationError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Remote(#[from] DataError),

    #[error("Cannot build client: {0}")]
    Build(#[from] ClientBuildError),

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Calibration(CalibrationError),
}

impl From<CalibrationError> for CoreError {
    fn from(err: CalibrationError) -> Self {
        match err {
            CalibrationError::Remote(e) => Self::Remote(e),
            other => Self::Calibration(other),
        }
    }
}

impl CoreError {
    /// The remote failure behind this error, if any.
    pub fn remote(&self) -> Option<&DataError> {
        match self {
            Self::Remote(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.remote().is_some_and(DataError::is_unauthorized)
    }

    pub fn is_transport(&self) -> bool {
        self.remote()
            .is_some_and(|e| e.kind() == ErrorKind::Transport)
    }
}
