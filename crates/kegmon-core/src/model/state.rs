// ── Device lifecycle state ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle state derived from a device's raw status code.
///
/// Never persisted; always recomputed with [`classify`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeviceState {
    Ready,
    ReadyNoService,
    CalibrationModeEnabled,
    Calibrating,
    MaintenanceModeEnabled,
    Unknown,
}

/// Map a raw status code to its lifecycle state. Total: unrecognized
/// codes are `Unknown`.
pub const fn classify(code: i64) -> DeviceState {
    match code {
        1 => DeviceState::Ready,
        2 => DeviceState::ReadyNoService,
        10 => DeviceState::CalibrationModeEnabled,
        11 => DeviceState::Calibrating,
        99 => DeviceState::MaintenanceModeEnabled,
        _ => DeviceState::Unknown,
    }
}

impl DeviceState {
    /// Inverse of [`classify`]. `None` for `Unknown`.
    pub const fn code(self) -> Option<i64> {
        match self {
            Self::Ready => Some(1),
            Self::ReadyNoService => Some(2),
            Self::CalibrationModeEnabled => Some(10),
            Self::Calibrating => Some(11),
            Self::MaintenanceModeEnabled => Some(99),
            Self::Unknown => None,
        }
    }

    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::ReadyNoService)
    }

    pub const fn is_calibrating(self) -> bool {
        matches!(self, Self::CalibrationModeEnabled | Self::Calibrating)
    }
}

impl From<i64> for DeviceState {
    fn from(code: i64) -> Self {
        classify(code)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(classify(1), DeviceState::Ready);
        assert_eq!(classify(2), DeviceState::ReadyNoService);
        assert_eq!(classify(10), DeviceState::CalibrationModeEnabled);
        assert_eq!(classify(11), DeviceState::Calibrating);
        assert_eq!(classify(99), DeviceState::MaintenanceModeEnabled);
    }

    #[test]
    fn everything_else_is_unknown() {
        for code in [-7, 0, 3, 9, 12, 98, 100, i64::MIN, i64::MAX] {
            assert_eq!(classify(code), DeviceState::Unknown, "code {code}");
        }
    }

    #[test]
    fn code_round_trips_for_known_states() {
        for state in DeviceState::iter() {
            match state.code() {
                Some(code) => assert_eq!(classify(code), state),
                None => assert_eq!(state, DeviceState::Unknown),
            }
        }
    }

    #[test]
    fn display_is_kebab_case() {
        assert_eq!(DeviceState::ReadyNoService.to_string(), "ready-no-service");
        assert_eq!(
            "maintenance-mode-enabled".parse::<DeviceState>().ok(),
            Some(DeviceState::MaintenanceModeEnabled)
        );
    }

    #[test]
    fn helpers() {
        assert!(DeviceState::ReadyNoService.is_ready());
        assert!(!DeviceState::MaintenanceModeEnabled.is_ready());
        assert!(DeviceState::Calibrating.is_calibrating());
        assert!(!DeviceState::Unknown.is_calibrating());
    }
}
