// ── Command guard ──
//
// The single source of truth for which named command may be sent to a
// device in which lifecycle state. The dispatcher checks it before every
// call; front-ends use it to decide which actions to offer.

use serde_json::{Value, json};

use crate::model::DeviceState;

/// A named, guarded device command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    EnableMaintenanceMode,
    DisableMaintenanceMode,
    EnableCalibrationMode,
    CancelCalibrationMode,
    /// Commit calibration against a reference weight on the scale.
    Calibrate { known_weight: f64 },
    Ping,
    Tare,
    ClearMemory,
    SendMostRecentSample,
}

const READY: &[DeviceState] = &[DeviceState::Ready, DeviceState::ReadyNoService];
const MAINTENANCE: &[DeviceState] = &[DeviceState::MaintenanceModeEnabled];
const CALIBRATION: &[DeviceState] = &[DeviceState::CalibrationModeEnabled];
const TARE: &[DeviceState] = &[
    DeviceState::Ready,
    DeviceState::ReadyNoService,
    DeviceState::MaintenanceModeEnabled,
];

impl DeviceCommand {
    /// Command name in `POST /devices/{id}/rpc/{name}`.
    pub const fn rpc_name(&self) -> &'static str {
        match self {
            Self::EnableMaintenanceMode => "start_maintenance_mode",
            Self::DisableMaintenanceMode => "stop_maintenance_mode",
            Self::EnableCalibrationMode => "start_calibration",
            Self::CancelCalibrationMode => "cancel_calibration",
            Self::Calibrate { .. } => "calibrate",
            Self::Ping => "ping",
            Self::Tare => "tare",
            Self::ClearMemory => "clear_memory",
            Self::SendMostRecentSample => "send_most_recent_sample",
        }
    }

    /// JSON body sent with the command.
    pub fn payload(&self) -> Value {
        match self {
            Self::Calibrate { known_weight } => json!({ "knownWeight": known_weight }),
            _ => json!({}),
        }
    }

    /// States the command may be issued from. `None` means any state.
    pub const fn allowed_states(&self) -> Option<&'static [DeviceState]> {
        match self {
            Self::EnableMaintenanceMode
            | Self::EnableCalibrationMode
            | Self::SendMostRecentSample => Some(READY),
            Self::DisableMaintenanceMode | Self::ClearMemory => Some(MAINTENANCE),
            Self::CancelCalibrationMode | Self::Calibrate { .. } => Some(CALIBRATION),
            Self::Tare => Some(TARE),
            Self::Ping => None,
        }
    }
}

/// Whether `command` may be sent to a device currently in `state`.
pub fn allowed(state: DeviceState, command: &DeviceCommand) -> bool {
    command
        .allowed_states()
        .is_none_or(|states| states.contains(&state))
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn maintenance_commands() {
        let enable = DeviceCommand::EnableMaintenanceMode;
        assert!(allowed(DeviceState::Ready, &enable));
        assert!(allowed(DeviceState::ReadyNoService, &enable));
        assert!(!allowed(DeviceState::MaintenanceModeEnabled, &enable));
        assert!(!allowed(DeviceState::CalibrationModeEnabled, &enable));

        let disable = DeviceCommand::DisableMaintenanceMode;
        assert!(allowed(DeviceState::MaintenanceModeEnabled, &disable));
        assert!(!allowed(DeviceState::Ready, &disable));
    }

    #[test]
    fn calibration_commands_need_calibration_mode() {
        for cmd in [
            DeviceCommand::CancelCalibrationMode,
            DeviceCommand::Calibrate { known_weight: 12.5 },
        ] {
            for state in DeviceState::iter() {
                assert_eq!(
                    allowed(state, &cmd),
                    state == DeviceState::CalibrationModeEnabled,
                    "{cmd:?} in {state}"
                );
            }
        }
    }

    #[test]
    fn nothing_guarded_is_allowed_while_calibrating_or_unknown() {
        let guarded = [
            DeviceCommand::EnableMaintenanceMode,
            DeviceCommand::DisableMaintenanceMode,
            DeviceCommand::EnableCalibrationMode,
            DeviceCommand::CancelCalibrationMode,
            DeviceCommand::Calibrate { known_weight: 1.0 },
            DeviceCommand::Tare,
            DeviceCommand::ClearMemory,
            DeviceCommand::SendMostRecentSample,
        ];
        for cmd in &guarded {
            assert!(!allowed(DeviceState::Calibrating, cmd));
            assert!(!allowed(DeviceState::Unknown, cmd));
        }
    }

    #[test]
    fn ping_is_always_allowed() {
        for state in DeviceState::iter() {
            assert!(allowed(state, &DeviceCommand::Ping));
        }
    }

    #[test]
    fn calibrate_payload_carries_known_weight() {
        let cmd = DeviceCommand::Calibrate { known_weight: 12.5 };
        assert_eq!(cmd.rpc_name(), "calibrate");
        assert_eq!(cmd.payload(), json!({ "knownWeight": 12.5 }));
        assert_eq!(DeviceCommand::Tare.payload(), json!({}));
    }
}
