// ── Command dispatcher ──
//
// Sends named rpc commands to devices. Every named operation re-checks
// the command guard against the device's current state and skips the
// call (without error) when the guard fails. At most one named command
// is in flight per device id; a second one is skipped until the first
// settles.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tracing::{debug, info, warn};

use kegmon_api::{ApiClient, DataError};

use crate::guard::{self, DeviceCommand};
use crate::model::{Device, DeviceState};

/// Why a named command was not sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// The device's current state does not permit the command.
    NotAllowed {
        command: &'static str,
        state: DeviceState,
    },
    /// Calibration weight was not a positive finite number.
    InvalidWeight(f64),
    /// Another command for the same device has not settled yet.
    InFlight { pending: &'static str },
}

/// A calibration reference weight must be a positive finite number.
pub fn is_valid_weight(known_weight: f64) -> bool {
    known_weight.is_finite() && known_weight > 0.0
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAllowed { command, state } => {
                write!(f, "{command} is not allowed while the device is {state}")
            }
            Self::InvalidWeight(w) => write!(f, "calibration weight must be positive, got {w}"),
            Self::InFlight { pending } => write!(f, "{pending} is still in flight"),
        }
    }
}

/// Outcome of a named command that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// Sent; carries the server's authoritative device representation.
    Applied(Device),
    /// Not sent. No network call was made.
    Skipped(SkipReason),
}

impl Dispatched {
    pub fn device(&self) -> Option<&Device> {
        match self {
            Self::Applied(d) => Some(d),
            Self::Skipped(_) => None,
        }
    }

    pub fn into_device(self) -> Option<Device> {
        match self {
            Self::Applied(d) => Some(d),
            Self::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Issues device commands over an [`ApiClient`].
pub struct Dispatcher {
    client: Arc<ApiClient>,
    /// device id -> rpc name of the command currently in flight.
    in_flight: DashMap<String, &'static str>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            in_flight: DashMap::new(),
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Whether a named command for `device_id` is currently in flight.
    pub fn is_in_flight(&self, device_id: &str) -> bool {
        self.in_flight.contains_key(device_id)
    }

    // ── Primitive ────────────────────────────────────────────────────

    /// Send `command` to the device unguarded.
    pub async fn dispatch(
        &self,
        device_id: &str,
        command: &str,
        payload: &Value,
    ) -> Result<Device, DataError> {
        let resp = self.client.rpc(device_id, command, payload).await?;
        Ok(resp.into())
    }

    /// Fetch the authoritative representation of a device.
    pub async fn fetch(&self, device_id: &str) -> Result<Device, DataError> {
        Ok(self.client.get_device(device_id).await?.into())
    }

    // ── Guarded commands ─────────────────────────────────────────────

    /// Send a named command if the device's current state allows it.
    pub async fn execute(
        &self,
        device: &Device,
        command: DeviceCommand,
    ) -> Result<Dispatched, DataError> {
        let name = command.rpc_name();
        let state = device.state();

        if !guard::allowed(state, &command) {
            debug!(device = %device.id, command = name, %state, "command not allowed, skipping");
            return Ok(Dispatched::Skipped(SkipReason::NotAllowed {
                command: name,
                state,
            }));
        }

        if let DeviceCommand::Calibrate { known_weight } = command {
            if !is_valid_weight(known_weight) {
                warn!(device = %device.id, known_weight, "invalid calibration weight, skipping");
                return Ok(Dispatched::Skipped(SkipReason::InvalidWeight(known_weight)));
            }
        }

        let Some(_flight) = self.begin(&device.id, name) else {
            let pending = self.in_flight.get(&device.id).map_or(name, |p| *p);
            warn!(
                device = %device.id,
                command = name,
                pending,
                "command already in flight, skipping"
            );
            return Ok(Dispatched::Skipped(SkipReason::InFlight { pending }));
        };

        let updated = self
            .dispatch(&device.id, name, &command.payload())
            .await?;
        info!(device = %device.id, command = name, state = %updated.state(), "command applied");
        Ok(Dispatched::Applied(updated))
    }

    pub async fn enable_maintenance_mode(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::EnableMaintenanceMode)
            .await
    }

    pub async fn disable_maintenance_mode(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::DisableMaintenanceMode)
            .await
    }

    pub async fn enable_calibration_mode(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::EnableCalibrationMode)
            .await
    }

    pub async fn cancel_calibration_mode(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::CancelCalibrationMode)
            .await
    }

    /// Commit calibration. `known_weight` is the reference weight currently
    /// on the scale and must be positive.
    pub async fn calibrate(
        &self,
        device: &Device,
        known_weight: f64,
    ) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::Calibrate { known_weight })
            .await
    }

    pub async fn ping(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::Ping).await
    }

    pub async fn tare(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::Tare).await
    }

    pub async fn clear_memory(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::ClearMemory).await
    }

    pub async fn send_most_recent_sample(&self, device: &Device) -> Result<Dispatched, DataError> {
        self.execute(device, DeviceCommand::SendMostRecentSample)
            .await
    }

    // ── Single flight ────────────────────────────────────────────────

    fn begin(&self, device_id: &str, command: &'static str) -> Option<Flight<'_>> {
        match self.in_flight.entry(device_id.to_owned()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(command);
                Some(Flight {
                    in_flight: &self.in_flight,
                    device_id: device_id.to_owned(),
                })
            }
        }
    }
}

/// Clears the device's in-flight marker when the command settles or its
/// future is dropped.
struct Flight<'a> {
    in_flight: &'a DashMap<String, &'static str>,
    device_id: String,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.device_id);
    }
}
