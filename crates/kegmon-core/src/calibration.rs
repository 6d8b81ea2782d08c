// ── Calibration workflow ──
//
// enter -> commit | cancel, driven through the dispatcher. Every device
// the server hands back is reconciled into the caller's collection.
//
//   Idle --enter--> Entering --ok--> CalibrationActive
//                            --err/skip--> Idle
//   CalibrationActive --commit--> Committing --ok--> Closed
//                                            --err--> (re-fetch) CalibrationActive
//   CalibrationActive --cancel--> Cancelling --ok--> Closed
//                                            --err--> CalibrationActive

use std::sync::Arc;

use strum::Display;
use thiserror::Error;
use tracing::{debug, info, warn};

use kegmon_api::DataError;

use crate::dispatcher::{Dispatched, Dispatcher, SkipReason};
use crate::model::{Device, DeviceState};
use crate::reconcile::{DeviceSlot, reconcile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    Idle,
    Entering,
    CalibrationActive,
    Committing,
    Cancelling,
    Closed,
}

/// Result of a workflow step that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The command was applied; the workflow moved on.
    Advanced(Phase),
    /// The dispatcher skipped the command; the phase is unchanged.
    Skipped(SkipReason),
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("calibration step requires phase {expected}, workflow is {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("device {device} is {state}, not in calibration mode")]
    NotInCalibrationMode { device: String, state: DeviceState },

    #[error(transparent)]
    Remote(#[from] DataError),
}

/// One calibration session for one device.
///
/// Dropping a step's future mid-flight leaves the workflow in its
/// transitional phase; later steps then fail with `InvalidPhase`.
#[derive(Debug)]
pub struct CalibrationWorkflow {
    dispatcher: Arc<Dispatcher>,
    device: Device,
    phase: Phase,
}

impl CalibrationWorkflow {
    /// Start a workflow for a device that is not yet in calibration mode.
    pub fn new(dispatcher: Arc<Dispatcher>, device: Device) -> Self {
        Self {
            dispatcher,
            device,
            phase: Phase::Idle,
        }
    }

    /// Pick up a device that is already in calibration mode.
    pub fn resume(dispatcher: Arc<Dispatcher>, device: Device) -> Result<Self, CalibrationError> {
        let state = device.state();
        if state != DeviceState::CalibrationModeEnabled {
            return Err(CalibrationError::NotInCalibrationMode {
                device: device.id,
                state,
            });
        }
        Ok(Self {
            dispatcher,
            device,
            phase: Phase::CalibrationActive,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The workflow's current view of the device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn into_device(self) -> Device {
        self.device
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Put the device into calibration mode.
    pub async fn enter<E: DeviceSlot>(
        &mut self,
        collection: &mut [E],
    ) -> Result<Step, CalibrationError> {
        self.expect_phase(Phase::Idle)?;
        self.phase = Phase::Entering;

        let outcome = self
            .dispatcher
            .enable_calibration_mode(&self.device)
            .await;
        match outcome {
            Ok(Dispatched::Applied(device)) => {
                self.adopt(device, collection);
                self.phase = Phase::CalibrationActive;
                info!(device = %self.device.id, "calibration mode entered");
                Ok(Step::Advanced(self.phase))
            }
            Ok(Dispatched::Skipped(reason)) => {
                self.phase = Phase::Idle;
                Ok(Step::Skipped(reason))
            }
            Err(e) => {
                self.phase = Phase::Idle;
                Err(e.into())
            }
        }
    }

    /// Calibrate against `known_weight` and close the workflow.
    ///
    /// On failure the device is re-fetched so the workflow shows what the
    /// server now believes, and the workflow stays open for a retry.
    pub async fn commit<E: DeviceSlot>(
        &mut self,
        known_weight: f64,
        collection: &mut [E],
    ) -> Result<Step, CalibrationError> {
        self.expect_phase(Phase::CalibrationActive)?;
        self.phase = Phase::Committing;

        let outcome = self
            .dispatcher
            .calibrate(&self.device, known_weight)
            .await;
        match outcome {
            Ok(Dispatched::Applied(device)) => {
                self.adopt(device, collection);
                self.phase = Phase::Closed;
                info!(device = %self.device.id, known_weight, "calibration committed");
                Ok(Step::Advanced(self.phase))
            }
            Ok(Dispatched::Skipped(reason)) => {
                self.phase = Phase::CalibrationActive;
                Ok(Step::Skipped(reason))
            }
            Err(e) => {
                warn!(
                    device = %self.device.id,
                    error = %e,
                    "calibration failed, refreshing device"
                );
                match self.dispatcher.fetch(&self.device.id).await {
                    Ok(device) => self.adopt(device, collection),
                    Err(refresh) => {
                        warn!(
                            device = %self.device.id,
                            error = %refresh,
                            "refresh after failed calibration also failed"
                        );
                    }
                }
                self.phase = Phase::CalibrationActive;
                Err(e.into())
            }
        }
    }

    /// Leave calibration mode without committing.
    pub async fn cancel<E: DeviceSlot>(
        &mut self,
        collection: &mut [E],
    ) -> Result<Step, CalibrationError> {
        self.expect_phase(Phase::CalibrationActive)?;
        self.phase = Phase::Cancelling;

        let outcome = self
            .dispatcher
            .cancel_calibration_mode(&self.device)
            .await;
        match outcome {
            Ok(Dispatched::Applied(device)) => {
                self.adopt(device, collection);
                self.phase = Phase::Closed;
                info!(device = %self.device.id, "calibration cancelled");
                Ok(Step::Advanced(self.phase))
            }
            Ok(Dispatched::Skipped(reason)) => {
                self.phase = Phase::CalibrationActive;
                Ok(Step::Skipped(reason))
            }
            Err(e) => {
                self.phase = Phase::CalibrationActive;
                Err(e.into())
            }
        }
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), CalibrationError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CalibrationError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn adopt<E: DeviceSlot>(&mut self, device: Device, collection: &mut [E]) {
        if !reconcile(collection, &device) {
            debug!(device = %device.id, "calibrated device not in collection");
        }
        self.device = device;
    }
}
