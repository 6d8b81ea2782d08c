//! Device lifecycle layer between `kegmon-api` and front-ends.
//!
//! - **[`Session`]**: facade owning the API client and the dispatcher;
//!   [`connect()`](Session::connect) logs in with the configured credentials.
//!
//! - **[`Dispatcher`]**: sends named device commands. Each one is checked
//!   against [`guard::allowed`] first and skipped, not failed, when the
//!   device's state forbids it. One command in flight per device.
//!
//! - **[`reconcile()`]**: folds a fresh device into a caller-owned list by id.
//!
//! - **[`CalibrationWorkflow`]**: enter / commit / cancel on top of the
//!   dispatcher and the reconciler.
//!
//! - **Domain model** ([`model`]): [`Device`] with its derived
//!   [`DeviceState`] ([`classify`]).

pub mod calibration;
pub mod config;
pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod model;
pub mod reconcile;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use calibration::{CalibrationError, CalibrationWorkflow, Phase, Step};
pub use config::{Credentials, SessionConfig, TlsVerification};
pub use dispatcher::{Dispatched, Dispatcher, SkipReason, is_valid_weight};
pub use error::CoreError;
pub use guard::{DeviceCommand, allowed};
pub use model::{Device, DeviceState, DeviceType, classify};
pub use reconcile::{DeviceEntry, DeviceSlot, reconcile};
pub use session::Session;

// API types that appear in this crate's signatures.
pub use kegmon_api::{
    DataError, DeviceMeasurement, DeviceUpdate, ErrorKind, LogNavigator, Navigator, NewDevice,
    NewUser, SubscriptionId, UserResponse, UserUpdate,
};
