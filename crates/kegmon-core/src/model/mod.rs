// ── Domain model ──
//
// Canonical device types, normalized from the wire representation in
// `kegmon_api::models`.

pub mod device;
pub mod state;

pub use device::{Device, DeviceType};
pub use state::{DeviceState, classify};
