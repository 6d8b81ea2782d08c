// kegmon-api: Async Rust client for the kegmon device and user API.
//
// Every failed request funnels through `ErrorFunnel`, which produces the
// single `DataError` value callers see and fires the session-level side
// effects (unauthorized broadcast, login redirect workaround).

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod funnel;
pub mod models;
pub mod navigator;
pub mod transport;
pub mod unauthorized;
pub mod users;

pub use client::ApiClient;
pub use error::{ClientBuildError, DataError, ErrorKind};
pub use funnel::{ErrorFunnel, RawFailure};
pub use models::{
    DeviceMeasurement, DeviceResponse, DeviceUpdate, NewDevice, NewUser, UserResponse, UserUpdate,
};
pub use navigator::{LogNavigator, Navigator};
pub use transport::{TlsMode, TransportConfig};
pub use unauthorized::{SubscriptionId, UnauthorizedRegistry};
