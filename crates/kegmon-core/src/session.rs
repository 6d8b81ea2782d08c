// ── Session facade ──
//
// One authenticated conversation with a kegmon server: owns the API
// client (and with it the cookie jar and unauthorized registry) and the
// dispatcher. Cheap to clone.

use std::sync::Arc;

use tracing::{debug, info, warn};

use kegmon_api::{
    ApiClient, DataError, DeviceMeasurement, DeviceUpdate, Navigator, NewDevice, NewUser,
    SubscriptionId, UserResponse, UserUpdate,
};

use crate::calibration::{CalibrationError, CalibrationWorkflow};
use crate::config::SessionConfig;
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::model::{Device, DeviceState};

#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    config: SessionConfig,
    client: Arc<ApiClient>,
    dispatcher: Arc<Dispatcher>,
}

impl Session {
    /// Build the client without talking to the server.
    pub fn new(config: SessionConfig, navigator: Arc<dyn Navigator>) -> Result<Self, CoreError> {
        let client = Arc::new(ApiClient::new(
            config.url.as_str(),
            &config.transport(),
            navigator,
        )?);
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&client)));

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                client,
                dispatcher,
            }),
        })
    }

    /// Build the client and log in with the configured credentials.
    pub async fn connect(
        config: SessionConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, CoreError> {
        let session = Self::new(config, navigator)?;
        session.login().await?;
        Ok(session)
    }

    pub async fn login(&self) -> Result<(), CoreError> {
        let Some(creds) = &self.inner.config.credentials else {
            return Err(CoreError::Config {
                message: "no login credentials configured".into(),
            });
        };
        self.inner
            .client
            .login(&creds.email, &creds.password)
            .await?;
        info!(server = %self.inner.config.url, "connected");
        Ok(())
    }

    /// Log out (best effort) and tear down the unauthorized registry.
    pub async fn close(&self) {
        if let Err(e) = self.inner.client.logout().await {
            warn!(error = %e, "logout failed");
        }
        self.inner.client.shutdown();
        debug!("session closed");
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.inner.client
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    /// Subscribe to session rejections (HTTP 401 on any call).
    pub fn on_unauthorized<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DataError) + Send + Sync + 'static,
    {
        self.inner.client.unauthorized().register(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.client.unauthorized().unregister(id)
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn devices(&self) -> Result<Vec<Device>, CoreError> {
        let devices = self.inner.client.list_devices().await?;
        Ok(devices.into_iter().map(Device::from).collect())
    }

    pub async fn device(&self, id: &str) -> Result<Device, CoreError> {
        self.inner
            .client
            .get_device(id)
            .await
            .map(Device::from)
            .map_err(|e| not_found(e, id))
    }

    pub async fn find_devices(&self, chip_id: &str) -> Result<Vec<Device>, CoreError> {
        let devices = self.inner.client.find_devices(chip_id).await?;
        Ok(devices.into_iter().map(Device::from).collect())
    }

    /// Create a device. The caller appends it to any collection it keeps.
    pub async fn create_device(&self, device: &NewDevice) -> Result<Device, CoreError> {
        Ok(self.inner.client.create_device(device).await?.into())
    }

    pub async fn update_device(
        &self,
        id: &str,
        update: &DeviceUpdate,
    ) -> Result<Device, CoreError> {
        self.inner
            .client
            .update_device(id, update)
            .await
            .map(Device::from)
            .map_err(|e| not_found(e, id))
    }

    pub async fn delete_device(&self, id: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .delete_device(id)
            .await
            .map_err(|e| not_found(e, id))
    }

    /// Recorded measurements of a device, as the server orders them.
    pub async fn measurements(&self, id: &str) -> Result<Vec<DeviceMeasurement>, CoreError> {
        self.inner
            .client
            .list_measurements(id)
            .await
            .map_err(|e| not_found(e, id))
    }

    /// Manufacturer-side details, optionally one key of them.
    pub async fn manufacturer_info(
        &self,
        id: &str,
        key: Option<&str>,
    ) -> Result<serde_json::Value, CoreError> {
        self.inner
            .client
            .manufacturer_info(id, key)
            .await
            .map_err(|e| not_found(e, id))
    }

    // ── Users ────────────────────────────────────────────────────────

    pub async fn users(&self) -> Result<Vec<UserResponse>, CoreError> {
        Ok(self.inner.client.list_users().await?)
    }

    pub async fn user(&self, id: &str) -> Result<UserResponse, CoreError> {
        self.inner
            .client
            .get_user(id)
            .await
            .map_err(|e| user_not_found(e, id))
    }

    /// The account this session is logged in as.
    pub async fn current_user(&self) -> Result<UserResponse, CoreError> {
        Ok(self.inner.client.current_user().await?)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<UserResponse, CoreError> {
        Ok(self.inner.client.create_user(user).await?)
    }

    pub async fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<UserResponse, CoreError> {
        self.inner
            .client
            .update_user(id, update)
            .await
            .map_err(|e| user_not_found(e, id))
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .delete_user(id)
            .await
            .map_err(|e| user_not_found(e, id))
    }

    pub async fn api_key(&self, user_id: &str) -> Result<Option<String>, CoreError> {
        self.inner
            .client
            .get_api_key(user_id)
            .await
            .map_err(|e| user_not_found(e, user_id))
    }

    /// Issue an API key, replacing any existing one when `regenerate` is set.
    pub async fn issue_api_key(
        &self,
        user_id: &str,
        regenerate: bool,
    ) -> Result<String, CoreError> {
        self.inner
            .client
            .issue_api_key(user_id, regenerate)
            .await
            .map_err(|e| user_not_found(e, user_id))
    }

    pub async fn revoke_api_key(&self, user_id: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .revoke_api_key(user_id)
            .await
            .map_err(|e| user_not_found(e, user_id))
    }

    // ── Calibration ──────────────────────────────────────────────────

    /// Workflow for `device`: fresh if the device is not yet calibrating,
    /// resumed if it is already in calibration mode.
    pub fn calibration(&self, device: Device) -> Result<CalibrationWorkflow, CalibrationError> {
        let dispatcher = Arc::clone(&self.inner.dispatcher);
        if device.state() == DeviceState::CalibrationModeEnabled {
            CalibrationWorkflow::resume(dispatcher, device)
        } else {
            Ok(CalibrationWorkflow::new(dispatcher, device))
        }
    }
}

fn not_found(err: DataError, id: &str) -> CoreError {
    if err.is_not_found() {
        CoreError::DeviceNotFound {
            identifier: id.to_owned(),
        }
    } else {
        CoreError::Remote(err)
    }
}

fn user_not_found(err: DataError, id: &str) -> CoreError {
    if err.is_not_found() {
        CoreError::NotFound {
            entity_type: "user".into(),
            identifier: id.to_owned(),
        }
    } else {
        CoreError::Remote(err)
    }
}
