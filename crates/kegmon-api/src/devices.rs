// Device endpoints
//
// CRUD under /devices plus the generic rpc dispatch
// POST /devices/{id}/rpc/{command}.

use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::DataError;
use crate::models::{DeviceMeasurement, DeviceResponse, DeviceUpdate, NewDevice};

impl ApiClient {
    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceResponse>, DataError> {
        // A server with no devices may answer `null`.
        let devices: Option<Vec<DeviceResponse>> = self.get(self.endpoint(&["devices"])).await?;
        Ok(devices.unwrap_or_default())
    }

    /// `GET /devices/{id}`
    pub async fn get_device(&self, id: &str) -> Result<DeviceResponse, DataError> {
        self.get(self.endpoint(&["devices", id])).await
    }

    /// Look up devices by chip id.
    ///
    /// `GET /devices/find?chip_id=...`
    pub async fn find_devices(&self, chip_id: &str) -> Result<Vec<DeviceResponse>, DataError> {
        self.get_with_params(self.endpoint(&["devices", "find"]), &[("chip_id", chip_id)])
            .await
    }

    /// `POST /devices`
    pub async fn create_device(&self, device: &NewDevice) -> Result<DeviceResponse, DataError> {
        debug!(name = %device.name, chip_id = %device.chip_id, "creating device");
        self.post(self.endpoint(&["devices"]), device).await
    }

    /// `PATCH /devices/{id}`
    pub async fn update_device(
        &self,
        id: &str,
        update: &DeviceUpdate,
    ) -> Result<DeviceResponse, DataError> {
        self.patch(self.endpoint(&["devices", id]), update).await
    }

    /// `DELETE /devices/{id}`
    pub async fn delete_device(&self, id: &str) -> Result<(), DataError> {
        let _: Value = self.delete(self.endpoint(&["devices", id])).await?;
        Ok(())
    }

    /// Run a named command on a device and return its new representation.
    ///
    /// `POST /devices/{id}/rpc/{command}` with `payload` as the JSON body.
    pub async fn rpc(
        &self,
        id: &str,
        command: &str,
        payload: &Value,
    ) -> Result<DeviceResponse, DataError> {
        debug!(device = id, command, "device rpc");
        self.post(self.endpoint(&["devices", id, "rpc", command]), payload)
            .await
    }

    /// Measurement history of a device.
    ///
    /// `GET /devices/{id}/measurements/`
    pub async fn list_measurements(&self, id: &str) -> Result<Vec<DeviceMeasurement>, DataError> {
        let measurements: Option<Vec<DeviceMeasurement>> = self
            .get(self.endpoint(&["devices", id, "measurements", ""]))
            .await?;
        Ok(measurements.unwrap_or_default())
    }

    /// Manufacturer-side details for a device, optionally narrowed to one key
    /// (`get_details`, `get_description`, `supports_status_check`, `online`).
    ///
    /// `GET /devices/{id}/manufacturer_info[/{key}]`
    pub async fn manufacturer_info(&self, id: &str, key: Option<&str>) -> Result<Value, DataError> {
        let url = match key {
            Some(key) => self.endpoint(&["devices", id, "manufacturer_info", key]),
            None => self.endpoint(&["devices", id, "manufacturer_info"]),
        };
        self.get(url).await
    }
}
