// ── API-to-domain type conversions ──
//
// Bridges raw `kegmon_api` response types into `kegmon_core::model`
// domain types, filling defaults for fields the server left out.

use kegmon_api::DeviceResponse;

use crate::model::{Device, DeviceType};

impl From<DeviceResponse> for Device {
    fn from(d: DeviceResponse) -> Self {
        let device_type = d
            .device_type
            .as_deref()
            .map(str::to_ascii_lowercase)
            .and_then(|t| t.parse().ok())
            .unwrap_or(DeviceType::Unknown);

        Self {
            id: d.id,
            name: d.name.unwrap_or_default(),
            chip_type: d.chip_type,
            chip_id: d.chip_id,
            chip_model: d.chip_model,
            device_type,
            offset: d.offset,
            offset_unit: d.offset_unit,
            measurement_count: d.measurement_count.unwrap_or(0),
            latest_measurement: d.latest_measurement,
            latest_measurement_unit: d.latest_measurement_unit,
            latest_measurement_taken_on: d.latest_measurement_taken_on,
            percent_remaining: d.percent_remaining,
            total_volume_remaining: d.total_volume_remaining,
            empty_keg_weight: d.empty_keg_weight,
            empty_keg_weight_unit: d.empty_keg_weight_unit,
            start_volume: d.start_volume,
            start_volume_unit: d.start_volume_unit,
            display_volume_unit: d.display_volume_unit,
            online: d.online.unwrap_or(false),
            // A missing code classifies as Unknown.
            state_code: d.state.unwrap_or(0),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::DeviceState;

    fn wire(value: serde_json::Value) -> DeviceResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_device_converts() {
        let dev: Device = wire(json!({
            "id": "d1",
            "name": "Porter",
            "deviceType": "Weight",
            "measurementCount": 12,
            "online": true,
            "state": 10,
        }))
        .into();

        assert_eq!(dev.name, "Porter");
        assert_eq!(dev.device_type, DeviceType::Weight);
        assert_eq!(dev.measurement_count, 12);
        assert!(dev.online);
        assert_eq!(dev.state(), DeviceState::CalibrationModeEnabled);
    }

    #[test]
    fn sparse_device_gets_defaults() {
        let dev: Device = wire(json!({ "id": "d2", "deviceType": "kegerator" })).into();

        assert_eq!(dev.name, "");
        assert_eq!(dev.device_type, DeviceType::Unknown);
        assert!(!dev.online);
        assert_eq!(dev.state(), DeviceState::Unknown);
    }
}
