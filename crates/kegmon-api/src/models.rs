// Wire types for the kegmon JSON API.
//
// The server emits camelCase keys and omits fields freely (measurement
// statistics are absent until a device has reported, calibration fields
// only exist on weight devices), so everything except `id` defaults.

use serde::{Deserialize, Serialize};

// ── Device ───────────────────────────────────────────────────────────

/// Device as returned by `/devices` and `/devices/{id}/rpc/{command}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub chip_type: Option<String>,
    #[serde(default)]
    pub chip_id: Option<String>,
    #[serde(default)]
    pub chip_model: Option<String>,
    /// `"weight"` or `"flow"`.
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub offset_unit: Option<String>,
    #[serde(default)]
    pub measurement_count: Option<u64>,
    #[serde(default)]
    pub latest_measurement: Option<f64>,
    #[serde(default)]
    pub latest_measurement_unit: Option<String>,
    /// ISO-8601, sometimes without an offset.
    #[serde(default)]
    pub latest_measurement_taken_on: Option<String>,
    #[serde(default)]
    pub percent_remaining: Option<f64>,
    #[serde(default)]
    pub total_volume_remaining: Option<f64>,
    #[serde(default)]
    pub empty_keg_weight: Option<f64>,
    #[serde(default)]
    pub empty_keg_weight_unit: Option<String>,
    #[serde(default)]
    pub start_volume: Option<f64>,
    #[serde(default)]
    pub start_volume_unit: Option<String>,
    #[serde(default)]
    pub display_volume_unit: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    /// Raw lifecycle code (1, 2, 10, 11, 99, ...).
    #[serde(default)]
    pub state: Option<i64>,
}

/// Body for `POST /devices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub name: String,
    pub chip_id: String,
    pub device_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_keg_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_keg_weight_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_volume_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_volume_unit: Option<String>,
}

/// Body for `PATCH /devices/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_keg_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_keg_weight_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_volume_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_volume_unit: Option<String>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── Measurement ──────────────────────────────────────────────────────

/// One reading from `/devices/{id}/measurements/`.
///
/// This endpoint is marshalled without the camelCase transform, so keys
/// arrive in snake_case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMeasurement {
    pub id: String,
    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,
    pub measurement: f64,
    #[serde(default)]
    pub unit: Option<String>,
    /// ISO-8601, sometimes without an offset.
    #[serde(default, alias = "takenOn")]
    pub taken_on: Option<String>,
}

// ── User ─────────────────────────────────────────────────────────────

/// User record from `/users`. `admin` and `apiKey` are filtered by the
/// server depending on who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub admin: Option<bool>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub password_enabled: Option<bool>,
}

/// Body for `POST /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body for `PATCH /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn sparse_device_decodes() {
        let dev: DeviceResponse = serde_json::from_value(json!({ "id": "d1" })).unwrap();
        assert_eq!(dev.id, "d1");
        assert_eq!(dev.state, None);
        assert_eq!(dev.device_type, None);
    }

    #[test]
    fn device_fields_are_camel_case() {
        let dev: DeviceResponse = serde_json::from_value(json!({
            "id": "d1",
            "name": "Porter",
            "chipId": "e00fce68",
            "deviceType": "weight",
            "emptyKegWeight": 4400.0,
            "latestMeasurementTakenOn": "2024-05-01T12:00:00",
            "online": true,
            "state": 99,
        }))
        .unwrap();

        assert_eq!(dev.chip_id.as_deref(), Some("e00fce68"));
        assert_eq!(dev.empty_keg_weight, Some(4400.0));
        assert_eq!(dev.state, Some(99));
        assert_eq!(dev.online, Some(true));
    }

    #[test]
    fn update_omits_absent_fields() {
        let update = DeviceUpdate {
            name: Some("Stout".into()),
            ..DeviceUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "name": "Stout" }));
        assert!(!update.is_empty());
        assert!(DeviceUpdate::default().is_empty());
    }
}
