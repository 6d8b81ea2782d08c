// ── Device domain types ──

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::state::{DeviceState, classify};

/// Sensing hardware behind a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    /// Load cell under the keg.
    Weight,
    /// Inline flow meter.
    Flow,
    #[default]
    Unknown,
}

/// A keg-volume sensing device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub chip_type: Option<String>,
    pub chip_id: Option<String>,
    pub chip_model: Option<String>,
    pub device_type: DeviceType,
    pub offset: Option<f64>,
    pub offset_unit: Option<String>,

    // Measurements
    pub measurement_count: u64,
    pub latest_measurement: Option<f64>,
    pub latest_measurement_unit: Option<String>,
    pub latest_measurement_taken_on: Option<String>,
    pub percent_remaining: Option<f64>,
    pub total_volume_remaining: Option<f64>,

    // Calibration (weight devices)
    pub empty_keg_weight: Option<f64>,
    pub empty_keg_weight_unit: Option<String>,
    pub start_volume: Option<f64>,
    pub start_volume_unit: Option<String>,
    pub display_volume_unit: Option<String>,

    pub online: bool,
    /// Raw lifecycle code as reported by the server.
    #[serde(rename = "state")]
    pub state_code: i64,
}

impl Device {
    /// Derived lifecycle state.
    pub fn state(&self) -> DeviceState {
        classify(self.state_code)
    }

    /// When the latest measurement was taken.
    ///
    /// The server emits ISO-8601 with or without an offset; naive
    /// timestamps are taken as UTC.
    pub fn latest_measurement_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.latest_measurement_taken_on.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    /// Overwrite every field with `other`'s.
    ///
    /// Full replace, not a merge: a field absent in `other` ends up absent
    /// here too.
    pub fn replace_from(&mut self, other: &Device) {
        let Device {
            id,
            name,
            chip_type,
            chip_id,
            chip_model,
            device_type,
            offset,
            offset_unit,
            measurement_count,
            latest_measurement,
            latest_measurement_unit,
            latest_measurement_taken_on,
            percent_remaining,
            total_volume_remaining,
            empty_keg_weight,
            empty_keg_weight_unit,
            start_volume,
            start_volume_unit,
            display_volume_unit,
            online,
            state_code,
        } = other;

        self.id.clone_from(id);
        self.name.clone_from(name);
        self.chip_type.clone_from(chip_type);
        self.chip_id.clone_from(chip_id);
        self.chip_model.clone_from(chip_model);
        self.device_type = *device_type;
        self.offset = *offset;
        self.offset_unit.clone_from(offset_unit);
        self.measurement_count = *measurement_count;
        self.latest_measurement = *latest_measurement;
        self.latest_measurement_unit.clone_from(latest_measurement_unit);
        self.latest_measurement_taken_on
            .clone_from(latest_measurement_taken_on);
        self.percent_remaining = *percent_remaining;
        self.total_volume_remaining = *total_volume_remaining;
        self.empty_keg_weight = *empty_keg_weight;
        self.empty_keg_weight_unit.clone_from(empty_keg_weight_unit);
        self.start_volume = *start_volume;
        self.start_volume_unit.clone_from(start_volume_unit);
        self.display_volume_unit.clone_from(display_volume_unit);
        self.online = *online;
        self.state_code = *state_code;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Device, DeviceType};

    pub(crate) fn device(id: &str, state_code: i64) -> Device {
        Device {
            id: id.to_owned(),
            name: format!("keg {id}"),
            chip_type: Some("Particle".into()),
            chip_id: Some(format!("chip-{id}")),
            chip_model: None,
            device_type: DeviceType::Weight,
            offset: None,
            offset_unit: None,
            measurement_count: 0,
            latest_measurement: None,
            latest_measurement_unit: None,
            latest_measurement_taken_on: None,
            percent_remaining: None,
            total_volume_remaining: None,
            empty_keg_weight: Some(4400.0),
            empty_keg_weight_unit: Some("g".into()),
            start_volume: None,
            start_volume_unit: None,
            display_volume_unit: None,
            online: true,
            state_code,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::fixtures::device;
    use super::*;

    #[test]
    fn state_is_derived_from_code() {
        assert_eq!(device("a", 99).state(), DeviceState::MaintenanceModeEnabled);
        assert_eq!(device("a", 42).state(), DeviceState::Unknown);
    }

    #[test]
    fn replace_from_copies_every_field() {
        let mut current = device("a", 1);
        let mut fresh = device("a", 10);
        fresh.name = "Porter".into();
        fresh.latest_measurement = Some(18_250.5);
        fresh.empty_keg_weight = None;
        fresh.online = false;

        current.replace_from(&fresh);
        assert_eq!(current, fresh);
    }

    #[test]
    fn measurement_time_accepts_offset_and_naive() {
        let mut dev = device("a", 1);
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        dev.latest_measurement_taken_on = Some("2024-05-01T12:00:00+00:00".into());
        assert_eq!(dev.latest_measurement_at(), Some(expected));

        dev.latest_measurement_taken_on = Some("2024-05-01T12:00:00".into());
        assert_eq!(dev.latest_measurement_at(), Some(expected));

        dev.latest_measurement_taken_on = Some("yesterday".into());
        assert_eq!(dev.latest_measurement_at(), None);
    }

    #[test]
    fn device_type_parses_lowercase() {
        assert_eq!("flow".parse::<DeviceType>().ok(), Some(DeviceType::Flow));
        assert_eq!(DeviceType::Weight.to_string(), "weight");
    }
}
