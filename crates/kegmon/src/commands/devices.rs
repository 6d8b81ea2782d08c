//! Device command handlers.

use tabled::Tabled;
use tracing::warn;

use kegmon_core::{
    Device, DeviceMeasurement, DeviceState, DeviceUpdate, Dispatched, NewDevice, Phase, Session,
    SkipReason, Step, is_valid_weight,
};

use crate::cli::{DeviceFields, DeviceKind, DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Online")]
    online: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            dtype: d.device_type.to_string(),
            state: d.state().to_string(),
            remaining: d
                .percent_remaining
                .map_or_else(|| "-".into(), |p| format!("{p:.0}%")),
            latest: util::quantity(d.latest_measurement, d.latest_measurement_unit.as_deref()),
            online: if d.online { "yes" } else { "no" }.into(),
        }
    }
}

#[derive(Tabled)]
struct MeasurementRow {
    #[tabled(rename = "Taken on")]
    taken_on: String,
    #[tabled(rename = "Measurement")]
    measurement: String,
}

impl From<&DeviceMeasurement> for MeasurementRow {
    fn from(m: &DeviceMeasurement) -> Self {
        Self {
            taken_on: util::or_dash(m.taken_on.as_deref()).to_owned(),
            measurement: util::quantity(Some(m.measurement), m.unit.as_deref()),
        }
    }
}

fn detail(d: &Device, color: bool) -> String {
    let mut lines = vec![
        format!("ID:          {}", d.id),
        format!("Name:        {}", d.name),
        format!("Type:        {}", d.device_type),
        format!("State:       {}", output::paint_state(d.state(), color)),
        format!("Online:      {}", if d.online { "yes" } else { "no" }),
        format!("Chip:        {}", util::or_dash(d.chip_id.as_deref())),
        format!("Chip model:  {}", util::or_dash(d.chip_model.as_deref())),
        format!(
            "Latest:      {}",
            util::quantity(d.latest_measurement, d.latest_measurement_unit.as_deref())
        ),
    ];
    if let Some(at) = d.latest_measurement_at() {
        lines.push(format!("Measured at: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    lines.push(format!("Samples:     {}", d.measurement_count));
    if let Some(pct) = d.percent_remaining {
        lines.push(format!("Remaining:   {pct:.1}%"));
    }
    if d.total_volume_remaining.is_some() {
        lines.push(format!(
            "Volume left: {}",
            util::quantity(d.total_volume_remaining, d.display_volume_unit.as_deref())
        ));
    }
    if d.empty_keg_weight.is_some() {
        lines.push(format!(
            "Empty keg:   {}",
            util::quantity(d.empty_keg_weight, d.empty_keg_weight_unit.as_deref())
        ));
    }
    if d.start_volume.is_some() {
        lines.push(format!(
            "Full keg:    {}",
            util::quantity(d.start_volume, d.start_volume_unit.as_deref())
        ));
    }
    if d.offset.is_some() {
        lines.push(format!(
            "Offset:      {}",
            util::quantity(d.offset, d.offset_unit.as_deref())
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List => {
            let devices = session.devices().await?;
            print_list(&devices, global)
        }

        DevicesCommand::Get { id } => {
            let device = session.device(&id).await?;
            print_device(&device, global, color)
        }

        DevicesCommand::Find { chip_id } => {
            let devices = session.find_devices(&chip_id).await?;
            print_list(&devices, global)
        }

        DevicesCommand::Create { fields, from_file } => {
            let body = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None => new_device(fields)?,
            };
            let device = session.create_device(&body).await?;
            print_device(&device, global, color)
        }

        DevicesCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let update: DeviceUpdate = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None => device_update(fields),
            };
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass at least one field".into(),
                });
            }
            let device = session.update_device(&id, &update).await?;
            print_device(&device, global, color)
        }

        DevicesCommand::Delete { id } => {
            if !util::confirm(&format!("Delete device {id}?"), "devices delete", global.yes)? {
                return Ok(());
            }
            session.delete_device(&id).await?;
            output::print_output(&format!("Deleted device {id}"), global.quiet);
            Ok(())
        }

        DevicesCommand::Maintenance(m) => {
            let device = session.device(&m.id).await?;
            let outcome = if m.on {
                session.dispatcher().enable_maintenance_mode(&device).await?
            } else {
                session.dispatcher().disable_maintenance_mode(&device).await?
            };
            report(outcome, global, color)
        }

        DevicesCommand::Calibrate { id, weight } => {
            calibrate(session, &id, weight, global, color).await
        }

        DevicesCommand::CalibrateCancel { id } => {
            let device = session.device(&id).await?;
            let outcome = session.dispatcher().cancel_calibration_mode(&device).await?;
            report(outcome, global, color)
        }

        DevicesCommand::Ping { id } => {
            let device = session.device(&id).await?;
            let outcome = session.dispatcher().ping(&device).await?;
            report(outcome, global, color)
        }

        DevicesCommand::Tare { id } => {
            let device = session.device(&id).await?;
            let outcome = session.dispatcher().tare(&device).await?;
            report(outcome, global, color)
        }

        DevicesCommand::ClearMemory { id } => {
            let device = session.device(&id).await?;
            let will_run = device.state() == DeviceState::MaintenanceModeEnabled;
            if will_run
                && !util::confirm(
                    &format!("Wipe stored samples on {id}?"),
                    "devices clear-memory",
                    global.yes,
                )?
            {
                return Ok(());
            }
            let outcome = session.dispatcher().clear_memory(&device).await?;
            report(outcome, global, color)
        }

        DevicesCommand::Sample { id } => {
            let device = session.device(&id).await?;
            let outcome = session.dispatcher().send_most_recent_sample(&device).await?;
            report(outcome, global, color)
        }

        DevicesCommand::Rpc { id, command, data } => {
            let payload: serde_json::Value =
                serde_json::from_str(&data).map_err(|e| CliError::Validation {
                    field: "data".into(),
                    reason: format!("invalid JSON: {e}"),
                })?;
            let device = session.dispatcher().dispatch(&id, &command, &payload).await?;
            print_device(&device, global, color)
        }

        DevicesCommand::Measurements { id } => {
            let history = session.measurements(&id).await?;
            let out = output::render_list(&global.output, &history, |m| MeasurementRow::from(m), |m| {
                format!("{}\t{}", util::or_dash(m.taken_on.as_deref()), m.measurement)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Info { id, key } => {
            let info = session.manufacturer_info(&id, key.as_deref()).await?;
            let out = output::render_single(
                &global.output,
                &info,
                |v| serde_json::to_string_pretty(v).unwrap_or_default(),
                ToString::to_string,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

// ── Calibration ─────────────────────────────────────────────────────

/// Enter calibration mode (unless the device is already there), then
/// commit `weight`. An invalid weight is skipped without touching the device.
async fn calibrate(
    session: &Session,
    id: &str,
    weight: f64,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    // Entering calibration mode changes device state, so reject the
    // weight before anything is sent.
    if !is_valid_weight(weight) {
        output::print_skipped(&SkipReason::InvalidWeight(weight), color, global.quiet);
        return Ok(());
    }

    let device = session.device(id).await?;
    let mut flow = session.calibration(device)?;

    if flow.phase() == Phase::Idle {
        if let Step::Skipped(reason) = flow.enter::<Device>(&mut []).await? {
            output::print_skipped(&reason, color, global.quiet);
            return Ok(());
        }
    }

    match flow.commit::<Device>(weight, &mut []).await {
        Ok(Step::Advanced(_)) => print_device(flow.device(), global, color),
        Ok(Step::Skipped(reason)) => {
            output::print_skipped(&reason, color, global.quiet);
            Ok(())
        }
        Err(e) => {
            warn!(
                device = id,
                state = %flow.device().state(),
                "calibration failed; device is still in calibration mode \
                 (retry, or run: kegmon devices calibrate-cancel {id})"
            );
            Err(e.into())
        }
    }
}

// ── Output helpers ──────────────────────────────────────────────────

fn report(outcome: Dispatched, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    match outcome {
        Dispatched::Applied(device) => print_device(&device, global, color),
        Dispatched::Skipped(reason) => {
            output::print_skipped(&reason, color, global.quiet);
            Ok(())
        }
    }
}

fn print_list(devices: &[Device], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(&global.output, devices, |d| DeviceRow::from(d), |d| d.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_device(device: &Device, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        device,
        |d| detail(d, color),
        |d| d.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Request bodies ──────────────────────────────────────────────────

fn kind_name(kind: DeviceKind) -> String {
    match kind {
        DeviceKind::Weight => "weight".into(),
        DeviceKind::Flow => "flow".into(),
    }
}

fn new_device(fields: DeviceFields) -> Result<NewDevice, CliError> {
    let missing = |field: &str| CliError::Validation {
        field: field.into(),
        reason: "required when creating a device".into(),
    };
    Ok(NewDevice {
        name: fields.name.ok_or_else(|| missing("name"))?,
        chip_id: fields.chip_id.ok_or_else(|| missing("chip-id"))?,
        device_type: fields
            .device_type
            .map(kind_name)
            .ok_or_else(|| missing("type"))?,
        chip_model: fields.chip_model,
        empty_keg_weight: fields.empty_keg_weight,
        empty_keg_weight_unit: fields.empty_keg_weight_unit,
        start_volume: fields.start_volume,
        start_volume_unit: fields.start_volume_unit,
        display_volume_unit: fields.display_volume_unit,
    })
}

fn device_update(fields: DeviceFields) -> DeviceUpdate {
    DeviceUpdate {
        name: fields.name,
        chip_id: fields.chip_id,
        chip_model: fields.chip_model,
        device_type: fields.device_type.map(kind_name),
        empty_keg_weight: fields.empty_keg_weight,
        empty_keg_weight_unit: fields.empty_keg_weight_unit,
        start_volume: fields.start_volume,
        start_volume_unit: fields.start_volume_unit,
        display_volume_unit: fields.display_volume_unit,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields() -> DeviceFields {
        DeviceFields {
            name: Some("Stout".into()),
            chip_id: Some("e00fce68".into()),
            chip_model: None,
            device_type: Some(DeviceKind::Weight),
            empty_keg_weight: Some(13.6),
            empty_keg_weight_unit: Some("lb".into()),
            start_volume: None,
            start_volume_unit: None,
            display_volume_unit: None,
        }
    }

    #[test]
    fn new_device_requires_name_chip_and_type() {
        let body = new_device(fields()).unwrap();
        assert_eq!(body.device_type, "weight");
        assert_eq!(body.empty_keg_weight, Some(13.6));

        let mut partial = fields();
        partial.chip_id = None;
        assert!(matches!(
            new_device(partial),
            Err(CliError::Validation { field, .. }) if field == "chip-id"
        ));
    }

    #[test]
    fn update_with_no_fields_is_empty() {
        let none = DeviceFields {
            name: None,
            chip_id: None,
            chip_model: None,
            device_type: None,
            empty_keg_weight: None,
            empty_keg_weight_unit: None,
            start_volume: None,
            start_volume_unit: None,
            display_volume_unit: None,
        };
        assert!(device_update(none).is_empty());
        assert!(!device_update(fields()).is_empty());
    }
}
