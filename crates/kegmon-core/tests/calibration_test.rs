#![allow(clippy::unwrap_used)]
// End-to-end calibration workflow against a mocked server.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kegmon_api::{ApiClient, LogNavigator, TransportConfig};
use kegmon_core::{
    CalibrationError, CalibrationWorkflow, Device, DeviceEntry, DeviceState, Dispatcher, Phase,
    SkipReason, Step,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<Dispatcher>) {
    let server = MockServer::start().await;
    let client =
        ApiClient::new(&server.uri(), &TransportConfig::default(), Arc::new(LogNavigator)).unwrap();
    (server, Arc::new(Dispatcher::new(Arc::new(client))))
}

fn device_json(id: &str, state: i64, measurement: f64) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("keg {id}"),
        "deviceType": "weight",
        "latestMeasurement": measurement,
        "online": true,
        "state": state,
    })
}

fn device(id: &str, state: i64) -> Device {
    let wire: kegmon_api::DeviceResponse =
        serde_json::from_value(device_json(id, state, 0.0)).unwrap();
    wire.into()
}

async fn mount_rpc(server: &MockServer, command: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/devices/d1/rpc/{command}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn collection() -> Vec<DeviceEntry> {
    vec![device("d0", 1).into(), device("d1", 1).into(), device("d2", 2).into()]
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_enter_then_commit_closes_and_reconciles() {
    let (server, dispatcher) = setup().await;
    mount_rpc(&server, "start_calibration", 200, device_json("d1", 10, 0.0)).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/devices/d1/rpc/calibrate"))
        .and(body_json(json!({ "knownWeight": 12.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("d1", 1, 12.5)))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = collection();
    let mut flow = CalibrationWorkflow::new(dispatcher, device("d1", 1));

    let step = flow.enter(&mut list).await.unwrap();
    assert_eq!(step, Step::Advanced(Phase::CalibrationActive));
    assert_eq!(flow.device().state(), DeviceState::CalibrationModeEnabled);
    assert_eq!(list[1].device.state(), DeviceState::CalibrationModeEnabled);

    let step = flow.commit(12.5, &mut list).await.unwrap();
    assert_eq!(step, Step::Advanced(Phase::Closed));
    assert!(flow.is_closed());
    assert!(!flow.device().state().is_calibrating());

    assert_eq!(list.len(), 3);
    assert_eq!(list[1].device.latest_measurement, Some(12.5));
    assert_eq!(list[1].device.state(), DeviceState::Ready);
    assert_eq!(list[0].device.id, "d0");
    assert_eq!(list[2].device.id, "d2");
}

#[tokio::test]
async fn test_cancel_closes_workflow() {
    let (server, dispatcher) = setup().await;
    mount_rpc(&server, "cancel_calibration", 200, device_json("d1", 1, 0.0)).await;

    let mut list = collection();
    let mut flow = CalibrationWorkflow::resume(dispatcher, device("d1", 10)).unwrap();
    assert_eq!(flow.phase(), Phase::CalibrationActive);

    let step = flow.cancel(&mut list).await.unwrap();
    assert_eq!(step, Step::Advanced(Phase::Closed));
    assert_eq!(list[1].device.state(), DeviceState::Ready);
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_commit_failure_refetches_and_stays_open() {
    let (server, dispatcher) = setup().await;
    mount_rpc(
        &server,
        "calibrate",
        500,
        json!({ "message": "device did not respond" }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("d1", 10, 3.2)))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = collection();
    let mut flow = CalibrationWorkflow::resume(dispatcher, device("d1", 10)).unwrap();

    let err = flow.commit(12.5, &mut list).await.unwrap_err();
    match err {
        CalibrationError::Remote(e) => {
            assert_eq!(e.status_code(), Some(500));
            assert_eq!(e.message(), "device did not respond");
        }
        other => panic!("expected remote error, got {other:?}"),
    }

    assert_eq!(flow.phase(), Phase::CalibrationActive);
    assert_eq!(flow.device().latest_measurement, Some(3.2));
    assert_eq!(list[1].device.latest_measurement, Some(3.2));
}

#[tokio::test]
async fn test_enter_failure_returns_to_idle() {
    let (server, dispatcher) = setup().await;
    mount_rpc(&server, "start_calibration", 503, json!({})).await;

    let mut list = collection();
    let mut flow = CalibrationWorkflow::new(dispatcher, device("d1", 1));

    assert!(flow.enter(&mut list).await.is_err());
    assert_eq!(flow.phase(), Phase::Idle);
    assert_eq!(list[1].device.state(), DeviceState::Ready);
}

#[tokio::test]
async fn test_cancel_failure_stays_open() {
    let (server, dispatcher) = setup().await;
    mount_rpc(&server, "cancel_calibration", 502, json!({})).await;

    let mut list: Vec<Device> = vec![device("d1", 10)];
    let mut flow = CalibrationWorkflow::resume(dispatcher, device("d1", 10)).unwrap();

    assert!(flow.cancel(&mut list).await.is_err());
    assert_eq!(flow.phase(), Phase::CalibrationActive);
}

// ── Misuse ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_commit_before_enter_is_invalid_phase() {
    let (_server, dispatcher) = setup().await;
    let mut list: Vec<Device> = Vec::new();
    let mut flow = CalibrationWorkflow::new(dispatcher, device("d1", 1));

    let err = flow.commit(12.5, &mut list).await.unwrap_err();
    assert!(matches!(
        err,
        CalibrationError::InvalidPhase {
            expected: Phase::CalibrationActive,
            actual: Phase::Idle,
        }
    ));
}

#[tokio::test]
async fn test_enter_from_maintenance_is_skipped() {
    let (_server, dispatcher) = setup().await;
    let mut list: Vec<Device> = Vec::new();
    let mut flow = CalibrationWorkflow::new(dispatcher, device("d1", 99));

    let step = flow.enter(&mut list).await.unwrap();
    assert!(matches!(step, Step::Skipped(SkipReason::NotAllowed { .. })));
    assert_eq!(flow.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_zero_weight_commit_is_skipped_and_stays_open() {
    let (_server, dispatcher) = setup().await;
    let mut list: Vec<Device> = Vec::new();
    let mut flow = CalibrationWorkflow::resume(dispatcher, device("d1", 10)).unwrap();

    let step = flow.commit(0.0, &mut list).await.unwrap();
    assert_eq!(step, Step::Skipped(SkipReason::InvalidWeight(0.0)));
    assert_eq!(flow.phase(), Phase::CalibrationActive);
}

#[tokio::test]
async fn test_resume_requires_calibration_mode() {
    let (_server, dispatcher) = setup().await;
    let err = CalibrationWorkflow::resume(dispatcher, device("d1", 1)).unwrap_err();
    assert!(matches!(
        err,
        CalibrationError::NotInCalibrationMode {
            state: DeviceState::Ready,
            ..
        }
    ));
}
