#![allow(clippy::unwrap_used)]
// Dispatcher tests: guards, skips, single flight, and applied commands.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kegmon_api::{ApiClient, LogNavigator, TransportConfig};
use kegmon_core::{Device, DeviceState, Dispatched, Dispatcher, SkipReason};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Dispatcher) {
    let server = MockServer::start().await;
    let client =
        ApiClient::new(&server.uri(), &TransportConfig::default(), Arc::new(LogNavigator)).unwrap();
    (server, Dispatcher::new(Arc::new(client)))
}

fn device_json(id: &str, state: i64) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("keg {id}"),
        "chipType": "Particle",
        "chipId": format!("chip-{id}"),
        "deviceType": "weight",
        "online": true,
        "state": state,
    })
}

fn device(id: &str, state: i64) -> Device {
    let wire: kegmon_api::DeviceResponse = serde_json::from_value(device_json(id, state)).unwrap();
    wire.into()
}

/// Fails the test on drop if any rpc reaches the server.
async fn forbid_rpc(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/devices/.+/rpc/.+$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

// ── Guard skips ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_enable_maintenance_in_maintenance_is_silent_noop() {
    let (server, dispatcher) = setup().await;
    forbid_rpc(&server).await;

    let outcome = dispatcher
        .enable_maintenance_mode(&device("d1", 99))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Dispatched::Skipped(SkipReason::NotAllowed {
            command: "start_maintenance_mode",
            state: DeviceState::MaintenanceModeEnabled,
        })
    );
}

#[tokio::test]
async fn test_calibrate_outside_calibration_mode_is_noop() {
    let (server, dispatcher) = setup().await;
    forbid_rpc(&server).await;

    for state in [1, 2, 11, 99, 0] {
        let outcome = dispatcher.calibrate(&device("d1", state), 12.5).await.unwrap();
        assert!(outcome.is_skipped(), "state {state}");
    }
}

#[tokio::test]
async fn test_calibrate_rejects_non_positive_weight() {
    let (server, dispatcher) = setup().await;
    forbid_rpc(&server).await;
    let dev = device("d1", 10);

    for weight in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let outcome = dispatcher.calibrate(&dev, weight).await.unwrap();
        assert!(
            matches!(outcome, Dispatched::Skipped(SkipReason::InvalidWeight(_))),
            "weight {weight}"
        );
    }
}

#[tokio::test]
async fn test_clear_memory_requires_maintenance() {
    let (server, dispatcher) = setup().await;
    forbid_rpc(&server).await;

    let outcome = dispatcher.clear_memory(&device("d1", 1)).await.unwrap();
    assert!(outcome.is_skipped());
}

// ── Applied commands ────────────────────────────────────────────────

#[tokio::test]
async fn test_enable_maintenance_from_ready() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/d1/rpc/start_maintenance_mode"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("d1", 99)))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher
        .enable_maintenance_mode(&device("d1", 2))
        .await
        .unwrap();
    let updated = outcome.into_device().unwrap();
    assert_eq!(updated.state(), DeviceState::MaintenanceModeEnabled);
}

#[tokio::test]
async fn test_calibrate_sends_known_weight() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/d1/rpc/calibrate"))
        .and(body_json(json!({ "knownWeight": 12.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("d1", 1)))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher.calibrate(&device("d1", 10), 12.5).await.unwrap();
    assert_eq!(outcome.device().unwrap().state(), DeviceState::Ready);
}

#[tokio::test]
async fn test_ping_is_sent_in_any_state() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/d1/rpc/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("d1", 0)))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher.ping(&device("d1", 0)).await.unwrap();
    assert!(!outcome.is_skipped());
}

#[tokio::test]
async fn test_remote_failure_is_an_error_not_a_skip() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/d1/rpc/tare"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "Unsupported RPC function" })),
        )
        .mount(&server)
        .await;

    let err = dispatcher.tare(&device("d1", 1)).await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.message(), "Unsupported RPC function");
    assert!(!dispatcher.is_in_flight("d1"));
}

// ── Single flight ───────────────────────────────────────────────────

#[tokio::test]
async fn test_second_command_on_same_device_is_skipped_while_in_flight() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/d1/rpc/start_maintenance_mode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(device_json("d1", 99))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dev = device("d1", 1);
    let (first, second) = tokio::join!(
        dispatcher.enable_maintenance_mode(&dev),
        dispatcher.enable_calibration_mode(&dev),
    );

    assert!(matches!(first.unwrap(), Dispatched::Applied(_)));
    assert_eq!(
        second.unwrap(),
        Dispatched::Skipped(SkipReason::InFlight {
            pending: "start_maintenance_mode"
        })
    );
    assert!(!dispatcher.is_in_flight("d1"));
}

#[tokio::test]
async fn test_different_devices_do_not_block_each_other() {
    let (server, dispatcher) = setup().await;

    for id in ["d1", "d2"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/v1/devices/{id}/rpc/tare")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(device_json(id, 1))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let (a, b) = (device("d1", 1), device("d2", 1));
    let (ra, rb) = tokio::join!(dispatcher.tare(&a), dispatcher.tare(&b));
    assert!(!ra.unwrap().is_skipped());
    assert!(!rb.unwrap().is_skipped());
}

#[tokio::test]
async fn test_raw_dispatch_is_unguarded() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/d1/rpc/send_most_recent_sample"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("d1", 99)))
        .expect(1)
        .mount(&server)
        .await;

    let updated = dispatcher
        .dispatch("d1", "send_most_recent_sample", &json!({}))
        .await
        .unwrap();
    assert_eq!(updated.id, "d1");
}
