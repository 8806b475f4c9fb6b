//! Land detector loop integration tests.
//!
//! Drive the real scheduling loop on a paused clock and observe it through
//! the shared application state.

use std::sync::Arc;
use std::time::Duration;

use land_core::models::{ActuatorArmed, VehicleAcceleration, VehicleLocalPosition};
use land_core::params::{ParamStore, LND_FLIGHT_T_HI, LND_FLIGHT_T_LO};
use land_core::{GroundVehicleProvider, LandDetectionResult};
use land_server::config::Config;
use land_server::loops::land_detector_loop::{run_land_detector_loop, LOOP_NAME};
use land_server::loops::param_persist_loop::flush_dirty;
use land_server::persistence::init_database;
use land_server::state::AppState;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

fn start_loop(state: &Arc<AppState>) -> (broadcast::Sender<()>, JoinHandle<()>) {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(run_land_detector_loop(
        state.clone(),
        GroundVehicleProvider::new(),
        shutdown_rx,
    ));
    (shutdown_tx, handle)
}

async fn wait_for<F>(
    rx: &mut watch::Receiver<Option<LandDetectionResult>>,
    predicate: F,
) -> LandDetectionResult
where
    F: Fn(&LandDetectionResult) -> bool,
{
    timeout(Duration::from_secs(10), async {
        loop {
            if let Some(result) = *rx.borrow_and_update() {
                if predicate(&result) {
                    return result;
                }
            }
            rx.changed().await.expect("publisher alive");
        }
    })
    .await
    .expect("condition reached in time")
}

fn level_flight(state: &AppState) {
    state
        .telemetry()
        .publish_acceleration(VehicleAcceleration::new(0.0, 0.0, -9.81));
}

#[tokio::test(start_paused = true)]
async fn publishes_landed_on_first_cycle() {
    let state = Arc::new(AppState::new(Config::default()));
    let mut results = state.results().subscribe_latest();
    let (shutdown, handle) = start_loop(&state);

    let first = wait_for(&mut results, |_| true).await;
    assert!(first.landed);
    assert!(first.ground_contact);
    assert!(!first.freefall);

    let beats = state.loop_heartbeats();
    assert!(beats.iter().any(|(name, _)| name == LOOP_NAME));

    shutdown.send(()).unwrap();
    timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop stops after shutdown")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn flight_time_is_recorded_on_disarm() {
    let state = Arc::new(AppState::new(Config::default()));
    let mut results = state.results().subscribe_latest();
    let (shutdown, handle) = start_loop(&state);

    level_flight(&state);
    wait_for(&mut results, |r| r.landed).await;

    state.telemetry().publish_armed(ActuatorArmed { armed: true });
    wait_for(&mut results, |r| !r.landed).await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    state.telemetry().publish_armed(ActuatorArmed { armed: false });
    wait_for(&mut results, |r| r.landed).await;

    let flight_time = state.params().total_flight_time();
    assert!(flight_time >= Duration::from_secs(2), "got {:?}", flight_time);
    assert!(flight_time < Duration::from_millis(2200), "got {:?}", flight_time);
    assert_eq!(state.params().dirty_count(), 2);

    shutdown.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn freefall_reported_when_armed_without_thrust() {
    let state = Arc::new(AppState::new(Config::default()));
    let mut results = state.results().subscribe_latest();
    let (shutdown, handle) = start_loop(&state);

    state
        .telemetry()
        .publish_acceleration(VehicleAcceleration::new(0.0, 0.0, -0.5));
    state.telemetry().publish_armed(ActuatorArmed { armed: true });

    let result = wait_for(&mut results, |r| r.freefall).await;
    assert!(!result.landed);

    shutdown.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn arming_without_acceleration_samples_is_not_freefall() {
    let state = Arc::new(AppState::new(Config::default()));
    let mut results = state.results().subscribe_latest();
    let (shutdown, handle) = start_loop(&state);

    state.telemetry().publish_armed(ActuatorArmed { armed: true });
    wait_for(&mut results, |r| !r.landed).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let latest = state.results().latest().expect("published");
    assert!(!latest.landed);
    assert!(!latest.freefall);

    shutdown.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn position_report_runs_a_cycle_before_the_timer() {
    let config = Config {
        cycle_ms: 10_000,
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config));
    let (shutdown, handle) = start_loop(&state);

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(state.results().latest().is_none());

    state.telemetry().publish_local_position(VehicleLocalPosition {
        z_valid: true,
        ..Default::default()
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(state.results().latest().is_some());

    shutdown.send(()).unwrap();
    // The next wake-up after shutdown is another position report.
    state
        .telemetry()
        .publish_local_position(VehicleLocalPosition::default());
    timeout(Duration::from_millis(100), handle)
        .await
        .expect("loop stops without waiting for the timer")
        .unwrap();
}

// Real clock: SQLite work happens off the runtime and must not race
// auto-advanced pool timeouts.
#[tokio::test]
async fn recorded_flight_time_survives_restart() {
    let path = std::env::temp_dir()
        .join(format!("land-loop-{}.db", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string();
    let db = init_database(&path, 1).await.unwrap();

    let state = Arc::new(AppState::with_database(db.clone(), Config::default()));
    let mut results = state.results().subscribe_latest();
    let (shutdown, handle) = start_loop(&state);

    level_flight(&state);
    state.telemetry().publish_armed(ActuatorArmed { armed: true });
    wait_for(&mut results, |r| !r.landed).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    state.telemetry().publish_armed(ActuatorArmed { armed: false });
    wait_for(&mut results, |r| r.landed).await;

    shutdown.send(()).unwrap();
    handle.await.unwrap();
    assert_eq!(flush_dirty(&db, state.params()).await.unwrap(), 2);

    let restarted = AppState::with_database(db, Config::default());
    restarted.load_from_database().await.unwrap();
    assert_eq!(
        restarted.params().get_i32(LND_FLIGHT_T_LO),
        state.params().get_i32(LND_FLIGHT_T_LO)
    );
    assert_eq!(restarted.params().get_i32(LND_FLIGHT_T_HI), 0);
    assert!(restarted.params().total_flight_time() >= Duration::from_secs(1));

    let _ = std::fs::remove_file(&path);
}
