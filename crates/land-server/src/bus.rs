//! Telemetry bus and result fan-out built on tokio channels.
//!
//! Each telemetry topic is a `watch` channel holding the latest sample, so a
//! slow consumer only ever sees the newest value and never blocks producers.

use land_core::models::{
    ActuatorArmed, LandDetectionResult, VehicleAcceleration, VehicleLocalPosition, VehicleStatus,
};
use land_core::{LandDetectedSink, TelemetryBus};
use tokio::sync::{broadcast, watch};

use crate::state::ParamRegistry;

const RESULT_STREAM_CAPACITY: usize = 64;

/// Producer side of the telemetry topics.
pub struct TelemetryChannels {
    armed: watch::Sender<Option<ActuatorArmed>>,
    acceleration: watch::Sender<Option<VehicleAcceleration>>,
    local_position: watch::Sender<Option<VehicleLocalPosition>>,
    vehicle_status: watch::Sender<Option<VehicleStatus>>,
}

impl Default for TelemetryChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryChannels {
    pub fn new() -> Self {
        Self {
            armed: watch::channel(None).0,
            acceleration: watch::channel(None).0,
            local_position: watch::channel(None).0,
            vehicle_status: watch::channel(None).0,
        }
    }

    pub fn publish_armed(&self, armed: ActuatorArmed) {
        self.armed.send_replace(Some(armed));
    }

    pub fn publish_acceleration(&self, acceleration: VehicleAcceleration) {
        self.acceleration.send_replace(Some(acceleration));
    }

    pub fn publish_local_position(&self, position: VehicleLocalPosition) {
        self.local_position.send_replace(Some(position));
    }

    pub fn publish_vehicle_status(&self, status: VehicleStatus) {
        self.vehicle_status.send_replace(Some(status));
    }

    /// Receiver used to wake the detector when a position report arrives.
    pub fn subscribe_local_position(&self) -> watch::Receiver<Option<VehicleLocalPosition>> {
        self.local_position.subscribe()
    }
}

/// Consumer side of the telemetry topics, polled once per cycle.
pub struct WatchBus {
    armed: watch::Receiver<Option<ActuatorArmed>>,
    acceleration: watch::Receiver<Option<VehicleAcceleration>>,
    local_position: watch::Receiver<Option<VehicleLocalPosition>>,
    vehicle_status: watch::Receiver<Option<VehicleStatus>>,
    parameter_update: watch::Receiver<u64>,
}

impl WatchBus {
    /// Subscribe to every topic.
    ///
    /// Samples published before the subscription are delivered on the first
    /// poll.
    pub fn new(channels: &TelemetryChannels, params: &ParamRegistry) -> Self {
        Self {
            armed: subscribe_pending(&channels.armed),
            acceleration: subscribe_pending(&channels.acceleration),
            local_position: subscribe_pending(&channels.local_position),
            vehicle_status: subscribe_pending(&channels.vehicle_status),
            parameter_update: params.subscribe_updates(),
        }
    }
}

fn subscribe_pending<T>(sender: &watch::Sender<Option<T>>) -> watch::Receiver<Option<T>> {
    let mut rx = sender.subscribe();
    rx.mark_changed();
    rx
}

fn poll<T: Copy>(rx: &mut watch::Receiver<Option<T>>) -> Option<T> {
    match rx.has_changed() {
        Ok(true) => *rx.borrow_and_update(),
        _ => None,
    }
}

impl TelemetryBus for WatchBus {
    fn armed(&mut self) -> Option<ActuatorArmed> {
        poll(&mut self.armed)
    }

    fn acceleration(&mut self) -> Option<VehicleAcceleration> {
        poll(&mut self.acceleration)
    }

    fn local_position(&mut self) -> Option<VehicleLocalPosition> {
        poll(&mut self.local_position)
    }

    fn vehicle_status(&mut self) -> Option<VehicleStatus> {
        poll(&mut self.vehicle_status)
    }

    fn parameter_update(&mut self) -> bool {
        match self.parameter_update.has_changed() {
            Ok(true) => {
                self.parameter_update.borrow_and_update();
                true
            }
            _ => false,
        }
    }
}

/// Hands published results to API readers and stream subscribers.
pub struct ResultPublisher {
    latest: watch::Sender<Option<LandDetectionResult>>,
    stream: broadcast::Sender<LandDetectionResult>,
}

impl Default for ResultPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultPublisher {
    pub fn new() -> Self {
        let (stream, _) = broadcast::channel(RESULT_STREAM_CAPACITY);
        Self {
            latest: watch::channel(None).0,
            stream,
        }
    }

    pub fn latest(&self) -> Option<LandDetectionResult> {
        *self.latest.borrow()
    }

    pub fn subscribe_latest(&self) -> watch::Receiver<Option<LandDetectionResult>> {
        self.latest.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LandDetectionResult> {
        self.stream.subscribe()
    }
}

impl LandDetectedSink for &ResultPublisher {
    fn publish(&mut self, result: &LandDetectionResult) {
        self.latest.send_replace(Some(*result));
        // No subscribers is fine
        let _ = self.stream.send(*result);
    }
}
