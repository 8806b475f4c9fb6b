//! Telemetry input and result output seams.

use crate::models::{
    ActuatorArmed, LandDetectionResult, VehicleAcceleration, VehicleLocalPosition, VehicleStatus,
};

/// Pull-based telemetry source.
///
/// Each accessor returns `Some` only when the channel carried a new value
/// since the previous call, and never blocks.
pub trait TelemetryBus {
    fn armed(&mut self) -> Option<ActuatorArmed>;
    fn acceleration(&mut self) -> Option<VehicleAcceleration>;
    fn local_position(&mut self) -> Option<VehicleLocalPosition>;
    fn vehicle_status(&mut self) -> Option<VehicleStatus>;
    /// Whether parameters changed (with notification) since the previous call.
    fn parameter_update(&mut self) -> bool;
}

/// Receiver of published land detection results.
pub trait LandDetectedSink {
    fn publish(&mut self, result: &LandDetectionResult);
}

impl LandDetectedSink for Vec<LandDetectionResult> {
    fn publish(&mut self, result: &LandDetectionResult) {
        self.push(*result);
    }
}
