//! Vehicle-specific raw land detection judgments.

use crate::models::TelemetrySnapshot;
use crate::params::{ParamStore, LND_ROV_ACC_THR};

/// Supplies the undebounced judgments the engine gates.
///
/// Every getter is a pure function of the telemetry snapshot handed in;
/// implementations hold only their own tuning.
pub trait RawStateProvider: Send {
    fn get_freefall_state(&self, telemetry: &TelemetrySnapshot) -> bool;
    fn get_ground_contact_state(&self, telemetry: &TelemetrySnapshot) -> bool;
    fn get_maybe_landed_state(&self, telemetry: &TelemetrySnapshot) -> bool;
    fn get_landed_state(&self, telemetry: &TelemetrySnapshot) -> bool;
    fn get_ground_effect_state(&self, telemetry: &TelemetrySnapshot) -> bool;

    /// Altitude ceiling in meters; non-positive means none.
    fn get_max_altitude(&self, telemetry: &TelemetrySnapshot) -> f32;

    /// Sensitivity change requested by the engine.
    fn set_hysteresis_factor(&mut self, _factor: u32) {}

    /// Re-read vehicle-specific parameters.
    fn update_params(&mut self, _params: &dyn ParamStore) {}
}

/// Provider for ground rovers.
///
/// A rover never leaves the surface, so it is landed whenever it is
/// disarmed and always in ground contact. Freefall is reported when the
/// measured acceleration norm collapses while armed (vehicle dropped or
/// tipped off a ledge). No freefall is reported before the first
/// acceleration sample.
#[derive(Debug, Clone)]
pub struct GroundVehicleProvider {
    freefall_acc_threshold: f32,
}

impl Default for GroundVehicleProvider {
    fn default() -> Self {
        Self {
            freefall_acc_threshold: 2.0,
        }
    }
}

impl GroundVehicleProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RawStateProvider for GroundVehicleProvider {
    fn get_freefall_state(&self, telemetry: &TelemetrySnapshot) -> bool {
        telemetry.armed
            && telemetry.has_acceleration
            && telemetry.acceleration.norm() < self.freefall_acc_threshold
    }

    fn get_ground_contact_state(&self, _telemetry: &TelemetrySnapshot) -> bool {
        true
    }

    fn get_maybe_landed_state(&self, telemetry: &TelemetrySnapshot) -> bool {
        !telemetry.armed
    }

    fn get_landed_state(&self, telemetry: &TelemetrySnapshot) -> bool {
        !telemetry.armed
    }

    fn get_ground_effect_state(&self, _telemetry: &TelemetrySnapshot) -> bool {
        false
    }

    fn get_max_altitude(&self, _telemetry: &TelemetrySnapshot) -> f32 {
        -1.0
    }

    fn update_params(&mut self, params: &dyn ParamStore) {
        self.freefall_acc_threshold = params.get_f32(LND_ROV_ACC_THR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VehicleAcceleration;
    use crate::params::{MemoryParamStore, ParamValue};

    fn armed_with_accel(armed: bool, z: f32) -> TelemetrySnapshot {
        TelemetrySnapshot {
            armed,
            acceleration: VehicleAcceleration::new(0.0, 0.0, z),
            has_acceleration: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_rover_landed_follows_arming() {
        let provider = GroundVehicleProvider::new();
        assert!(provider.get_landed_state(&armed_with_accel(false, -9.81)));
        assert!(!provider.get_landed_state(&armed_with_accel(true, -9.81)));
        assert!(provider.get_ground_contact_state(&armed_with_accel(true, -9.81)));
        assert!(provider.get_max_altitude(&TelemetrySnapshot::default()) <= 0.0);
    }

    #[test]
    fn test_rover_freefall_only_when_armed() {
        let provider = GroundVehicleProvider::new();
        assert!(provider.get_freefall_state(&armed_with_accel(true, -0.5)));
        assert!(!provider.get_freefall_state(&armed_with_accel(false, -0.5)));
        assert!(!provider.get_freefall_state(&armed_with_accel(true, -9.81)));
    }

    #[test]
    fn test_rover_no_freefall_without_acceleration_sample() {
        let provider = GroundVehicleProvider::new();
        let armed_only = TelemetrySnapshot {
            armed: true,
            ..Default::default()
        };
        assert!(!provider.get_freefall_state(&armed_only));
    }

    #[test]
    fn test_rover_threshold_from_params() {
        let mut params = MemoryParamStore::with_defaults();
        params.set(LND_ROV_ACC_THR, ParamValue::Float(0.1)).unwrap();

        let mut provider = GroundVehicleProvider::new();
        provider.update_params(&params);
        assert!(!provider.get_freefall_state(&armed_with_accel(true, -0.5)));
    }
}
