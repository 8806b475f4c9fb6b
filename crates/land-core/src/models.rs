//! Core data models for the land detector.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Bit in [`VehicleLocalPosition::dist_bottom_sensor_bitfield`]: a range finder is in use.
pub const DIST_BOTTOM_SENSOR_RANGE: u8 = 1 << 0;

/// Arming state reported by the actuator layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorArmed {
    pub armed: bool,
}

/// Filtered body-frame acceleration in m/s².
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleAcceleration {
    pub xyz: [f32; 3],
}

impl VehicleAcceleration {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { xyz: [x, y, z] }
    }

    /// Euclidean norm of the acceleration vector.
    pub fn norm(&self) -> f32 {
        self.xyz.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

/// Local position estimate (NED frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleLocalPosition {
    #[serde(default)]
    pub xy_valid: bool,
    #[serde(default)]
    pub z_valid: bool,
    #[serde(default)]
    pub v_z_valid: bool,
    /// Down position (m)
    #[serde(default)]
    pub z: f32,
    /// Down velocity (m/s)
    #[serde(default)]
    pub vz: f32,
    /// Distance to the ground below the vehicle (m)
    #[serde(default)]
    pub dist_bottom: f32,
    #[serde(default)]
    pub dist_bottom_valid: bool,
    /// Which sensors feed `dist_bottom`, see `DIST_BOTTOM_SENSOR_*`
    #[serde(default)]
    pub dist_bottom_sensor_bitfield: u8,
}

impl VehicleLocalPosition {
    /// Whether a range finder currently contributes to `dist_bottom`.
    pub fn uses_range_sensor(&self) -> bool {
        self.dist_bottom_sensor_bitfield & DIST_BOTTOM_SENSOR_RANGE != 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Unknown,
    RotaryWing,
    FixedWing,
    Rover,
}

/// High level vehicle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatus {
    #[serde(default)]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub is_vtol: bool,
    #[serde(default)]
    pub in_transition_mode: bool,
    #[serde(default)]
    pub failsafe: bool,
}

/// Last known value of every telemetry channel the engine reads.
///
/// Channels are refreshed independently; a silent channel keeps its
/// previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub armed: bool,
    pub acceleration: VehicleAcceleration,
    /// Set once the first acceleration sample has arrived.
    pub has_acceleration: bool,
    pub local_position: VehicleLocalPosition,
    pub vehicle_status: VehicleStatus,
}

/// Debounced flight-phase flags published by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandDetectionResult {
    pub landed: bool,
    pub freefall: bool,
    pub maybe_landed: bool,
    pub ground_contact: bool,
    pub in_ground_effect: bool,
    /// Altitude ceiling in meters, infinite when none applies
    #[serde(serialize_with = "serialize_alt_max", deserialize_with = "deserialize_alt_max")]
    pub alt_max: f32,
    /// Monotonic time of publication
    #[serde(rename = "timestamp_us", with = "duration_micros")]
    pub timestamp: Duration,
}

impl Default for LandDetectionResult {
    fn default() -> Self {
        Self {
            landed: true,
            freefall: false,
            maybe_landed: true,
            ground_contact: true,
            in_ground_effect: false,
            alt_max: f32::INFINITY,
            timestamp: Duration::ZERO,
        }
    }
}

impl LandDetectionResult {
    /// Whether any reportable field differs from `other` (timestamps ignored).
    pub fn differs_from(&self, other: &LandDetectionResult) -> bool {
        self.landed != other.landed
            || self.freefall != other.freefall
            || self.maybe_landed != other.maybe_landed
            || self.ground_contact != other.ground_contact
            || self.in_ground_effect != other.in_ground_effect
            || (self.alt_max - other.alt_max).abs() > f32::EPSILON
    }
}

fn serialize_alt_max<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_some(value)
    } else {
        serializer.serialize_none()
    }
}

fn deserialize_alt_max<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::INFINITY))
}

mod duration_micros {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_micros() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_micros(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_alt_max_serializes_as_null() {
        let result = LandDetectionResult::default();
        let json = serde_json::to_value(result).unwrap();
        assert!(json["alt_max"].is_null());
        assert_eq!(json["timestamp_us"], 0);

        let parsed: LandDetectionResult = serde_json::from_value(json).unwrap();
        assert!(parsed.alt_max.is_infinite());
    }

    #[test]
    fn test_finite_alt_max_survives_json() {
        let result = LandDetectionResult {
            alt_max: 42.5,
            timestamp: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: LandDetectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_differs_ignores_timestamp_and_float_noise() {
        let a = LandDetectionResult { alt_max: 10.0, ..Default::default() };
        let b = LandDetectionResult {
            alt_max: 10.0 + f32::EPSILON / 2.0,
            timestamp: Duration::from_secs(3),
            ..a
        };
        assert!(!a.differs_from(&b));

        let c = LandDetectionResult { landed: false, ..a };
        assert!(a.differs_from(&c));
    }

    #[test]
    fn test_infinite_ceilings_compare_equal() {
        let a = LandDetectionResult::default();
        let b = LandDetectionResult::default();
        assert!(!a.differs_from(&b));

        let finite = LandDetectionResult { alt_max: 50.0, ..a };
        assert!(a.differs_from(&finite));
    }

    #[test]
    fn test_local_position_defaults_missing_fields() {
        let pos: VehicleLocalPosition =
            serde_json::from_str(r#"{"dist_bottom_valid": true, "dist_bottom_sensor_bitfield": 1}"#)
                .unwrap();
        assert!(pos.dist_bottom_valid);
        assert!(pos.uses_range_sensor());
        assert!(!pos.z_valid);
    }

    #[test]
    fn test_acceleration_norm() {
        let acc = VehicleAcceleration::new(3.0, 4.0, 0.0);
        assert!((acc.norm() - 5.0).abs() < 1e-6);
    }
}
