//! Distance-to-ground observability and gate sensitivity.

use crate::models::VehicleLocalPosition;

/// Hysteresis factor used while distance-to-ground is trusted.
pub const NOMINAL_HYSTERESIS_FACTOR: u32 = 1;
/// Hysteresis factor used after a range sensor has gone invalid.
pub const HIGH_HYSTERESIS_FACTOR: u32 = 3;

/// Decides whether distance-to-ground can be relied on and how much to
/// slow the ground-contact gates when it cannot.
#[derive(Debug, Clone, Default)]
pub struct DistBottomTracker {
    dist_bottom_observable: bool,
    high_sensitivity_active: bool,
}

impl DistBottomTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latched once a range sensor has been seen in use; never cleared.
    pub fn dist_bottom_observable(&self) -> bool {
        self.dist_bottom_observable
    }

    pub fn high_sensitivity_active(&self) -> bool {
        self.high_sensitivity_active
    }

    /// Evaluate the latest position report.
    ///
    /// Returns the new hysteresis factor when it changes.
    pub fn update(&mut self, position: &VehicleLocalPosition) -> Option<u32> {
        if !self.dist_bottom_observable {
            self.dist_bottom_observable = position.uses_range_sensor();
            return None;
        }

        if !self.high_sensitivity_active && !position.dist_bottom_valid {
            self.high_sensitivity_active = true;
            Some(HIGH_HYSTERESIS_FACTOR)
        } else if self.high_sensitivity_active && position.dist_bottom_valid {
            self.high_sensitivity_active = false;
            Some(NOMINAL_HYSTERESIS_FACTOR)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DIST_BOTTOM_SENSOR_RANGE;

    fn position(range_bit: bool, valid: bool) -> VehicleLocalPosition {
        VehicleLocalPosition {
            dist_bottom_valid: valid,
            dist_bottom_sensor_bitfield: if range_bit { DIST_BOTTOM_SENSOR_RANGE } else { 0 },
            ..Default::default()
        }
    }

    #[test]
    fn test_no_escalation_before_latch() {
        let mut tracker = DistBottomTracker::new();
        for _ in 0..10 {
            assert_eq!(tracker.update(&position(false, false)), None);
            assert_eq!(tracker.update(&position(false, true)), None);
        }
        assert!(!tracker.dist_bottom_observable());
        assert!(!tracker.high_sensitivity_active());
    }

    #[test]
    fn test_latch_survives_bit_clearing() {
        let mut tracker = DistBottomTracker::new();
        tracker.update(&position(true, true));
        assert!(tracker.dist_bottom_observable());

        for _ in 0..5 {
            tracker.update(&position(false, true));
            assert!(tracker.dist_bottom_observable());
        }
    }

    #[test]
    fn test_latch_cycle_does_not_evaluate_sensitivity() {
        let mut tracker = DistBottomTracker::new();
        assert_eq!(tracker.update(&position(true, false)), None);
        assert!(!tracker.high_sensitivity_active());

        assert_eq!(tracker.update(&position(true, false)), Some(HIGH_HYSTERESIS_FACTOR));
    }

    #[test]
    fn test_factor_follows_validity_after_latch() {
        let mut tracker = DistBottomTracker::new();
        tracker.update(&position(true, true));

        assert_eq!(tracker.update(&position(false, true)), None);
        assert_eq!(tracker.update(&position(false, false)), Some(HIGH_HYSTERESIS_FACTOR));
        assert_eq!(tracker.update(&position(false, false)), None);
        assert_eq!(tracker.update(&position(false, true)), Some(NOMINAL_HYSTERESIS_FACTOR));
        assert_eq!(tracker.update(&position(false, true)), None);
        assert_eq!(tracker.update(&position(false, false)), Some(HIGH_HYSTERESIS_FACTOR));
    }
}
