//! Scripted flights for exercising the land detector.
//!
//! A scenario is a list of phases. Each phase holds the arming state and
//! acceleration constant and moves the vehicle linearly between two heights
//! above ground.

use std::time::Duration;

use land_core::models::{
    ActuatorArmed, VehicleAcceleration, VehicleLocalPosition, DIST_BOTTOM_SENSOR_RANGE,
};

pub const SCENARIO_NAMES: &[&str] = &["hop", "freefall", "range-dropout"];

const GRAVITY: f32 = 9.81;

/// One segment of a scripted flight.
#[derive(Debug, Clone)]
pub struct Phase {
    pub name: &'static str,
    pub duration: Duration,
    pub armed: bool,
    pub acceleration: VehicleAcceleration,
    /// Height above ground at the start and end of the phase (m)
    pub height: (f32, f32),
    pub range_valid: bool,
}

impl Phase {
    fn new(name: &'static str, secs: f32, armed: bool, height: (f32, f32)) -> Self {
        Self {
            name,
            duration: Duration::from_secs_f32(secs),
            armed,
            acceleration: VehicleAcceleration::new(0.0, 0.0, -GRAVITY),
            height,
            range_valid: true,
        }
    }

    fn falling(mut self) -> Self {
        self.acceleration = VehicleAcceleration::new(0.0, 0.0, -0.3);
        self
    }

    fn range_dropout(mut self) -> Self {
        self.range_valid = false;
        self
    }
}

/// Telemetry for one instant of a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub phase: &'static str,
    pub armed: ActuatorArmed,
    pub acceleration: VehicleAcceleration,
    pub local_position: VehicleLocalPosition,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub phases: Vec<Phase>,
}

impl Scenario {
    pub fn duration(&self) -> Duration {
        self.phases.iter().map(|phase| phase.duration).sum()
    }

    /// Telemetry at `elapsed` since the scenario started, `None` once it is over.
    pub fn sample_at(&self, elapsed: Duration) -> Option<Sample> {
        let mut phase_start = Duration::ZERO;
        for phase in &self.phases {
            let phase_end = phase_start + phase.duration;
            if elapsed < phase_end {
                return Some(sample_phase(phase, elapsed - phase_start));
            }
            phase_start = phase_end;
        }
        None
    }
}

fn sample_phase(phase: &Phase, into_phase: Duration) -> Sample {
    let (start, end) = phase.height;
    let secs = phase.duration.as_secs_f32();
    let progress = if secs > 0.0 {
        (into_phase.as_secs_f32() / secs).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let height = start + (end - start) * progress;
    let climb_rate = if secs > 0.0 { (end - start) / secs } else { 0.0 };

    // NED: up is negative z
    let local_position = VehicleLocalPosition {
        xy_valid: true,
        z_valid: true,
        v_z_valid: true,
        z: -height,
        vz: -climb_rate,
        dist_bottom: height,
        dist_bottom_valid: phase.range_valid,
        dist_bottom_sensor_bitfield: DIST_BOTTOM_SENSOR_RANGE,
    };

    Sample {
        phase: phase.name,
        armed: ActuatorArmed { armed: phase.armed },
        acceleration: phase.acceleration,
        local_position,
    }
}

pub fn scenario_by_name(name: &str) -> Option<Scenario> {
    match name {
        "hop" => Some(create_hop_scenario()),
        "freefall" => Some(create_freefall_scenario()),
        "range-dropout" => Some(create_range_dropout_scenario()),
        _ => None,
    }
}

/// Arm, climb to 5 m, hover, land and disarm.
pub fn create_hop_scenario() -> Scenario {
    Scenario {
        name: "hop",
        description: "Short hop: take off, hover at 5 m, land and disarm",
        phases: vec![
            Phase::new("preflight", 2.0, false, (0.0, 0.0)),
            Phase::new("armed", 1.0, true, (0.0, 0.0)),
            Phase::new("climb", 2.0, true, (0.0, 5.0)),
            Phase::new("hover", 3.0, true, (5.0, 5.0)),
            Phase::new("descend", 3.0, true, (5.0, 0.0)),
            Phase::new("touchdown", 2.0, true, (0.0, 0.0)),
            Phase::new("disarmed", 2.0, false, (0.0, 0.0)),
        ],
    }
}

/// Lose thrust at 10 m, fall for a second and recover.
pub fn create_freefall_scenario() -> Scenario {
    Scenario {
        name: "freefall",
        description: "Climb to 10 m, drop for one second, recover and land",
        phases: vec![
            Phase::new("armed", 1.0, true, (0.0, 0.0)),
            Phase::new("climb", 3.0, true, (0.0, 10.0)),
            Phase::new("freefall", 1.0, true, (10.0, 5.1)).falling(),
            Phase::new("recover", 2.0, true, (5.1, 5.1)),
            Phase::new("descend", 3.0, true, (5.1, 0.0)),
            Phase::new("disarmed", 2.0, false, (0.0, 0.0)),
        ],
    }
}

/// Range finder goes out of range while high, then comes back on descent.
pub fn create_range_dropout_scenario() -> Scenario {
    Scenario {
        name: "range-dropout",
        description: "Climb above range finder limits, hover without range, land on range",
        phases: vec![
            Phase::new("armed", 1.0, true, (0.0, 0.0)),
            Phase::new("climb", 2.0, true, (0.0, 4.0)),
            Phase::new("climb-out-of-range", 2.0, true, (4.0, 30.0)).range_dropout(),
            Phase::new("hover-out-of-range", 3.0, true, (30.0, 30.0)).range_dropout(),
            Phase::new("descend", 4.0, true, (30.0, 0.0)),
            Phase::new("disarmed", 2.0, false, (0.0, 0.0)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_scenario_resolves() {
        for name in SCENARIO_NAMES {
            let scenario = scenario_by_name(name).unwrap();
            assert_eq!(scenario.name, *name);
            assert!(scenario.duration() > Duration::ZERO);
        }
        assert!(scenario_by_name("loop-the-loop").is_none());
    }

    #[test]
    fn hop_climbs_in_ned_and_ends_disarmed() {
        let scenario = create_hop_scenario();

        let climbing = scenario.sample_at(Duration::from_secs(4)).unwrap();
        assert_eq!(climbing.phase, "climb");
        assert!(climbing.armed.armed);
        assert!((climbing.local_position.z + 2.5).abs() < 1e-3);
        assert!(climbing.local_position.vz < 0.0);

        let last = scenario
            .sample_at(scenario.duration() - Duration::from_millis(1))
            .unwrap();
        assert!(!last.armed.armed);
        assert_eq!(last.local_position.z, 0.0);
        assert!(scenario.sample_at(scenario.duration()).is_none());
    }

    #[test]
    fn phases_start_at_their_boundary() {
        let scenario = create_hop_scenario();
        assert_eq!(scenario.sample_at(Duration::ZERO).unwrap().phase, "preflight");
        assert_eq!(scenario.sample_at(Duration::from_secs(2)).unwrap().phase, "armed");
    }

    #[test]
    fn freefall_drops_acceleration_below_gravity() {
        let scenario = create_freefall_scenario();
        let falling = scenario.sample_at(Duration::from_millis(4500)).unwrap();
        assert_eq!(falling.phase, "freefall");
        assert!(falling.acceleration.norm() < 1.0);

        let hovering = scenario.sample_at(Duration::from_millis(5500)).unwrap();
        assert!((hovering.acceleration.norm() - GRAVITY).abs() < 1e-3);
    }

    #[test]
    fn range_dropout_keeps_the_range_sensor_flagged() {
        let scenario = create_range_dropout_scenario();
        let high = scenario.sample_at(Duration::from_secs(6)).unwrap();
        assert!(!high.local_position.dist_bottom_valid);
        assert!(high.local_position.uses_range_sensor());

        let low = scenario.sample_at(Duration::from_millis(1500)).unwrap();
        assert!(low.local_position.dist_bottom_valid);
    }
}
