//! Land detector CLI - replay scripted flights against a running service.
//!
//! - `fly_scenario`: stream a scenario's telemetry and print every change
//!   in the published land detection state

pub mod client;
pub mod scenarios;

pub use client::{parse_param_assignment, LandClient};
pub use scenarios::{scenario_by_name, Phase, Sample, Scenario, SCENARIO_NAMES};
