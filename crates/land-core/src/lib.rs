//! Land detection core.
//!
//! Fuses asynchronously updated telemetry into debounced flight-phase flags
//! (landed, freefall, ground contact, maybe landed, ground effect) and keeps
//! a persistent flight-time total.

pub mod bus;
pub mod engine;
pub mod error;
pub mod flight_time;
pub mod hysteresis;
pub mod models;
pub mod observability;
pub mod params;
pub mod provider;

pub use bus::{LandDetectedSink, TelemetryBus};
pub use engine::{CycleReport, LandDetector, CYCLE_PERIOD, PUBLISH_INTERVAL};
pub use error::ParamError;
pub use flight_time::{join_flight_time, split_flight_time, FlightTimeAccumulator, FlightTimeHalves};
pub use hysteresis::HysteresisGate;
pub use models::{
    ActuatorArmed, LandDetectionResult, TelemetrySnapshot, VehicleAcceleration,
    VehicleLocalPosition, VehicleStatus, VehicleType,
};
pub use observability::DistBottomTracker;
pub use params::{MemoryParamStore, ParamStore, ParamValue};
pub use provider::{GroundVehicleProvider, RawStateProvider};
