//! Land detector service: telemetry ingest, detection loop, parameter
//! persistence and result streaming.

pub mod api;
pub mod bus;
pub mod config;
pub mod loops;
pub mod persistence;
pub mod state;
