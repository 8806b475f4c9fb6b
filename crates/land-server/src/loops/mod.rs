//! Background loops for continuous processing.

pub mod land_detector_loop;
pub mod param_persist_loop;
