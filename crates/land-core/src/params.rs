//! Parameter definitions and the store interface.
//!
//! Every tunable the engine reads is declared in [`PARAM_DEFS`]. Values are
//! validated against their definition before they reach a store; the engine
//! itself only ever reads, or writes its own flight-time halves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ParamError;

/// High 32 bits of the accumulated flight time (µs).
pub const LND_FLIGHT_T_HI: &str = "LND_FLIGHT_T_HI";
/// Low 32 bits of the accumulated flight time (µs).
pub const LND_FLIGHT_T_LO: &str = "LND_FLIGHT_T_LO";
pub const LND_TRIG_TIME: &str = "LND_TRIG_TIME";
pub const LND_MAYBE_TIME: &str = "LND_MAYBE_TIME";
pub const LND_GC_TIME: &str = "LND_GC_TIME";
pub const LND_FFALL_TTRI: &str = "LND_FFALL_TTRI";
pub const LND_GE_TIME: &str = "LND_GE_TIME";
pub const LND_ROV_ACC_THR: &str = "LND_ROV_ACC_THR";

/// A single parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
}

impl ParamValue {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(_) => None,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Int(v) => *v as f64,
            ParamValue::Float(v) => *v as f64,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
        }
    }
}

/// Static definition of a parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamDef {
    pub name: &'static str,
    pub default: ParamValue,
    pub min: f64,
    pub max: f64,
    pub description: &'static str,
}

pub const PARAM_DEFS: &[ParamDef] = &[
    ParamDef {
        name: LND_FLIGHT_T_HI,
        default: ParamValue::Int(0),
        min: i32::MIN as f64,
        max: i32::MAX as f64,
        description: "Total flight time, high 32 bits (us)",
    },
    ParamDef {
        name: LND_FLIGHT_T_LO,
        default: ParamValue::Int(0),
        min: i32::MIN as f64,
        max: i32::MAX as f64,
        description: "Total flight time, low 32 bits (us)",
    },
    ParamDef {
        name: LND_TRIG_TIME,
        default: ParamValue::Float(0.3),
        min: 0.05,
        max: 10.0,
        description: "Landed trigger time (s)",
    },
    ParamDef {
        name: LND_MAYBE_TIME,
        default: ParamValue::Float(0.25),
        min: 0.0,
        max: 10.0,
        description: "Maybe-landed trigger time (s)",
    },
    ParamDef {
        name: LND_GC_TIME,
        default: ParamValue::Float(0.35),
        min: 0.0,
        max: 10.0,
        description: "Ground contact trigger time (s)",
    },
    ParamDef {
        name: LND_FFALL_TTRI,
        default: ParamValue::Float(0.3),
        min: 0.02,
        max: 5.0,
        description: "Freefall trigger time (s)",
    },
    ParamDef {
        name: LND_GE_TIME,
        default: ParamValue::Float(0.0),
        min: 0.0,
        max: 10.0,
        description: "Ground effect trigger time (s)",
    },
    ParamDef {
        name: LND_ROV_ACC_THR,
        default: ParamValue::Float(2.0),
        min: 0.0,
        max: 20.0,
        description: "Rover freefall acceleration threshold (m/s^2)",
    },
];

/// Look up a parameter definition by name.
pub fn find_def(name: &str) -> Option<&'static ParamDef> {
    PARAM_DEFS.iter().find(|def| def.name == name)
}

/// Check `value` against the definition of `name`.
///
/// Integers are accepted for float parameters and widened.
pub fn validate(name: &str, value: ParamValue) -> Result<ParamValue, ParamError> {
    let def = find_def(name).ok_or_else(|| ParamError::UnknownParam(name.to_string()))?;

    let value = match (def.default, value) {
        (ParamValue::Float(_), ParamValue::Int(v)) => ParamValue::Float(v as f32),
        (ParamValue::Int(_), ParamValue::Float(_)) => {
            return Err(ParamError::TypeMismatch {
                name: name.to_string(),
                expected: def.default.kind(),
            })
        }
        (_, value) => value,
    };

    let raw = value.as_f64();
    if !raw.is_finite() || raw < def.min || raw > def.max {
        return Err(ParamError::OutOfRange {
            name: name.to_string(),
            value: raw,
            min: def.min,
            max: def.max,
        });
    }

    Ok(value)
}

/// Durable parameter storage as seen by the engine.
pub trait ParamStore {
    fn get(&self, name: &str) -> Option<ParamValue>;

    /// Write without raising a parameter-update notification.
    fn set_no_notification(&mut self, name: &str, value: ParamValue);

    /// Float parameter, falling back to its declared default.
    fn get_f32(&self, name: &str) -> f32 {
        self.get(name)
            .and_then(|v| v.as_f32())
            .or_else(|| find_def(name).and_then(|def| def.default.as_f32()))
            .unwrap_or(0.0)
    }

    /// Integer parameter, falling back to its declared default.
    fn get_i32(&self, name: &str) -> i32 {
        self.get(name)
            .and_then(|v| v.as_i32())
            .or_else(|| find_def(name).and_then(|def| def.default.as_i32()))
            .unwrap_or(0)
    }
}

/// Seconds stored in a float parameter as a [`Duration`], rounded to the microsecond.
pub fn seconds_param(store: &dyn ParamStore, name: &str) -> Duration {
    let secs = f64::from(store.get_f32(name).max(0.0));
    Duration::from_micros((secs * 1e6).round() as u64)
}

/// In-process parameter store.
///
/// Counts notifying writes so callers can tell them apart from
/// [`ParamStore::set_no_notification`].
#[derive(Debug, Clone, Default)]
pub struct MemoryParamStore {
    values: HashMap<String, ParamValue>,
    notifications: u64,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with every default from [`PARAM_DEFS`].
    pub fn with_defaults() -> Self {
        let values = PARAM_DEFS
            .iter()
            .map(|def| (def.name.to_string(), def.default))
            .collect();
        Self {
            values,
            notifications: 0,
        }
    }

    /// Validate and write, raising a notification.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        let value = validate(name, value)?;
        self.values.insert(name.to_string(), value);
        self.notifications += 1;
        Ok(())
    }

    pub fn notifications(&self) -> u64 {
        self.notifications
    }
}

impl ParamStore for MemoryParamStore {
    fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    fn set_no_notification(&mut self, name: &str, value: ParamValue) {
        self.values.insert(name.to_string(), value);
    }
}
