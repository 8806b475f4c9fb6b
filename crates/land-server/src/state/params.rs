//! Shared parameter registry.
//!
//! Holds the live value of every parameter in a `DashMap` so the API and
//! the detector loop can read and write without a global lock. Writes are
//! tracked as dirty until the persistence loop flushes them.

use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use land_core::params::{validate, ParamStore, ParamValue, LND_FLIGHT_T_HI, LND_FLIGHT_T_LO, PARAM_DEFS};
use land_core::{join_flight_time, FlightTimeHalves, ParamError};
use tokio::sync::watch;

struct RegistryInner {
    values: DashMap<String, ParamValue>,
    dirty: DashSet<String>,
    updates: watch::Sender<u64>,
}

/// Cheaply cloneable handle to the parameter values.
#[derive(Clone)]
pub struct ParamRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for ParamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamRegistry {
    /// Registry seeded with every declared default.
    pub fn new() -> Self {
        let values = DashMap::new();
        for def in PARAM_DEFS {
            values.insert(def.name.to_string(), def.default);
        }
        Self {
            inner: Arc::new(RegistryInner {
                values,
                dirty: DashSet::new(),
                updates: watch::channel(0).0,
            }),
        }
    }

    /// Overlay persisted values. Invalid rows are skipped; nothing is marked dirty.
    pub fn load<I>(&self, rows: I) -> usize
    where
        I: IntoIterator<Item = (String, ParamValue)>,
    {
        let mut loaded = 0;
        for (name, value) in rows {
            match validate(&name, value) {
                Ok(value) => {
                    self.inner.values.insert(name, value);
                    loaded += 1;
                }
                Err(err) => tracing::warn!("Skipping stored parameter: {}", err),
            }
        }
        loaded
    }

    /// Validate and write a value, notifying the detector.
    pub fn set(&self, name: &str, value: ParamValue) -> Result<ParamValue, ParamError> {
        let value = validate(name, value)?;
        self.inner.values.insert(name.to_string(), value);
        self.inner.dirty.insert(name.to_string());
        self.inner.updates.send_modify(|count| *count += 1);
        Ok(value)
    }

    pub fn value(&self, name: &str) -> Option<ParamValue> {
        self.inner.values.get(name).map(|entry| *entry.value())
    }

    /// All parameters, sorted by name.
    pub fn list(&self) -> Vec<(String, ParamValue)> {
        let mut entries: Vec<(String, ParamValue)> = self
            .inner
            .values
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Receiver that changes on every notifying write.
    pub fn subscribe_updates(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    /// Remove and return every dirty parameter with its current value.
    pub fn take_dirty(&self) -> Vec<(String, ParamValue)> {
        let names: Vec<String> = self.inner.dirty.iter().map(|name| name.key().clone()).collect();
        let mut batch = Vec::with_capacity(names.len());
        for name in names {
            self.inner.dirty.remove(&name);
            if let Some(value) = self.value(&name) {
                batch.push((name, value));
            }
        }
        batch
    }

    pub fn mark_dirty<I: IntoIterator<Item = String>>(&self, names: I) {
        for name in names {
            self.inner.dirty.insert(name);
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.inner.dirty.len()
    }

    /// Persisted flight-time total.
    pub fn total_flight_time(&self) -> Duration {
        let halves =
            FlightTimeHalves::from_param_ints(self.get_i32(LND_FLIGHT_T_HI), self.get_i32(LND_FLIGHT_T_LO));
        Duration::from_micros(join_flight_time(halves))
    }
}

impl ParamStore for ParamRegistry {
    fn get(&self, name: &str) -> Option<ParamValue> {
        self.value(name)
    }

    fn set_no_notification(&mut self, name: &str, value: ParamValue) {
        self.inner.values.insert(name.to_string(), value);
        self.inner.dirty.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use land_core::params::LND_GC_TIME;

    #[test]
    fn new_registry_has_defaults() {
        let registry = ParamRegistry::new();
        assert_eq!(registry.list().len(), PARAM_DEFS.len());
        assert_eq!(registry.value(LND_GC_TIME), Some(ParamValue::Float(0.35)));
        assert_eq!(registry.dirty_count(), 0);
    }

    #[test]
    fn set_notifies_and_marks_dirty() {
        let registry = ParamRegistry::new();
        let rx = registry.subscribe_updates();

        registry.set(LND_GC_TIME, ParamValue::Float(1.0)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(registry.dirty_count(), 1);
    }

    #[test]
    fn no_notification_write_is_silent_but_dirty() {
        let mut registry = ParamRegistry::new();
        let rx = registry.subscribe_updates();

        registry.set_no_notification(LND_FLIGHT_T_LO, ParamValue::Int(42));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(registry.take_dirty(), vec![(LND_FLIGHT_T_LO.to_string(), ParamValue::Int(42))]);
        assert_eq!(registry.dirty_count(), 0);
    }

    #[test]
    fn invalid_set_is_rejected() {
        let registry = ParamRegistry::new();
        assert!(registry.set("LND_NOPE", ParamValue::Int(1)).is_err());
        assert!(registry.set(LND_GC_TIME, ParamValue::Float(-1.0)).is_err());
        assert_eq!(registry.dirty_count(), 0);
    }

    #[test]
    fn load_skips_invalid_rows() {
        let registry = ParamRegistry::new();
        let loaded = registry.load(vec![
            (LND_FLIGHT_T_HI.to_string(), ParamValue::Int(1)),
            ("LND_GONE".to_string(), ParamValue::Int(1)),
        ]);
        assert_eq!(loaded, 1);
        assert_eq!(registry.dirty_count(), 0);
        assert_eq!(registry.total_flight_time(), Duration::from_micros(1 << 32));
    }
}
