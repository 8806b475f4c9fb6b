//! Accumulated flight time across arm/disarm cycles.
//!
//! The total is a single `u64` of microseconds. It only meets its two
//! 32-bit storage halves in [`split_flight_time`] and [`join_flight_time`].

use std::time::Duration;

/// Flight time as stored: two 32-bit halves of a microsecond count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlightTimeHalves {
    pub high: u32,
    pub low: u32,
}

impl FlightTimeHalves {
    /// Halves as the signed 32-bit values held by the parameter store.
    pub fn as_param_ints(&self) -> (i32, i32) {
        (self.high as i32, self.low as i32)
    }

    pub fn from_param_ints(high: i32, low: i32) -> Self {
        Self {
            high: high as u32,
            low: low as u32,
        }
    }
}

pub fn split_flight_time(total_us: u64) -> FlightTimeHalves {
    FlightTimeHalves {
        high: (total_us >> 32) as u32,
        low: (total_us & 0xffff_ffff) as u32,
    }
}

pub fn join_flight_time(halves: FlightTimeHalves) -> u64 {
    (u64::from(halves.high) << 32) | u64::from(halves.low)
}

/// Tracks takeoff and arming to accumulate airborne time.
#[derive(Debug, Clone, Default)]
pub struct FlightTimeAccumulator {
    total_flight_time_us: u64,
    takeoff_time: Option<Duration>,
    armed: bool,
    previous_armed: bool,
}

impl FlightTimeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the running total with a persisted value.
    pub fn load(&mut self, halves: FlightTimeHalves) {
        self.total_flight_time_us = join_flight_time(halves);
    }

    pub fn total_flight_time_us(&self) -> u64 {
        self.total_flight_time_us
    }

    pub fn total_flight_time(&self) -> Duration {
        Duration::from_micros(self.total_flight_time_us)
    }

    pub fn takeoff_time(&self) -> Option<Duration> {
        self.takeoff_time
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    /// Record a takeoff at `now` unless one is already tracked.
    ///
    /// Returns whether the takeoff was recorded.
    pub fn mark_takeoff(&mut self, now: Duration) -> bool {
        if self.takeoff_time.is_some() {
            return false;
        }
        self.takeoff_time = Some(now);
        true
    }

    /// End-of-cycle bookkeeping.
    ///
    /// On the disarm edge with a tracked takeoff, folds the flight into the
    /// total and returns the halves to persist.
    pub fn update(&mut self, now: Duration) -> Option<FlightTimeHalves> {
        let disarmed = self.previous_armed && !self.armed;
        self.previous_armed = self.armed;

        if !disarmed {
            return None;
        }
        let takeoff = self.takeoff_time.take()?;
        let flight_us = now.saturating_sub(takeoff).as_micros() as u64;
        self.total_flight_time_us = self.total_flight_time_us.saturating_add(flight_us);
        Some(split_flight_time(self.total_flight_time_us))
    }
}
