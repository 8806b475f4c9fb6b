//! Boolean debounce with asymmetric dwell times.
//!
//! A [`HysteresisGate`] only reports a new state after its raw input has
//! disagreed with the reported state for an uninterrupted dwell time. The
//! dwell time depends on the direction of the change and is multiplied by a
//! runtime scale factor, which the engine raises while distance-to-ground is
//! unreliable.

use std::time::Duration;

/// Debounced boolean signal.
#[derive(Debug, Clone)]
pub struct HysteresisGate {
    state: bool,
    /// Time the raw input first disagreed with `state`, if it still does.
    pending_since: Option<Duration>,
    /// Dwell required to go from `false` to `true`
    enter_delay: Duration,
    /// Dwell required to go from `true` to `false`
    exit_delay: Duration,
    scale_factor: u32,
}

impl HysteresisGate {
    /// Create a gate reporting `initial_state` with zero dwell times.
    pub fn new(initial_state: bool) -> Self {
        Self {
            state: initial_state,
            pending_since: None,
            enter_delay: Duration::ZERO,
            exit_delay: Duration::ZERO,
            scale_factor: 1,
        }
    }

    /// Set both dwell times.
    pub fn with_delays(mut self, enter_delay: Duration, exit_delay: Duration) -> Self {
        self.enter_delay = enter_delay;
        self.exit_delay = exit_delay;
        self
    }

    /// Set the dwell time required to leave `from_state`.
    pub fn set_hysteresis_time_from(&mut self, from_state: bool, delay: Duration) {
        if from_state {
            self.exit_delay = delay;
        } else {
            self.enter_delay = delay;
        }
    }

    /// Multiply both dwell times by `factor` from the next evaluation on.
    ///
    /// A factor of zero is treated as one.
    pub fn set_scale_factor(&mut self, factor: u32) {
        self.scale_factor = factor.max(1);
    }

    pub fn scale_factor(&self) -> u32 {
        self.scale_factor
    }

    /// Feed the raw input observed at `now` and re-evaluate the output.
    pub fn set_state_and_update(&mut self, raw: bool, now: Duration) {
        if raw == self.state {
            self.pending_since = None;
            return;
        }

        let since = *self.pending_since.get_or_insert(now);
        if now.saturating_sub(since) >= self.required_dwell(raw) {
            self.state = raw;
            self.pending_since = None;
        }
    }

    /// Current debounced output.
    pub fn get_state(&self) -> bool {
        self.state
    }

    /// Whether a transition is currently waiting out its dwell time.
    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    fn required_dwell(&self, target: bool) -> Duration {
        let base = if target { self.enter_delay } else { self.exit_delay };
        base.saturating_mul(self.scale_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_commits_after_enter_delay() {
        let mut gate = HysteresisGate::new(false).with_delays(ms(300), ms(0));

        gate.set_state_and_update(true, ms(1000));
        assert!(!gate.get_state());
        assert!(gate.is_pending());

        gate.set_state_and_update(true, ms(1299));
        assert!(!gate.get_state());

        gate.set_state_and_update(true, ms(1300));
        assert!(gate.get_state());
        assert!(!gate.is_pending());
    }

    #[test]
    fn test_zero_delay_commits_immediately() {
        let mut gate = HysteresisGate::new(true).with_delays(ms(300), ms(0));
        gate.set_state_and_update(false, ms(5));
        assert!(!gate.get_state());
    }

    #[test]
    fn test_asymmetric_delays() {
        let mut gate = HysteresisGate::new(false).with_delays(ms(100), ms(500));

        gate.set_state_and_update(true, ms(0));
        gate.set_state_and_update(true, ms(100));
        assert!(gate.get_state());

        gate.set_state_and_update(false, ms(200));
        gate.set_state_and_update(false, ms(600));
        assert!(gate.get_state());
        gate.set_state_and_update(false, ms(700));
        assert!(!gate.get_state());
    }

    #[test]
    fn test_flapping_input_never_commits() {
        let mut gate = HysteresisGate::new(false).with_delays(ms(300), ms(300));

        // Raw input toggles every 50 ms, well below the dwell time
        for step in 0..100u64 {
            gate.set_state_and_update(step % 2 == 0, ms(step * 50));
            assert!(!gate.get_state(), "gate flipped at step {}", step);
        }
    }

    #[test]
    fn test_agreement_cancels_pending_transition() {
        let mut gate = HysteresisGate::new(false).with_delays(ms(300), ms(0));

        gate.set_state_and_update(true, ms(0));
        gate.set_state_and_update(true, ms(250));
        gate.set_state_and_update(false, ms(260));
        assert!(!gate.is_pending());

        // The dwell restarts from the next disagreement
        gate.set_state_and_update(true, ms(270));
        gate.set_state_and_update(true, ms(500));
        assert!(!gate.get_state());
        gate.set_state_and_update(true, ms(570));
        assert!(gate.get_state());
    }

    #[test]
    fn test_scale_factor_stretches_dwell() {
        let mut gate = HysteresisGate::new(false).with_delays(ms(100), ms(0));
        gate.set_scale_factor(3);

        gate.set_state_and_update(true, ms(0));
        gate.set_state_and_update(true, ms(299));
        assert!(!gate.get_state());
        gate.set_state_and_update(true, ms(300));
        assert!(gate.get_state());
    }

    #[test]
    fn test_scale_factor_change_applies_to_pending_interval() {
        let mut gate = HysteresisGate::new(false).with_delays(ms(100), ms(0));
        gate.set_scale_factor(3);

        gate.set_state_and_update(true, ms(0));
        gate.set_state_and_update(true, ms(150));
        assert!(!gate.get_state());

        // Dropping back to 1x: 160 ms already pending satisfies 100 ms
        gate.set_scale_factor(1);
        gate.set_state_and_update(true, ms(160));
        assert!(gate.get_state());
    }

    #[test]
    fn test_reconfigure_single_direction() {
        let mut gate = HysteresisGate::new(true);
        gate.set_hysteresis_time_from(true, ms(200));

        gate.set_state_and_update(false, ms(0));
        gate.set_state_and_update(false, ms(199));
        assert!(gate.get_state());
        gate.set_state_and_update(false, ms(200));
        assert!(!gate.get_state());

        // Enter delay untouched (zero)
        gate.set_state_and_update(true, ms(201));
        assert!(gate.get_state());
    }

    #[test]
    fn test_zero_scale_factor_is_clamped() {
        let mut gate = HysteresisGate::new(false);
        gate.set_scale_factor(0);
        assert_eq!(gate.scale_factor(), 1);
    }
}
