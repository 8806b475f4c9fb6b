//! Land detection engine.
//!
//! [`LandDetector`] owns all per-cycle state: the cached telemetry, five
//! hysteresis gates, the observability tracker, the flight-time accumulator
//! and the last published result. The caller invokes [`LandDetector::run_cycle`]
//! on a fixed period; the engine never blocks and never fails a cycle, it
//! simply works from whatever telemetry it last saw.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bus::{LandDetectedSink, TelemetryBus};
use crate::flight_time::{FlightTimeAccumulator, FlightTimeHalves};
use crate::hysteresis::HysteresisGate;
use crate::models::{LandDetectionResult, TelemetrySnapshot};
use crate::observability::{DistBottomTracker, NOMINAL_HYSTERESIS_FACTOR};
use crate::params::{
    seconds_param, ParamStore, ParamValue, LND_FFALL_TTRI, LND_FLIGHT_T_HI, LND_FLIGHT_T_LO,
    LND_GC_TIME, LND_GE_TIME, LND_MAYBE_TIME, LND_TRIG_TIME,
};
use crate::provider::RawStateProvider;

/// Longest time between two publications of an unchanged result.
pub const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

/// Nominal cycle period the engine is tuned for.
pub const CYCLE_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
struct Gates {
    freefall: HysteresisGate,
    ground_contact: HysteresisGate,
    maybe_landed: HysteresisGate,
    landed: HysteresisGate,
    ground_effect: HysteresisGate,
}

impl Default for Gates {
    fn default() -> Self {
        Self {
            freefall: HysteresisGate::new(false),
            ground_contact: HysteresisGate::new(true),
            maybe_landed: HysteresisGate::new(true),
            landed: HysteresisGate::new(true),
            ground_effect: HysteresisGate::new(false),
        }
    }
}

impl Gates {
    fn configure(&mut self, params: &dyn ParamStore) {
        // Leaving a landed-like state is never delayed
        self.freefall.set_hysteresis_time_from(false, seconds_param(params, LND_FFALL_TTRI));
        self.freefall.set_hysteresis_time_from(true, Duration::ZERO);
        self.landed.set_hysteresis_time_from(false, seconds_param(params, LND_TRIG_TIME));
        self.landed.set_hysteresis_time_from(true, Duration::ZERO);
        self.maybe_landed.set_hysteresis_time_from(false, seconds_param(params, LND_MAYBE_TIME));
        self.maybe_landed.set_hysteresis_time_from(true, Duration::ZERO);
        self.ground_contact.set_hysteresis_time_from(false, seconds_param(params, LND_GC_TIME));
        self.ground_contact.set_hysteresis_time_from(true, Duration::ZERO);
        self.ground_effect.set_hysteresis_time_from(false, seconds_param(params, LND_GE_TIME));
        self.ground_effect.set_hysteresis_time_from(true, Duration::ZERO);
    }

    fn set_ground_contact_factor(&mut self, factor: u32) {
        self.ground_contact.set_scale_factor(factor);
        self.maybe_landed.set_scale_factor(factor);
    }
}

/// What a single cycle produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Result handed to the sink this cycle
    pub published: Option<LandDetectionResult>,
    /// Flight-time halves written to the parameter store this cycle
    pub flight_time_saved: Option<FlightTimeHalves>,
    pub params_reloaded: bool,
}

/// Periodic, debounced land detector.
pub struct LandDetector<P> {
    provider: P,
    telemetry: TelemetrySnapshot,
    observability: DistBottomTracker,
    gates: Gates,
    flight_time: FlightTimeAccumulator,
    land_detected: LandDetectionResult,
    last_publish: Option<Duration>,
    hysteresis_factor: u32,
}

impl<P: RawStateProvider> LandDetector<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            telemetry: TelemetrySnapshot::default(),
            observability: DistBottomTracker::new(),
            gates: Gates::default(),
            flight_time: FlightTimeAccumulator::new(),
            land_detected: LandDetectionResult::default(),
            last_publish: None,
            hysteresis_factor: NOMINAL_HYSTERESIS_FACTOR,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn telemetry(&self) -> &TelemetrySnapshot {
        &self.telemetry
    }

    /// Last published result.
    pub fn land_detected(&self) -> &LandDetectionResult {
        &self.land_detected
    }

    pub fn flight_time(&self) -> &FlightTimeAccumulator {
        &self.flight_time
    }

    pub fn observability(&self) -> &DistBottomTracker {
        &self.observability
    }

    /// Factor currently applied to the ground-contact gates.
    pub fn hysteresis_factor(&self) -> u32 {
        self.hysteresis_factor
    }

    /// Run one detection cycle at monotonic time `now`.
    pub fn run_cycle<B, S, K>(
        &mut self,
        now: Duration,
        bus: &mut B,
        params: &mut S,
        sink: &mut K,
    ) -> CycleReport
    where
        B: TelemetryBus + ?Sized,
        S: ParamStore,
        K: LandDetectedSink + ?Sized,
    {
        let mut report = CycleReport::default();

        if bus.parameter_update() || self.last_publish.is_none() {
            self.reload_params(params);
            report.params_reloaded = true;
        }

        self.refresh_telemetry(bus);

        if let Some(factor) = self.observability.update(&self.telemetry.local_position) {
            debug!(
                "Distance to ground {}, hysteresis factor {}",
                if factor == NOMINAL_HYSTERESIS_FACTOR { "recovered" } else { "lost" },
                factor
            );
            self.hysteresis_factor = factor;
            self.gates.set_ground_contact_factor(factor);
            self.provider.set_hysteresis_factor(factor);
        }

        let telemetry = &self.telemetry;
        let provider = &self.provider;
        self.gates.freefall.set_state_and_update(provider.get_freefall_state(telemetry), now);
        self.gates
            .ground_contact
            .set_state_and_update(provider.get_ground_contact_state(telemetry), now);
        self.gates
            .maybe_landed
            .set_state_and_update(provider.get_maybe_landed_state(telemetry), now);
        self.gates.landed.set_state_and_update(provider.get_landed_state(telemetry), now);
        self.gates
            .ground_effect
            .set_state_and_update(provider.get_ground_effect_state(telemetry), now);

        let max_altitude = provider.get_max_altitude(telemetry);
        let candidate = LandDetectionResult {
            landed: self.gates.landed.get_state(),
            freefall: self.gates.freefall.get_state(),
            maybe_landed: self.gates.maybe_landed.get_state(),
            ground_contact: self.gates.ground_contact.get_state(),
            in_ground_effect: self.gates.ground_effect.get_state(),
            alt_max: if max_altitude > 0.0 { max_altitude } else { f32::INFINITY },
            timestamp: now,
        };

        if self.should_publish(&candidate, now) {
            self.log_transitions(&candidate, now);

            if !candidate.landed && self.land_detected.landed && self.flight_time.mark_takeoff(now) {
                info!("Takeoff detected at {:?}", now);
            }

            self.land_detected = candidate;
            self.last_publish = Some(now);
            sink.publish(&self.land_detected);
            report.published = Some(self.land_detected);
        }

        // Saved on disarm rather than on landing so all writes happen disarmed
        if let Some(halves) = self.flight_time.update(now) {
            let (high, low) = halves.as_param_ints();
            params.set_no_notification(LND_FLIGHT_T_HI, ParamValue::Int(high));
            params.set_no_notification(LND_FLIGHT_T_LO, ParamValue::Int(low));
            info!(
                "Flight time saved, total {:.1}s",
                self.flight_time.total_flight_time().as_secs_f64()
            );
            report.flight_time_saved = Some(halves);
        }

        report
    }

    fn reload_params<S: ParamStore>(&mut self, params: &S) {
        self.gates.configure(params);
        self.provider.update_params(params);
        self.flight_time.load(FlightTimeHalves::from_param_ints(
            params.get_i32(LND_FLIGHT_T_HI),
            params.get_i32(LND_FLIGHT_T_LO),
        ));
        debug!(
            "Parameters loaded, total flight time {:.1}s",
            self.flight_time.total_flight_time().as_secs_f64()
        );
    }

    fn refresh_telemetry<B: TelemetryBus + ?Sized>(&mut self, bus: &mut B) {
        if let Some(armed) = bus.armed() {
            self.telemetry.armed = armed.armed;
            self.flight_time.set_armed(armed.armed);
        }
        if let Some(acceleration) = bus.acceleration() {
            self.telemetry.acceleration = acceleration;
            self.telemetry.has_acceleration = true;
        }
        if let Some(position) = bus.local_position() {
            self.telemetry.local_position = position;
        }
        if let Some(status) = bus.vehicle_status() {
            self.telemetry.vehicle_status = status;
        }
    }

    fn should_publish(&self, candidate: &LandDetectionResult, now: Duration) -> bool {
        match self.last_publish {
            None => true,
            Some(at) => {
                now.saturating_sub(at) >= PUBLISH_INTERVAL || candidate.differs_from(&self.land_detected)
            }
        }
    }

    fn log_transitions(&self, candidate: &LandDetectionResult, now: Duration) {
        let previous = &self.land_detected;
        if candidate.landed && !previous.landed {
            info!("Landing detected at {:?}", now);
        }
        if candidate.freefall && !previous.freefall {
            warn!("Freefall detected at {:?}", now);
        }
        if candidate.ground_contact != previous.ground_contact {
            debug!("Ground contact -> {}", candidate.ground_contact);
        }
    }
}
