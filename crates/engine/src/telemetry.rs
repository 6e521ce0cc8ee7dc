//! Synthetic telemetry standing in for sensor polling.
//!
//! Each tick applies a bounded, zero-mean random walk to every zone's
//! moisture and to the battery level, clamped to the simulated band, and
//! refreshes the status timestamp. Solar and pump flags are never touched.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock;
use crate::state::{IrrigationState, SharedState};

/// Default interval between simulated readings.
pub const DEFAULT_TICK: Duration = Duration::from_millis(3000);

/// Band the simulator keeps moisture and battery readings in.
pub const SIM_FLOOR: f64 = 20.0;
pub const SIM_CEILING: f64 = 100.0;

/// Largest moisture change per tick, in percentage points.
pub const MOISTURE_STEP: f64 = 2.5;
/// Largest battery change per tick, in percentage points.
pub const BATTERY_STEP: f64 = 1.0;

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct TelemetrySimulator {
    rng: fastrand::Rng,
}

impl Default for TelemetrySimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySimulator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Reproducible sequence, for tests and demos.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Uniform sample in `[-amplitude, amplitude)`.
    fn jitter(&mut self, amplitude: f64) -> f64 {
        (self.rng.f64() - 0.5) * 2.0 * amplitude
    }

    /// Apply one simulated reading to every zone and the battery.
    pub fn tick(&mut self, state: &mut IrrigationState) {
        for zone in &mut state.zones {
            let delta = self.jitter(MOISTURE_STEP);
            zone.moisture = drift(zone.moisture, delta);
        }

        let delta = self.jitter(BATTERY_STEP);
        state.status.battery_level = drift(state.status.battery_level, delta);
        state.status.last_update = clock::time_of_day();
        state.ticks += 1;
    }
}

/// `current + delta` clamped to the simulated band. A non-finite result is
/// discarded and `current` kept (pulled into the band if needed).
fn drift(current: f64, delta: f64) -> f64 {
    let next = current + delta;
    if next.is_finite() {
        next.clamp(SIM_FLOOR, SIM_CEILING)
    } else {
        warn!(current, delta, "telemetry: discarding non-finite reading");
        if current.is_finite() {
            current.clamp(SIM_FLOOR, SIM_CEILING)
        } else {
            SIM_FLOOR
        }
    }
}

// ---------------------------------------------------------------------------
// Recurring task
// ---------------------------------------------------------------------------

/// Owned handle to the running telemetry loop. Dropping it cancels the loop;
/// [`TelemetryTask::stop`] also waits until the task is gone.
pub struct TelemetryTask {
    handle: Option<JoinHandle<()>>,
}

impl TelemetryTask {
    /// Spawn the loop. The first tick fires one `period` after the call.
    pub fn spawn(shared: SharedState, mut sim: TelemetrySimulator, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // The write guard is held only across synchronous code, so a
                // cancelled task never leaves a half-applied tick behind.
                let mut st = shared.write().await;
                sim.tick(&mut st);
                debug!(tick = st.ticks, battery = st.status.battery_level, "telemetry tick");
            }
        });

        info!(tick_ms = period.as_millis() as u64, "telemetry started");
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait for it to wind down. No tick is applied
    /// after this returns.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            info!("telemetry stopped");
        }
    }
}

impl Drop for TelemetryTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("telemetry cancelled on drop");
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{IrrigationState, SystemStatus, Zone};

    fn in_band(v: f64) -> bool {
        (SIM_FLOOR..=SIM_CEILING).contains(&v)
    }

    // -- Simulator ------------------------------------------------------------

    #[test]
    fn readings_stay_in_band_over_many_ticks() {
        let mut sim = TelemetrySimulator::with_seed(7);
        let mut st = IrrigationState::default();
        for _ in 0..5_000 {
            sim.tick(&mut st);
            for z in &st.zones {
                assert!(in_band(z.moisture), "moisture out of band: {}", z.moisture);
            }
            assert!(
                in_band(st.status.battery_level),
                "battery out of band: {}",
                st.status.battery_level
            );
        }
    }

    #[test]
    fn step_is_bounded() {
        let mut sim = TelemetrySimulator::with_seed(42);
        let mut st = IrrigationState::default();
        for _ in 0..1_000 {
            let before: Vec<f64> = st.zones.iter().map(|z| z.moisture).collect();
            let battery_before = st.status.battery_level;
            sim.tick(&mut st);
            for (b, z) in before.iter().zip(&st.zones) {
                assert!((z.moisture - b).abs() <= MOISTURE_STEP + 1e-9);
            }
            assert!((st.status.battery_level - battery_before).abs() <= BATTERY_STEP + 1e-9);
        }
    }

    #[test]
    fn readings_below_floor_are_pulled_into_band() {
        let zones = vec![Zone::new(1, 5.0, false, "Radis", "Sol sableux")];
        let mut st = IrrigationState::new(zones, SystemStatus::new(10.0, false));
        TelemetrySimulator::with_seed(1).tick(&mut st);
        assert_eq!(st.zones[0].moisture, SIM_FLOOR);
        assert_eq!(st.status.battery_level, SIM_FLOOR);
    }

    #[test]
    fn tick_leaves_flags_and_labels_alone() {
        let mut st = IrrigationState::default();
        st.status.pump_on = true;
        let mut sim = TelemetrySimulator::with_seed(3);
        for _ in 0..50 {
            sim.tick(&mut st);
        }
        assert!(st.status.pump_on);
        assert!(st.status.solar_power);
        assert_eq!(st.open_zone_count(), 1);
        assert_eq!(st.zone(1).unwrap().plant_type, "Tomates");
        assert_eq!(st.ticks, 50);
    }

    #[test]
    fn tick_does_not_touch_the_activity_log() {
        let mut st = IrrigationState::default();
        let before = st.log.len();
        TelemetrySimulator::with_seed(5).tick(&mut st);
        assert_eq!(st.log.len(), before);
    }

    #[test]
    fn same_seed_same_walk() {
        let mut a = IrrigationState::default();
        let mut b = IrrigationState::default();
        let mut sa = TelemetrySimulator::with_seed(99);
        let mut sb = TelemetrySimulator::with_seed(99);
        for _ in 0..20 {
            sa.tick(&mut a);
            sb.tick(&mut b);
        }
        assert_eq!(a.zones, b.zones);
        assert_eq!(a.status.battery_level, b.status.battery_level);
    }

    // -- drift ------------------------------------------------------------------

    #[test]
    fn drift_discards_non_finite() {
        assert_eq!(drift(50.0, f64::NAN), 50.0);
        assert_eq!(drift(50.0, f64::INFINITY), 50.0);
        assert_eq!(drift(f64::NAN, 1.0), SIM_FLOOR);
    }

    #[test]
    fn drift_clamps() {
        assert_eq!(drift(99.0, 2.5), SIM_CEILING);
        assert_eq!(drift(21.0, -2.5), SIM_FLOOR);
        assert_eq!(drift(50.0, 1.5), 51.5);
    }

    // -- Task -------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn task_ticks_once_per_period() {
        let shared = IrrigationState::default().shared();
        let task = TelemetryTask::spawn(
            shared.clone(),
            TelemetrySimulator::with_seed(1),
            Duration::from_secs(3),
        );

        tokio::time::sleep(Duration::from_millis(9_500)).await;
        assert_eq!(shared.read().await.ticks, 3);
        assert!(task.is_running());

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_task_no_longer_ticks() {
        let shared = IrrigationState::default().shared();
        let task = TelemetryTask::spawn(
            shared.clone(),
            TelemetrySimulator::with_seed(1),
            Duration::from_secs(3),
        );
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        task.stop().await;

        let ticks = shared.read().await.ticks;
        let moisture: Vec<f64> = shared.read().await.zones.iter().map(|z| z.moisture).collect();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let st = shared.read().await;
        assert_eq!(st.ticks, ticks);
        assert_eq!(st.zones.iter().map(|z| z.moisture).collect::<Vec<_>>(), moisture);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_task_cancels_loop() {
        let shared = IrrigationState::default().shared();
        {
            let _task = TelemetryTask::spawn(
                shared.clone(),
                TelemetrySimulator::with_seed(1),
                Duration::from_secs(3),
            );
            tokio::time::sleep(Duration::from_millis(3_500)).await;
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(shared.read().await.ticks, 1);
    }
}
