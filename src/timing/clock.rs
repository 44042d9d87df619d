use serde::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::timing::live::LiveReader;

/// Authoritative playback position, in seconds, owned by the media player.
pub trait PlaybackClock {
    fn position(&self) -> f64;
}

impl<F: Fn() -> f64> PlaybackClock for F {
    fn position(&self) -> f64 {
        self()
    }
}

impl PlaybackClock for LiveReader<f64> {
    fn position(&self) -> f64 {
        self.get()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationStep {
    Earlier,
    Later,
}

/// User latency compensation, kept in whole milliseconds so repeated steps do
/// not drift.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    offset_ms: i32,
    step_ms: i32,
    limit_ms: i32,
}

impl Calibration {
    pub fn new(config: &CalibrationConfig) -> Self {
        let limit_ms = config.limit_ms.max(0);
        Calibration {
            offset_ms: config.initial_ms.clamp(-limit_ms, limit_ms),
            step_ms: config.step_ms,
            limit_ms,
        }
    }

    pub fn step(&mut self, step: CalibrationStep) -> i32 {
        let delta = match step {
            CalibrationStep::Earlier => -self.step_ms,
            CalibrationStep::Later => self.step_ms,
        };
        self.offset_ms = self
            .offset_ms
            .saturating_add(delta)
            .clamp(-self.limit_ms, self.limit_ms);
        log::info!("Calibration offset now {} ms", self.offset_ms);
        self.offset_ms
    }

    pub fn reset(&mut self) {
        self.offset_ms = 0;
    }

    pub fn offset_ms(&self) -> i32 {
        self.offset_ms
    }

    pub fn offset_seconds(&self) -> f64 {
        self.offset_ms as f64 / 1000.0
    }
}

/// Current playback time as seen by scoring: the latest clock reading plus the
/// calibration offset. No extrapolation is done between readings; a stalled
/// clock simply yields the same time again.
pub struct TimeSource<K> {
    clock: K,
    calibration: Calibration,
    last_position: f64,
}

impl<K: PlaybackClock> TimeSource<K> {
    pub fn new(clock: K, calibration: Calibration) -> Self {
        TimeSource {
            clock,
            calibration,
            last_position: 0.0,
        }
    }

    pub fn current_time(&mut self) -> f64 {
        let reported = self.clock.position();
        if reported.is_finite() {
            self.last_position = reported;
        }
        self.last_position + self.calibration.offset_seconds()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut Calibration {
        &mut self.calibration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::live::live_value;

    fn calibration() -> Calibration {
        Calibration::new(&CalibrationConfig::default())
    }

    #[test]
    fn test_offset_applied_immediately() {
        let (writer, reader) = live_value(10.0);
        let mut time = TimeSource::new(reader, calibration());
        assert_eq!(time.current_time(), 10.0);
        time.calibration_mut().step(CalibrationStep::Later);
        assert!((time.current_time() - 10.05).abs() < 1e-9);
        writer.set(11.0);
        time.calibration_mut().step(CalibrationStep::Earlier);
        time.calibration_mut().step(CalibrationStep::Earlier);
        assert!((time.current_time() - 10.95).abs() < 1e-9);
    }

    #[test]
    fn test_offset_clamped() {
        let mut cal = calibration();
        for _ in 0..500 {
            cal.step(CalibrationStep::Later);
        }
        assert_eq!(cal.offset_ms(), 5000);
        for _ in 0..1000 {
            cal.step(CalibrationStep::Earlier);
        }
        assert_eq!(cal.offset_ms(), -5000);
        cal.reset();
        assert_eq!(cal.offset_ms(), 0);
    }

    #[test]
    fn test_initial_offset_clamped() {
        let cal = Calibration::new(&CalibrationConfig {
            step_ms: 50,
            limit_ms: 200,
            initial_ms: 900,
        });
        assert_eq!(cal.offset_ms(), 200);
    }

    #[test]
    fn test_stalled_and_backwards_clock_used_as_reported() {
        let (writer, reader) = live_value(3.0);
        let mut time = TimeSource::new(reader, calibration());
        assert_eq!(time.current_time(), 3.0);
        assert_eq!(time.current_time(), 3.0);
        writer.set(2.5);
        assert_eq!(time.current_time(), 2.5);
    }

    #[test]
    fn test_non_finite_reading_holds_last_value() {
        let (writer, reader) = live_value(4.0);
        let mut time = TimeSource::new(reader, calibration());
        assert_eq!(time.current_time(), 4.0);
        writer.set(f64::NAN);
        assert_eq!(time.current_time(), 4.0);
    }

    #[test]
    fn test_closure_clock() {
        let mut time = TimeSource::new(|| 1.5, calibration());
        assert_eq!(time.current_time(), 1.5);
    }
}
