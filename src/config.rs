use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Tunable engine parameters. Every section falls back to its defaults, so a
/// partial object only overrides what it names.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub pitch: PitchConfig,
    pub scoring: ScoringConfig,
    pub lines: LineConfig,
    pub calibration: CalibrationConfig,
    pub session: SessionConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PitchConfig {
    /// Lowest fundamental searched for, in Hz.
    pub min_freq: f32,
    /// Highest fundamental searched for, in Hz.
    pub max_freq: f32,
    /// RMS below this is treated as silence.
    pub rms_threshold: f32,
    /// Number of leading samples the noise gate looks at.
    pub gate_window: usize,
    /// Number of samples summed per lag.
    pub integration_window: usize,
    /// Step through the integration window (2 halves the cost).
    pub integration_stride: usize,
    /// Minimum normalized correlation for the chosen peak to count as voiced.
    pub clarity_threshold: f32,
    /// The first local peak reaching this fraction of the global maximum wins.
    pub peak_ratio: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        PitchConfig {
            min_freq: 50.0,
            max_freq: 1100.0,
            rms_threshold: 0.01,
            gate_window: 512,
            integration_window: 512,
            integration_stride: 2,
            clarity_threshold: 0.5,
            peak_ratio: 0.9,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Semitone distance below which a tick is Perfect.
    pub perfect_threshold: f64,
    /// Semitone distance below which a tick is Good.
    pub good_threshold: f64,
    pub perfect_base: u64,
    /// Extra points per combo step on a Perfect tick.
    pub combo_bonus: u64,
    pub good_points: u64,
    pub initial_mood: f64,
    pub mood_perfect: f64,
    pub mood_good: f64,
    pub mood_miss: f64,
    /// Applied on every tick spent silent inside a note.
    pub mood_silence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            perfect_threshold: 1.5,
            good_threshold: 3.0,
            perfect_base: 10,
            combo_bonus: 2,
            good_points: 5,
            initial_mood: 50.0,
            mood_perfect: 0.3,
            mood_good: 0.1,
            mood_miss: -0.4,
            mood_silence: -0.05,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LineConfig {
    /// Silence (seconds) between two notes that starts a new line.
    pub max_gap: f64,
    /// Lyric characters a line may accumulate before it is closed.
    pub max_chars: usize,
}

impl Default for LineConfig {
    fn default() -> Self {
        LineConfig {
            max_gap: 1.5,
            max_chars: 28,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CalibrationConfig {
    pub step_ms: i32,
    /// Offset is clamped to `[-limit_ms, limit_ms]`.
    pub limit_ms: i32,
    pub initial_ms: i32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            step_ms: 50,
            limit_ms: 5000,
            initial_ms: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Samples captured per tick.
    pub window_size: usize,
    pub trail_seconds: f64,
    pub trail_capacity: usize,
    /// A score snapshot is published every this many ticks.
    pub publish_every: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            window_size: 2048,
            trail_seconds: 3.0,
            trail_capacity: 512,
            publish_every: 6,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let pitch = &self.pitch;
        if !(pitch.min_freq > 0.0 && pitch.min_freq < pitch.max_freq) {
            return Err(EngineError::Config(format!(
                "Pitch range {}-{} Hz is empty",
                pitch.min_freq, pitch.max_freq
            )));
        }
        if pitch.integration_window == 0 || pitch.integration_stride == 0 || pitch.gate_window == 0 {
            return Err(EngineError::Config(
                "Pitch windows and stride must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&pitch.peak_ratio) {
            return Err(EngineError::Config(format!(
                "Peak ratio {} must lie in 0..=1",
                pitch.peak_ratio
            )));
        }

        let scoring = &self.scoring;
        if !(scoring.perfect_threshold > 0.0 && scoring.perfect_threshold <= scoring.good_threshold) {
            return Err(EngineError::Config(format!(
                "Perfect threshold {} must be positive and not above good threshold {}",
                scoring.perfect_threshold, scoring.good_threshold
            )));
        }
        if !(0.0..=100.0).contains(&scoring.initial_mood) {
            return Err(EngineError::Config(format!(
                "Initial mood {} must lie in 0..=100",
                scoring.initial_mood
            )));
        }

        if self.lines.max_gap < 0.0 {
            return Err(EngineError::Config("Line gap threshold is negative".to_string()));
        }

        let calibration = &self.calibration;
        if calibration.step_ms <= 0 || calibration.limit_ms < 0 {
            return Err(EngineError::Config(format!(
                "Calibration step {} ms / limit {} ms are invalid",
                calibration.step_ms, calibration.limit_ms
            )));
        }

        let session = &self.session;
        if session.window_size == 0 || session.publish_every == 0 || session.trail_capacity == 0 {
            return Err(EngineError::Config(
                "Session window, trail capacity and publish cadence must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
