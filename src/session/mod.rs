pub mod capture;
pub mod trail;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::lines::{self, KaraokeLine, LineWindow};
use crate::pitch::PitchDetector;
use crate::scoring::engine::{ScoringEngine, TickOutcome};
use crate::scoring::summary::{summarize, PerformanceSummary};
use crate::scoring::types::*;
use crate::timing::{Calibration, CalibrationStep, PlaybackClock, TimeSource};

pub use capture::{AudioCapture, CaptureLease, CapturedFrame, PushCapture};
pub use trail::PitchTrail;

const INITIAL_SAMPLE_RATE: f32 = 48_000.0;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
    Stopped,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TickReport {
    pub time: f64,
    pub pitch_hz: Option<f32>,
    #[serde(flatten)]
    pub outcome: TickOutcome,
    /// Full copy of the score, present only on publishing ticks.
    pub snapshot: Option<ScoreState>,
}

/// Lets a score snapshot through every `every` ticks, starting with the first.
pub struct SnapshotThrottle {
    every: u32,
    countdown: u32,
}

impl SnapshotThrottle {
    pub fn new(every: u32) -> Self {
        SnapshotThrottle {
            every: every.max(1),
            countdown: 0,
        }
    }

    /// Make the next poll publish.
    pub fn arm(&mut self) {
        self.countdown = 0;
    }

    pub fn poll(&mut self) -> bool {
        if self.countdown == 0 {
            self.countdown = self.every - 1;
            true
        } else {
            self.countdown -= 1;
            false
        }
    }
}

/// Per-frame driver tying capture, pitch detection, timing and scoring together.
///
/// The host owns the loop and calls [`Session::tick`] once per render frame
/// while playing. After [`Session::stop`], `tick` returns `None` without
/// touching anything.
pub struct Session<C: AudioCapture, K: PlaybackClock> {
    detector: PitchDetector,
    engine: ScoringEngine,
    time: TimeSource<K>,
    capture: CaptureLease<C>,
    window: Vec<f32>,
    trail: PitchTrail,
    throttle: SnapshotThrottle,
    lines: Vec<KaraokeLine>,
    state: SessionState,
    // Last capture rate whose windows were too short for the detector
    short_window_rate: Option<f32>,
}

impl<C: AudioCapture, K: PlaybackClock> Session<C, K> {
    pub fn new(
        notes: NoteSequence,
        config: &EngineConfig,
        capture: C,
        clock: K,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let lines = lines::segment(&notes, &config.lines);
        log::info!(
            "Loaded {} notes in {} lines, {:.1}s long",
            notes.len(),
            lines.len(),
            notes.end_time()
        );

        let detector = PitchDetector::new(INITIAL_SAMPLE_RATE, config.pitch.clone());
        if config.session.window_size < detector.required_len() {
            log::warn!(
                "Capture window of {} samples is shorter than the {} the pitch detector needs at {} Hz",
                config.session.window_size,
                detector.required_len(),
                INITIAL_SAMPLE_RATE
            );
        }

        Ok(Session {
            detector,
            engine: ScoringEngine::new(notes, config.scoring.clone()),
            time: TimeSource::new(clock, Calibration::new(&config.calibration)),
            capture: CaptureLease::new(capture),
            window: vec![0.0; config.session.window_size],
            trail: PitchTrail::new(config.session.trail_seconds, config.session.trail_capacity),
            throttle: SnapshotThrottle::new(config.session.publish_every),
            lines,
            state: SessionState::Idle,
            short_window_rate: None,
        })
    }

    /// Validate raw notes from the chart loader and build a session on them.
    pub fn load(
        notes: Vec<Note>,
        config: &EngineConfig,
        capture: C,
        clock: K,
    ) -> Result<Self, EngineError> {
        let notes = NoteSequence::new(notes).map_err(|e| {
            log::warn!("Rejected note sequence: {}", e);
            e
        })?;
        Session::new(notes, config, capture, clock)
    }

    /// Open the capture and reset score, hits and trail to their baseline.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state == SessionState::Playing {
            log::debug!("Session already playing");
            return Ok(());
        }
        self.capture.acquire()?;
        self.engine.reset();
        self.trail.clear();
        self.throttle.arm();
        self.state = SessionState::Playing;
        log::info!("Session started");
        Ok(())
    }

    /// Halt ticking and release the capture. Safe to call in any state.
    pub fn stop(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        self.state = SessionState::Stopped;
        self.capture.release();
        let score = self.engine.state();
        log::info!(
            "Session stopped: score {}, max combo {}",
            score.current_score,
            score.max_combo
        );
    }

    pub fn tick(&mut self, mode: DifficultyMode) -> Option<TickReport> {
        if self.state != SessionState::Playing {
            return None;
        }

        let time = self.time.current_time();
        let pitch_hz = match self.capture.read_window(&mut self.window) {
            Some(frame) => {
                let hz = self
                    .detector
                    .detect(&self.window[..frame.len], frame.sample_rate);
                self.check_window(frame);
                hz
            }
            None => None,
        };

        let outcome = self.engine.tick(time, pitch_hz, mode);
        match outcome.sung_midi {
            Some(midi) => self.trail.push(PitchSample {
                time,
                midi,
                is_hit: outcome.judgement.map_or(false, Judgement::is_hit),
            }),
            None => self.trail.prune(time),
        }

        let snapshot = self.throttle.poll().then(|| *self.engine.state());

        Some(TickReport {
            time,
            pitch_hz,
            outcome,
            snapshot,
        })
    }

    /// Warn once per sample rate when captured windows cannot hold the lag range.
    fn check_window(&mut self, frame: CapturedFrame) {
        let required = self.detector.required_len();
        if frame.len >= required || self.short_window_rate == Some(frame.sample_rate) {
            return;
        }
        self.short_window_rate = Some(frame.sample_rate);
        log::warn!(
            "Captured window of {} samples at {} Hz is shorter than the {} the pitch detector needs; no pitch will be detected",
            frame.len,
            frame.sample_rate,
            required
        );
    }

    pub fn calibrate(&mut self, step: CalibrationStep) -> i32 {
        self.time.calibration_mut().step(step)
    }

    pub fn calibration(&self) -> &Calibration {
        self.time.calibration()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score_state(&self) -> &ScoreState {
        self.engine.state()
    }

    pub fn hits(&self) -> &NoteHitRecord {
        self.engine.hits()
    }

    pub fn notes(&self) -> &NoteSequence {
        self.engine.notes()
    }

    pub fn lines(&self) -> &[KaraokeLine] {
        &self.lines
    }

    pub fn line_window(&mut self) -> LineWindow {
        let time = self.time.current_time();
        lines::line_window(&self.lines, time)
    }

    pub fn trail(&self) -> &PitchTrail {
        &self.trail
    }

    pub fn summary(&self) -> PerformanceSummary {
        summarize(self.engine.notes(), self.engine.state(), self.engine.hits())
    }

    pub fn capture(&self) -> &C {
        self.capture.capture()
    }

    pub fn capture_mut(&mut self) -> &mut C {
        self.capture.capture_mut()
    }

    pub fn capture_open(&self) -> bool {
        self.capture.is_open()
    }
}
