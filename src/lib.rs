use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod lines;
pub mod pitch;
pub mod scoring;
pub mod session;
pub mod timing;

use config::{EngineConfig, PitchConfig};
use pitch::notes;
use scoring::types::{DifficultyMode, Note, NoteSequence};
use session::{PushCapture, Session};
use timing::{live_value, CalibrationStep, LiveReader, LiveWriter};

use std::cell::RefCell;

thread_local! {
    static DETECTOR: RefCell<Option<pitch::PitchDetector>> = RefCell::new(None);
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn config_from_js(config_js: JsValue) -> Result<EngineConfig, JsValue> {
    if config_js.is_null() || config_js.is_undefined() {
        return Ok(EngineConfig::default());
    }
    serde_wasm_bindgen::from_value(config_js).map_err(js_error)
}

/// Pitch detection returning Float64Array [hz, midi_float]; both are 0 when no
/// pitch was found. Uses a thread-local detector so repeated calls do not allocate.
#[wasm_bindgen]
pub fn detect_pitch(samples: &[f32], sample_rate: f32) -> js_sys::Float64Array {
    let hz = DETECTOR.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let detector = borrow
            .get_or_insert_with(|| pitch::PitchDetector::new(sample_rate, PitchConfig::default()));
        detector.detect(samples, sample_rate)
    });

    let arr = js_sys::Float64Array::new_with_length(2);
    if let Some(hz) = hz {
        arr.set_index(0, hz as f64);
        arr.set_index(1, notes::frequency_to_midi(hz as f64));
    }
    arr
}

#[wasm_bindgen]
pub fn frequency_to_midi(hz: f64) -> f64 {
    notes::frequency_to_midi(hz)
}

#[wasm_bindgen]
pub fn midi_to_note_name(midi: f64) -> String {
    notes::midi_to_note_name(midi)
}

/// Group notes into display lines. `config_js` may be null or a partial
/// engine config.
#[wasm_bindgen]
pub fn segment_lines(notes_js: JsValue, config_js: JsValue) -> Result<JsValue, JsValue> {
    let notes: Vec<Note> = serde_wasm_bindgen::from_value(notes_js).map_err(js_error)?;
    let notes = NoteSequence::new(notes).map_err(js_error)?;
    let config = config_from_js(config_js)?;
    let lines = lines::segment(&notes, &config.lines);
    serde_wasm_bindgen::to_value(&lines).map_err(js_error)
}

/// One play session. The host pushes each analyser window and the media
/// player's position, then calls `tick` once per animation frame.
#[wasm_bindgen]
pub struct KaraokeSession {
    inner: Session<PushCapture, LiveReader<f64>>,
    position: LiveWriter<f64>,
}

#[wasm_bindgen]
impl KaraokeSession {
    #[wasm_bindgen(constructor)]
    pub fn new(notes_js: JsValue, config_js: JsValue) -> Result<KaraokeSession, JsValue> {
        let notes: Vec<Note> = serde_wasm_bindgen::from_value(notes_js).map_err(js_error)?;
        let config = config_from_js(config_js)?;
        let (position, reader) = live_value(0.0);
        let capture = PushCapture::new(config.session.window_size);
        let inner = Session::load(notes, &config, capture, reader).map_err(js_error)?;
        Ok(KaraokeSession { inner, position })
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.inner.start().map_err(js_error)
    }

    pub fn stop(&mut self) {
        self.inner.stop();
    }

    pub fn push_samples(&mut self, samples: &[f32], sample_rate: f32) {
        self.inner.capture_mut().push(samples, sample_rate);
    }

    pub fn set_playback_position(&self, seconds: f64) {
        self.position.set(seconds);
    }

    /// Move the calibration offset one step; returns the new offset in ms.
    pub fn calibrate(&mut self, later: bool) -> i32 {
        let step = if later {
            CalibrationStep::Later
        } else {
            CalibrationStep::Earlier
        };
        self.inner.calibrate(step)
    }

    /// Run one frame. Returns null when the session is not playing.
    pub fn tick(&mut self, tolerant: bool) -> Result<JsValue, JsValue> {
        let mode = if tolerant {
            DifficultyMode::Tolerant
        } else {
            DifficultyMode::Strict
        };
        match self.inner.tick(mode) {
            Some(report) => serde_wasm_bindgen::to_value(&report).map_err(js_error),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn score_state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.score_state()).map_err(js_error)
    }

    pub fn hit_notes(&self) -> Vec<u32> {
        self.inner.hits().indices().map(|i| i as u32).collect()
    }

    pub fn lines(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.lines()).map_err(js_error)
    }

    pub fn line_window(&mut self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.line_window()).map_err(js_error)
    }

    pub fn pitch_trail(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.trail()).map_err(js_error)
    }

    pub fn summary(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.summary()).map_err(js_error)
    }
}
