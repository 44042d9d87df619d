use thiserror::Error;

/// Rejection reasons for a note timeline handed over by the chart loader.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Note sequence is empty")]
    Empty,

    #[error("Note {index} has an invalid start time {start_time}")]
    InvalidStartTime { index: usize, start_time: f64 },

    #[error("Note {index} has a non-positive duration {duration}")]
    NonPositiveDuration { index: usize, duration: f64 },

    #[error("Note {index} has pitch {pitch} outside the MIDI range 0-127")]
    PitchOutOfRange { index: usize, pitch: f64 },

    #[error("Note {index} starts before the note preceding it")]
    Unsorted { index: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Audio capture unavailable: {0}")]
    Unavailable(String),

    #[error("Audio capture is already open")]
    AlreadyOpen,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}
