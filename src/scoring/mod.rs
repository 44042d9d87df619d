pub mod engine;
pub mod summary;
pub mod types;

pub use engine::{reduce, ScoringEngine, TickOutcome};
pub use summary::{summarize, PerformanceSummary, Rating};
pub use types::{
    DifficultyMode, Judgement, Note, NoteHitRecord, NoteSequence, PitchSample, ScoreState,
};
