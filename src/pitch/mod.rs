pub mod detector;
pub mod notes;

pub use detector::PitchDetector;
