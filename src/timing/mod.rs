pub mod clock;
pub mod live;

pub use clock::{Calibration, CalibrationStep, PlaybackClock, TimeSource};
pub use live::{live_value, LiveReader, LiveWriter};
