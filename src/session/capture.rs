use crate::error::CaptureError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapturedFrame {
    /// Number of samples written to the front of the window.
    pub len: usize,
    pub sample_rate: f32,
}

/// Microphone source polled once per tick.
pub trait AudioCapture {
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Copy the newest samples into `window`. Returns `None` when nothing new
    /// arrived since the last read.
    fn read_window(&mut self, window: &mut [f32]) -> Option<CapturedFrame>;

    fn close(&mut self);
}

/// Holds a capture and keeps it open only between `acquire` and `release`.
/// Dropping the lease releases it as well, so an aborted session never leaves
/// the microphone running.
pub struct CaptureLease<C: AudioCapture> {
    capture: C,
    open: bool,
}

impl<C: AudioCapture> CaptureLease<C> {
    pub fn new(capture: C) -> Self {
        CaptureLease {
            capture,
            open: false,
        }
    }

    pub fn acquire(&mut self) -> Result<(), CaptureError> {
        if self.open {
            return Ok(());
        }
        self.capture.open()?;
        self.open = true;
        log::info!("Audio capture opened");
        Ok(())
    }

    pub fn release(&mut self) {
        if self.open {
            self.capture.close();
            self.open = false;
            log::info!("Audio capture released");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn read_window(&mut self, window: &mut [f32]) -> Option<CapturedFrame> {
        if !self.open {
            return None;
        }
        self.capture
            .read_window(window)
            .map(|frame| CapturedFrame {
                len: frame.len.min(window.len()),
                ..frame
            })
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }
}

impl<C: AudioCapture> Drop for CaptureLease<C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Capture fed by the host: each analyser window is pushed in and copied into
/// a buffer sized once up front.
pub struct PushCapture {
    buffer: Vec<f32>,
    filled: usize,
    sample_rate: f32,
    open: bool,
}

impl PushCapture {
    pub fn new(window_size: usize) -> Self {
        PushCapture {
            buffer: vec![0.0; window_size],
            filled: 0,
            sample_rate: 0.0,
            open: false,
        }
    }

    /// Store the newest `window_size` samples of `samples`. Ignored while closed.
    pub fn push(&mut self, samples: &[f32], sample_rate: f32) {
        if !self.open {
            return;
        }
        let n = samples.len().min(self.buffer.len());
        self.buffer[..n].copy_from_slice(&samples[samples.len() - n..]);
        self.filled = n;
        self.sample_rate = sample_rate;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl AudioCapture for PushCapture {
    fn open(&mut self) -> Result<(), CaptureError> {
        if self.open {
            return Err(CaptureError::AlreadyOpen);
        }
        self.open = true;
        self.filled = 0;
        Ok(())
    }

    fn read_window(&mut self, window: &mut [f32]) -> Option<CapturedFrame> {
        if !self.open || self.filled == 0 {
            return None;
        }
        let n = self.filled.min(window.len());
        window[..n].copy_from_slice(&self.buffer[..n]);
        self.filled = 0;
        Some(CapturedFrame {
            len: n,
            sample_rate: self.sample_rate,
        })
    }

    fn close(&mut self) {
        self.open = false;
        self.filled = 0;
    }
}
