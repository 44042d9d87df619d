use crate::config::PitchConfig;

/// Normalized autocorrelation pitch detector tuned for the singing voice.
///
/// The correlation curve is kept in a buffer that is sized once per sample
/// rate and reused for every frame, so `detect` does not allocate.
pub struct PitchDetector {
    config: PitchConfig,
    sample_rate: f32,
    min_lag: usize,
    max_lag: usize,
    correlation: Vec<f32>,
}

impl PitchDetector {
    pub fn new(sample_rate: f32, config: PitchConfig) -> Self {
        let mut detector = PitchDetector {
            config,
            sample_rate: 0.0,
            min_lag: 0,
            max_lag: 0,
            correlation: Vec::new(),
        };
        detector.retune(sample_rate);
        detector
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Lag range searched, in samples. One extra lag on each side of the
    /// configured band is included so peaks at the band edges can be refined.
    pub fn lag_range(&self) -> (usize, usize) {
        (self.min_lag, self.max_lag)
    }

    /// Shortest buffer `detect` will analyze at the current sample rate.
    pub fn required_len(&self) -> usize {
        self.max_lag + self.config.integration_window
    }

    fn retune(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            self.min_lag = 0;
            self.max_lag = 0;
            return;
        }
        self.min_lag = ((sample_rate / self.config.max_freq).floor() as usize)
            .saturating_sub(1)
            .max(1);
        self.max_lag = (sample_rate / self.config.min_freq).ceil() as usize + 1;
        self.correlation.clear();
        self.correlation.resize(self.max_lag + 1, 0.0);
        log::debug!(
            "Pitch detector tuned to {} Hz, lags {}..={}",
            sample_rate,
            self.min_lag,
            self.max_lag
        );
    }

    /// Estimate the fundamental of `samples` in Hz, or `None` when the frame is
    /// silent, unvoiced, or too short for the configured lag range.
    pub fn detect(&mut self, samples: &[f32], sample_rate: f32) -> Option<f32> {
        if sample_rate != self.sample_rate {
            self.retune(sample_rate);
        }
        if self.max_lag == 0 || samples.len() < self.required_len() {
            return None;
        }

        // Noise gate over a short prefix
        let gate = &samples[..self.config.gate_window.min(samples.len())];
        let rms = (gate.iter().map(|s| s * s).sum::<f32>() / gate.len() as f32).sqrt();
        if rms.is_nan() || rms < self.config.rms_threshold {
            return None;
        }

        let window = self.config.integration_window;
        let stride = self.config.integration_stride;

        let mut base_energy = 0.0f32;
        for i in (0..window).step_by(stride) {
            base_energy += samples[i] * samples[i];
        }

        for lag in self.min_lag..=self.max_lag {
            let mut cross = 0.0f32;
            let mut lag_energy = 0.0f32;
            for i in (0..window).step_by(stride) {
                let shifted = samples[i + lag];
                cross += samples[i] * shifted;
                lag_energy += shifted * shifted;
            }
            let denom = (base_energy * lag_energy).sqrt();
            self.correlation[lag] = if denom > f32::EPSILON { cross / denom } else { 0.0 };
        }

        let best_lag = self.pick_peak()?;
        let refined = self.refine(best_lag);
        if refined <= 0.0 {
            return None;
        }
        Some(sample_rate / refined)
    }

    /// First interior local maximum that comes within `peak_ratio` of the global
    /// maximum. Taking the first rather than the largest keeps period multiples
    /// from winning on strongly periodic input.
    fn pick_peak(&self) -> Option<usize> {
        let first = self.min_lag + 1;
        let global_max = self.correlation[first..self.max_lag]
            .iter()
            .copied()
            .fold(f32::MIN, f32::max);
        if global_max < self.config.clarity_threshold {
            return None;
        }

        let threshold = global_max * self.config.peak_ratio;
        (first..self.max_lag).find(|&lag| {
            let value = self.correlation[lag];
            value >= threshold
                && value >= self.correlation[lag - 1]
                && value >= self.correlation[lag + 1]
        })
    }

    /// Parabolic interpolation around `lag`; a flat neighbourhood leaves it as is.
    fn refine(&self, lag: usize) -> f32 {
        let alpha = self.correlation[lag - 1];
        let beta = self.correlation[lag];
        let gamma = self.correlation[lag + 1];
        let denom = alpha - 2.0 * beta + gamma;
        if denom.abs() > 1e-9 {
            lag as f32 + 0.5 * (alpha - gamma) / denom
        } else {
            lag as f32
        }
    }
}
