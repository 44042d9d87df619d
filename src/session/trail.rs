use std::collections::VecDeque;

use serde::{Serialize, Serializer};

use crate::scoring::types::PitchSample;

/// Rolling window of recent pitch readings for the on-screen trail.
/// Capacity is fixed up front; once full the oldest sample is dropped.
pub struct PitchTrail {
    samples: VecDeque<PitchSample>,
    span: f64,
    capacity: usize,
}

impl PitchTrail {
    pub fn new(span: f64, capacity: usize) -> Self {
        PitchTrail {
            samples: VecDeque::with_capacity(capacity),
            span,
            capacity,
        }
    }

    pub fn push(&mut self, sample: PitchSample) {
        // A seek backwards invalidates everything we have.
        if self.samples.back().map_or(false, |last| sample.time < last.time) {
            self.samples.clear();
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.prune(sample.time);
    }

    pub fn prune(&mut self, now: f64) {
        if self.samples.back().map_or(false, |last| now < last.time) {
            self.samples.clear();
            return;
        }
        while self
            .samples
            .front()
            .map_or(false, |first| first.time < now - self.span)
        {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PitchSample> {
        self.samples.iter()
    }
}

impl Serialize for PitchTrail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.samples.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64) -> PitchSample {
        PitchSample {
            time,
            midi: 60.0,
            is_hit: true,
        }
    }

    #[test]
    fn test_old_samples_pruned() {
        let mut trail = PitchTrail::new(1.05, 100);
        for i in 0..30 {
            trail.push(sample(i as f64 * 0.1));
        }
        let first = trail.iter().next().unwrap().time;
        assert!(first >= 2.9 - 1.05, "oldest sample {} too old", first);
        assert_eq!(trail.len(), 11);
    }

    #[test]
    fn test_capacity_bound() {
        let mut trail = PitchTrail::new(100.0, 8);
        for i in 0..50 {
            trail.push(sample(i as f64 * 0.01));
        }
        assert_eq!(trail.len(), 8);
        assert_eq!(trail.iter().next().unwrap().time, 42.0 * 0.01);
    }

    #[test]
    fn test_backwards_jump_clears() {
        let mut trail = PitchTrail::new(3.0, 16);
        trail.push(sample(5.0));
        trail.push(sample(5.1));
        trail.push(sample(1.0));
        assert_eq!(trail.len(), 1);
        trail.prune(0.5);
        assert!(trail.is_empty());
    }

    #[test]
    fn test_prune_without_new_samples() {
        let mut trail = PitchTrail::new(1.0, 16);
        trail.push(sample(0.0));
        trail.push(sample(0.5));
        trail.prune(1.2);
        assert_eq!(trail.len(), 1);
        trail.prune(10.0);
        assert!(trail.is_empty());
    }
}
