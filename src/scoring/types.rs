use std::rc::Rc;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ChartError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Note {
    /// Seconds from the start of the song.
    pub start_time: f64,
    /// Seconds, strictly positive.
    pub duration: f64,
    /// Fractional MIDI number.
    pub pitch: f64,
    #[serde(default)]
    pub lyric: Option<String>,
}

impl Note {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time()
    }

    pub fn lyric_len(&self) -> usize {
        self.lyric.as_deref().map_or(0, |l| l.chars().count())
    }
}

/// A validated, immutable melody timeline sorted by start time. Cloning only
/// bumps a reference count.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteSequence {
    notes: Rc<[Note]>,
    longest: f64,
}

impl NoteSequence {
    pub fn new(notes: Vec<Note>) -> Result<Self, ChartError> {
        if notes.is_empty() {
            return Err(ChartError::Empty);
        }

        let mut longest = 0.0f64;
        for (index, note) in notes.iter().enumerate() {
            if !(note.start_time.is_finite() && note.start_time >= 0.0) {
                return Err(ChartError::InvalidStartTime {
                    index,
                    start_time: note.start_time,
                });
            }
            if !(note.duration.is_finite() && note.duration > 0.0) {
                return Err(ChartError::NonPositiveDuration {
                    index,
                    duration: note.duration,
                });
            }
            if !(0.0..=127.0).contains(&note.pitch) {
                return Err(ChartError::PitchOutOfRange {
                    index,
                    pitch: note.pitch,
                });
            }
            if index > 0 && note.start_time < notes[index - 1].start_time {
                return Err(ChartError::Unsorted { index });
            }
            longest = longest.max(note.duration);
        }

        Ok(NoteSequence {
            notes: notes.into(),
            longest,
        })
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    /// End of the last-ending note.
    pub fn end_time(&self) -> f64 {
        self.notes.iter().map(Note::end_time).fold(0.0, f64::max)
    }

    /// Index of the note sounding at `time`. When notes overlap, the earliest in
    /// sorted order wins. Bounds are inclusive on both ends.
    pub fn active_at(&self, time: f64) -> Option<usize> {
        if !time.is_finite() {
            return None;
        }
        // Everything from here on starts after `time`.
        let upper = self.notes.partition_point(|n| n.start_time <= time);
        // Nothing before this can still be sounding. Adding rather than
        // subtracting keeps `start + longest >= end` exact at note ends.
        let lower = self.notes[..upper].partition_point(|n| n.start_time + self.longest < time);
        (lower..upper).find(|&i| self.notes[i].contains(time))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgement {
    Perfect,
    Good,
    Miss,
}

impl Judgement {
    pub fn is_hit(self) -> bool {
        !matches!(self, Judgement::Miss)
    }
}

/// How the distance between the sung pitch and the target is measured.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DifficultyMode {
    /// Matches in any register: the distance is also taken one and two
    /// octaves up and down, and the smallest wins.
    #[default]
    Tolerant,
    /// Raw semitone distance.
    Strict,
}

impl DifficultyMode {
    pub fn pitch_distance(self, sung_midi: f64, target_midi: f64) -> f64 {
        let raw = sung_midi - target_midi;
        match self {
            DifficultyMode::Strict => raw.abs(),
            DifficultyMode::Tolerant => [-24.0, -12.0, 0.0, 12.0, 24.0]
                .iter()
                .map(|shift| (raw + shift).abs())
                .fold(f64::INFINITY, f64::min),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ScoreState {
    pub current_score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub misses: u32,
    /// Always within 0..=100.
    pub audience_mood: f64,
}

impl ScoreState {
    pub fn baseline(initial_mood: f64) -> Self {
        ScoreState {
            current_score: 0,
            combo: 0,
            max_combo: 0,
            perfect_hits: 0,
            good_hits: 0,
            misses: 0,
            audience_mood: initial_mood.clamp(0.0, 100.0),
        }
    }

    pub fn judged_ticks(&self) -> u32 {
        self.perfect_hits + self.good_hits + self.misses
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        ScoreState::baseline(50.0)
    }
}

/// Which notes have been sung well at least once this session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteHitRecord {
    hits: Vec<bool>,
    count: usize,
}

impl NoteHitRecord {
    pub fn new(note_count: usize) -> Self {
        NoteHitRecord {
            hits: vec![false; note_count],
            count: 0,
        }
    }

    /// Returns true if the note had not been hit before.
    pub fn mark(&mut self, index: usize) -> bool {
        match self.hits.get_mut(index) {
            Some(hit) if !*hit => {
                *hit = true;
                self.count += 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_hit(&self, index: usize) -> bool {
        self.hits.get(index).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.hits
            .iter()
            .enumerate()
            .filter_map(|(i, &hit)| hit.then_some(i))
    }

    pub fn clear(&mut self) {
        self.hits.iter_mut().for_each(|hit| *hit = false);
        self.count = 0;
    }
}

impl Serialize for NoteHitRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.indices())
    }
}

/// One point of the on-screen pitch trail. Not authoritative.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PitchSample {
    pub time: f64,
    pub midi: f64,
    pub is_hit: bool,
}
