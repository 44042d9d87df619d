use serde::Serialize;

use crate::config::ScoringConfig;
use crate::pitch::notes::frequency_to_midi;
use crate::scoring::types::*;

/// What happened on one tick, for the caller's own bookkeeping.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    pub active_note: Option<usize>,
    pub sung_midi: Option<f64>,
    pub judgement: Option<Judgement>,
}

pub fn classify(distance: f64, config: &ScoringConfig) -> Judgement {
    if distance < config.perfect_threshold {
        Judgement::Perfect
    } else if distance < config.good_threshold {
        Judgement::Good
    } else {
        Judgement::Miss
    }
}

fn nudge_mood(mood: f64, delta: f64) -> f64 {
    (mood + delta).clamp(0.0, 100.0)
}

/// Advance the score by one tick.
///
/// With no active note the state comes back unchanged. With an active note
/// but no pitch, only the mood decays. Otherwise the sung pitch is judged
/// against the note and score, combo, counters and mood move accordingly.
pub fn reduce(
    prev: &ScoreState,
    active: Option<&Note>,
    sung_midi: Option<f64>,
    mode: DifficultyMode,
    config: &ScoringConfig,
) -> (ScoreState, Option<Judgement>) {
    let mut next = *prev;
    let note = match active {
        Some(note) => note,
        None => return (next, None),
    };

    let sung = match sung_midi {
        Some(midi) => midi,
        None => {
            next.audience_mood = nudge_mood(next.audience_mood, config.mood_silence);
            return (next, None);
        }
    };

    let judgement = classify(mode.pitch_distance(sung, note.pitch), config);
    match judgement {
        Judgement::Perfect => {
            next.current_score += config.perfect_base + config.combo_bonus * next.combo as u64;
            next.combo += 1;
            next.perfect_hits += 1;
            next.audience_mood = nudge_mood(next.audience_mood, config.mood_perfect);
        }
        Judgement::Good => {
            next.current_score += config.good_points;
            next.combo += 1;
            next.good_hits += 1;
            next.audience_mood = nudge_mood(next.audience_mood, config.mood_good);
        }
        Judgement::Miss => {
            next.combo = 0;
            next.misses += 1;
            next.audience_mood = nudge_mood(next.audience_mood, config.mood_miss);
        }
    }
    next.max_combo = next.max_combo.max(next.combo);

    (next, Some(judgement))
}

/// Owns the score state and hit record of one play session.
pub struct ScoringEngine {
    config: ScoringConfig,
    notes: NoteSequence,
    state: ScoreState,
    hits: NoteHitRecord,
}

impl ScoringEngine {
    pub fn new(notes: NoteSequence, config: ScoringConfig) -> Self {
        let state = ScoreState::baseline(config.initial_mood);
        let hits = NoteHitRecord::new(notes.len());
        ScoringEngine {
            config,
            notes,
            state,
            hits,
        }
    }

    pub fn tick(&mut self, time: f64, pitch_hz: Option<f32>, mode: DifficultyMode) -> TickOutcome {
        let sung_midi = pitch_hz
            .filter(|hz| hz.is_finite() && *hz > 0.0)
            .map(|hz| frequency_to_midi(hz as f64));
        let active_note = self.notes.active_at(time);

        let (next, judgement) = reduce(
            &self.state,
            active_note.and_then(|i| self.notes.get(i)),
            sung_midi,
            mode,
            &self.config,
        );
        self.state = next;

        if let (Some(index), Some(j)) = (active_note, judgement) {
            if j.is_hit() && self.hits.mark(index) {
                log::debug!("Note {} hit at {:.3}s ({:?})", index, time, j);
            }
        }

        TickOutcome {
            active_note,
            sung_midi,
            judgement,
        }
    }

    pub fn reset(&mut self) {
        self.state = ScoreState::baseline(self.config.initial_mood);
        self.hits.clear();
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn hits(&self) -> &NoteHitRecord {
        &self.hits
    }

    pub fn notes(&self) -> &NoteSequence {
        &self.notes
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::notes::midi_to_frequency;

    fn note(start_time: f64, duration: f64, pitch: f64) -> Note {
        Note {
            start_time,
            duration,
            pitch,
            lyric: None,
        }
    }

    fn engine() -> ScoringEngine {
        let notes = NoteSequence::new(vec![note(0.0, 1.0, 60.0), note(2.0, 1.0, 64.0)]).unwrap();
        ScoringEngine::new(notes, ScoringConfig::default())
    }

    fn hz(midi: f64) -> Option<f32> {
        Some(midi_to_frequency(midi) as f32)
    }

    #[test]
    fn test_perfect_in_strict_mode() {
        let config = ScoringConfig::default();
        let target = note(0.0, 1.0, 60.0);
        let mut prev = ScoreState::default();
        prev.combo = 3;
        prev.max_combo = 3;
        prev.current_score = 100;

        let (next, j) = reduce(&prev, Some(&target), Some(60.2), DifficultyMode::Strict, &config);
        assert_eq!(j, Some(Judgement::Perfect));
        assert_eq!(next.current_score, 100 + 10 + 2 * 3);
        assert_eq!(next.combo, 4);
        assert_eq!(next.max_combo, 4);
        assert_eq!(next.perfect_hits, 1);
        assert!(next.audience_mood > prev.audience_mood);
    }

    #[test]
    fn test_octave_up_depends_on_mode() {
        let config = ScoringConfig::default();
        let target = note(0.0, 1.0, 60.0);
        let mut prev = ScoreState::default();
        prev.combo = 5;
        prev.max_combo = 5;

        let (tolerant, j) = reduce(&prev, Some(&target), Some(72.2), DifficultyMode::Tolerant, &config);
        assert_eq!(j, Some(Judgement::Perfect));
        assert_eq!(tolerant.combo, 6);

        let (strict, j) = reduce(&prev, Some(&target), Some(72.2), DifficultyMode::Strict, &config);
        assert_eq!(j, Some(Judgement::Miss));
        assert_eq!(strict.combo, 0);
        assert_eq!(strict.max_combo, 5);
        assert_eq!(strict.misses, 1);
        assert_eq!(strict.current_score, prev.current_score);
    }

    #[test]
    fn test_good_band() {
        let config = ScoringConfig::default();
        let target = note(0.0, 1.0, 60.0);
        let (next, j) = reduce(
            &ScoreState::default(),
            Some(&target),
            Some(62.0),
            DifficultyMode::Strict,
            &config,
        );
        assert_eq!(j, Some(Judgement::Good));
        assert_eq!(next.current_score, 5);
        assert_eq!(next.combo, 1);
        assert_eq!(next.good_hits, 1);
    }

    #[test]
    fn test_silence_only_decays_mood() {
        let config = ScoringConfig::default();
        let target = note(0.0, 1.0, 60.0);
        let mut prev = ScoreState::default();
        prev.combo = 7;
        let (next, j) = reduce(&prev, Some(&target), None, DifficultyMode::Strict, &config);
        assert_eq!(j, None);
        assert_eq!(next.combo, 7);
        assert_eq!(next.misses, 0);
        assert!(next.audience_mood < prev.audience_mood);
    }

    #[test]
    fn test_no_active_note_leaves_state_unchanged() {
        let mut engine = engine();
        engine.tick(0.5, hz(60.0), DifficultyMode::Strict);
        let before = *engine.state();
        for pitch in [None, hz(40.0), hz(64.0)] {
            let outcome = engine.tick(1.5, pitch, DifficultyMode::Strict);
            assert_eq!(outcome.active_note, None);
            assert_eq!(outcome.judgement, None);
            assert_eq!(*engine.state(), before);
        }
    }

    #[test]
    fn test_mood_stays_in_bounds() {
        let mut engine = engine();
        for _ in 0..2000 {
            engine.tick(0.5, hz(60.0), DifficultyMode::Strict);
            assert!(engine.state().audience_mood <= 100.0);
        }
        assert_eq!(engine.state().audience_mood, 100.0);
        for _ in 0..2000 {
            engine.tick(0.5, hz(70.0), DifficultyMode::Strict);
            assert!(engine.state().audience_mood >= 0.0);
        }
        assert_eq!(engine.state().audience_mood, 0.0);
        for _ in 0..2000 {
            engine.tick(0.5, None, DifficultyMode::Strict);
            assert!(engine.state().audience_mood >= 0.0);
        }
    }

    #[test]
    fn test_hits_recorded_per_note() {
        let mut engine = engine();
        engine.tick(0.5, hz(70.0), DifficultyMode::Strict);
        assert!(!engine.hits().is_hit(0));
        engine.tick(0.6, hz(60.1), DifficultyMode::Strict);
        assert!(engine.hits().is_hit(0));
        engine.tick(2.5, hz(58.0), DifficultyMode::Strict);
        assert!(!engine.hits().is_hit(1));
        assert_eq!(engine.hits().count(), 1);
    }

    #[test]
    fn test_deterministic_replay_and_reset() {
        let script = [
            (0.1, hz(60.0)),
            (0.2, hz(60.4)),
            (0.3, None),
            (0.4, hz(62.5)),
            (0.5, hz(67.0)),
            (1.5, hz(60.0)),
            (2.1, hz(64.1)),
        ];
        let run = |engine: &mut ScoringEngine| {
            for (t, p) in script {
                engine.tick(t, p, DifficultyMode::Tolerant);
            }
            (*engine.state(), engine.hits().clone())
        };

        let mut engine = engine();
        let first = run(&mut engine);
        engine.reset();
        assert_eq!(*engine.state(), ScoreState::default());
        assert_eq!(engine.hits().count(), 0);
        let second = run(&mut engine);
        assert_eq!(first, second);
        assert_eq!(first.0.max_combo, 3);
        assert_eq!(first.0.misses, 1);
    }

    #[test]
    fn test_invalid_pitch_treated_as_silence() {
        let mut engine = engine();
        let outcome = engine.tick(0.5, Some(-3.0), DifficultyMode::Strict);
        assert_eq!(outcome.sung_midi, None);
        assert_eq!(outcome.judgement, None);
    }
}
