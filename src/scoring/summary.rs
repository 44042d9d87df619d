use serde::{Deserialize, Serialize};

use crate::scoring::types::*;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rating {
    S,
    A,
    B,
    C,
    D,
}

impl Rating {
    fn from_hit_rate(hit_rate: f64) -> Self {
        if hit_rate >= 0.9 {
            Rating::S
        } else if hit_rate >= 0.75 {
            Rating::A
        } else if hit_rate >= 0.5 {
            Rating::B
        } else if hit_rate >= 0.25 {
            Rating::C
        } else {
            Rating::D
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PerformanceSummary {
    pub total_notes: u32,
    pub notes_hit: u32,
    /// Share of notes hit at least once, 0-1.
    pub hit_rate: f64,
    /// Share of judged ticks that were Perfect or Good, 0-1.
    pub accuracy: f64,
    pub final_score: u64,
    pub max_combo: u32,
    pub final_mood: f64,
    pub rating: Rating,
    pub feedback: Vec<String>,
}

pub fn summarize(notes: &NoteSequence, state: &ScoreState, hits: &NoteHitRecord) -> PerformanceSummary {
    let total_notes = notes.len() as u32;
    let notes_hit = hits.count() as u32;

    let hit_rate = if total_notes > 0 {
        notes_hit as f64 / total_notes as f64
    } else {
        0.0
    };

    let judged = state.judged_ticks();
    let accuracy = if judged > 0 {
        (state.perfect_hits + state.good_hits) as f64 / judged as f64
    } else {
        0.0
    };

    let rating = Rating::from_hit_rate(hit_rate);

    let mut feedback: Vec<String> = Vec::new();

    let pct = hit_rate * 100.0;
    match rating {
        Rating::S => feedback.push(format!("Superstar! You hit {:.0}% of the notes.", pct)),
        Rating::A => feedback.push(format!("Great show! You hit {:.0}% of the notes.", pct)),
        Rating::B => feedback.push(format!("Nice work! You hit {:.0}% of the notes.", pct)),
        Rating::C => feedback.push(format!(
            "Keep at it! You hit {:.0}% of the notes. Try humming along first.",
            pct
        )),
        Rating::D => feedback.push(format!(
            "Tough one! You hit {:.0}% of the notes. Try a song in a more comfortable range.",
            pct
        )),
    }

    if judged == 0 {
        feedback.push("We couldn't hear you. Check that the microphone is enabled.".to_string());
    } else if state.perfect_hits > 0 && state.perfect_hits >= state.good_hits * 2 {
        feedback.push("Your pitch was spot on most of the time.".to_string());
    } else if state.good_hits > state.perfect_hits {
        feedback.push(
            "You were close on most notes. Listen for the exact pitch before you slide into it."
                .to_string(),
        );
    }

    if state.max_combo >= 50 {
        feedback.push(format!("Longest streak: {} in a row!", state.max_combo));
    }

    if state.audience_mood >= 80.0 {
        feedback.push("The crowd loved it.".to_string());
    } else if state.audience_mood <= 20.0 {
        feedback.push("The crowd lost interest. Stay on the melody to win them back.".to_string());
    }

    PerformanceSummary {
        total_notes,
        notes_hit,
        hit_rate,
        accuracy,
        final_score: state.current_score,
        max_combo: state.max_combo,
        final_mood: state.audience_mood,
        rating,
        feedback,
    }
}
