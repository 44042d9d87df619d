use serde::{Deserialize, Serialize};

use crate::config::LineConfig;
use crate::scoring::types::{Note, NoteSequence};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LineNote {
    /// Position of the note in the full sequence, for hit-record lookups.
    pub index: usize,
    pub note: Note,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KaraokeLine {
    pub notes: Vec<LineNote>,
    pub start_time: f64,
    pub end_time: f64,
}

impl KaraokeLine {
    fn from_chunk(notes: Vec<LineNote>) -> Self {
        let start_time = notes.first().map_or(0.0, |n| n.note.start_time);
        let end_time = notes.last().map_or(0.0, |n| n.note.end_time());
        KaraokeLine {
            notes,
            start_time,
            end_time,
        }
    }

    pub fn text(&self) -> String {
        self.notes
            .iter()
            .filter_map(|n| n.note.lyric.as_deref())
            .collect()
    }
}

/// The line being sung (or coming up next, during a gap) and the one after it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineWindow {
    pub current: Option<usize>,
    pub next: Option<usize>,
}

/// Split the notes into lines. A new line starts when the silence since the
/// previous note exceeds `max_gap`, or when the lyrics gathered so far exceed
/// `max_chars`. The last chunk is always emitted.
pub fn segment(notes: &NoteSequence, config: &LineConfig) -> Vec<KaraokeLine> {
    let mut lines: Vec<KaraokeLine> = Vec::new();
    let mut chunk: Vec<LineNote> = Vec::new();
    let mut chunk_chars = 0usize;

    for (index, note) in notes.notes().iter().enumerate() {
        if let Some(prev) = chunk.last() {
            let gap = note.start_time - prev.note.end_time();
            if gap > config.max_gap || chunk_chars > config.max_chars {
                lines.push(KaraokeLine::from_chunk(std::mem::take(&mut chunk)));
                chunk_chars = 0;
            }
        }
        chunk_chars += note.lyric_len();
        chunk.push(LineNote {
            index,
            note: note.clone(),
        });
    }

    if !chunk.is_empty() {
        lines.push(KaraokeLine::from_chunk(chunk));
    }

    lines
}

pub fn line_window(lines: &[KaraokeLine], time: f64) -> LineWindow {
    let first_open = lines.partition_point(|line| line.end_time < time);
    let current = (first_open < lines.len()).then_some(first_open);
    let next = current
        .map(|i| i + 1)
        .filter(|&i| i < lines.len());
    LineWindow { current, next }
}
