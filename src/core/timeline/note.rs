use std::fmt;

use crate::core::oscillator::Waveform;

/// Prefix carried by every locally generated note id.
pub const PROVISIONAL_PREFIX: &str = "temp-";

/// Identity of a note. Provisional ids are minted locally and can never
/// collide with ids assigned by the collaboration layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteId {
    Provisional { x: i64, seq: u64 },
    Confirmed(String),
}

impl NoteId {
    pub fn is_provisional(&self) -> bool {
        matches!(self, NoteId::Provisional { .. })
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteId::Provisional { x, seq } => write!(f, "{}{}-{}", PROVISIONAL_PREFIX, x, seq),
            NoteId::Confirmed(id) => f.write_str(id),
        }
    }
}

/// A timed, pitched event on the shared timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    /// World time, epoch milliseconds.
    pub x: i64,
    /// World-space offset from the pitch center; positive is lower.
    pub y: f64,
    pub waveform: Waveform,
    pub color: Option<String>,
    played: bool,
}

impl Note {
    pub fn optimistic(seq: u64, x: i64, y: f64, waveform: Waveform, color: impl Into<String>) -> Self {
        Self {
            id: NoteId::Provisional { x, seq },
            x,
            y,
            waveform,
            color: Some(color.into()),
            played: false,
        }
    }

    pub fn confirmed(id: impl Into<String>, x: i64, y: f64, waveform: Waveform) -> Self {
        Self {
            id: NoteId::Confirmed(id.into()),
            x,
            y,
            waveform,
            color: None,
            played: false,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.id.is_provisional()
    }

    pub fn played(&self) -> bool {
        self.played
    }

    /// Flip to played. Returns false if it already was; the flag never reverts.
    pub fn mark_played(&mut self) -> bool {
        let was = self.played;
        self.played = true;
        !was
    }

    pub(crate) fn inherit_played(&mut self, played: bool) {
        self.played |= played;
    }
}
