//! Contract with the external renderer.
//!
//! Every method defaults to a no-op: a renderer without a clock display,
//! cursor layer or provisional-note layer just leaves that feature dark.

use crate::core::timeline::{Note, NoteId};

/// Stable element the renderer exposes for each confirmed note.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNote {
    pub id: String,
    pub x: i64,
    pub y: f64,
    pub waveform: String,
}

pub trait Renderer {
    /// Horizontal canvas translation in pixels.
    fn scroll_to(&mut self, _offset_px: f64) {}

    fn show_clock(&mut self, _text: &str) {}

    /// Draw a not-yet-confirmed note at `left_px` on the canvas and
    /// `offset_y_px` below the vertical center.
    fn draw_provisional(&mut self, _note: &Note, _left_px: f64, _offset_y_px: f64) {}

    fn remove_provisional(&mut self, _id: &NoteId) {}

    /// Short highlight of a note that just fired.
    fn pulse(&mut self, _id: &NoteId) {}

    fn place_cursor(&mut self, _user_id: &str, _color: &str, _x: f64, _y: f64) {}

    fn remove_cursor(&mut self, _user_id: &str) {}

    fn audio_state(&mut self, _enabled: bool) {}
}

/// Renderer with no anchors at all.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {}

/// Headless renderer that reports through the log.
#[derive(Debug, Default)]
pub struct LogRenderer {
    last_clock: String,
}

impl Renderer for LogRenderer {
    fn show_clock(&mut self, text: &str) {
        if self.last_clock != text {
            log::info!("clock {}", text);
            self.last_clock = text.to_string();
        }
    }

    fn draw_provisional(&mut self, note: &Note, left_px: f64, offset_y_px: f64) {
        log::debug!("draw {} at ({:.1}, {:+.1}) [{}]", note.id, left_px, offset_y_px, note.waveform);
    }

    fn remove_provisional(&mut self, id: &NoteId) {
        log::debug!("retire {}", id);
    }

    fn pulse(&mut self, id: &NoteId) {
        log::info!("pulse {}", id);
    }

    fn place_cursor(&mut self, user_id: &str, _color: &str, x: f64, y: f64) {
        log::trace!("cursor {} at ({:.1}, {:.1})", user_id, x, y);
    }

    fn remove_cursor(&mut self, user_id: &str) {
        log::debug!("cursor {} gone", user_id);
    }

    fn audio_state(&mut self, enabled: bool) {
        log::info!("audio {}", if enabled { "on" } else { "muted" });
    }
}
