use super::ViewState;
use crate::utils::helpers::midi_to_freq;

/// Vertical world units per semitone.
pub const PIXELS_PER_SEMITONE: f64 = 16.66;
/// MIDI note sitting on the vertical center line (A4).
pub const CENTER_MIDI: f64 = 69.0;

/// Converts between world coordinates and view-space pixels.
///
/// Holds only a borrow of the live [`ViewState`]; every call reads it again.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper<'a> {
    view: &'a ViewState,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(view: &'a ViewState) -> Self {
        Self { view }
    }

    /// Horizontal pixel position of world time `t` (ms) on the scrolling canvas.
    pub fn world_to_screen_x(&self, t: i64) -> f64 {
        (t - self.view.base_time) as f64 * self.view.zoom_x()
    }

    /// Milliseconds spanned by `px` horizontal pixels.
    pub fn screen_to_world_x(&self, px: f64) -> f64 {
        px / self.view.zoom_x()
    }

    pub fn world_to_screen_y(&self, y: f64) -> f64 {
        y * self.view.zoom_y()
    }

    /// World offset of `px` pixels from the vertical center; positive is down.
    pub fn screen_to_world_y(&self, px: f64) -> f64 {
        px / self.view.zoom_y()
    }

    /// Scroll offset of the canvas at time `now`.
    pub fn scroll_offset(&self, now: i64) -> f64 {
        self.world_to_screen_x(now)
    }

    /// Surface position of a world offset `(dt, dy)` from the surface center.
    pub fn offset_to_screen(&self, center: (f64, f64), dt: f64, dy: f64) -> (f64, f64) {
        (
            center.0 + dt * self.view.zoom_x(),
            center.1 + self.world_to_screen_y(dy),
        )
    }
}

/// Fractional MIDI pitch of a world-space vertical offset.
pub fn y_to_midi(y: f64) -> f64 {
    CENTER_MIDI - y / PIXELS_PER_SEMITONE
}

pub fn y_to_frequency(y: f64) -> f64 {
    midi_to_freq(y_to_midi(y))
}
