//! Local note creation with optimistic insertion.

pub mod throttle;

pub use throttle::Throttle;

use crate::core::oscillator::Waveform;
use crate::core::timeline::{Note, NoteId, NoteStore};
use crate::core::view::ViewState;
use crate::messaging::{CollabBus, OutboundEvent};
use crate::render::Renderer;

/// Minimum spacing between notes laid down by one continuous drag.
pub const DRAW_THROTTLE_MS: i64 = 50;

/// Local user settings read at the moment of input.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub color: &'a str,
    pub waveform: Waveform,
}

/// Turns presses and drags into provisional notes.
///
/// Each note is stored and drawn immediately and a creation request goes
/// out without waiting; the authoritative echo is reconciled by the store.
#[derive(Debug)]
pub struct OptimisticNoteController {
    draw_throttle: Throttle,
    drawing: bool,
    next_seq: u64,
}

impl Default for OptimisticNoteController {
    fn default() -> Self {
        Self {
            draw_throttle: Throttle::new(DRAW_THROTTLE_MS),
            drawing: false,
            next_seq: 0,
        }
    }
}

impl OptimisticNoteController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Start a stroke and place a note. `offset` is the pointer's pixel
    /// offset from the view center.
    pub fn press(
        &mut self,
        now: i64,
        offset: (f64, f64),
        view: &ViewState,
        placement: Placement<'_>,
        store: &mut NoteStore,
        bus: &CollabBus,
        renderer: &mut dyn Renderer,
    ) -> NoteId {
        self.drawing = true;
        self.draw_throttle.stamp(now);
        self.place(now, offset, view, placement, store, bus, renderer)
    }

    /// Continue a stroke; places a note at most once per throttle interval.
    pub fn drag(
        &mut self,
        now: i64,
        offset: (f64, f64),
        view: &ViewState,
        placement: Placement<'_>,
        store: &mut NoteStore,
        bus: &CollabBus,
        renderer: &mut dyn Renderer,
    ) -> Option<NoteId> {
        if !self.drawing || !self.draw_throttle.try_pass(now) {
            return None;
        }
        Some(self.place(now, offset, view, placement, store, bus, renderer))
    }

    pub fn release(&mut self) {
        self.drawing = false;
    }

    fn place(
        &mut self,
        now: i64,
        offset: (f64, f64),
        view: &ViewState,
        placement: Placement<'_>,
        store: &mut NoteStore,
        bus: &CollabBus,
        renderer: &mut dyn Renderer,
    ) -> NoteId {
        let mapper = view.mapper();
        let (dx, dy) = offset;
        let x = (now as f64 + mapper.screen_to_world_x(dx)).floor() as i64;
        let y = mapper.screen_to_world_y(dy);

        let note = Note::optimistic(self.next_seq, x, y, placement.waveform, placement.color);
        self.next_seq += 1;
        let id = note.id.clone();

        renderer.draw_provisional(&note, mapper.world_to_screen_x(x), dy);
        store.upsert_local(note);

        // Raw pixel offset: the collaboration layer divides by its own vertical scale.
        bus.publish(OutboundEvent::AddNote { x, y: dy });
        id
    }
}
