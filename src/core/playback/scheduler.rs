use super::{AudioEngine, AudioGate};
use crate::core::synth::NOTE_GATE_SECS;
use crate::core::timeline::{NoteId, NoteStore};
use crate::core::view::mapper::y_to_frequency;
use crate::render::Renderer;

/// How far ahead of `now` an unplayed note may fire.
pub const LOOKAHEAD_MS: i64 = 100;
/// How far behind `now` an unplayed note may still fire; older ones are missed.
pub const LATE_TOLERANCE_MS: i64 = 100;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub pruned: usize,
    pub fired: Vec<NoteId>,
}

/// Per-frame look-ahead loop that fires each note exactly once.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    fired_total: u64,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fired_total(&self) -> u64 {
        self.fired_total
    }

    pub fn in_window(x: i64, now: i64) -> bool {
        x >= now - LATE_TOLERANCE_MS && x <= now + LOOKAHEAD_MS
    }

    /// Prune the store, then trigger every unplayed note inside the window.
    ///
    /// While audio is not running nothing fires and notes stay unplayed;
    /// those that drift past the late edge are left for pruning.
    pub fn tick(
        &mut self,
        now: i64,
        store: &mut NoteStore,
        gate: &AudioGate,
        engine: &mut dyn AudioEngine,
        renderer: &mut dyn Renderer,
    ) -> TickReport {
        let mut report = TickReport {
            pruned: store.prune(now),
            ..Default::default()
        };

        if !gate.is_enabled() {
            return report;
        }

        let audio_now = engine.now();
        for note in store.iter_mut() {
            if note.played() || !Self::in_window(note.x, now) {
                continue;
            }

            let frequency = y_to_frequency(note.y);
            let start_at = audio_now + (note.x - now) as f64 / 1000.0;
            engine.trigger(note.waveform, frequency, start_at, NOTE_GATE_SECS as f64);
            note.mark_played();

            log::debug!(
                "fired {} ({}, {:.1} Hz) at +{:.3}s",
                note.id, note.waveform, frequency, start_at - audio_now
            );
            renderer.pulse(&note.id);
            report.fired.push(note.id.clone());
        }

        self.fired_total += report.fired.len() as u64;
        report
    }
}
