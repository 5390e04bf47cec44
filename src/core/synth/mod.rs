pub mod audio;
pub mod voice;

use std::collections::HashMap;

use crate::core::oscillator::{VoicePreset, Waveform};
use crate::utils::helpers::db_to_amplitude;
use voice::Voice;

/// Hard polyphony cap; the oldest voice is stolen beyond it.
pub const MAX_VOICES: usize = 32;
/// Gate length of a fired note: an eighth note at 120 BPM.
pub const NOTE_GATE_SECS: f32 = 0.25;

/// Polyphonic synthesizer engine driven by scheduled triggers
pub struct Synth {
    pub sample_rate: f32,
    pub volume_db: f32,
    master_gain: f32,
    pub voices: Vec<Voice>,
    presets: HashMap<Waveform, VoicePreset>,
    clock: u64, // samples rendered so far
}

impl Synth {
    /// Create a new synthesizer instance with the stock voice presets
    pub fn new(sample_rate: f32) -> Self {
        Self::with_presets(sample_rate, VoicePreset::defaults())
    }

    pub fn with_presets(sample_rate: f32, presets: Vec<VoicePreset>) -> Self {
        Synth {
            sample_rate,
            volume_db: 0.0,
            master_gain: 1.0,
            voices: Vec::new(),
            presets: presets.into_iter().map(|p| (p.waveform, p)).collect(),
            clock: 0,
        }
    }

    /// Preset for `waveform`, or the sine preset when that voice is not loaded.
    pub fn preset_for(&self, waveform: Waveform) -> VoicePreset {
        self.presets
            .get(&waveform)
            .or_else(|| self.presets.get(&Waveform::Sine))
            .cloned()
            .unwrap_or_else(|| VoicePreset::new(Waveform::Sine))
    }

    /// Audio clock in seconds
    pub fn now(&self) -> f64 {
        self.clock as f64 / self.sample_rate as f64
    }

    /// Schedule a note to start at audio time `start_at` (seconds); past times start immediately.
    pub fn trigger(&mut self, waveform: Waveform, frequency: f32, start_at: f64, gate: f32) {
        let preset = self.preset_for(waveform);
        let start_sample = ((start_at * self.sample_rate as f64).max(0.0) as u64).max(self.clock);
        let gain = db_to_amplitude(preset.volume_offset_db);

        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice::new(
            preset.waveform,
            frequency,
            gain,
            preset.envelope,
            start_sample,
            gate,
            self.sample_rate,
        ));
    }

    /// Master volume in dB, applied at the output so sounding voices follow it.
    /// Per-waveform offsets stay on the voices.
    pub fn set_volume(&mut self, db: f32) {
        self.volume_db = db;
        self.master_gain = db_to_amplitude(db);
    }
}
