mod envelope;
mod waveform;

pub use self::envelope::{Envelope, EnvelopeStage};
pub use self::waveform::Waveform;

use serde::{Serialize, Deserialize};

/// Per-waveform voice settings the synth picks from when a note fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreset {
    pub waveform: Waveform,
    pub volume_offset_db: f32, // relative to master volume
    pub envelope: Envelope,
}

impl VoicePreset {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            volume_offset_db: 0.0,
            envelope: Envelope::default(),
        }
    }

    pub fn with_offset(mut self, db: f32) -> Self {
        self.volume_offset_db = db;
        self
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// The four stock voices: a soft sine, and quieter square and sawtooth.
    pub fn defaults() -> Vec<VoicePreset> {
        vec![
            VoicePreset::new(Waveform::Sine)
                .with_envelope(Envelope::new(0.1, 0.2, 0.5, 1.0)),
            VoicePreset::new(Waveform::Square).with_offset(-10.0),
            VoicePreset::new(Waveform::Triangle),
            VoicePreset::new(Waveform::Sawtooth).with_offset(-10.0),
        ]
    }
}
