use serde::{Serialize, Deserialize};
use std::f32::consts::PI;
use std::fmt;

/// Synthesis voice shape attached to every note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Sine
    }
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];

    /// Wire tag as it travels through the collaboration layer.
    pub fn tag(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "sine" => Some(Waveform::Sine),
            "square" => Some(Waveform::Square),
            "triangle" => Some(Waveform::Triangle),
            "sawtooth" | "saw" => Some(Waveform::Sawtooth),
            _ => None,
        }
    }

    /// Unknown or missing tags play as a sine.
    pub fn from_tag_or_sine(tag: Option<&str>) -> Self {
        match tag.and_then(Self::from_tag) {
            Some(waveform) => waveform,
            None => {
                if let Some(tag) = tag {
                    log::warn!("unrecognized waveform {:?}, falling back to sine", tag);
                }
                Waveform::Sine
            },
        }
    }

    /// One sample of the unit waveform at `phase` in [0, 1).
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    -4.0 + 4.0 * phase
                }
            },
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
