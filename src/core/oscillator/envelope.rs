use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Idle,
}

/// ADSR envelope, all times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.005,
            decay: 0.1,
            sustain: 0.3,
            release: 1.0,
        }
    }
}

impl Envelope {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self { attack, decay, sustain, release }
    }

    /// Stage of a note that started `elapsed` seconds ago and is held for `gate` seconds.
    pub fn stage(&self, elapsed: f32, gate: f32) -> EnvelopeStage {
        if elapsed < 0.0 {
            EnvelopeStage::Idle
        } else if elapsed < gate {
            if elapsed < self.attack {
                EnvelopeStage::Attack
            } else if elapsed < self.attack + self.decay {
                EnvelopeStage::Decay
            } else {
                EnvelopeStage::Sustain
            }
        } else if elapsed < gate + self.release {
            EnvelopeStage::Release
        } else {
            EnvelopeStage::Idle
        }
    }

    fn held_level(&self, t: f32) -> f32 {
        if t < self.attack {
            (t / self.attack.max(f32::EPSILON)).min(1.0)
        } else if t < self.attack + self.decay {
            1.0 - (1.0 - self.sustain) * ((t - self.attack) / self.decay.max(f32::EPSILON))
        } else {
            self.sustain
        }
    }

    pub fn level(&self, elapsed: f32, gate: f32) -> f32 {
        match self.stage(elapsed, gate) {
            EnvelopeStage::Idle => 0.0,
            EnvelopeStage::Release => {
                let from = self.held_level(gate);
                let t = (elapsed - gate) / self.release.max(f32::EPSILON);
                (from * (1.0 - t)).max(0.0)
            },
            _ => self.held_level(elapsed),
        }
    }

    /// Total audible length for a gate of `gate` seconds.
    pub fn total_length(&self, gate: f32) -> f32 {
        gate + self.release
    }
}
