use crate::core::oscillator::{Envelope, Waveform};

/// One scheduled sounding of a note, pinned to an absolute sample position.
#[derive(Debug, Clone)]
pub struct Voice {
    pub waveform: Waveform,
    pub frequency: f32,
    pub gain: f32,
    pub envelope: Envelope,
    pub start_sample: u64,
    pub gate: f32, // seconds held before release
    phase: f32,
    phase_increment: f32,
}

impl Voice {
    pub fn new(
        waveform: Waveform,
        frequency: f32,
        gain: f32,
        envelope: Envelope,
        start_sample: u64,
        gate: f32,
        sample_rate: f32,
    ) -> Self {
        Self {
            waveform,
            frequency,
            gain,
            envelope,
            start_sample,
            gate,
            phase: 0.0,
            phase_increment: frequency / sample_rate,
        }
    }

    fn elapsed(&self, clock: u64, sample_rate: f32) -> f32 {
        (clock as f64 - self.start_sample as f64) as f32 / sample_rate
    }

    pub fn is_pending(&self, clock: u64) -> bool {
        clock < self.start_sample
    }

    pub fn is_finished(&self, clock: u64, sample_rate: f32) -> bool {
        !self.is_pending(clock)
            && self.elapsed(clock, sample_rate) >= self.envelope.total_length(self.gate)
    }

    /// Produce the sample at `clock` and advance the oscillator phase.
    pub fn next_sample(&mut self, clock: u64, sample_rate: f32) -> f32 {
        if self.is_pending(clock) {
            return 0.0;
        }
        let level = self.envelope.level(self.elapsed(clock, sample_rate), self.gate);
        let value = self.waveform.sample(self.phase) * level * self.gain;
        self.phase = (self.phase + self.phase_increment) % 1.0;
        value
    }
}
