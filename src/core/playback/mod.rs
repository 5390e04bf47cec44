pub mod scheduler;

pub use scheduler::{PlaybackScheduler, TickReport, LATE_TOLERANCE_MS, LOOKAHEAD_MS};

use crate::core::oscillator::Waveform;

/// Triggering side of the audio engine. Synthesis itself is opaque here.
pub trait AudioEngine {
    /// Bring audio output up. Only ever called behind a user gesture.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Audio clock in seconds.
    fn now(&self) -> f64;

    /// Sound `frequency` Hz on the `waveform` voice at audio time `start_at`
    /// for `duration` seconds.
    fn trigger(&mut self, waveform: Waveform, frequency: f64, start_at: f64, duration: f64);

    /// Master volume in dB.
    fn set_volume(&mut self, db: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Uninitialized,
    Running,
    Muted,
}

/// Tracks one-time audio initialization and the mute toggle.
#[derive(Debug)]
pub struct AudioGate {
    state: AudioState,
}

impl Default for AudioGate {
    fn default() -> Self {
        Self { state: AudioState::Uninitialized }
    }
}

impl AudioGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    /// Whether triggers may reach the engine.
    pub fn is_enabled(&self) -> bool {
        self.state == AudioState::Running
    }

    pub fn is_initialized(&self) -> bool {
        self.state != AudioState::Uninitialized
    }

    fn initialize(&mut self, engine: &mut dyn AudioEngine) -> bool {
        if self.is_initialized() {
            return true;
        }
        match engine.start() {
            Ok(()) => {
                log::info!("audio output started");
                self.state = AudioState::Muted;
                true
            },
            Err(e) => {
                log::error!("failed to start audio: {:#}", e);
                false
            },
        }
    }

    /// Initialize if needed and unmute. Returns whether audio is now enabled.
    pub fn ensure_started(&mut self, engine: &mut dyn AudioEngine) -> bool {
        if self.initialize(engine) {
            self.state = AudioState::Running;
        }
        self.is_enabled()
    }

    /// Flip between running and muted, initializing on first use.
    pub fn toggle(&mut self, engine: &mut dyn AudioEngine) -> bool {
        let was_enabled = self.is_enabled();
        if self.initialize(engine) {
            self.state = if was_enabled { AudioState::Muted } else { AudioState::Running };
        }
        self.is_enabled()
    }
}
