//! Shared scrolling timeline of pitched notes with look-ahead playback,
//! optimistic note creation and live peer cursors.

pub mod audio;
pub mod config;
pub mod core;
pub mod messaging;
pub mod render;
pub mod session;
pub mod utils;

pub use crate::config::{SessionConfig, ViewConfig};
pub use crate::core::oscillator::Waveform;
pub use crate::core::playback::AudioEngine;
pub use crate::core::timeline::{Note, NoteId, NoteStore};
pub use crate::core::view::{ViewState, Viewport};
pub use crate::render::{RenderedNote, Renderer};
pub use crate::session::{FrameLoop, FrameLoopHandle, JamSession};
