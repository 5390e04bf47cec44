pub mod cursor;
pub mod input;
pub mod oscillator;
pub mod playback;
pub mod synth;
pub mod timeline;
pub mod timer;
pub mod view;

pub use synth::Synth;
