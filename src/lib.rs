//! Procedural focus audio: twelve synthesised ambience voices with a shared
//! 120 bpm kick, played on the default output device or rendered to WAV.

pub mod audio_io;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod models;
pub mod overlay;
pub mod render;
pub mod synth;
pub mod voices;

pub use engine::{AmbientEngine, EngineError, OutputBackend};
pub use models::{catalog, VoiceId, VoiceInfo};
pub use synth::Synth;
