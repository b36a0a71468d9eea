//! Audio backend implementations
//!
//! Platform-independent abstraction over audio playback libraries. A backend
//! is a factory for [`Voice`]s, the playback objects the voice pool lends out.

pub mod null_backend;
#[cfg(feature = "rodio-backend")]
pub mod rodio_backend;

use crate::audio::asset::AudioClip;
use crate::audio::voice_pool::VoicePrefab;
use crate::audio::AudioError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything a voice needs to start one item
#[derive(Debug, Clone)]
pub struct VoiceSetup {
    /// Item name, for logging
    pub name: String,
    /// Clip to play
    pub clip: Arc<AudioClip>,
    /// Volume before the fade envelope
    pub volume: f32,
    /// Fade-in time in seconds
    pub fade_in_time: f32,
    /// Fade-out time in seconds
    pub fade_out_time: f32,
    /// Mixer group the item is routed through
    pub mixer_group: Option<String>,
    /// Playback speed multiplier
    pub pitch: f32,
}

/// A playback object
///
/// Single-threaded: voices are driven from the caller's update thread.
/// Completion is polled through [`Voice::is_finished`] once per tick.
pub trait Voice {
    /// Configure the next clip; takes effect on [`Voice::play`]
    fn setup(&mut self, setup: VoiceSetup);

    /// Start the configured clip from the beginning
    fn play(&mut self) -> Result<(), AudioError>;

    /// Pause playback
    fn pause(&mut self);

    /// Resume paused playback
    fn resume(&mut self);

    /// Stop playback
    fn stop(&mut self);

    /// Set volume before the fade envelope
    fn set_volume(&mut self, volume: f32);

    /// Advance fades and play time
    fn update(&mut self, delta_time: f32);

    /// Whether the started clip ran to its end
    fn is_finished(&self) -> bool;

    /// Whether playback is paused
    fn is_paused(&self) -> bool;
}

/// Audio backend trait for platform abstraction
pub trait AudioBackend {
    /// Initialize the audio backend
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError>;

    /// Shutdown the audio backend
    fn shutdown(&mut self);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;

    /// Create a new voice for a prefab
    fn create_voice(&mut self, prefab: &VoicePrefab) -> Result<Box<dyn Voice>, AudioError>;
}

/// Configuration for audio backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioBackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
    /// Buffer size for audio processing
    pub buffer_size: usize,
    /// Play length the null backend assumes when a clip has no readable duration
    pub null_clip_length: f32,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
            null_clip_length: 1.0,
        }
    }
}

/// Create the default audio backend for the platform
///
/// rodio when the `rodio-backend` feature is enabled, the null backend otherwise.
pub fn create_backend(config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    #[cfg(feature = "rodio-backend")]
    let mut backend: Box<dyn AudioBackend> = Box::new(rodio_backend::RodioBackend::new());
    #[cfg(not(feature = "rodio-backend"))]
    let mut backend: Box<dyn AudioBackend> = Box::new(null_backend::NullBackend::new());

    backend.initialize(config)?;
    Ok(backend)
}
