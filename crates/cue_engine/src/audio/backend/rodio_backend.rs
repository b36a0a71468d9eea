//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback.
//! Rodio is pure Rust and supports WAV, OGG Vorbis, MP3, and FLAC formats.
//!
//! Each voice owns one `Sink`; starting a clip replaces the sink. Pitch maps
//! to sink speed and fades are applied by scaling sink volume every update.
//!
//! # Example
//!
//! ```no_run
//! use cue_engine::audio::backend::{AudioBackend, AudioBackendConfig};
//! use cue_engine::audio::backend::rodio_backend::RodioBackend;
//! use cue_engine::audio::voice_pool::VoicePrefab;
//!
//! let mut backend = RodioBackend::new();
//! backend.initialize(&AudioBackendConfig::default()).unwrap();
//!
//! let voice = backend.create_voice(&VoicePrefab::new("default")).unwrap();
//! # drop(voice);
//! backend.shutdown();
//! ```

use super::{AudioBackend, AudioBackendConfig, Voice, VoiceSetup};
use crate::audio::fade::FadeEnvelope;
use crate::audio::voice_pool::VoicePrefab;
use crate::audio::AudioError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: Option<OutputStream>,
    /// Output stream handle for creating sinks
    stream_handle: Option<OutputStreamHandle>,
    /// Initialization state
    initialized: bool,
}

impl RodioBackend {
    /// Create a new Rodio backend
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            initialized: false,
        }
    }
}

impl AudioBackend for RodioBackend {
    fn initialize(&mut self, _config: &AudioBackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendInitFailed(format!("Failed to create audio output: {e}")))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.initialized = true;

        log::info!("Rodio audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;

        log::info!("Rodio audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn create_voice(&mut self, prefab: &VoicePrefab) -> Result<Box<dyn Voice>, AudioError> {
        let stream_handle = self.stream_handle.as_ref().ok_or(AudioError::BackendNotInitialized)?;
        log::trace!("Created rodio voice for prefab '{}'", prefab.name);
        Ok(Box::new(RodioVoice::new(stream_handle.clone())))
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Voice playing through a rodio `Sink`
pub struct RodioVoice {
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    setup: Option<VoiceSetup>,
    envelope: FadeEnvelope,
    volume: f32,
    elapsed: f32,
}

impl RodioVoice {
    fn new(stream_handle: OutputStreamHandle) -> Self {
        Self {
            stream_handle,
            sink: None,
            setup: None,
            envelope: FadeEnvelope::none(),
            volume: 1.0,
            elapsed: 0.0,
        }
    }

    fn apply_gain(&self) {
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume * self.envelope.gain_at(self.elapsed));
        }
    }
}

impl Voice for RodioVoice {
    fn setup(&mut self, setup: VoiceSetup) {
        self.volume = setup.volume;
        self.setup = Some(setup);
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let setup = self
            .setup
            .as_ref()
            .ok_or_else(|| AudioError::PlaybackFailed("voice has no clip set up".to_string()))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {e}")))?;

        let cursor = Cursor::new(setup.clip.data().to_vec());
        let source = Decoder::new(cursor)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode '{}': {e}", setup.name)))?;

        let pitch = setup.pitch.max(0.01);
        let duration = source
            .total_duration()
            .map(|d| d.as_secs_f32())
            .or_else(|| setup.clip.duration())
            .map(|d| d / pitch);

        self.envelope = FadeEnvelope::new(setup.fade_in_time, setup.fade_out_time, duration);
        self.elapsed = 0.0;

        sink.set_speed(pitch);
        sink.append(source);

        if let Some(previous) = self.sink.replace(sink) {
            previous.stop();
        }
        self.apply_gain();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.elapsed = 0.0;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.apply_gain();
    }

    fn update(&mut self, delta_time: f32) {
        let advancing = self.sink.as_ref().is_some_and(|sink| !sink.is_paused() && !sink.empty());
        if advancing {
            self.elapsed += delta_time;
            self.apply_gain();
        }
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }

    fn is_paused(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::is_paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_initialization() {
        let mut backend = RodioBackend::new();
        assert!(!backend.is_initialized());

        let config = AudioBackendConfig::default();
        let result = backend.initialize(&config);

        // May fail in CI/test environments without audio device
        if result.is_ok() {
            assert!(backend.is_initialized());
            backend.shutdown();
            assert!(!backend.is_initialized());
        }
    }

    #[test]
    fn test_double_initialization() {
        let mut backend = RodioBackend::new();
        let config = AudioBackendConfig::default();

        if backend.initialize(&config).is_ok() {
            assert!(backend.initialize(&config).is_ok());
            backend.shutdown();
        }
    }

    #[test]
    fn test_voice_without_initialization() {
        let mut backend = RodioBackend::new();
        let result = backend.create_voice(&VoicePrefab::new("default"));
        assert!(matches!(result, Err(AudioError::BackendNotInitialized)));
    }

    #[test]
    fn test_play_undecodable_clip_fails() {
        let mut backend = RodioBackend::new();
        if backend.initialize(&AudioBackendConfig::default()).is_err() {
            return;
        }

        let mut voice = backend.create_voice(&VoicePrefab::new("default")).unwrap();
        let clip = crate::audio::asset::AudioClip::from_bytes("bad", b"OggS garbage".to_vec()).unwrap();
        voice.setup(VoiceSetup {
            name: "bad".to_string(),
            clip: std::sync::Arc::new(clip),
            volume: 1.0,
            fade_in_time: 0.0,
            fade_out_time: 0.0,
            mixer_group: None,
            pitch: 1.0,
        });
        assert!(matches!(voice.play(), Err(AudioError::PlaybackFailed(_))));
        assert!(!voice.is_finished());
    }
}
