//! Null audio backend
//!
//! Produces no sound. Voices keep time against the clip's length so that
//! completion, looping and fades behave as with a real device. Used for
//! headless runs and tests.

use super::{AudioBackend, AudioBackendConfig, Voice, VoiceSetup};
use crate::audio::fade::FadeEnvelope;
use crate::audio::voice_pool::VoicePrefab;
use crate::audio::AudioError;

/// Backend whose voices only track play time
pub struct NullBackend {
    clip_length: f32,
    voices_created: usize,
    initialized: bool,
}

impl NullBackend {
    /// Create an uninitialized null backend
    pub fn new() -> Self {
        Self {
            clip_length: AudioBackendConfig::default().null_clip_length,
            voices_created: 0,
            initialized: false,
        }
    }

    /// Number of voices created so far
    pub fn voices_created(&self) -> usize {
        self.voices_created
    }
}

impl AudioBackend for NullBackend {
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }
        self.clip_length = config.null_clip_length.max(0.0);
        self.initialized = true;

        log::info!("Null audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        log::info!("Null audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn create_voice(&mut self, prefab: &VoicePrefab) -> Result<Box<dyn Voice>, AudioError> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }
        self.voices_created += 1;
        log::trace!("Created null voice #{} for prefab '{}'", self.voices_created, prefab.name);
        Ok(Box::new(NullVoice::new(self.clip_length)))
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NullVoiceState {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// Voice that counts play time instead of producing samples
#[derive(Debug)]
pub struct NullVoice {
    setup: Option<VoiceSetup>,
    default_length: f32,
    length: f32,
    elapsed: f32,
    volume: f32,
    envelope: FadeEnvelope,
    state: NullVoiceState,
}

impl NullVoice {
    /// Create a voice that assumes `default_length` seconds for clips of unknown length
    pub fn new(default_length: f32) -> Self {
        Self {
            setup: None,
            default_length,
            length: 0.0,
            elapsed: 0.0,
            volume: 1.0,
            envelope: FadeEnvelope::none(),
            state: NullVoiceState::Idle,
        }
    }

    /// Output gain right now: volume times the fade envelope
    pub fn current_gain(&self) -> f32 {
        self.volume * self.envelope.gain_at(self.elapsed)
    }

    /// Seconds played since the last start
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Play length of the current start, pitch applied
    pub fn length(&self) -> f32 {
        self.length
    }
}

impl Voice for NullVoice {
    fn setup(&mut self, setup: VoiceSetup) {
        self.volume = setup.volume;
        self.setup = Some(setup);
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let setup = self
            .setup
            .as_ref()
            .ok_or_else(|| AudioError::PlaybackFailed("voice has no clip set up".to_string()))?;

        let pitch = setup.pitch.max(0.01);
        self.length = setup.clip.duration().unwrap_or(self.default_length) / pitch;
        self.envelope = FadeEnvelope::new(setup.fade_in_time, setup.fade_out_time, Some(self.length));
        self.elapsed = 0.0;
        self.state = NullVoiceState::Playing;
        Ok(())
    }

    fn pause(&mut self) {
        if self.state == NullVoiceState::Playing {
            self.state = NullVoiceState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state == NullVoiceState::Paused {
            self.state = NullVoiceState::Playing;
        }
    }

    fn stop(&mut self) {
        self.state = NullVoiceState::Idle;
        self.elapsed = 0.0;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn update(&mut self, delta_time: f32) {
        if self.state != NullVoiceState::Playing {
            return;
        }
        self.elapsed += delta_time;
        if self.elapsed >= self.length {
            self.state = NullVoiceState::Finished;
        }
    }

    fn is_finished(&self) -> bool {
        self.state == NullVoiceState::Finished
    }

    fn is_paused(&self) -> bool {
        self.state == NullVoiceState::Paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::asset::{silent_wav, AudioClip};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn setup(seconds: f32, fade_in: f32, fade_out: f32, pitch: f32) -> VoiceSetup {
        VoiceSetup {
            name: "test".to_string(),
            clip: Arc::new(AudioClip::from_bytes("test", silent_wav(seconds)).unwrap()),
            volume: 0.8,
            fade_in_time: fade_in,
            fade_out_time: fade_out,
            mixer_group: None,
            pitch,
        }
    }

    #[test]
    fn test_create_voice_requires_initialization() {
        let mut backend = NullBackend::new();
        let prefab = VoicePrefab::new("default");
        assert!(matches!(backend.create_voice(&prefab), Err(AudioError::BackendNotInitialized)));

        backend.initialize(&AudioBackendConfig::default()).unwrap();
        assert!(backend.create_voice(&prefab).is_ok());
        assert_eq!(backend.voices_created(), 1);

        backend.shutdown();
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_play_without_setup_fails() {
        let mut voice = NullVoice::new(1.0);
        assert!(matches!(voice.play(), Err(AudioError::PlaybackFailed(_))));
    }

    #[test]
    fn test_voice_finishes_after_clip_length() {
        let mut voice = NullVoice::new(1.0);
        voice.setup(setup(0.5, 0.0, 0.0, 1.0));
        voice.play().unwrap();

        voice.update(0.3);
        assert!(!voice.is_finished());
        voice.update(0.3);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_pitch_shortens_length() {
        let mut voice = NullVoice::new(1.0);
        voice.setup(setup(1.0, 0.0, 0.0, 2.0));
        voice.play().unwrap();
        assert_relative_eq!(voice.length(), 0.5);
    }

    #[test]
    fn test_paused_voice_does_not_advance() {
        let mut voice = NullVoice::new(1.0);
        voice.setup(setup(0.5, 0.0, 0.0, 1.0));
        voice.play().unwrap();
        voice.pause();
        assert!(voice.is_paused());

        voice.update(1.0);
        assert!(!voice.is_finished());
        assert_eq!(voice.elapsed(), 0.0);

        voice.resume();
        voice.update(1.0);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_fade_in_gain() {
        let mut voice = NullVoice::new(1.0);
        voice.setup(setup(4.0, 2.0, 0.0, 1.0));
        voice.play().unwrap();
        assert_eq!(voice.current_gain(), 0.0);

        voice.update(1.0);
        assert_relative_eq!(voice.current_gain(), 0.4);
    }

    #[test]
    fn test_fade_out_gain() {
        let mut voice = NullVoice::new(1.0);
        voice.setup(setup(4.0, 0.0, 2.0, 1.0));
        voice.play().unwrap();

        voice.update(3.0);
        assert_relative_eq!(voice.current_gain(), 0.4);
    }
}
