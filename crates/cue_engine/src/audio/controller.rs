//! Sound controller
//!
//! Front door of the audio system. Play requests come in by name; the first
//! play of a name resolves its clip and builds cue data, later plays reuse
//! that data from the registry. Each playback runs in a pooled [`SoundCue`]
//! session addressed by a [`CueHandle`].
//!
//! # Example
//!
//! ```
//! use cue_engine::audio::asset::MemoryAssetResolver;
//! use cue_engine::audio::backend::null_backend::NullBackend;
//! use cue_engine::audio::backend::{AudioBackend, AudioBackendConfig};
//! use cue_engine::audio::config::AudioConfig;
//! use cue_engine::audio::{PlaySoundSettings, SoundController};
//!
//! let mut backend = NullBackend::new();
//! backend.initialize(&AudioBackendConfig::default()).unwrap();
//!
//! let mut controller = SoundController::new(
//!     Box::new(backend),
//!     Box::new(MemoryAssetResolver::new()),
//!     &AudioConfig::default(),
//! );
//!
//! // nothing registered under "ui/missing": logged, no handle
//! let settings = PlaySoundSettings::new("click", "ui/missing", 0.0, 0.0, false, 1.0, None);
//! assert!(controller.play_audio(&settings).is_none());
//! controller.update(1.0 / 60.0);
//! ```

use crate::audio::asset::AssetResolver;
use crate::audio::backend::AudioBackend;
use crate::audio::config::AudioConfig;
use crate::audio::context::AudioContext;
use crate::audio::cue::SoundCue;
use crate::audio::cue_pool::{CueHandle, CuePool};
use crate::audio::item::{SoundCueData, SoundItem};
use crate::audio::mixer::MixerSystem;
use crate::audio::voice_pool::{ParentId, VoicePool, VoicePrefab};
use std::collections::HashMap;

/// A play or stop request for a named cue
#[derive(Debug, Clone, PartialEq)]
pub struct PlaySoundSettings {
    /// Cue name, the registry key
    pub name: String,
    /// Clip path handed to the asset resolver
    pub path: String,
    /// What the voice is attached to
    pub parent: Option<ParentId>,
    /// Fade-in time in seconds
    pub fade_in_time: f32,
    /// Fade-out time in seconds
    pub fade_out_time: f32,
    /// Restart the clip when it ends
    pub is_looped: bool,
    /// Request volume
    pub volume: f32,
    /// true to start the cue, false to stop it
    pub play_state: bool,
    /// Mixer group for the cue's item
    pub mixer_group: Option<String>,
    /// Voice prefab to lend from; the controller's default when unset
    pub prefab: Option<String>,
}

impl PlaySoundSettings {
    /// Create a request to start a cue
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        fade_in_time: f32,
        fade_out_time: f32,
        is_looped: bool,
        volume: f32,
        parent: Option<ParentId>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            parent,
            fade_in_time,
            fade_out_time,
            is_looped,
            volume,
            play_state: true,
            mixer_group: None,
            prefab: None,
        }
    }

    /// Turn the request into a start (true) or stop (false) request
    pub fn with_play_state(mut self, play_state: bool) -> Self {
        self.play_state = play_state;
        self
    }

    /// Route the cue through a mixer group
    pub fn with_mixer_group(mut self, group: impl Into<String>) -> Self {
        self.mixer_group = Some(group.into());
        self
    }

    /// Lend the voice from a prefab registered with [`SoundController::register_prefab`]
    pub fn with_prefab(mut self, prefab: impl Into<String>) -> Self {
        self.prefab = Some(prefab.into());
        self
    }
}

/// Registry record for a named cue
#[derive(Debug, Clone)]
struct RegistryEntry {
    /// Most recent session started under the name; may be stale
    handle: CueHandle,
    /// Data reused by later plays of the name
    data: SoundCueData,
}

/// Named cue dispatch over pooled sessions and voices
pub struct SoundController {
    default_prefab: String,
    cues: CuePool,
    context: AudioContext,
    resolver: Box<dyn AssetResolver>,
    registry: HashMap<String, RegistryEntry>,
}

impl SoundController {
    /// Create a controller over an initialized backend
    pub fn new(backend: Box<dyn AudioBackend>, resolver: Box<dyn AssetResolver>, config: &AudioConfig) -> Self {
        let mut voices = VoicePool::new(backend, config.max_voices);
        voices.register_prefab(config.default_prefab.clone());

        let mixer = MixerSystem::with_groups(config.mixer_groups.iter().map(|(group, volume)| (group.clone(), *volume)));

        log::info!(
            "Sound controller ready: {} cue sessions, {} max voices, prefab '{}'",
            config.initial_cue_pool_size,
            config.max_voices,
            config.default_prefab.name
        );

        Self {
            default_prefab: config.default_prefab.name.clone(),
            cues: CuePool::with_capacity(config.initial_cue_pool_size),
            context: AudioContext::new(voices, mixer),
            resolver,
            registry: HashMap::new(),
        }
    }

    /// Seed volume, pitch and clip randomisation
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.context.reseed(seed);
        self
    }

    /// Register another voice prefab, or replace the limits of a registered one
    ///
    /// Requests pick it through [`PlaySoundSettings::with_prefab`].
    pub fn register_prefab(&mut self, prefab: VoicePrefab) {
        self.context.voices.register_prefab(prefab);
    }

    /// Resolve the clip and start a new, unregistered cue
    ///
    /// Returns `None` without side effects when the name is empty or the
    /// clip can't be resolved, and when no voice is available or the cue
    /// fails to start.
    pub fn play(&mut self, settings: &PlaySoundSettings) -> Option<CueHandle> {
        let data = self.build_cue_data(settings)?;
        self.start_cue(data, settings.parent)
    }

    /// Start or stop a cue by name
    ///
    /// The first successful start of a name registers it. Later starts reuse
    /// the registered data without touching the asset resolver; a stop
    /// request stops the registered session. Returns the started session.
    pub fn play_audio(&mut self, settings: &PlaySoundSettings) -> Option<CueHandle> {
        let stored = self
            .registry
            .get(&settings.name)
            .map(|entry| (entry.handle, entry.data.clone()));

        match (stored, settings.play_state) {
            (Some((_, data)), true) => {
                let (handle, data) = self.play_sound_cue(data, settings)?;
                self.registry.insert(settings.name.clone(), RegistryEntry { handle, data });
                Some(handle)
            }
            (Some((handle, _)), false) => {
                self.stop_cue(handle, true);
                None
            }
            (None, true) => {
                let data = self.build_cue_data(settings)?;
                let handle = self.start_cue(data.clone(), settings.parent)?;
                log::debug!("Registered cue '{}'", settings.name);
                self.registry.insert(settings.name.clone(), RegistryEntry { handle, data });
                Some(handle)
            }
            (None, false) => None,
        }
    }

    /// Restart registered data with the request's fades, loop flag and volume
    fn play_sound_cue(
        &mut self,
        mut data: SoundCueData,
        settings: &PlaySoundSettings,
    ) -> Option<(CueHandle, SoundCueData)> {
        data.set_fades(settings.fade_in_time, settings.fade_out_time);
        data.is_looped = settings.is_looped;
        data.name.clone_from(&settings.name);
        data.volume = settings.volume.max(0.0);

        let handle = self.start_cue(data.clone(), settings.parent)?;
        Some((handle, data))
    }

    fn build_cue_data(&mut self, settings: &PlaySoundSettings) -> Option<SoundCueData> {
        if settings.name.is_empty() {
            return None;
        }

        let clip = match self.resolver.resolve(&settings.path) {
            Ok(clip) => clip,
            Err(e) => {
                log::error!("Can't find clip '{}' for cue '{}': {}", settings.path, settings.name, e);
                return None;
            }
        };

        let mut item = SoundItem::new(settings.name.clone(), clip);
        if let Some(group) = &settings.mixer_group {
            item = item.with_mixer_group(group.clone());
        }

        let prefab = settings.prefab.as_ref().unwrap_or(&self.default_prefab).clone();
        Some(
            SoundCueData::new(settings.name.clone(), prefab, vec![item])
                .with_fades(settings.fade_in_time, settings.fade_out_time)
                .with_looped(settings.is_looped)
                .with_volume(settings.volume),
        )
    }

    fn start_cue(&mut self, data: SoundCueData, parent: Option<ParentId>) -> Option<CueHandle> {
        let voice = match self.context.voices.acquire(&data.prefab, parent) {
            Ok(voice) => voice,
            Err(e) => {
                log::error!("No voice for cue '{}': {}", data.name, e);
                return None;
            }
        };

        let name = data.name.clone();
        let handle = self.cues.acquire();
        let Some(cue) = self.cues.get_mut(handle) else {
            self.context.voices.release(voice);
            return None;
        };

        if cue.play(data, voice, Some(handle), &mut self.context) {
            log::debug!("Cue '{}' started ({:?})", name, handle);
            Some(handle)
        } else {
            self.cues.release(handle);
            None
        }
    }

    /// Stop the cue registered under `name`
    ///
    /// Returns false for unknown names and cues that already stopped.
    pub fn stop(&mut self, name: &str) -> bool {
        self.handle_of(name).is_some_and(|handle| self.stop_cue(handle, true))
    }

    /// Stop every playing cue
    ///
    /// `on_cue_ended` fires only when `notify` is set; `on_killed` always does.
    pub fn stop_all(&mut self, notify: bool) {
        let handles = self.cues.active_handles();
        log::debug!("Stopping {} cues", handles.len());
        for handle in handles {
            self.stop_cue(handle, notify);
        }
    }

    /// Stop one session and return it to the pool
    pub fn stop_cue(&mut self, handle: CueHandle, notify: bool) -> bool {
        let Some(cue) = self.cues.get_mut(handle) else {
            return false;
        };
        let stopped = cue.stop(notify, &mut self.context);
        self.cues.release(handle);
        stopped
    }

    /// Pause a session's voice
    pub fn pause(&mut self, handle: CueHandle) {
        if let Some(cue) = self.cues.get_mut(handle) {
            cue.pause(&mut self.context);
        }
    }

    /// Resume a session's voice
    pub fn resume(&mut self, handle: CueHandle) {
        if let Some(cue) = self.cues.get_mut(handle) {
            cue.resume(&mut self.context);
        }
    }

    /// Whether the session is still playing; false for stale handles
    pub fn is_playing(&self, handle: CueHandle) -> bool {
        self.cues.get(handle).is_some_and(SoundCue::is_playing)
    }

    /// Whether the session's voice is paused
    pub fn is_paused(&self, handle: CueHandle) -> bool {
        self.cues
            .get(handle)
            .and_then(SoundCue::voice)
            .and_then(|key| self.context.voices.voice(key))
            .is_some_and(|voice| voice.is_paused())
    }

    /// What the session's voice is attached to
    pub fn parent_of(&self, handle: CueHandle) -> Option<ParentId> {
        self.cues
            .get(handle)
            .and_then(SoundCue::voice)
            .and_then(|key| self.context.voices.parent_of(key))
    }

    /// Name of the cue a session plays
    pub fn cue_name(&self, handle: CueHandle) -> Option<&str> {
        self.cues.get(handle).and_then(SoundCue::name)
    }

    /// Call `callback` with the cue name each time the session's clip ends
    ///
    /// Returns false for stale handles.
    pub fn on_play_ended(&mut self, handle: CueHandle, callback: impl FnMut(&str) + 'static) -> bool {
        self.cues
            .get_mut(handle)
            .map(|cue| cue.callbacks_mut().on_play_ended = Some(Box::new(callback)))
            .is_some()
    }

    /// Call `callback` with the cue name when the session stops with notification
    pub fn on_cue_ended(&mut self, handle: CueHandle, callback: impl FnMut(&str) + 'static) -> bool {
        self.cues
            .get_mut(handle)
            .map(|cue| cue.callbacks_mut().on_cue_ended = Some(Box::new(callback)))
            .is_some()
    }

    /// Call `callback` with the session's handle whenever it stops
    pub fn on_killed(&mut self, handle: CueHandle, callback: impl FnMut(Option<CueHandle>) + 'static) -> bool {
        self.cues
            .get_mut(handle)
            .map(|cue| cue.callbacks_mut().on_killed = Some(Box::new(callback)))
            .is_some()
    }

    /// Handle most recently started under `name`
    pub fn handle_of(&self, name: &str) -> Option<CueHandle> {
        self.registry.get(name).map(|entry| entry.handle)
    }

    /// Data registered under `name`
    pub fn cue_data(&self, name: &str) -> Option<&SoundCueData> {
        self.registry.get(name).map(|entry| &entry.data)
    }

    /// Pause the cue registered under `name`
    pub fn pause_named(&mut self, name: &str) {
        if let Some(handle) = self.handle_of(name) {
            self.pause(handle);
        }
    }

    /// Resume the cue registered under `name`
    pub fn resume_named(&mut self, name: &str) {
        if let Some(handle) = self.handle_of(name) {
            self.resume(handle);
        }
    }

    /// Whether the cue registered under `name` is playing
    pub fn is_playing_named(&self, name: &str) -> bool {
        self.handle_of(name).is_some_and(|handle| self.is_playing(handle))
    }

    /// Advance playback by one frame
    ///
    /// Moves voice clocks and fades forward, pushes mixer changes to playing
    /// voices, handles clips that ended and recycles sessions that stopped.
    pub fn update(&mut self, delta_time: f32) {
        self.context.voices.update(delta_time);
        let finished = self.context.voices.finished_voices();

        for handle in self.cues.active_handles() {
            let Some(cue) = self.cues.get_mut(handle) else {
                continue;
            };

            cue.apply_mixer(&mut self.context);
            if cue.voice().is_some_and(|voice| finished.contains(&voice)) {
                cue.on_finished(&mut self.context);
            }

            if !cue.is_playing() {
                self.cues.release(handle);
            }
        }
    }

    /// Number of sessions playing
    pub fn active_cue_count(&self) -> usize {
        self.cues.active_count()
    }

    /// Mixer used for all cues
    pub fn mixer(&self) -> &MixerSystem {
        &self.context.mixer
    }

    /// Mutable mixer; changes reach playing cues on the next update
    pub fn mixer_mut(&mut self) -> &mut MixerSystem {
        &mut self.context.mixer
    }

    /// Voice pool, for diagnostics
    pub fn voices(&self) -> &VoicePool {
        &self.context.voices
    }
}
