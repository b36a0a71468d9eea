//! Sound cue playback
//!
//! A [`SoundCue`] runs one playback session: it is bound to cue data and a
//! lent voice, restarts its item when looped, and stops itself when the item
//! ends or cannot be started.
//!
//! ```text
//!          play(data, voice) ok
//!   Idle ─────────────────────────► Playing { voice }
//!    ▲                                 │  finished + looped → restart item
//!    └──────── stop / finished ────────┘
//! ```

use crate::audio::backend::VoiceSetup;
use crate::audio::context::AudioContext;
use crate::audio::cue_pool::CueHandle;
use crate::audio::item::SoundCueData;
use crate::audio::voice_pool::VoiceKey;
use std::fmt;

/// Playback state; the voice is held exactly while playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueState {
    /// No voice bound
    Idle,
    /// Playing through a lent voice
    Playing {
        /// The lent voice
        voice: VoiceKey,
    },
}

/// Callbacks raised by a cue session
#[derive(Default)]
pub struct CueCallbacks {
    /// The item finished playing, with the cue name; raised before any loop restart
    pub on_play_ended: Option<Box<dyn FnMut(&str)>>,
    /// The cue stopped with notification, with the cue name
    pub on_cue_ended: Option<Box<dyn FnMut(&str)>>,
    /// The cue stopped for any reason, with the handle it was started for
    pub on_killed: Option<Box<dyn FnMut(Option<CueHandle>)>>,
}

impl fmt::Debug for CueCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CueCallbacks")
            .field("on_play_ended", &self.on_play_ended.is_some())
            .field("on_cue_ended", &self.on_cue_ended.is_some())
            .field("on_killed", &self.on_killed.is_some())
            .finish()
    }
}

/// One playback session
#[derive(Debug)]
pub struct SoundCue {
    data: Option<SoundCueData>,
    state: CueState,
    /// Handle the session was started for
    owner: Option<CueHandle>,
    /// Item volume of the current start, before the mixer
    base_volume: f32,
    callbacks: CueCallbacks,
}

impl SoundCue {
    /// Create an idle cue
    pub fn new() -> Self {
        Self {
            data: None,
            state: CueState::Idle,
            owner: None,
            base_volume: 1.0,
            callbacks: CueCallbacks::default(),
        }
    }

    /// Data the cue was last played with
    pub fn data(&self) -> Option<&SoundCueData> {
        self.data.as_ref()
    }

    /// Name of the bound cue data
    pub fn name(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.name.as_str())
    }

    /// Current state
    pub fn state(&self) -> CueState {
        self.state
    }

    /// Whether a voice is bound and playing
    pub fn is_playing(&self) -> bool {
        matches!(self.state, CueState::Playing { .. })
    }

    /// The voice held while playing
    pub fn voice(&self) -> Option<VoiceKey> {
        match self.state {
            CueState::Playing { voice } => Some(voice),
            CueState::Idle => None,
        }
    }

    /// Handle the session was started for
    pub fn owner(&self) -> Option<CueHandle> {
        self.owner
    }

    /// Callbacks raised by this session
    pub fn callbacks_mut(&mut self) -> &mut CueCallbacks {
        &mut self.callbacks
    }

    /// Start playing `data` through `voice`
    ///
    /// The voice must already be lent from `ctx.voices`. If the first item
    /// cannot be started the voice goes back to the pool and the cue stays
    /// idle. Returns whether playback started.
    pub fn play(
        &mut self,
        data: SoundCueData,
        voice: VoiceKey,
        owner: Option<CueHandle>,
        ctx: &mut AudioContext,
    ) -> bool {
        if self.is_playing() {
            log::warn!("Cue '{}' restarted while playing", self.name().unwrap_or_default());
            self.stop(false, ctx);
        }

        self.data = Some(data);
        self.owner = owner;
        ctx.voices.set_notify_on_finish(voice, true);

        if self.try_play_next(voice, ctx) {
            self.state = CueState::Playing { voice };
            true
        } else {
            ctx.voices.release(voice);
            self.owner = None;
            false
        }
    }

    /// Pause the bound voice
    pub fn pause(&mut self, ctx: &mut AudioContext) {
        if let Some(voice) = self.voice().and_then(|key| ctx.voices.voice_mut(key)) {
            voice.pause();
        }
    }

    /// Resume the bound voice
    pub fn resume(&mut self, ctx: &mut AudioContext) {
        if let Some(voice) = self.voice().and_then(|key| ctx.voices.voice_mut(key)) {
            voice.resume();
        }
    }

    /// Stop playback and give the voice back
    ///
    /// No-op when idle. `on_cue_ended` is raised only when `notify` is set,
    /// `on_killed` always. Returns whether the cue was playing.
    pub fn stop(&mut self, notify: bool, ctx: &mut AudioContext) -> bool {
        let CueState::Playing { voice } = self.state else {
            return false;
        };

        ctx.voices.set_notify_on_finish(voice, false);
        ctx.voices.release(voice);
        self.state = CueState::Idle;

        let name = self.name().unwrap_or_default().to_string();
        log::debug!("Cue '{}' stopped", name);

        if notify {
            if let Some(on_cue_ended) = self.callbacks.on_cue_ended.as_mut() {
                on_cue_ended(&name);
            }
        }

        let owner = self.owner.take();
        if let Some(on_killed) = self.callbacks.on_killed.as_mut() {
            on_killed(owner);
        }
        true
    }

    /// React to the bound voice reaching the end of its clip
    pub fn on_finished(&mut self, ctx: &mut AudioContext) {
        let CueState::Playing { voice } = self.state else {
            return;
        };

        let name = self.name().unwrap_or_default().to_string();
        if let Some(on_play_ended) = self.callbacks.on_play_ended.as_mut() {
            on_play_ended(&name);
        }

        let looped = self.data.as_ref().is_some_and(|data| data.is_looped);
        if !looped || !self.try_play_next(voice, ctx) {
            self.stop(true, ctx);
        }
    }

    /// Push the current mixer volume to the bound voice
    pub fn apply_mixer(&mut self, ctx: &mut AudioContext) {
        let Some(key) = self.voice() else {
            return;
        };
        let group = self
            .data
            .as_ref()
            .and_then(SoundCueData::first_item)
            .and_then(|item| item.mixer_group.as_deref());
        let volume = self.base_volume * ctx.mixer.get_effective_volume(group);

        if let Some(voice) = ctx.voices.voice_mut(key) {
            voice.set_volume(volume);
        }
    }

    /// Forget data, owner and callbacks; used when the session is recycled
    pub fn reset(&mut self) {
        debug_assert!(!self.is_playing(), "recycled a playing cue");
        *self = Self::new();
    }

    /// Set up and start the first item on `voice`
    fn try_play_next(&mut self, voice: VoiceKey, ctx: &mut AudioContext) -> bool {
        let Some(data) = self.data.as_ref() else {
            return false;
        };
        let Some(item) = data.first_item() else {
            log::warn!("Cue '{}' has no sound items", data.name);
            return false;
        };
        let Some(clip) = item.pick_clip(&mut ctx.rng) else {
            log::warn!("Sound item '{}' has no clips", item.name);
            return false;
        };

        let volume = item.sample_volume(&mut ctx.rng) * data.volume;
        let pitch = item.sample_pitch(&mut ctx.rng);
        let setup = VoiceSetup {
            name: item.name.clone(),
            clip,
            volume: volume * ctx.mixer.get_effective_volume(item.mixer_group.as_deref()),
            fade_in_time: data.fade_in_time(),
            fade_out_time: data.fade_out_time(),
            mixer_group: item.mixer_group.clone(),
            pitch,
        };
        self.base_volume = volume;

        let Some(target) = ctx.voices.voice_mut(voice) else {
            log::warn!("Cue '{}' lost its voice", data.name);
            return false;
        };
        target.setup(setup);
        match target.play() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Cue '{}' failed to start: {}", data.name, e);
                false
            }
        }
    }
}

impl Default for SoundCue {
    fn default() -> Self {
        Self::new()
    }
}
