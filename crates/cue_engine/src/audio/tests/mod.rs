//! Controller behaviour across the whole audio stack, on the null backend

use crate::audio::asset::{silent_wav, AssetResolver, AudioClip, MemoryAssetResolver};
use crate::audio::backend::null_backend::NullBackend;
use crate::audio::backend::{AudioBackend, AudioBackendConfig, Voice, VoiceSetup};
use crate::audio::config::AudioConfig;
use crate::audio::voice_pool::VoicePrefab;
use crate::audio::{AudioError, CueHandle, PlaySoundSettings, SoundController};
use approx::assert_relative_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

const MUSIC: &str = "Audios/BGM/Fly Catchers";
const CLICK: &str = "UI/click";
const FRAME: f32 = 1.0 / 60.0;

/// Memory resolver that counts lookups
struct CountingResolver {
    inner: MemoryAssetResolver,
    lookups: Rc<Cell<usize>>,
}

impl AssetResolver for CountingResolver {
    fn resolve(&mut self, path: &str) -> Result<Arc<AudioClip>, AudioError> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.resolve(path)
    }
}

struct Harness {
    controller: SoundController,
    lookups: Rc<Cell<usize>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(&AudioConfig::default())
    }

    fn with_config(config: &AudioConfig) -> Self {
        crate::foundation::logging::init_with_level(log::LevelFilter::Debug);

        let mut backend = NullBackend::new();
        backend.initialize(&config.backend).unwrap();

        let lookups = Rc::new(Cell::new(0));
        let resolver = CountingResolver {
            inner: MemoryAssetResolver::new()
                .with_clip(MUSIC, AudioClip::from_bytes(MUSIC, silent_wav(1.0)).unwrap())
                .with_clip(CLICK, AudioClip::from_bytes(CLICK, silent_wav(0.25)).unwrap()),
            lookups: Rc::clone(&lookups),
        };

        let controller = SoundController::new(Box::new(backend), Box::new(resolver), config).with_seed(42);
        Self { controller, lookups }
    }

    fn run(&mut self, seconds: f32) {
        let frames = (seconds / FRAME).round() as usize;
        for _ in 0..frames {
            self.controller.update(FRAME);
        }
    }
}

fn music(looped: bool) -> PlaySoundSettings {
    PlaySoundSettings::new("Fly Catchers", MUSIC, 0.0, 0.0, looped, 1.0, None)
}

fn click() -> PlaySoundSettings {
    PlaySoundSettings::new("Active_Disable_menu Button", CLICK, 0.0, 0.0, false, 1.0, None)
}

#[test]
fn test_empty_name_creates_nothing() {
    let mut harness = Harness::new();
    let settings = PlaySoundSettings::new("", MUSIC, 0.0, 0.0, false, 1.0, None);

    assert!(harness.controller.play(&settings).is_none());
    assert!(harness.controller.play_audio(&settings).is_none());
    assert_eq!(harness.controller.active_cue_count(), 0);
    assert_eq!(harness.controller.voices().total_count(), 0);
    assert_eq!(harness.lookups.get(), 0);
}

#[test]
fn test_missing_asset_leaves_registry_unchanged() {
    let mut harness = Harness::new();
    let settings = PlaySoundSettings::new("ghost", "Audios/none", 0.0, 0.0, false, 1.0, None);

    assert!(harness.controller.play_audio(&settings).is_none());
    assert_eq!(harness.controller.handle_of("ghost"), None);
    assert_eq!(harness.controller.active_cue_count(), 0);
    assert_eq!(harness.controller.voices().in_use_count(), 0);
}

#[test]
fn test_playing_until_clip_ends() {
    let mut harness = Harness::new();
    let handle = harness.controller.play_audio(&music(false)).unwrap();

    harness.run(0.5);
    assert!(harness.controller.is_playing(handle));

    harness.run(0.6);
    assert!(!harness.controller.is_playing(handle));
    assert_eq!(harness.controller.active_cue_count(), 0);
    assert_eq!(harness.controller.voices().in_use_count(), 0);
}

#[test]
fn test_playing_until_stopped() {
    let mut harness = Harness::new();
    let handle = harness.controller.play_audio(&music(false)).unwrap();

    harness.run(0.25);
    assert!(harness.controller.stop_cue(handle, true));
    assert!(!harness.controller.is_playing(handle));
}

#[test]
fn test_looped_cue_restarts() {
    let mut harness = Harness::new();
    let handle = harness.controller.play_audio(&music(true)).unwrap();

    let ended = Rc::new(RefCell::new(Vec::new()));
    let ended_log = Rc::clone(&ended);
    harness
        .controller
        .on_play_ended(handle, move |name| ended_log.borrow_mut().push(name.to_string()));

    harness.run(3.5);
    assert!(harness.controller.is_playing(handle));
    assert_eq!(ended.borrow().len(), 3);
    assert!(ended.borrow().iter().all(|name| name == "Fly Catchers"));
    // the same voice keeps playing
    assert_eq!(harness.controller.voices().total_count(), 1);
}

#[test]
fn test_second_stop_fires_no_callbacks() {
    let mut harness = Harness::new();
    let handle = harness.controller.play_audio(&music(true)).unwrap();

    let ended = Rc::new(Cell::new(0));
    let killed = Rc::new(RefCell::new(Vec::new()));
    let ended_count = Rc::clone(&ended);
    let killed_log = Rc::clone(&killed);
    harness
        .controller
        .on_cue_ended(handle, move |_| ended_count.set(ended_count.get() + 1));
    harness
        .controller
        .on_killed(handle, move |owner| killed_log.borrow_mut().push(owner));

    assert!(harness.controller.stop("Fly Catchers"));
    assert!(!harness.controller.stop("Fly Catchers"));
    assert!(!harness.controller.stop_cue(handle, true));

    assert_eq!(ended.get(), 1);
    assert_eq!(*killed.borrow(), vec![Some(handle)]);
}

#[test]
fn test_replay_skips_asset_lookup() {
    let mut harness = Harness::new();
    let first = harness.controller.play_audio(&click()).unwrap();
    assert_eq!(harness.lookups.get(), 1);

    let second = harness.controller.play_audio(&click()).unwrap();
    assert_eq!(harness.lookups.get(), 1);
    assert_ne!(first, second);
    assert_eq!(harness.controller.handle_of("Active_Disable_menu Button"), Some(second));

    // replays keep working after the registered session ended
    harness.run(0.5);
    assert!(harness.controller.play_audio(&click()).is_some());
    assert_eq!(harness.lookups.get(), 1);
}

#[test]
fn test_stop_all_without_notify() {
    let mut harness = Harness::new();
    let ended = Rc::new(Cell::new(0));
    let killed = Rc::new(Cell::new(0));

    for settings in [music(true), click()] {
        let handle = harness.controller.play_audio(&settings).unwrap();
        let ended_count = Rc::clone(&ended);
        let killed_count = Rc::clone(&killed);
        harness
            .controller
            .on_cue_ended(handle, move |_| ended_count.set(ended_count.get() + 1));
        harness
            .controller
            .on_killed(handle, move |_| killed_count.set(killed_count.get() + 1));
    }

    harness.controller.stop_all(false);
    assert_eq!(harness.controller.active_cue_count(), 0);
    assert_eq!(ended.get(), 0);
    assert_eq!(killed.get(), 2);
}

#[test]
fn test_stop_all_with_notify() {
    let mut harness = Harness::new();
    let ended = Rc::new(RefCell::new(Vec::new()));

    for settings in [music(true), click()] {
        let handle = harness.controller.play_audio(&settings).unwrap();
        let ended_log = Rc::clone(&ended);
        harness
            .controller
            .on_cue_ended(handle, move |name| ended_log.borrow_mut().push(name.to_string()));
    }

    harness.controller.stop_all(true);
    let mut names = ended.borrow().clone();
    names.sort();
    assert_eq!(names, vec!["Active_Disable_menu Button".to_string(), "Fly Catchers".to_string()]);
}

#[test]
fn test_stop_request_for_unregistered_name() {
    let mut harness = Harness::new();
    let settings = music(false).with_play_state(false);

    assert!(harness.controller.play_audio(&settings).is_none());
    assert_eq!(harness.controller.handle_of("Fly Catchers"), None);
    assert_eq!(harness.lookups.get(), 0);
}

#[test]
fn test_stale_handles_are_inert() {
    let config = AudioConfig {
        initial_cue_pool_size: 1,
        ..AudioConfig::default()
    };
    let mut harness = Harness::with_config(&config);
    let stale = harness.controller.play(&click()).unwrap();
    harness.run(0.5);

    // a new session takes over the recycled slot
    let fresh = harness.controller.play(&music(true)).unwrap();
    assert_eq!(fresh.index, stale.index);

    assert!(!harness.controller.is_playing(stale));
    assert_eq!(harness.controller.cue_name(stale), None);
    assert!(!harness.controller.stop_cue(stale, true));
    assert!(!harness.controller.on_killed(stale, |_| {}));
    harness.controller.pause(stale);
    assert!(harness.controller.is_playing(fresh));
    assert!(!harness.controller.is_paused(fresh));

    assert!(!harness.controller.is_playing(CueHandle::new(999, 0)));
}

#[test]
fn test_voices_are_reused() {
    let mut harness = Harness::new();
    for _ in 0..5 {
        harness.controller.play_audio(&click()).unwrap();
        harness.run(0.5);
    }

    let voices = harness.controller.voices();
    assert_eq!(voices.total_count(), 1);
    assert_eq!(voices.in_use_count(), 0);
    assert_eq!(voices.free_count("default"), 1);
}

#[test]
fn test_exhausted_pool_returns_none() {
    let config = AudioConfig {
        default_prefab: VoicePrefab::new("sfx").with_max_instances(2),
        ..AudioConfig::default()
    };
    let mut harness = Harness::with_config(&config);

    assert!(harness.controller.play_audio(&click()).is_some());
    assert!(harness.controller.play_audio(&click()).is_some());
    assert!(harness.controller.play_audio(&click()).is_none());
    assert_eq!(harness.controller.active_cue_count(), 2);

    // capacity comes back once a cue ends
    harness.run(0.5);
    assert!(harness.controller.play_audio(&click()).is_some());
}

#[test]
fn test_cue_pool_grows_past_initial_size() {
    let config = AudioConfig {
        initial_cue_pool_size: 2,
        ..AudioConfig::default()
    };
    let mut harness = Harness::with_config(&config);

    let handles: Vec<_> = (0..4).filter_map(|_| harness.controller.play(&click())).collect();
    assert_eq!(handles.len(), 4);
    assert!(handles.iter().all(|handle| harness.controller.is_playing(*handle)));
}

/// Backend whose voices record every volume they are set to
struct RecordingBackend {
    inner: NullBackend,
    volumes: Rc<RefCell<Vec<f32>>>,
}

struct RecordingVoice {
    inner: Box<dyn Voice>,
    volumes: Rc<RefCell<Vec<f32>>>,
}

impl AudioBackend for RecordingBackend {
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        self.inner.initialize(config)
    }
    fn shutdown(&mut self) {
        self.inner.shutdown();
    }
    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }
    fn create_voice(&mut self, prefab: &VoicePrefab) -> Result<Box<dyn Voice>, AudioError> {
        Ok(Box::new(RecordingVoice {
            inner: self.inner.create_voice(prefab)?,
            volumes: Rc::clone(&self.volumes),
        }))
    }
}

impl Voice for RecordingVoice {
    fn setup(&mut self, setup: VoiceSetup) {
        self.volumes.borrow_mut().push(setup.volume);
        self.inner.setup(setup);
    }
    fn play(&mut self) -> Result<(), AudioError> {
        self.inner.play()
    }
    fn pause(&mut self) {
        self.inner.pause();
    }
    fn resume(&mut self) {
        self.inner.resume();
    }
    fn stop(&mut self) {
        self.inner.stop();
    }
    fn set_volume(&mut self, volume: f32) {
        self.volumes.borrow_mut().push(volume);
        self.inner.set_volume(volume);
    }
    fn update(&mut self, delta_time: f32) {
        self.inner.update(delta_time);
    }
    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
    fn is_paused(&self) -> bool {
        self.inner.is_paused()
    }
}

#[test]
fn test_mixer_changes_reach_playing_voice() {
    let volumes = Rc::new(RefCell::new(Vec::new()));
    let mut backend = RecordingBackend {
        inner: NullBackend::new(),
        volumes: Rc::clone(&volumes),
    };
    backend.initialize(&AudioBackendConfig::default()).unwrap();

    let resolver = MemoryAssetResolver::new().with_clip(MUSIC, AudioClip::from_bytes(MUSIC, silent_wav(1.0)).unwrap());
    let mut controller = SoundController::new(Box::new(backend), Box::new(resolver), &AudioConfig::default());
    let last_volume = || volumes.borrow().last().copied().unwrap();

    let settings = PlaySoundSettings::new("Fly Catchers", MUSIC, 0.0, 0.0, true, 0.8, None).with_mixer_group("music");
    controller.play_audio(&settings).unwrap();
    assert_relative_eq!(last_volume(), 0.8);

    controller.mixer_mut().set_group_volume("music", 0.5);
    controller.update(FRAME);
    assert_relative_eq!(last_volume(), 0.4);

    controller.mixer_mut().mute_group("master");
    controller.update(FRAME);
    assert_eq!(last_volume(), 0.0);
    assert!(controller.is_playing_named("Fly Catchers"));

    controller.mixer_mut().unmute_group("master");
    controller.mixer_mut().set_group_volume("master", 0.5);
    controller.update(FRAME);
    assert_relative_eq!(last_volume(), 0.2);
}
