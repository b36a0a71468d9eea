//! Cue demo application
//!
//! Drives a sound controller through a short frame loop: background music
//! that loops with fades, a menu click replayed through the registry, and a
//! stop request at the end.
//!
//! Usage: `cue_demo [config.toml|config.ron]`. Without a readable asset root
//! the demo plays generated clips instead.

use cue_engine::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

const MUSIC: &str = "Audios/BGM/Fly Catchers";
const CLICK: &str = "Audios/UI/Active_Disable_menu Button";
const FRAME_TIME: f32 = 1.0 / 60.0;
const RUN_SECONDS: f32 = 6.0;

pub struct CueDemoApp {
    controller: SoundController,
    clicks_played: Rc<Cell<usize>>,
    elapsed: f32,
}

impl CueDemoApp {
    pub fn new(config: &AudioConfig) -> Result<Self, AudioError> {
        log::info!("Creating audio backend...");
        let backend = create_backend(&config.backend)?;

        let resolver: Box<dyn AssetResolver> = if config.asset_root.is_dir() {
            log::info!("Resolving clips from {}", config.asset_root.display());
            Box::new(FileAssetResolver::new(&config.asset_root))
        } else {
            log::warn!(
                "Asset root {} not found, using generated clips",
                config.asset_root.display()
            );
            Box::new(generated_clips()?)
        };

        Ok(Self {
            controller: SoundController::new(backend, resolver, config),
            clicks_played: Rc::new(Cell::new(0)),
            elapsed: 0.0,
        })
    }

    pub fn run(&mut self) {
        let music = PlaySoundSettings::new("Fly Catchers", MUSIC, 1.0, 1.0, true, 0.8, None)
            .with_mixer_group("music");
        if let Some(handle) = self.controller.play_audio(&music) {
            self.controller
                .on_play_ended(handle, |name| log::info!("'{}' reached the end, looping", name));
            self.controller
                .on_killed(handle, |owner| log::info!("Music session {:?} released", owner));
        }

        let mut next_click = 0.5;
        while self.elapsed < RUN_SECONDS {
            if self.elapsed >= next_click {
                self.click();
                next_click += 1.0;
            }

            if self.elapsed >= RUN_SECONDS / 2.0 && self.controller.mixer().get_group_volume("music") > 0.5 {
                log::info!("Ducking music group");
                self.controller.mixer_mut().set_group_volume("music", 0.3);
            }

            self.controller.update(FRAME_TIME);
            self.elapsed += FRAME_TIME;
        }

        log::info!("Stopping music");
        self.controller.play_audio(&music.with_play_state(false));
        self.controller.stop_all(true);

        log::info!(
            "Played {} clicks, {} voices created",
            self.clicks_played.get(),
            self.controller.voices().total_count()
        );
    }

    fn click(&mut self) {
        let settings = PlaySoundSettings::new("Active_Disable_menu Button", CLICK, 0.0, 0.0, false, 1.0, None)
            .with_mixer_group("ui");
        let Some(handle) = self.controller.play_audio(&settings) else {
            return;
        };

        let clicks = Rc::clone(&self.clicks_played);
        self.controller.on_killed(handle, move |_| clicks.set(clicks.get() + 1));
    }
}

/// Silent PCM clips of the demo's lengths, for runs without asset files
fn generated_clips() -> Result<MemoryAssetResolver, AudioError> {
    Ok(MemoryAssetResolver::new()
        .with_clip(MUSIC, AudioClip::from_bytes(MUSIC, pcm_wav(2.0))?)
        .with_clip(CLICK, AudioClip::from_bytes(CLICK, pcm_wav(0.2))?))
}

fn pcm_wav(seconds: f32) -> Vec<u8> {
    const SAMPLE_RATE: u32 = 22_050;
    let samples = (seconds * SAMPLE_RATE as f32) as u32;
    let data_len = samples * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    bytes
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting cue demo");

    let config = match std::env::args().nth(1) {
        Some(path) => AudioConfig::load_or_default(path),
        None => AudioConfig::default(),
    };

    let mut app = CueDemoApp::new(&config)?;
    app.run();

    log::info!("Cue demo finished successfully");
    Ok(())
}
