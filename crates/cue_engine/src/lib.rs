//! # Cue Engine
//!
//! Sound cue playback for games, layered over a pluggable voice backend.
//!
//! ## Features
//!
//! - **Named Cues**: Play and stop sounds by name; repeated plays reuse the data built the first time
//! - **Pooling**: Cue sessions live in a generational arena, playback voices are pooled per prefab
//! - **Fades**: Fade-in and fade-out envelopes per cue
//! - **Mixer Groups**: Independent, mutable volume per group with a master volume
//! - **Backends**: rodio output (feature `rodio-backend`) or a headless null backend
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cue_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AudioConfig::default();
//!     let backend = create_backend(&config.backend)?;
//!     let resolver = FileAssetResolver::new(&config.asset_root);
//!     let mut controller = SoundController::new(backend, Box::new(resolver), &config);
//!
//!     let settings = PlaySoundSettings::new("theme", "music/theme", 1.0, 1.0, true, 0.8, None);
//!     controller.play_audio(&settings);
//!
//!     loop {
//!         controller.update(1.0 / 60.0);
//!         # break;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod audio;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        audio::{
            asset::{AssetResolver, AudioClip, FileAssetResolver, MemoryAssetResolver},
            backend::{create_backend, AudioBackend, AudioBackendConfig, Voice},
            config::AudioConfig,
            controller::{PlaySoundSettings, SoundController},
            cue_pool::CueHandle,
            item::{RandomRange, SoundCueData, SoundItem},
            mixer::MixerSystem,
            voice_pool::VoicePrefab,
            AudioError,
        },
        config::{Config, ConfigError},
    };
}
