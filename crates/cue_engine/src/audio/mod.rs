//! Audio system
//!
//! Cue based sound playback. A [`controller::SoundController`] resolves play
//! requests by name, builds [`item::SoundCueData`] once per name and runs each
//! playback through a pooled [`cue::SoundCue`] bound to a pooled backend voice.
//!
//! ```text
//! PlaySoundSettings ──► SoundController ──► registry (name → handle + data)
//!                              │
//!                              ├── CuePool   (generational arena of SoundCue)
//!                              └── AudioContext
//!                                     ├── VoicePool ──► AudioBackend ──► Voice
//!                                     ├── MixerSystem
//!                                     └── rng (volume / pitch ranges)
//! ```
//!
//! Everything runs on the caller's update thread. Clip completion is polled
//! once per [`controller::SoundController::update`].

pub mod asset;
pub mod backend;
pub mod config;
pub mod context;
pub mod controller;
pub mod cue;
pub mod cue_pool;
pub mod fade;
pub mod item;
pub mod mixer;
pub mod voice_pool;

#[cfg(test)]
mod tests;

pub use controller::{PlaySoundSettings, SoundController};
pub use cue_pool::CueHandle;

/// Audio errors
#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    /// Backend used before `initialize`
    #[error("Audio backend not initialized")]
    BackendNotInitialized,

    /// Output device could not be opened
    #[error("Audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// A voice failed to start
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// No clip exists at the requested path
    #[error("Audio asset not found: {0}")]
    AssetNotFound(String),

    /// Clip bytes are empty or in an unknown format
    #[error("Invalid audio asset: {0}")]
    InvalidAsset(String),

    /// No voice can be lent for the prefab
    #[error("Voice pool exhausted for prefab '{prefab}' (limit {limit})")]
    PoolExhausted {
        /// Prefab the voice was requested for
        prefab: String,
        /// Limit that was hit
        limit: usize,
    },

    /// IO error while reading a clip
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
