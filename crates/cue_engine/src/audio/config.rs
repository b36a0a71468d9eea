//! Audio subsystem configuration

use crate::audio::backend::AudioBackendConfig;
use crate::audio::cue_pool::DEFAULT_CUE_POOL_SIZE;
use crate::audio::voice_pool::VoicePrefab;
use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Settings a [`crate::audio::SoundController`] is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory request paths are resolved against
    pub asset_root: PathBuf,
    /// Cue sessions allocated up front
    pub initial_cue_pool_size: usize,
    /// Maximum voices alive at once (0 = unlimited)
    pub max_voices: usize,
    /// Output backend settings
    pub backend: AudioBackendConfig,
    /// Prefab named play requests lend voices from
    pub default_prefab: VoicePrefab,
    /// Initial mixer group volumes
    pub mixer_groups: BTreeMap<String, f32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("resources"),
            initial_cue_pool_size: DEFAULT_CUE_POOL_SIZE,
            max_voices: 32,
            backend: AudioBackendConfig::default(),
            default_prefab: VoicePrefab::default(),
            mixer_groups: BTreeMap::new(),
        }
    }
}

impl Config for AudioConfig {}
