//! Voice pooling
//!
//! Lends backend voices out per prefab and takes them back when a cue stops.
//! Returned voices stay alive on their prefab's free list, so a busy sound
//! reuses the same few voices instead of creating new ones every play.

use crate::audio::backend::{AudioBackend, Voice};
use crate::audio::AudioError;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;

slotmap::new_key_type! {
    /// Key of a pooled voice
    pub struct VoiceKey;
}

/// Opaque id of whatever a voice is attached to (an entity, a scene node)
pub type ParentId = u64;

/// Description voices are created from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoicePrefab {
    /// Prefab name, used as the pool key
    pub name: String,
    /// Maximum voices of this prefab lent at once (0 = unlimited)
    #[serde(default)]
    pub max_instances: usize,
}

impl VoicePrefab {
    /// Create a prefab with no instance limit
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_instances: 0,
        }
    }

    /// Limit how many voices of this prefab may be lent at once
    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }
}

impl Default for VoicePrefab {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Information about a pooled voice
struct PooledVoice {
    /// Backend voice
    voice: Box<dyn Voice>,
    /// Prefab the voice was created from
    prefab: String,
    /// Lent out to a cue
    in_use: bool,
    /// Report completion to the owning cue
    notify_on_finish: bool,
    /// What the voice is attached to
    parent: Option<ParentId>,
}

/// Voice pool lending voices per prefab
pub struct VoicePool {
    backend: Box<dyn AudioBackend>,
    voices: SlotMap<VoiceKey, PooledVoice>,
    /// Returned voices per prefab
    free: HashMap<String, Vec<VoiceKey>>,
    prefabs: HashMap<String, VoicePrefab>,
    /// Lent voices per prefab
    instance_counts: HashMap<String, usize>,
    /// Maximum number of voices alive at once (0 = unlimited)
    max_voices: usize,
}

impl VoicePool {
    /// Create a pool over an initialized backend
    pub fn new(backend: Box<dyn AudioBackend>, max_voices: usize) -> Self {
        Self {
            backend,
            voices: SlotMap::with_key(),
            free: HashMap::new(),
            prefabs: HashMap::new(),
            instance_counts: HashMap::new(),
            max_voices,
        }
    }

    /// Register a prefab; unknown prefab names act as unlimited prefabs
    pub fn register_prefab(&mut self, prefab: VoicePrefab) {
        self.prefabs.insert(prefab.name.clone(), prefab);
    }

    /// Lend a voice of `prefab`, attached to `parent`
    ///
    /// Reuses a returned voice of the same prefab when there is one and asks
    /// the backend for a new voice otherwise.
    ///
    /// # Errors
    /// - `PoolExhausted` if the prefab's instance limit or the pool limit is reached
    /// - Whatever the backend returns when creating a voice fails
    pub fn acquire(&mut self, prefab: &str, parent: Option<ParentId>) -> Result<VoiceKey, AudioError> {
        let limit = self.prefabs.get(prefab).map_or(0, |p| p.max_instances);
        let lent = self.instance_counts.get(prefab).copied().unwrap_or(0);
        if limit > 0 && lent >= limit {
            return Err(AudioError::PoolExhausted { prefab: prefab.to_string(), limit });
        }

        let key = match self.free.get_mut(prefab).and_then(Vec::pop) {
            Some(key) => key,
            None => self.create_voice(prefab)?,
        };

        if let Some(slot) = self.voices.get_mut(key) {
            slot.in_use = true;
            slot.notify_on_finish = false;
            slot.parent = parent;
        }
        *self.instance_counts.entry(prefab.to_string()).or_insert(0) += 1;
        Ok(key)
    }

    fn create_voice(&mut self, prefab: &str) -> Result<VoiceKey, AudioError> {
        if self.max_voices > 0 && self.voices.len() >= self.max_voices && !self.evict_free_voice() {
            return Err(AudioError::PoolExhausted { prefab: prefab.to_string(), limit: self.max_voices });
        }

        let description = self
            .prefabs
            .get(prefab)
            .cloned()
            .unwrap_or_else(|| VoicePrefab::new(prefab));
        let voice = self.backend.create_voice(&description)?;

        log::debug!("Voice pool grew to {} voices (prefab '{}')", self.voices.len() + 1, prefab);
        Ok(self.voices.insert(PooledVoice {
            voice,
            prefab: prefab.to_string(),
            in_use: false,
            notify_on_finish: false,
            parent: None,
        }))
    }

    /// Drop one returned voice of any prefab to make room under `max_voices`
    fn evict_free_voice(&mut self) -> bool {
        let Some(key) = self.free.values_mut().find_map(Vec::pop) else {
            return false;
        };
        if let Some(slot) = self.voices.remove(key) {
            log::debug!("Evicted free voice of prefab '{}'", slot.prefab);
        }
        true
    }

    /// Stop a lent voice and put it back on its prefab's free list
    ///
    /// Returns false if the key is unknown or the voice is not lent out.
    pub fn release(&mut self, key: VoiceKey) -> bool {
        let Some(slot) = self.voices.get_mut(key) else {
            return false;
        };
        if !slot.in_use {
            return false;
        }

        slot.voice.stop();
        slot.in_use = false;
        slot.notify_on_finish = false;
        slot.parent = None;

        if let Some(count) = self.instance_counts.get_mut(&slot.prefab) {
            *count = count.saturating_sub(1);
        }
        self.free.entry(slot.prefab.clone()).or_default().push(key);
        true
    }

    /// Access a lent voice
    pub fn voice(&self, key: VoiceKey) -> Option<&(dyn Voice + 'static)> {
        self.voices
            .get(key)
            .filter(|slot| slot.in_use)
            .map(|slot| &*slot.voice)
    }

    /// Mutably access a lent voice
    pub fn voice_mut(&mut self, key: VoiceKey) -> Option<&mut (dyn Voice + 'static)> {
        self.voices
            .get_mut(key)
            .filter(|slot| slot.in_use)
            .map(|slot| &mut *slot.voice)
    }

    /// Set or clear the finish hook of a lent voice
    pub fn set_notify_on_finish(&mut self, key: VoiceKey, notify: bool) {
        if let Some(slot) = self.voices.get_mut(key).filter(|slot| slot.in_use) {
            slot.notify_on_finish = notify;
        }
    }

    /// Advance every lent voice
    pub fn update(&mut self, delta_time: f32) {
        for slot in self.voices.values_mut().filter(|slot| slot.in_use) {
            slot.voice.update(delta_time);
        }
    }

    /// Lent voices whose clip ended while their finish hook is set
    pub fn finished_voices(&self) -> Vec<VoiceKey> {
        self.voices
            .iter()
            .filter(|(_, slot)| slot.in_use && slot.notify_on_finish && slot.voice.is_finished())
            .map(|(key, _)| key)
            .collect()
    }

    /// What a lent voice is attached to
    pub fn parent_of(&self, key: VoiceKey) -> Option<ParentId> {
        self.voices.get(key).filter(|slot| slot.in_use).and_then(|slot| slot.parent)
    }

    /// Number of voices lent out
    pub fn in_use_count(&self) -> usize {
        self.voices.values().filter(|slot| slot.in_use).count()
    }

    /// Number of voices alive, lent or free
    pub fn total_count(&self) -> usize {
        self.voices.len()
    }

    /// Number of returned voices waiting for reuse for a prefab
    pub fn free_count(&self, prefab: &str) -> usize {
        self.free.get(prefab).map_or(0, Vec::len)
    }

    /// Get the maximum number of voices (0 = unlimited)
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Backend voices are created with
    pub fn backend(&self) -> &dyn AudioBackend {
        self.backend.as_ref()
    }
}

impl Drop for VoicePool {
    fn drop(&mut self) {
        for slot in self.voices.values_mut().filter(|slot| slot.in_use) {
            slot.voice.stop();
        }
        self.backend.shutdown();
    }
}
