//! Audio mixer system
//!
//! Named volume groups with a master volume. Items route through a group by
//! name; a voice's volume is scaled by its group's effective volume.

use std::collections::{HashMap, HashSet};

/// Name of the group every other group is scaled by
pub const MASTER_GROUP: &str = "master";

/// Audio mixer managing volume groups
#[derive(Debug, Clone)]
pub struct MixerSystem {
    /// Volume levels for each group (0.0 to 1.0)
    group_volumes: HashMap<String, f32>,
    /// Muted groups
    group_muted: HashSet<String>,
}

impl MixerSystem {
    /// Create a mixer with only the master group at full volume
    pub fn new() -> Self {
        let mut group_volumes = HashMap::new();
        group_volumes.insert(MASTER_GROUP.to_string(), 1.0);

        Self {
            group_volumes,
            group_muted: HashSet::new(),
        }
    }

    /// Create a mixer with preset group volumes
    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        let mut mixer = Self::new();
        for (group, volume) in groups {
            mixer.set_group_volume(group, volume);
        }
        mixer
    }

    /// Set volume for a group (0.0 to 1.0)
    pub fn set_group_volume(&mut self, group: impl Into<String>, volume: f32) {
        let clamped = volume.clamp(0.0, 1.0);
        self.group_volumes.insert(group.into(), clamped);
    }

    /// Get volume for a group; unknown groups are at full volume
    pub fn get_group_volume(&self, group: &str) -> f32 {
        self.group_volumes.get(group).copied().unwrap_or(1.0)
    }

    /// Effective volume for a group, considering master volume and mute
    ///
    /// `None` routes straight to master.
    pub fn get_effective_volume(&self, group: Option<&str>) -> f32 {
        if self.is_muted(MASTER_GROUP) {
            return 0.0;
        }
        let master_vol = self.get_group_volume(MASTER_GROUP);

        match group {
            Some(group) if group != MASTER_GROUP => {
                if self.is_muted(group) {
                    0.0
                } else {
                    self.get_group_volume(group) * master_vol
                }
            }
            _ => master_vol,
        }
    }

    /// Mute a group
    pub fn mute_group(&mut self, group: impl Into<String>) {
        self.group_muted.insert(group.into());
    }

    /// Unmute a group
    pub fn unmute_group(&mut self, group: &str) {
        self.group_muted.remove(group);
    }

    /// Check if a group is muted
    pub fn is_muted(&self, group: &str) -> bool {
        self.group_muted.contains(group)
    }

    /// Toggle mute state for a group
    pub fn toggle_mute(&mut self, group: &str) {
        if self.is_muted(group) {
            self.unmute_group(group);
        } else {
            self.mute_group(group);
        }
    }

    /// Names of all groups with a volume set, master included
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.group_volumes.keys().map(String::as_str)
    }
}

impl Default for MixerSystem {
    fn default() -> Self {
        Self::new()
    }
}
