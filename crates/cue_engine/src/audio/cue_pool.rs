//! Cue session pool
//!
//! A generational arena of reusable [`SoundCue`] sessions. Slots are
//! pre-allocated and recycled; releasing a slot bumps its generation so
//! handles issued for the previous session stop resolving.

use crate::audio::cue::SoundCue;
use std::collections::VecDeque;

/// Number of sessions allocated up front
pub const DEFAULT_CUE_POOL_SIZE: usize = 10;

/// Handle for a pooled cue session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CueHandle {
    /// Index in the pool
    pub index: u32,
    /// Generation counter for stale handle detection
    pub generation: u32,
}

impl CueHandle {
    /// Create a new cue handle
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Pool entry for cue sessions
struct CueSlot {
    cue: SoundCue,
    /// Current generation counter
    generation: u32,
    /// Whether this entry is currently allocated
    allocated: bool,
}

impl CueSlot {
    fn new() -> Self {
        Self {
            cue: SoundCue::new(),
            generation: 0,
            allocated: false,
        }
    }
}

/// Pool of cue sessions with handle-based access
pub struct CuePool {
    slots: Vec<CueSlot>,
    free_list: VecDeque<u32>,
}

impl CuePool {
    /// Create a pool with `capacity` sessions ready; it grows when they run out
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        let mut free_list = VecDeque::with_capacity(capacity);
        for index in 0..capacity {
            slots.push(CueSlot::new());
            free_list.push_back(index as u32);
        }

        log::debug!("Created CuePool with {} sessions", capacity);
        Self { slots, free_list }
    }

    /// Take an idle session
    pub fn acquire(&mut self) -> CueHandle {
        let index = self.free_list.pop_front().unwrap_or_else(|| {
            self.slots.push(CueSlot::new());
            log::debug!("CuePool grew to {} sessions", self.slots.len());
            (self.slots.len() - 1) as u32
        });

        let slot = &mut self.slots[index as usize];
        slot.allocated = true;
        CueHandle::new(index, slot.generation)
    }

    /// Reset a session and return it to the pool
    ///
    /// Returns false for stale or unknown handles.
    pub fn release(&mut self, handle: CueHandle) -> bool {
        let Some(slot) = self.slot_mut(handle) else {
            return false;
        };

        slot.cue.reset();
        slot.allocated = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push_back(handle.index);
        true
    }

    /// Access the session behind a handle
    pub fn get(&self, handle: CueHandle) -> Option<&SoundCue> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.allocated && slot.generation == handle.generation)
            .map(|slot| &slot.cue)
    }

    /// Mutably access the session behind a handle
    pub fn get_mut(&mut self, handle: CueHandle) -> Option<&mut SoundCue> {
        self.slot_mut(handle).map(|slot| &mut slot.cue)
    }

    fn slot_mut(&mut self, handle: CueHandle) -> Option<&mut CueSlot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.allocated && slot.generation == handle.generation)
    }

    /// Whether the handle still refers to its session
    pub fn contains(&self, handle: CueHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Handles of all allocated sessions
    pub fn active_handles(&self) -> Vec<CueHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.allocated)
            .map(|(index, slot)| CueHandle::new(index as u32, slot.generation))
            .collect()
    }

    /// Number of allocated sessions
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.allocated).count()
    }

    /// Number of sessions, allocated or idle
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for CuePool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CUE_POOL_SIZE)
    }
}
