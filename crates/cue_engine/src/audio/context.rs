//! Playback context
//!
//! The shared state every cue operation works against, owned by the
//! controller and passed down by reference.

use crate::audio::mixer::MixerSystem;
use crate::audio::voice_pool::VoicePool;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Voices, mixer and randomness shared by all cues of one controller
pub struct AudioContext {
    /// Voice pool cues borrow playback objects from
    pub voices: VoicePool,
    /// Mixer scaling item volumes
    pub mixer: MixerSystem,
    /// Source for volume, pitch and clip randomisation
    pub rng: StdRng,
}

impl AudioContext {
    /// Create a context with an entropy-seeded generator
    pub fn new(voices: VoicePool, mixer: MixerSystem) -> Self {
        Self {
            voices,
            mixer,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reseed the generator for reproducible randomisation
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
