//! Sound items and cue data
//!
//! Plain data built once per play request and copied into each cue session.

use crate::audio::asset::AudioClip;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fade times below this many seconds are treated as no fade
pub const FADE_THRESHOLD: f32 = 0.1;

/// Inclusive range a value is drawn from uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomRange {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

impl RandomRange {
    /// Create a range; bounds given in the wrong order are swapped
    ///
    /// A non-finite bound collapses the range onto the other bound, or onto
    /// 1.0 when neither is finite.
    pub fn new(min: f32, max: f32) -> Self {
        let (min, max) = match (min.is_finite(), max.is_finite()) {
            (true, true) => (min, max),
            (true, false) => (min, min),
            (false, true) => (max, max),
            (false, false) => (1.0, 1.0),
        };

        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Draw a value from the range
    ///
    /// Ranges deserialized with a non-finite bound yield the finite bound
    /// (1.0 if there is none) instead of drawing.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return [self.min, self.max].into_iter().find(|b| b.is_finite()).unwrap_or(1.0);
        }
        if self.max - self.min <= f32::EPSILON {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

/// One playable unit: clips plus volume, pitch and mixer routing
#[derive(Debug, Clone)]
pub struct SoundItem {
    /// Item name, passed to the voice
    pub name: String,
    /// Clips to pick from; one is chosen per start
    pub clips: Vec<Arc<AudioClip>>,
    /// Base volume when no volume range is set
    pub volume: f32,
    /// Random volume range, overrides `volume`
    pub volume_range: Option<RandomRange>,
    /// Random pitch range; pitch is 1.0 without one
    pub pitch_range: Option<RandomRange>,
    /// Mixer group the item is routed through
    pub mixer_group: Option<String>,
}

impl SoundItem {
    /// Create an item with a single clip at full volume
    pub fn new(name: impl Into<String>, clip: Arc<AudioClip>) -> Self {
        Self {
            name: name.into(),
            clips: vec![clip],
            volume: 1.0,
            volume_range: None,
            pitch_range: None,
            mixer_group: None,
        }
    }

    /// Set the base volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.max(0.0);
        self
    }

    /// Randomize volume per start
    pub fn with_volume_range(mut self, range: RandomRange) -> Self {
        self.volume_range = Some(range);
        self
    }

    /// Randomize pitch per start
    pub fn with_pitch_range(mut self, range: RandomRange) -> Self {
        self.pitch_range = Some(range);
        self
    }

    /// Route through a mixer group
    pub fn with_mixer_group(mut self, group: impl Into<String>) -> Self {
        self.mixer_group = Some(group.into());
        self
    }

    /// Add another clip to choose from
    pub fn with_clip(mut self, clip: Arc<AudioClip>) -> Self {
        self.clips.push(clip);
        self
    }

    /// Volume for one start
    pub fn sample_volume<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.volume_range.map_or(self.volume, |range| range.sample(rng))
    }

    /// Pitch for one start
    pub fn sample_pitch<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.pitch_range.map_or(1.0, |range| range.sample(rng))
    }

    /// Clip for one start
    pub fn pick_clip<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<AudioClip>> {
        match self.clips.len() {
            0 => None,
            1 => Some(Arc::clone(&self.clips[0])),
            len => Some(Arc::clone(&self.clips[rng.gen_range(0..len)])),
        }
    }
}

/// Everything one cue session needs to play
///
/// Only the first item is played. Fade flags are derived from the fade times
/// and kept in sync by [`SoundCueData::set_fades`].
#[derive(Debug, Clone)]
pub struct SoundCueData {
    /// Items of the cue
    pub sounds: Vec<SoundItem>,
    /// Prefab the voice is lent for
    pub prefab: String,
    /// Whether the first item restarts when it finishes
    pub is_looped: bool,
    /// Cue name, reported to callbacks
    pub name: String,
    /// Request volume, multiplied into the item volume
    pub volume: f32,
    fade_in_time: f32,
    fade_out_time: f32,
    is_fade_in: bool,
    is_fade_out: bool,
}

impl SoundCueData {
    /// Create cue data with no fades, no loop and full volume
    pub fn new(name: impl Into<String>, prefab: impl Into<String>, sounds: Vec<SoundItem>) -> Self {
        Self {
            sounds,
            prefab: prefab.into(),
            is_looped: false,
            name: name.into(),
            volume: 1.0,
            fade_in_time: 0.0,
            fade_out_time: 0.0,
            is_fade_in: false,
            is_fade_out: false,
        }
    }

    /// Set fade times and recompute the fade flags
    pub fn set_fades(&mut self, fade_in_time: f32, fade_out_time: f32) {
        self.fade_in_time = fade_in_time;
        self.fade_out_time = fade_out_time;
        self.is_fade_in = fade_in_time >= FADE_THRESHOLD;
        self.is_fade_out = fade_out_time >= FADE_THRESHOLD;
    }

    /// Builder form of [`SoundCueData::set_fades`]
    pub fn with_fades(mut self, fade_in_time: f32, fade_out_time: f32) -> Self {
        self.set_fades(fade_in_time, fade_out_time);
        self
    }

    /// Set the loop flag
    pub fn with_looped(mut self, is_looped: bool) -> Self {
        self.is_looped = is_looped;
        self
    }

    /// Set the request volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.max(0.0);
        self
    }

    /// Fade-in time in seconds
    pub fn fade_in_time(&self) -> f32 {
        self.fade_in_time
    }

    /// Fade-out time in seconds
    pub fn fade_out_time(&self) -> f32 {
        self.fade_out_time
    }

    /// Whether the cue fades in
    pub fn is_fade_in(&self) -> bool {
        self.is_fade_in
    }

    /// Whether the cue fades out
    pub fn is_fade_out(&self) -> bool {
        self.is_fade_out
    }

    /// The item that gets played
    pub fn first_item(&self) -> Option<&SoundItem> {
        self.sounds.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::asset::silent_wav;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clip() -> Arc<AudioClip> {
        Arc::new(AudioClip::from_bytes("clip", silent_wav(0.5)).unwrap())
    }

    #[test]
    fn test_fade_flags_follow_threshold() {
        let data = SoundCueData::new("cue", "default", Vec::new()).with_fades(0.1, 0.09);
        assert!(data.is_fade_in());
        assert!(!data.is_fade_out());

        let data = data.with_fades(0.0, 5.0);
        assert!(!data.is_fade_in());
        assert!(data.is_fade_out());
    }

    #[test]
    fn test_range_swaps_bounds() {
        let range = RandomRange::new(1.2, 0.8);
        assert_eq!(range.min, 0.8);
        assert_eq!(range.max, 1.2);
    }

    #[test]
    fn test_range_samples_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let range = RandomRange::new(0.5, 0.75);
        for _ in 0..100 {
            let value = range.sample(&mut rng);
            assert!((0.5..=0.75).contains(&value));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(RandomRange::new(0.4, 0.4).sample(&mut rng), 0.4);
    }

    #[test]
    fn test_non_finite_bounds_collapse() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(RandomRange::new(0.5, f32::INFINITY), RandomRange::new(0.5, 0.5));
        assert_eq!(RandomRange::new(f32::NAN, 0.7).sample(&mut rng), 0.7);
        assert_eq!(RandomRange::new(f32::NEG_INFINITY, f32::NAN).sample(&mut rng), 1.0);
    }

    #[test]
    fn test_deserialized_non_finite_range_does_not_draw() {
        let mut rng = StdRng::seed_from_u64(3);
        let range: RandomRange = toml::from_str("min = 0.0\nmax = inf").unwrap();
        assert!(range.max.is_infinite());
        assert_eq!(range.sample(&mut rng), 0.0);

        let range = RandomRange { min: f32::NAN, max: f32::NAN };
        assert_eq!(range.sample(&mut rng), 1.0);
    }

    #[test]
    fn test_item_defaults_without_ranges() {
        let mut rng = StdRng::seed_from_u64(9);
        let item = SoundItem::new("hit", clip()).with_volume(0.6);
        assert_eq!(item.sample_volume(&mut rng), 0.6);
        assert_eq!(item.sample_pitch(&mut rng), 1.0);
    }

    #[test]
    fn test_pick_clip() {
        let mut rng = StdRng::seed_from_u64(1);
        let item = SoundItem::new("hit", clip()).with_clip(clip());
        assert!(item.pick_clip(&mut rng).is_some());

        let mut empty = SoundItem::new("none", clip());
        empty.clips.clear();
        assert!(empty.pick_clip(&mut rng).is_none());
    }
}
