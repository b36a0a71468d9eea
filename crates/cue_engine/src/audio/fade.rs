//! Fade envelope
//!
//! Gain curve a voice applies on top of its volume: a linear ramp up over the
//! fade-in time and a linear ramp down over the last fade-out seconds.

use crate::audio::item::FADE_THRESHOLD;

/// Fade-in/fade-out gain over a voice's play time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FadeEnvelope {
    fade_in: Option<f32>,
    fade_out: Option<f32>,
    duration: Option<f32>,
}

impl FadeEnvelope {
    /// Build an envelope; fades shorter than [`FADE_THRESHOLD`] are dropped
    ///
    /// The fade-out needs the play `duration` to know where it starts; without
    /// one only the fade-in applies.
    pub fn new(fade_in_time: f32, fade_out_time: f32, duration: Option<f32>) -> Self {
        Self {
            fade_in: (fade_in_time >= FADE_THRESHOLD).then_some(fade_in_time),
            fade_out: (fade_out_time >= FADE_THRESHOLD).then_some(fade_out_time),
            duration: duration.filter(|d| *d > 0.0),
        }
    }

    /// No fades at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Gain in `[0, 1]` at `elapsed` seconds into playback
    pub fn gain_at(&self, elapsed: f32) -> f32 {
        let mut gain = 1.0;
        if let Some(fade_in) = self.fade_in {
            gain *= (elapsed / fade_in).clamp(0.0, 1.0);
        }
        if let (Some(fade_out), Some(duration)) = (self.fade_out, self.duration) {
            gain *= ((duration - elapsed) / fade_out).clamp(0.0, 1.0);
        }
        gain
    }

    /// Whether any fade is active
    pub fn is_flat(&self) -> bool {
        self.fade_in.is_none() && (self.fade_out.is_none() || self.duration.is_none())
    }
}
