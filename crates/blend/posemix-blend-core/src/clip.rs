//! Clip source abstraction, clip playback, and the overlay composite mixer.
//!
//! The playback engine for individual clips is not part of this core: hosts
//! implement [`PoseClip`] over whatever clip format they decode, and
//! [`ClipSource`] to resolve the clip names a [`BlendAsset`](crate::BlendAsset)
//! carries.

use std::sync::Arc;

use crate::asset::OverrideOverlay;
use crate::rig::BoneIndex;
use crate::transform::BoneTransform;

/// A sampled animation clip: bone-local transforms as a function of time.
pub trait PoseClip {
    /// Clip length in seconds.
    fn duration(&self) -> f32;
    fn is_looping(&self) -> bool {
        false
    }
    /// Bone-local transform of `bone` at `time` seconds.
    fn sample_local(&self, time: f32, bone: BoneIndex) -> BoneTransform;
}

/// Resolves clip names from a blend asset into host clips.
pub trait ClipSource {
    fn resolve(&self, name: &str) -> Option<Arc<dyn PoseClip>>;
}

/// Playback cursor over one clip. Speed 0 freezes the clip at its current
/// time, which is how static poses are held.
pub struct ClipPlayback {
    clip: Arc<dyn PoseClip>,
    time: f32,
    speed: f32,
}

impl ClipPlayback {
    pub fn new(clip: Arc<dyn PoseClip>, speed: f32) -> Self {
        Self {
            clip,
            time: 0.0,
            speed,
        }
    }

    /// Advance playback, wrapping looping clips past their end back to zero.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt * self.speed;
        let duration = self.clip.duration();
        if self.clip.is_looping() && duration > 0.0 && self.time > duration {
            self.time = 0.0;
        }
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Playback progress in [0,1]. Zero-length clips report 0.
    pub fn normalized_time(&self) -> f32 {
        let duration = self.clip.duration();
        if duration <= f32::EPSILON {
            return 0.0;
        }
        (self.time / duration).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn sample(&self, bone: BoneIndex) -> BoneTransform {
        self.clip.sample_local(self.time, bone)
    }
}

/// One override input of the overlay composite: clip playback, resolved
/// per-bone mask, and its current contribution weight.
pub struct OverrideInput {
    pub playback: ClipPlayback,
    pub mask: Vec<bool>,
    pub weight: f32,
}

/// Weighted composite of the primary overlay clip and any override clips.
///
/// Input 0 is the primary overlay at full contribution; each override blends
/// over it in input order, per bone, scaled by its weight wherever its mask
/// admits the bone. With no overrides this degenerates to a pass-through of
/// the primary clip.
pub struct OverlayMixer {
    primary: ClipPlayback,
    overrides: Vec<OverrideInput>,
}

impl OverlayMixer {
    pub fn passthrough(primary: ClipPlayback) -> Self {
        Self {
            primary,
            overrides: Vec::new(),
        }
    }

    pub fn new(primary: ClipPlayback, overrides: Vec<OverrideInput>) -> Self {
        Self { primary, overrides }
    }

    pub fn advance(&mut self, dt: f32) {
        self.primary.advance(dt);
        for input in &mut self.overrides {
            input.playback.advance(dt);
        }
    }

    /// Re-read override weights from configuration data. Called every frame
    /// so weight edits apply without an asset switch.
    pub fn refresh_weights(&mut self, overrides: &[OverrideOverlay]) {
        for (input, authored) in self.overrides.iter_mut().zip(overrides.iter()) {
            input.weight = authored.weight.clamp(0.0, 1.0);
        }
    }

    /// Sample the composite bone-local transform.
    pub fn sample(&self, bone: BoneIndex) -> BoneTransform {
        let mut result = self.primary.sample(bone);
        for input in &self.overrides {
            if !input.mask.get(bone).copied().unwrap_or(false) {
                continue;
            }
            let sample = input.playback.sample(bone);
            result = BoneTransform::lerp(result, sample, input.weight);
        }
        result
    }

    #[inline]
    pub fn primary(&self) -> &ClipPlayback {
        &self.primary
    }

    /// Seek the primary clip. Override inputs keep their own cursors.
    pub fn set_primary_time(&mut self, time: f32) {
        self.primary.set_time(time);
    }
}
