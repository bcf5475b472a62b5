//! Per-bone blend state.
//!
//! Each bound bone carries one [`BlendAtom`] for the lifetime of the blender.
//! The atom holds two [`AtomPose`] snapshots: the active pose (current asset)
//! and the cached pose (frozen from the previous asset at switch time), which
//! is what makes crossfading glitch-free.

use glam::Quat;

use crate::transform::BoneTransform;

/// One sampled pose per bone plus the weight triple in effect when it was
/// captured. Rotations are root-relative; positions are bone-local.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtomPose {
    pub base_pose: BoneTransform,
    pub overlay_pose: BoneTransform,
    pub local_overlay_rotation: Quat,

    pub base_weight: f32,
    pub additive_weight: f32,
    pub local_weight: f32,
}

#[inline]
fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl AtomPose {
    /// Component-wise blend of two atom poses, weights included.
    pub fn lerp(a: Self, b: Self, alpha: f32) -> Self {
        Self {
            base_pose: BoneTransform::lerp(a.base_pose, b.base_pose, alpha),
            overlay_pose: BoneTransform::lerp(a.overlay_pose, b.overlay_pose, alpha),
            local_overlay_rotation: a
                .local_overlay_rotation
                .slerp(b.local_overlay_rotation, alpha),
            base_weight: lerp_f32(a.base_weight, b.base_weight, alpha),
            additive_weight: lerp_f32(a.additive_weight, b.additive_weight, alpha),
            local_weight: lerp_f32(a.local_weight, b.local_weight, alpha),
        }
    }
}

impl Default for AtomPose {
    fn default() -> Self {
        Self {
            base_pose: BoneTransform::IDENTITY,
            overlay_pose: BoneTransform::IDENTITY,
            local_overlay_rotation: Quat::IDENTITY,
            base_weight: 0.0,
            additive_weight: 0.0,
            local_weight: 0.0,
        }
    }
}

/// Per-bone blend state: the live weight triple, the refreshed stream pose,
/// and the active/cached pose pair.
#[derive(Copy, Clone, Debug, Default)]
pub struct BlendAtom {
    pub base_weight: f32,
    pub additive_weight: f32,
    pub local_weight: f32,

    pub mesh_stream_pose: BoneTransform,
    pub active_pose: AtomPose,
    pub cached_pose: AtomPose,
}

impl BlendAtom {
    /// The pose fed to the layering math: cached and active blended by the
    /// crossfade weight (0 = fully previous asset, 1 = fully current).
    #[inline]
    pub fn blended(&self, blend_weight: f32) -> AtomPose {
        AtomPose::lerp(self.cached_pose, self.active_pose, blend_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn pose(rot_y: f32, x: f32, weights: (f32, f32, f32)) -> AtomPose {
        AtomPose {
            base_pose: BoneTransform::new(Quat::from_rotation_y(rot_y), Vec3::new(x, 0.0, 0.0)),
            overlay_pose: BoneTransform::new(Quat::from_rotation_y(rot_y), Vec3::new(x, 0.0, 0.0)),
            local_overlay_rotation: Quat::from_rotation_y(rot_y),
            base_weight: weights.0,
            additive_weight: weights.1,
            local_weight: weights.2,
        }
    }

    #[test]
    fn lerp_blends_weights_linearly() {
        let a = pose(0.0, 0.0, (0.0, 0.0, 0.0));
        let b = pose(0.0, 1.0, (1.0, 0.5, 0.25));
        let mid = AtomPose::lerp(a, b, 0.5);
        assert_eq!(mid.base_weight, 0.5);
        assert_eq!(mid.additive_weight, 0.25);
        assert_eq!(mid.local_weight, 0.125);
        assert_eq!(mid.base_pose.position.x, 0.5);
    }

    #[test]
    fn blended_midpoint_is_rotation_midpoint() {
        let atom = BlendAtom {
            cached_pose: pose(0.0, 0.0, (1.0, 0.0, 0.0)),
            active_pose: pose(FRAC_PI_2, 0.0, (1.0, 0.0, 0.0)),
            ..Default::default()
        };
        let mid = atom.blended(0.5);
        let expected = Quat::from_rotation_y(FRAC_PI_2 * 0.5);
        assert!(mid.base_pose.rotation.dot(expected).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn blended_endpoints_reproduce_cached_and_active() {
        let atom = BlendAtom {
            cached_pose: pose(0.3, -1.0, (0.2, 0.4, 0.6)),
            active_pose: pose(-0.9, 2.0, (1.0, 1.0, 1.0)),
            ..Default::default()
        };
        let at0 = atom.blended(0.0);
        let at1 = atom.blended(1.0);
        assert!((at0.base_weight - 0.2).abs() < 1e-6);
        assert!((at0.base_pose.position.x + 1.0).abs() < 1e-5);
        assert!((at1.base_weight - 1.0).abs() < 1e-6);
        assert!((at1.base_pose.position.x - 2.0).abs() < 1e-5);
    }
}
