//! Bone transform math: the rotation/position pair the blend core moves around.
//!
//! Rotations handled by the layering passes are root-relative (mesh-space);
//! positions stay bone-local throughout and are never basis-converted.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A bone's rotation and position. Scale is not blended by this core.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    pub rotation: Quat,
    pub position: Vec3,
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        position: Vec3::ZERO,
    };

    #[inline]
    pub fn new(rotation: Quat, position: Vec3) -> Self {
        Self { rotation, position }
    }

    /// Component-wise blend: position lerp, rotation slerp (shortest arc).
    #[inline]
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        Self {
            rotation: a.rotation.slerp(b.rotation, t),
            position: a.position.lerp(b.position, t),
        }
    }

    /// Express `other` relative to `self` (change of basis). The position
    /// component is rotated and translated, not naively subtracted.
    #[inline]
    pub fn relative(&self, other: Self) -> Self {
        let inv = self.rotation.inverse();
        Self {
            rotation: inv * other.rotation,
            position: inv * (other.position - self.position),
        }
    }

    /// Compose a child-local transform under this (parent) transform.
    #[inline]
    pub fn transform(&self, local: Self) -> Self {
        Self {
            rotation: self.rotation * local.rotation,
            position: self.position + self.rotation * local.position,
        }
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
