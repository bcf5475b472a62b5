//! Runtime toggles for a blender instance.

use serde::{Deserialize, Serialize};

/// Per-instance behavior switches. Keep both on unless profiling says
/// otherwise.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BlendOptions {
    /// Re-sample the base and overlay poses every frame. When off, poses are
    /// only sampled for one frame after an asset switch and stay frozen in
    /// between.
    pub always_animate_poses: bool,
    /// Re-derive per-bone weights from the asset every frame, so weight edits
    /// in configuration data apply without a full resample.
    pub force_update_weights: bool,
}

impl Default for BlendOptions {
    fn default() -> Self {
        Self {
            always_animate_poses: true,
            force_update_weights: true,
        }
    }
}
