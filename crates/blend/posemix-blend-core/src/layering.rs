//! Per-frame evaluation passes over the bone atom buffer.
//!
//! Frame order is fixed: base/overlay pose evaluation, then stream refresh
//! (pass A), then the layered blend that writes final transforms (pass B).
//! Rotations inside atoms are root-relative; positions are bone-local.

use glam::{Quat, Vec3};

use crate::atom::{AtomPose, BlendAtom};
use crate::clip::{ClipPlayback, OverlayMixer};
use crate::rig::{BoneIndex, BoundRig};
use crate::transform::BoneTransform;

/// The host-owned transform destination. The blender reads the live stream
/// pose from it (whatever upstream animation already wrote this frame) and
/// writes final bone transforms back. It never owns the sink.
///
/// Contract: `set_world_rotation` must re-derive the bone's local rotation
/// against the current parent world rotation, so a following
/// `local_transform` read observes the write.
pub trait BoneSink {
    /// Current world transform of the character root.
    fn root_transform(&self) -> BoneTransform;
    /// Current world transform of a bone.
    fn world_transform(&self, bone: BoneIndex) -> BoneTransform;
    /// Current bone-local transform.
    fn local_transform(&self, bone: BoneIndex) -> BoneTransform;

    fn set_world_rotation(&mut self, bone: BoneIndex, rotation: Quat);
    fn set_local_rotation(&mut self, bone: BoneIndex, rotation: Quat);
    fn set_local_position(&mut self, bone: BoneIndex, position: Vec3);
}

/// Sample the base pose clip into every atom's active pose: mesh-space
/// rotation via forward kinematics over the clip's local pose, bone-local
/// position stored unchanged.
pub fn evaluate_base_pose(atoms: &mut [BlendAtom], rig: &BoundRig, base: &ClipPlayback) {
    for i in 0..atoms.len() {
        let local = base.sample(i);
        // Parents precede children, so the parent's mesh rotation is already
        // in its atom.
        let mesh_rotation = match rig.parent(i) {
            Some(p) => atoms[p].active_pose.base_pose.rotation * local.rotation,
            None => local.rotation,
        };
        atoms[i].active_pose.base_pose = BoneTransform::new(mesh_rotation, local.position);
    }
}

/// Same shape as the base pass, sourced from the overlay composite.
/// Additionally captures the overlay's local rotation for the local-space
/// override in pass B.
pub fn evaluate_overlay_pose(atoms: &mut [BlendAtom], rig: &BoundRig, overlay: &OverlayMixer) {
    for i in 0..atoms.len() {
        let local = overlay.sample(i);
        let mesh_rotation = match rig.parent(i) {
            Some(p) => atoms[p].active_pose.overlay_pose.rotation * local.rotation,
            None => local.rotation,
        };
        let atom = &mut atoms[i];
        atom.active_pose.overlay_pose = BoneTransform::new(mesh_rotation, local.position);
        atom.active_pose.local_overlay_rotation = local.rotation;
    }
}

/// Pass A: refresh each atom's live stream pose from the sink and copy the
/// atom's current weight triple into its active pose, so weight edits apply
/// even without a pose resample.
pub fn refresh_stream_pose(atoms: &mut [BlendAtom], sink: &dyn BoneSink) {
    let root = sink.root_transform();
    for (i, atom) in atoms.iter_mut().enumerate() {
        let world = sink.world_transform(i);
        let rotation = root.rotation.inverse() * world.rotation;
        atom.mesh_stream_pose = BoneTransform::new(rotation, sink.local_transform(i).position);

        atom.active_pose.base_weight = atom.base_weight;
        atom.active_pose.additive_weight = atom.additive_weight;
        atom.active_pose.local_weight = atom.local_weight;
    }
}

/// Pass B: blend cached and active poses by `blend_weight`, layer the result
/// over the live stream, and write final transforms to the sink.
///
/// When `cache_pose` is set the blended result is stored as the cached pose
/// first, which is how the next asset switch gets a clean starting point.
pub fn apply_layered_blend(
    atoms: &mut [BlendAtom],
    sink: &mut dyn BoneSink,
    blend_weight: f32,
    cache_pose: bool,
) {
    let root = sink.root_transform();
    for i in 0..atoms.len() {
        let atom = &mut atoms[i];

        let blended = atom.blended(blend_weight);
        if cache_pose {
            atom.cached_pose = blended;
        }

        let stream = atom.mesh_stream_pose;

        // Delta between whatever the stream already holds and the blended
        // base pose.
        let additive_rotation = stream.rotation * blended.base_pose.rotation.inverse();
        let additive_position = stream.position - blended.base_pose.position;

        let mut rotation = additive_rotation * blended.overlay_pose.rotation;
        // Blend additive.
        rotation = blended
            .overlay_pose
            .rotation
            .slerp(rotation, blended.additive_weight);
        // Blend locomotion pose: base weight 0 keeps the stream untouched.
        rotation = stream.rotation.slerp(rotation, blended.base_weight);
        // Back to world space.
        rotation = root.rotation * rotation;

        let mut position =
            blended.overlay_pose.position + additive_position * blended.additive_weight;
        position = stream.position.lerp(position, blended.base_weight);

        sink.set_world_rotation(i, rotation);

        // Local-space override: force specific bones toward the overlay's
        // authored local pose irrespective of the mesh-space blend.
        let local_rotation = sink
            .local_transform(i)
            .rotation
            .slerp(blended.local_overlay_rotation, blended.local_weight);
        sink.set_local_rotation(i, local_rotation);

        position = position.lerp(blended.overlay_pose.position, blended.local_weight);
        sink.set_local_position(i, position);
    }
}

/// Seed the cache from the live stream alone. Used when a blended switch
/// arrives while no asset is active, so the new asset fades in from whatever
/// the stream currently shows.
pub fn snapshot_stream_as_cache(atoms: &mut [BlendAtom], sink: &dyn BoneSink) {
    refresh_stream_pose(atoms, sink);
    for (i, atom) in atoms.iter_mut().enumerate() {
        atom.cached_pose = AtomPose {
            base_pose: atom.mesh_stream_pose,
            overlay_pose: atom.mesh_stream_pose,
            local_overlay_rotation: sink.local_transform(i).rotation,
            base_weight: 0.0,
            additive_weight: 0.0,
            local_weight: 0.0,
        };
    }
}
