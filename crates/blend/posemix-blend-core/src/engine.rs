//! PoseBlender: rig binding, asset switching and the per-frame update loop.
//!
//! Frame order inside [`PoseBlender::update`] is strict: clip playback
//! advance, crossfade bookkeeping and weight refresh, pose evaluation,
//! layering pass A, layering pass B, then the deferred switch commit that
//! arms the *next* frame. Switching is a two-step commit so a mid-evaluation
//! frame is never torn: the request only flags a cache snapshot, and the
//! pending asset activates after the frame's pose has been consumed.

use std::sync::Arc;

use crate::asset::BlendAsset;
use crate::atom::BlendAtom;
use crate::clip::{ClipPlayback, ClipSource, OverlayMixer, OverrideInput, PoseClip};
use crate::config::BlendOptions;
use crate::fade::{Crossfade, FadeState};
use crate::layering::{self, BoneSink};
use crate::rig::{BoneIndex, BoundRig, SkeletonProvider};

/// One layered blend resolved against the bound rig: flat bone indices plus
/// the authored weight triple, clamped.
struct ResolvedChain {
    bones: Vec<BoneIndex>,
    base_weight: f32,
    additive_weight: f32,
    local_weight: f32,
}

/// The active configuration's runtime state.
struct ActiveBlend {
    asset: BlendAsset,
    base: ClipPlayback,
    overlay: OverlayMixer,
    chains: Vec<ResolvedChain>,
}

/// A switch request with its clips already resolved, waiting for commit.
struct PendingSwitch {
    asset: BlendAsset,
    base: Arc<dyn PoseClip>,
    overlay: Arc<dyn PoseClip>,
    overrides: Vec<(Arc<dyn PoseClip>, Vec<bool>)>,
    blend_time: Option<f32>,
    use_curve: bool,
}

/// Per-character pose blender. Owns the per-bone atom buffer for its whole
/// lifetime; never shared across characters.
pub struct PoseBlender {
    rig: BoundRig,
    atoms: Vec<BlendAtom>,
    options: BlendOptions,

    active: Option<ActiveBlend>,
    pending: Option<PendingSwitch>,
    fade: Crossfade,

    /// Snapshot the blended pose into the cache on the next layering pass.
    cache_pose_pending: bool,
    /// One-shot pose resample, used when `always_animate_poses` is off.
    resample_poses: bool,
}

impl PoseBlender {
    /// Bind against a host skeleton. A failed binding logs and yields a
    /// disabled instance whose `update` is a no-op.
    pub fn bind(provider: &dyn SkeletonProvider, options: BlendOptions) -> Self {
        let (rig, atoms) = match BoundRig::bind(provider) {
            Ok(rig) => {
                let atoms = vec![BlendAtom::default(); rig.len()];
                (rig, atoms)
            }
            Err(err) => {
                log::warn!("pose blender disabled: {err}");
                (BoundRig::default(), Vec::new())
            }
        };
        Self {
            rig,
            atoms,
            options,
            active: None,
            pending: None,
            fade: Crossfade::new(),
            cache_pose_pending: false,
            resample_poses: false,
        }
    }

    /// False when binding failed or the blender was released.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.atoms.is_empty()
    }

    #[inline]
    pub fn rig(&self) -> &BoundRig {
        &self.rig
    }

    pub fn active_asset_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.asset.name.as_str())
    }

    /// Crossfade weight currently fed to the layering pass.
    #[inline]
    pub fn blend_weight(&self) -> f32 {
        self.fade.blend_weight()
    }

    #[inline]
    pub fn fade_state(&self) -> FadeState {
        self.fade.state()
    }

    /// Request a new blend configuration.
    ///
    /// With `use_blending` the switch defers: the current blended pose is
    /// snapshotted on the next layering pass and the new asset then fades in
    /// from it. Without it the asset applies immediately at full weight.
    /// `blend_time` overrides the asset's transition duration when positive.
    /// Invalid requests (rejected validation, unresolvable clips) log a
    /// warning and leave the active configuration unchanged.
    pub fn switch_configuration(
        &mut self,
        asset: &BlendAsset,
        clips: &dyn ClipSource,
        use_blending: bool,
        blend_time: Option<f32>,
        use_curve: bool,
    ) {
        if !self.is_enabled() {
            log::warn!("switch ignored: blender is disabled");
            return;
        }
        if let Err(err) = asset.validate() {
            log::warn!("blend asset '{}' rejected: {err}", asset.name);
            return;
        }
        let Some(base) = clips.resolve(&asset.base_pose) else {
            log::warn!(
                "blend asset '{}': base clip '{}' not found",
                asset.name,
                asset.base_pose
            );
            return;
        };
        let Some(overlay) = clips.resolve(&asset.overlay_pose) else {
            log::warn!(
                "blend asset '{}': overlay clip '{}' not found",
                asset.name,
                asset.overlay_pose
            );
            return;
        };

        let mut overrides = Vec::new();
        if asset.has_overrides() {
            for authored in &asset.override_overlays {
                match clips.resolve(&authored.overlay) {
                    Some(clip) => {
                        let mask = self.rig.resolve_mask(&authored.mask.bones, &asset.name);
                        overrides.push((clip, mask));
                    }
                    None => {
                        log::warn!(
                            "blend asset '{}': override clip '{}' not found, overrides skipped",
                            asset.name,
                            authored.overlay
                        );
                        overrides.clear();
                        break;
                    }
                }
            }
        }

        let request = PendingSwitch {
            asset: asset.clone(),
            base,
            overlay,
            overrides,
            blend_time,
            use_curve,
        };

        if use_blending {
            // Two-step commit: flag the snapshot, commit after the next
            // layering pass. Re-requesting mid-blend simply re-flags.
            self.pending = Some(request);
            self.cache_pose_pending = true;
        } else {
            self.pending = None;
            self.cache_pose_pending = false;
            self.commit(request);
            self.fade.snap();
            if !self.options.always_animate_poses {
                self.resample_poses = true;
            }
        }
    }

    /// Fade the active configuration's contribution to zero, then clear it.
    /// The character reverts to whatever the live stream alone provides.
    pub fn stop_blending(&mut self) {
        if self.active.is_none() {
            return;
        }
        self.fade.begin_out();
    }

    /// Overlay playback time, normalized to [0,1] or in seconds. Returns 0
    /// when no animated overlay is active or the clip has zero length.
    pub fn overlay_time(&self, normalized: bool) -> f32 {
        match &self.active {
            Some(active) if active.asset.is_animation => {
                let primary = active.overlay.primary();
                if normalized {
                    primary.normalized_time()
                } else {
                    primary.time()
                }
            }
            _ => 0.0,
        }
    }

    /// Seek the primary overlay clip. Override inputs keep their own
    /// playback cursors.
    pub fn set_overlay_time(&mut self, time: f32) {
        if let Some(active) = self.active.as_mut() {
            active.overlay.set_primary_time(time);
        }
    }

    /// Edit the active configuration's global weight in place. Picked up by
    /// the next frame's weight refresh; no re-switch, so overlay playback is
    /// not disturbed.
    pub fn set_global_weight(&mut self, weight: f32) {
        if let Some(active) = self.active.as_mut() {
            active.asset.global_weight = weight.clamp(0.0, 1.0);
        }
    }

    /// Edit one override's contribution weight in place, addressed by its
    /// position in the configuration's override list. Out-of-range indices
    /// are ignored.
    pub fn set_override_weight(&mut self, index: usize, weight: f32) {
        if let Some(active) = self.active.as_mut() {
            if let Some(authored) = active.asset.override_overlays.get_mut(index) {
                authored.weight = weight.clamp(0.0, 1.0);
            }
        }
    }

    /// Step the blender by `dt` seconds, writing final bone transforms to
    /// `sink`. No-op when disabled or when nothing is active or pending.
    pub fn update(&mut self, dt: f32, sink: &mut dyn BoneSink) {
        if !self.is_enabled() {
            return;
        }

        if self.active.is_none() {
            // A blended switch with nothing active fades in from the live
            // stream: seed the cache from the sink, commit, and start the
            // first blended frame next update at weight 0.
            if self.cache_pose_pending {
                if let Some(request) = self.pending.take() {
                    layering::snapshot_stream_as_cache(&mut self.atoms, sink);
                    self.cache_pose_pending = false;
                    self.commit(request);
                    self.fade.begin();
                    if !self.options.always_animate_poses {
                        self.resample_poses = true;
                    }
                }
            }
            return;
        }

        // 1) Advance clip playback (loop wrapping lives in ClipPlayback).
        if let Some(active) = self.active.as_mut() {
            active.overlay.advance(dt);
        }

        // 2) Crossfade bookkeeping and per-frame weight refresh.
        self.fade.advance(dt);
        let fading_out = self.fade.state() == FadeState::BlendingOut;
        if self.options.force_update_weights || fading_out {
            let global = self.fade.fade_out_weight();
            self.update_blend_weights(global);
        }

        // 3) Pose evaluation (base + overlay composite).
        let animate = self.options.always_animate_poses || self.resample_poses;
        if animate {
            if let Some(active) = self.active.as_ref() {
                layering::evaluate_base_pose(&mut self.atoms, &self.rig, &active.base);
                layering::evaluate_overlay_pose(&mut self.atoms, &self.rig, &active.overlay);
            }
        }
        self.resample_poses = false;

        // 4) Layering: refresh the live stream pose, then blend and write.
        layering::refresh_stream_pose(&mut self.atoms, sink);
        let cache = self.cache_pose_pending && self.pending.is_some();
        layering::apply_layered_blend(&mut self.atoms, sink, self.fade.blend_weight(), cache);

        // 5) Blend-out terminal: the zeroed weights were applied this frame,
        // so the sink now shows the live stream alone.
        if self.fade.is_faded_out() {
            self.active = None;
            self.fade.finish_out();
            return;
        }

        // 6) Deferred switch commit; the next frame starts at weight 0.
        if cache {
            if let Some(request) = self.pending.take() {
                self.cache_pose_pending = false;
                self.commit(request);
                self.fade.begin();
                if !self.options.always_animate_poses {
                    self.resample_poses = true;
                }
            }
        }
    }

    /// Release the per-bone atom buffer. Idempotent and safe to call even if
    /// binding never completed; the blender is disabled afterwards.
    pub fn release(&mut self) {
        self.atoms = Vec::new();
        self.active = None;
        self.pending = None;
        self.cache_pose_pending = false;
        self.resample_poses = false;
        self.fade = Crossfade::new();
    }

    /// Activate a resolved request: rebuild playbacks and the overlay
    /// composite, re-resolve chains against the rig, reset weights to the
    /// asset's authored values.
    fn commit(&mut self, request: PendingSwitch) {
        let PendingSwitch {
            asset,
            base,
            overlay,
            overrides,
            blend_time,
            use_curve,
        } = request;

        let speed = if asset.is_animation {
            asset.overlay_speed
        } else {
            0.0
        };
        let primary = ClipPlayback::new(overlay, speed);
        let mixer = if overrides.is_empty() {
            OverlayMixer::passthrough(primary)
        } else {
            let inputs = overrides
                .into_iter()
                .zip(asset.override_overlays.iter())
                .map(|((clip, mask), authored)| OverrideInput {
                    playback: ClipPlayback::new(clip, speed),
                    mask,
                    weight: authored.weight.clamp(0.0, 1.0),
                })
                .collect();
            OverlayMixer::new(primary, inputs)
        };

        let chains = asset
            .layered_blends
            .iter()
            .map(|blend| ResolvedChain {
                bones: self.rig.resolve_bones(&blend.layer.bones, &blend.layer.name),
                base_weight: blend.base_weight.clamp(0.0, 1.0),
                additive_weight: blend.additive_weight.clamp(0.0, 1.0),
                local_weight: blend.local_weight.clamp(0.0, 1.0),
            })
            .collect();

        // Zero everything first; bones outside every chain stay at pure
        // stream pass-through.
        for atom in &mut self.atoms {
            atom.base_weight = 0.0;
            atom.additive_weight = 0.0;
            atom.local_weight = 0.0;
        }

        let duration = blend_time
            .filter(|t| *t > 0.0)
            .unwrap_or(asset.blend_time)
            .max(0.0);
        let curve = use_curve.then_some(asset.blend_curve);
        self.fade.configure(duration, curve);

        self.active = Some(ActiveBlend {
            asset,
            base: ClipPlayback::new(base, 0.0),
            overlay: mixer,
            chains,
        });
        self.update_blend_weights(1.0);
    }

    /// Derive per-bone weights from the active asset: chain triple scaled by
    /// the asset's global weight and the blend-out factor, clamped. Also
    /// refreshes the override mixer's input weights from configuration data.
    fn update_blend_weights(&mut self, global: f32) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let scale = active.asset.global_weight.clamp(0.0, 1.0) * global.clamp(0.0, 1.0);
        for chain in &active.chains {
            for &bone in &chain.bones {
                let atom = &mut self.atoms[bone];
                atom.base_weight = (chain.base_weight * scale).clamp(0.0, 1.0);
                atom.additive_weight = (chain.additive_weight * scale).clamp(0.0, 1.0);
                atom.local_weight = (chain.local_weight * scale).clamp(0.0, 1.0);
            }
        }
        active.overlay.refresh_weights(&active.asset.override_overlays);
    }
}
