//! Posemix Blend Core (engine-agnostic)
//!
//! Skeletal pose-blending: combines a base locomotion pose, an overlay pose
//! (optionally a weighted composite of override clips) and per-bone-chain
//! weight triples into a final per-bone transform every frame, with
//! snapshot-and-crossfade transitions between successive blend assets.
//!
//! The crate owns no clock, no clip decoding and no render skeleton: hosts
//! provide a [`SkeletonProvider`] to bind against, a [`ClipSource`] that
//! resolves clip names, and a [`BoneSink`] the blender reads the live stream
//! from and writes final transforms to, once per frame via
//! [`PoseBlender::update`].

pub mod asset;
pub mod atom;
pub mod clip;
pub mod config;
pub mod curve;
pub mod engine;
pub mod error;
pub mod fade;
pub mod layering;
pub mod rig;
pub mod transform;

// Re-exports for consumers (adapters)
pub use asset::{parse_blend_asset_json, BlendAsset, BoneChain, BoneMask, LayeredBlend, OverrideOverlay};
pub use atom::{AtomPose, BlendAtom};
pub use clip::{ClipPlayback, ClipSource, OverlayMixer, PoseClip};
pub use config::BlendOptions;
pub use curve::BlendCurve;
pub use engine::PoseBlender;
pub use error::{AssetError, RigError};
pub use fade::{Crossfade, FadeState};
pub use layering::BoneSink;
pub use rig::{BoneIndex, BoneInfo, BoundRig, SkeletonProvider};
pub use transform::BoneTransform;
