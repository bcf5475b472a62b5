//! Blend asset: the immutable, serializable description of one blend request.
//!
//! Authored offline, resolved against a rig and a clip source at switch time,
//! and never mutated in place while active. Weight fields are clamped to
//! [0,1] when consumed rather than rejected.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::curve::BlendCurve;
use crate::error::AssetError;

/// A named, ordered set of bone names sharing one blend-weight triple.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneChain {
    pub name: String,
    #[serde(default)]
    pub bones: Vec<String>,
}

/// One bone chain and the weights applied to every bone in it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayeredBlend {
    pub layer: BoneChain,
    #[serde(default)]
    pub base_weight: f32,
    #[serde(default)]
    pub additive_weight: f32,
    #[serde(default)]
    pub local_weight: f32,
}

/// Per-bone on/off contribution filter for an override clip. Bones not named
/// here receive no contribution from the override.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneMask {
    #[serde(default)]
    pub bones: Vec<String>,
}

/// An override clip layered on top of the primary overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverrideOverlay {
    pub overlay: String,
    #[serde(default)]
    pub mask: BoneMask,
    #[serde(default = "default_one")]
    pub weight: f32,
}

fn default_one() -> f32 {
    1.0
}

fn default_blend_time() -> f32 {
    0.15
}

/// A complete blend configuration: pose clips, override composite, layered
/// weight table, transition timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendAsset {
    pub name: String,

    #[serde(default = "default_blend_time")]
    pub blend_time: f32,
    #[serde(default)]
    pub blend_curve: BlendCurve,

    /// Clip name of the base locomotion pose.
    pub base_pose: String,
    /// Clip name of the overlay pose.
    pub overlay_pose: String,
    #[serde(default)]
    pub override_overlays: Vec<OverrideOverlay>,
    #[serde(default = "default_one")]
    pub overlay_speed: f32,
    /// Whether the overlay plays back over time. A static overlay is sampled
    /// at time zero.
    #[serde(default)]
    pub is_animation: bool,

    #[serde(default)]
    pub layered_blends: Vec<LayeredBlend>,
    #[serde(default = "default_one")]
    pub global_weight: f32,
}

impl BlendAsset {
    /// True only when overrides are configured and every one names a clip.
    pub fn has_overrides(&self) -> bool {
        !self.override_overlays.is_empty()
            && self.override_overlays.iter().all(|o| !o.overlay.is_empty())
    }

    /// Authoring-time validation. A bone listed by two layered chains is
    /// rejected outright: the blend result would depend on chain order.
    pub fn validate(&self) -> Result<(), AssetError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for blend in &self.layered_blends {
            for bone in &blend.layer.bones {
                if !seen.insert(bone.as_str()) {
                    return Err(AssetError::OverlappingChains { bone: bone.clone() });
                }
            }
        }
        Ok(())
    }
}

/// Parse and validate a blend asset from its canonical JSON form.
pub fn parse_blend_asset_json(json: &str) -> Result<BlendAsset, AssetError> {
    let asset: BlendAsset = serde_json::from_str(json)?;
    asset.validate()?;
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(name: &str, bones: &[&str]) -> BoneChain {
        BoneChain {
            name: name.to_string(),
            bones: bones.iter().map(|b| b.to_string()).collect(),
        }
    }

    fn asset_with_chains(chains: Vec<LayeredBlend>) -> BlendAsset {
        BlendAsset {
            name: "test".into(),
            blend_time: 0.15,
            blend_curve: BlendCurve::default(),
            base_pose: "base".into(),
            overlay_pose: "overlay".into(),
            override_overlays: vec![],
            overlay_speed: 1.0,
            is_animation: false,
            layered_blends: chains,
            global_weight: 1.0,
        }
    }

    #[test]
    fn validate_accepts_disjoint_chains() {
        let asset = asset_with_chains(vec![
            LayeredBlend {
                layer: chain("Spine", &["Spine", "Chest"]),
                base_weight: 1.0,
                ..Default::default()
            },
            LayeredBlend {
                layer: chain("Arms", &["ArmL", "ArmR"]),
                base_weight: 1.0,
                ..Default::default()
            },
        ]);
        assert!(asset.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bone_in_two_chains() {
        let asset = asset_with_chains(vec![
            LayeredBlend {
                layer: chain("Spine", &["Spine", "Chest"]),
                ..Default::default()
            },
            LayeredBlend {
                layer: chain("Upper", &["Chest"]),
                ..Default::default()
            },
        ]);
        let err = asset.validate().unwrap_err();
        assert!(matches!(err, AssetError::OverlappingChains { ref bone } if bone == "Chest"));
    }

    #[test]
    fn has_overrides_requires_named_clips() {
        let mut asset = asset_with_chains(vec![]);
        assert!(!asset.has_overrides());
        asset.override_overlays.push(OverrideOverlay {
            overlay: String::new(),
            mask: BoneMask::default(),
            weight: 1.0,
        });
        assert!(!asset.has_overrides());
        asset.override_overlays[0].overlay = "aim".into();
        assert!(asset.has_overrides());
    }
}
