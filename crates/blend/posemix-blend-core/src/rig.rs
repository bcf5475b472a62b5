//! Rig binding: resolves a host skeleton into addressable per-bone indices
//! once at startup. All other modules refer to bones by [`BoneIndex`] only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Index into the bound bone list. Bone 0 is the character root.
pub type BoneIndex = usize;

/// One bone identity as exposed by the host skeleton. Parents must come
/// before children in the list (parent index strictly less than the bone's).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneInfo {
    pub name: String,
    pub parent: Option<BoneIndex>,
}

/// Host skeleton: an ordered list of named bone chains to bind against.
pub trait SkeletonProvider {
    fn bones(&self) -> Vec<BoneInfo>;
}

/// A bound skeleton: ordered bone handles plus a name-to-index map.
#[derive(Clone, Debug, Default)]
pub struct BoundRig {
    bones: Vec<BoneInfo>,
    index: HashMap<String, BoneIndex>,
}

impl BoundRig {
    /// Bind against a skeleton. Fails if the skeleton is empty or if a bone
    /// precedes its own parent; both are host wiring mistakes.
    pub fn bind(provider: &dyn SkeletonProvider) -> Result<Self, RigError> {
        let bones = provider.bones();
        if bones.is_empty() {
            return Err(RigError::EmptySkeleton);
        }
        let mut index = HashMap::with_capacity(bones.len());
        for (i, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= i {
                    return Err(RigError::BadParentOrder {
                        bone: bone.name.clone(),
                    });
                }
            }
            index.insert(bone.name.clone(), i);
        }
        Ok(Self { bones, index })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<BoneIndex> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn parent(&self, bone: BoneIndex) -> Option<BoneIndex> {
        self.bones.get(bone).and_then(|b| b.parent)
    }

    #[inline]
    pub fn bone_name(&self, bone: BoneIndex) -> Option<&str> {
        self.bones.get(bone).map(|b| b.name.as_str())
    }

    /// Resolve bone names to indices. Unresolved names are dropped with a
    /// warning, not fatal.
    pub fn resolve_bones(&self, names: &[String], context: &str) -> Vec<BoneIndex> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            match self.index_of(name) {
                Some(idx) => out.push(idx),
                None => log::warn!("{context}: bone '{name}' not found in rig, dropped"),
            }
        }
        out
    }

    /// Resolve a mask's bone names to a per-bone contribution bitmap.
    /// Bones the mask does not name are fully masked out.
    pub fn resolve_mask(&self, names: &[String], context: &str) -> Vec<bool> {
        let mut mask = vec![false; self.bones.len()];
        for idx in self.resolve_bones(names, context) {
            mask[idx] = true;
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bones(Vec<BoneInfo>);
    impl SkeletonProvider for Bones {
        fn bones(&self) -> Vec<BoneInfo> {
            self.0.clone()
        }
    }

    fn bone(name: &str, parent: Option<usize>) -> BoneInfo {
        BoneInfo {
            name: name.to_string(),
            parent,
        }
    }

    #[test]
    fn bind_maps_names_to_indices() {
        let rig = BoundRig::bind(&Bones(vec![
            bone("Root", None),
            bone("Spine", Some(0)),
            bone("Head", Some(1)),
        ]))
        .unwrap();
        assert_eq!(rig.len(), 3);
        assert_eq!(rig.index_of("Head"), Some(2));
        assert_eq!(rig.parent(2), Some(1));
        assert_eq!(rig.index_of("Tail"), None);
    }

    #[test]
    fn bind_rejects_empty_skeleton() {
        assert_eq!(
            BoundRig::bind(&Bones(vec![])).unwrap_err(),
            RigError::EmptySkeleton
        );
    }

    #[test]
    fn bind_rejects_child_before_parent() {
        let err = BoundRig::bind(&Bones(vec![bone("Root", Some(0))])).unwrap_err();
        assert!(matches!(err, RigError::BadParentOrder { .. }));
    }

    #[test]
    fn resolve_drops_unknown_names() {
        let rig = BoundRig::bind(&Bones(vec![bone("Root", None), bone("Spine", Some(0))])).unwrap();
        let resolved = rig.resolve_bones(
            &["Spine".to_string(), "Missing".to_string()],
            "test",
        );
        assert_eq!(resolved, vec![1]);

        let mask = rig.resolve_mask(&["Root".to_string()], "test");
        assert_eq!(mask, vec![true, false]);
    }
}
