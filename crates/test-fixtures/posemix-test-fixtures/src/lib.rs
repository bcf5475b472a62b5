//! In-memory skeleton, clip and transform-sink fixtures shared by posemix
//! integration tests and benches. Not published.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Quat, Vec3};
use posemix_blend_core::{
    BoneIndex, BoneInfo, BoneSink, BoneTransform, ClipSource, PoseClip, SkeletonProvider,
};

/// A plain bone list acting as the host skeleton.
pub struct FixtureSkeleton {
    pub bones: Vec<BoneInfo>,
}

impl FixtureSkeleton {
    pub fn empty() -> Self {
        Self { bones: Vec::new() }
    }

    /// Root -> Spine -> Head.
    pub fn three_bone() -> Self {
        Self {
            bones: vec![
                BoneInfo {
                    name: "Root".into(),
                    parent: None,
                },
                BoneInfo {
                    name: "Spine".into(),
                    parent: Some(0),
                },
                BoneInfo {
                    name: "Head".into(),
                    parent: Some(1),
                },
            ],
        }
    }

    /// A serial chain bone0 -> bone1 -> ... of the given length.
    pub fn chain(len: usize) -> Self {
        let bones = (0..len)
            .map(|i| BoneInfo {
                name: format!("bone{i}"),
                parent: if i == 0 { None } else { Some(i - 1) },
            })
            .collect();
        Self { bones }
    }
}

impl SkeletonProvider for FixtureSkeleton {
    fn bones(&self) -> Vec<BoneInfo> {
        self.bones.clone()
    }
}

/// A pose clip holding one fixed local transform per bone, independent of
/// time.
#[derive(Clone)]
pub struct StaticClip {
    pub duration: f32,
    pub looping: bool,
    pub poses: Vec<BoneTransform>,
}

impl StaticClip {
    pub fn identity(bones: usize) -> Self {
        Self {
            duration: 1.0,
            looping: false,
            poses: vec![BoneTransform::IDENTITY; bones],
        }
    }

    /// Identity everywhere except `bone`, which holds `rotation`.
    pub fn with_rotation(bones: usize, bone: BoneIndex, rotation: Quat) -> Self {
        let mut clip = Self::identity(bones);
        clip.poses[bone] = BoneTransform::new(rotation, Vec3::ZERO);
        clip
    }

    /// Identity everywhere except `bone`, which holds a full transform.
    pub fn with_transform(bones: usize, bone: BoneIndex, transform: BoneTransform) -> Self {
        let mut clip = Self::identity(bones);
        clip.poses[bone] = transform;
        clip
    }
}

impl PoseClip for StaticClip {
    fn duration(&self) -> f32 {
        self.duration
    }
    fn is_looping(&self) -> bool {
        self.looping
    }
    fn sample_local(&self, _time: f32, bone: BoneIndex) -> BoneTransform {
        self.poses.get(bone).copied().unwrap_or(BoneTransform::IDENTITY)
    }
}

/// A clip whose chosen bone turns about Y at a constant rate. Exercises
/// playback advance, speed and loop wrapping.
pub struct SpinningClip {
    pub duration: f32,
    pub looping: bool,
    pub bone: BoneIndex,
    pub radians_per_second: f32,
}

impl PoseClip for SpinningClip {
    fn duration(&self) -> f32 {
        self.duration
    }
    fn is_looping(&self) -> bool {
        self.looping
    }
    fn sample_local(&self, time: f32, bone: BoneIndex) -> BoneTransform {
        if bone == self.bone {
            BoneTransform::new(Quat::from_rotation_y(time * self.radians_per_second), Vec3::ZERO)
        } else {
            BoneTransform::IDENTITY
        }
    }
}

/// Name-keyed clip storage implementing the core's resolver trait.
#[derive(Default)]
pub struct ClipLibrary {
    clips: HashMap<String, Arc<dyn PoseClip>>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, clip: Arc<dyn PoseClip>) {
        self.clips.insert(name.to_string(), clip);
    }
}

impl ClipSource for ClipLibrary {
    fn resolve(&self, name: &str) -> Option<Arc<dyn PoseClip>> {
        self.clips.get(name).cloned()
    }
}

/// A host render skeleton: per-bone local transforms plus the character
/// root's world transform, with worlds derived by forward kinematics.
pub struct FixtureSink {
    parents: Vec<Option<usize>>,
    pub root: BoneTransform,
    pub locals: Vec<BoneTransform>,
}

impl FixtureSink {
    pub fn new(skeleton: &FixtureSkeleton) -> Self {
        Self {
            parents: skeleton.bones.iter().map(|b| b.parent).collect(),
            root: BoneTransform::IDENTITY,
            locals: vec![BoneTransform::IDENTITY; skeleton.bones.len()],
        }
    }

    fn world_of(&self, bone: BoneIndex) -> BoneTransform {
        let parent = match self.parents[bone] {
            Some(p) => self.world_of(p),
            None => self.root,
        };
        parent.transform(self.locals[bone])
    }

    fn parent_world_rotation(&self, bone: BoneIndex) -> Quat {
        match self.parents[bone] {
            Some(p) => self.world_of(p).rotation,
            None => self.root.rotation,
        }
    }
}

impl BoneSink for FixtureSink {
    fn root_transform(&self) -> BoneTransform {
        self.root
    }

    fn world_transform(&self, bone: BoneIndex) -> BoneTransform {
        self.world_of(bone)
    }

    fn local_transform(&self, bone: BoneIndex) -> BoneTransform {
        self.locals[bone]
    }

    fn set_world_rotation(&mut self, bone: BoneIndex, rotation: Quat) {
        let parent = self.parent_world_rotation(bone);
        self.locals[bone].rotation = parent.inverse() * rotation;
    }

    fn set_local_rotation(&mut self, bone: BoneIndex, rotation: Quat) {
        self.locals[bone].rotation = rotation;
    }

    fn set_local_position(&mut self, bone: BoneIndex, position: Vec3) {
        self.locals[bone].position = position;
    }
}
