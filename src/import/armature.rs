use nalgebra::{Matrix4, Vector3};

use super::math_utils::{basis_column, translation_of};
use super::types::DEFAULT_BONE_LENGTH;

// ─── Constraints ──────────────────────────────────────────────────────────────

/// Axis a tracking constraint aims at its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackAxis {
    X,
    Y,
    Z,
}

/// Axis kept pointing toward the up reference while tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpAxis {
    X,
    Y,
    Z,
}

/// Space a constraint is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSpace {
    World,
    Pose,
}

/// Orientation-tracking constraint owned by a bone, aimed at a sibling's
/// child to smooth twist-joint rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackConstraint {
    /// Index of the target bone within the owning armature.
    pub target: usize,
    pub track_axis: TrackAxis,
    pub up_axis: UpAxis,
    pub target_space: ConstraintSpace,
    pub owner_space: ConstraintSpace,
}

// ─── Bones ────────────────────────────────────────────────────────────────────

/// One synthesized bone. The rest matrix is world-space with the bone running
/// along its local Y axis; head and tail are derived, never stored.
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// World-space rest matrix (source node world × reorientation).
    pub matrix: Matrix4<f32>,
    pub length: f32,
    /// Parent bone index within the owning armature.
    pub parent: Option<usize>,
    /// Rigidly chained to the parent (no translational gap at the joint).
    pub connected: bool,
    pub constraint: Option<TrackConstraint>,
}

impl Bone {
    pub fn new(name: impl Into<String>, matrix: Matrix4<f32>) -> Self {
        Self {
            name: name.into(),
            matrix,
            length: DEFAULT_BONE_LENGTH,
            parent: None,
            connected: false,
            constraint: None,
        }
    }

    pub fn head(&self) -> Vector3<f32> {
        translation_of(&self.matrix)
    }

    /// Unit direction the bone runs along (local Y in world space).
    pub fn axis(&self) -> Vector3<f32> {
        let axis = basis_column(&self.matrix, 1);
        if axis.norm_squared() < 1e-12 {
            Vector3::y()
        } else {
            axis.normalize()
        }
    }

    pub fn tail(&self) -> Vector3<f32> {
        self.head() + self.axis() * self.length
    }
}

// ─── Armature ─────────────────────────────────────────────────────────────────

/// Owns all bones for one import. Bone indices are stable and reflect
/// creation order; later stages rely on that for first-match semantics.
#[derive(Debug, Clone)]
pub struct Armature {
    pub name: String,
    bones: Vec<Bone>,
}

impl Armature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
        }
    }

    pub fn add_bone(&mut self, bone: Bone) -> usize {
        self.bones.push(bone);
        self.bones.len() - 1
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> &Bone {
        &self.bones[index]
    }

    pub fn bone_mut(&mut self, index: usize) -> &mut Bone {
        &mut self.bones[index]
    }

    /// First bone carrying `name`, in creation order.
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    /// Indices of the direct children of `parent`, ascending.
    pub fn children_of(&self, parent: usize) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent == Some(parent))
            .map(|(index, _)| index)
            .collect()
    }
}
