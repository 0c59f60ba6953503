//! Host scene-graph boundary.
//!
//! The reconstruction core never talks to a concrete host; it mutates the
//! scene through the [`SceneSink`] capability trait. [`MemoryScene`] is the
//! in-crate reference implementation used by the CLI and the test suite:
//! a plain object table with local transforms, parent links (none, object,
//! or bone) and collection membership, composing world matrices through the
//! parent chain.

use nalgebra::{Matrix4, Translation3};

use crate::import::armature::Armature;

// ─── Handles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionHandle(pub usize);

/// Parent link of a placed object.
#[derive(Debug, Clone, PartialEq)]
pub enum Parent {
    Object(ObjectHandle),
    /// Bone-space parenting: the object follows the named bone of the
    /// skeleton object, offset from the bone tail.
    Bone {
        skeleton: ObjectHandle,
        bone: String,
    },
}

// ─── Capability trait ─────────────────────────────────────────────────────────

/// Scene mutation capabilities the reconstruction core requires from a host.
///
/// All operations are synchronous; one import owns the sink for its whole
/// duration, so implementations need no internal synchronization.
pub trait SceneSink {
    /// Coarse undo checkpoint, taken once before the first mutation.
    fn undo_checkpoint(&mut self);

    fn create_collection(&mut self, name: &str) -> CollectionHandle;

    /// Non-rendering marker object.
    fn create_empty(&mut self, name: &str, local: &Matrix4<f32>) -> ObjectHandle;

    /// Mesh object. `skinned` attaches an unbound deform-modifier
    /// placeholder to be bound to the skeleton later.
    fn create_mesh_object(
        &mut self,
        name: &str,
        local: &Matrix4<f32>,
        mesh: Option<usize>,
        material: Option<usize>,
        skinned: bool,
    ) -> ObjectHandle;

    fn link(&mut self, collection: CollectionHandle, object: ObjectHandle);

    /// Removes the object from every collection it was linked into.
    fn unlink_from_all(&mut self, object: ObjectHandle);

    fn world_matrix(&self, object: ObjectHandle) -> Matrix4<f32>;

    /// Rewrites the object's local transform so its world transform matches
    /// `world` under the current parent link.
    fn set_world_matrix(&mut self, object: ObjectHandle, world: &Matrix4<f32>);

    /// Plain object parenting. The local transform is kept, so chains of
    /// parent-relative source transforms compose naturally.
    fn set_parent_object(&mut self, child: ObjectHandle, parent: ObjectHandle);

    /// Installs a fully built armature as a scene object.
    fn create_armature_object(&mut self, name: &str, armature: Armature) -> ObjectHandle;

    fn armature(&self, object: ObjectHandle) -> Option<&Armature>;

    /// Bone-space parenting by bone name. The local transform is kept;
    /// callers preserve world placement explicitly around this call.
    fn set_parent_bone(&mut self, child: ObjectHandle, skeleton: ObjectHandle, bone: &str);

    fn has_unbound_deform_modifier(&self, object: ObjectHandle) -> bool;

    fn bind_deform_modifier(&mut self, object: ObjectHandle, skeleton: ObjectHandle);
}

// ─── In-memory reference implementation ───────────────────────────────────────

#[derive(Debug, Clone)]
struct DeformModifier {
    target: Option<ObjectHandle>,
}

#[derive(Debug, Clone)]
enum ObjectData {
    Empty,
    Mesh {
        mesh: Option<usize>,
        material: Option<usize>,
        modifier: Option<DeformModifier>,
    },
    Armature(Armature),
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub local: Matrix4<f32>,
    pub parent: Option<Parent>,
    data: ObjectData,
}

#[derive(Debug, Clone)]
struct Collection {
    name: String,
    members: Vec<ObjectHandle>,
}

/// Reference [`SceneSink`] holding everything in plain vectors.
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    collections: Vec<Collection>,
    checkpoints: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, handle: ObjectHandle) -> &SceneObject {
        &self.objects[handle.0]
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// First object carrying `name`.
    pub fn find_object(&self, name: &str) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .position(|object| object.name == name)
            .map(ObjectHandle)
    }

    pub fn collections_of(&self, object: ObjectHandle) -> Vec<CollectionHandle> {
        self.collections
            .iter()
            .enumerate()
            .filter(|(_, collection)| collection.members.contains(&object))
            .map(|(index, _)| CollectionHandle(index))
            .collect()
    }

    pub fn collection_name(&self, handle: CollectionHandle) -> &str {
        &self.collections[handle.0].name
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints
    }

    /// Loader-owned geometry and material handles of a mesh object.
    pub fn mesh_handles(&self, object: ObjectHandle) -> Option<(Option<usize>, Option<usize>)> {
        match &self.objects[object.0].data {
            ObjectData::Mesh { mesh, material, .. } => Some((*mesh, *material)),
            _ => None,
        }
    }

    pub fn deform_modifier_target(&self, object: ObjectHandle) -> Option<ObjectHandle> {
        match &self.objects[object.0].data {
            ObjectData::Mesh {
                modifier: Some(modifier),
                ..
            } => modifier.target,
            _ => None,
        }
    }

    fn push_object(&mut self, object: SceneObject) -> ObjectHandle {
        self.objects.push(object);
        ObjectHandle(self.objects.len() - 1)
    }

    /// World matrix of the parent frame an object's local transform applies
    /// in. A bone parent contributes the bone rest matrix offset to its tail.
    /// The hop budget breaks parent cycles from malformed input.
    fn parent_world(&self, object: ObjectHandle, hops: usize) -> Matrix4<f32> {
        if hops == 0 {
            return Matrix4::identity();
        }
        match &self.objects[object.0].parent {
            None => Matrix4::identity(),
            Some(Parent::Object(parent)) => self.object_world(*parent, hops - 1),
            Some(Parent::Bone { skeleton, bone }) => {
                let base = self.object_world(*skeleton, hops - 1);
                let Some(armature) = self.armature(*skeleton) else {
                    return base;
                };
                match armature.find_bone(bone) {
                    Some(index) => {
                        let bone = armature.bone(index);
                        base * bone.matrix
                            * Translation3::new(0.0, bone.length, 0.0).to_homogeneous()
                    }
                    None => base,
                }
            }
        }
    }

    fn object_world(&self, object: ObjectHandle, hops: usize) -> Matrix4<f32> {
        self.parent_world(object, hops) * self.objects[object.0].local
    }
}

impl SceneSink for MemoryScene {
    fn undo_checkpoint(&mut self) {
        self.checkpoints += 1;
    }

    fn create_collection(&mut self, name: &str) -> CollectionHandle {
        self.collections.push(Collection {
            name: name.to_string(),
            members: Vec::new(),
        });
        CollectionHandle(self.collections.len() - 1)
    }

    fn create_empty(&mut self, name: &str, local: &Matrix4<f32>) -> ObjectHandle {
        self.push_object(SceneObject {
            name: name.to_string(),
            local: *local,
            parent: None,
            data: ObjectData::Empty,
        })
    }

    fn create_mesh_object(
        &mut self,
        name: &str,
        local: &Matrix4<f32>,
        mesh: Option<usize>,
        material: Option<usize>,
        skinned: bool,
    ) -> ObjectHandle {
        self.push_object(SceneObject {
            name: name.to_string(),
            local: *local,
            parent: None,
            data: ObjectData::Mesh {
                mesh,
                material,
                modifier: skinned.then_some(DeformModifier { target: None }),
            },
        })
    }

    fn link(&mut self, collection: CollectionHandle, object: ObjectHandle) {
        let members = &mut self.collections[collection.0].members;
        if !members.contains(&object) {
            members.push(object);
        }
    }

    fn unlink_from_all(&mut self, object: ObjectHandle) {
        for collection in &mut self.collections {
            collection.members.retain(|member| *member != object);
        }
    }

    fn world_matrix(&self, object: ObjectHandle) -> Matrix4<f32> {
        self.object_world(object, self.objects.len() + 1)
    }

    fn set_world_matrix(&mut self, object: ObjectHandle, world: &Matrix4<f32>) {
        let parent_world = self.parent_world(object, self.objects.len() + 1);
        let inverse = parent_world.try_inverse().unwrap_or_else(Matrix4::identity);
        self.objects[object.0].local = inverse * world;
    }

    fn set_parent_object(&mut self, child: ObjectHandle, parent: ObjectHandle) {
        self.objects[child.0].parent = Some(Parent::Object(parent));
    }

    fn create_armature_object(&mut self, name: &str, armature: Armature) -> ObjectHandle {
        self.push_object(SceneObject {
            name: name.to_string(),
            local: Matrix4::identity(),
            parent: None,
            data: ObjectData::Armature(armature),
        })
    }

    fn armature(&self, object: ObjectHandle) -> Option<&Armature> {
        match &self.objects[object.0].data {
            ObjectData::Armature(armature) => Some(armature),
            _ => None,
        }
    }

    fn set_parent_bone(&mut self, child: ObjectHandle, skeleton: ObjectHandle, bone: &str) {
        self.objects[child.0].parent = Some(Parent::Bone {
            skeleton,
            bone: bone.to_string(),
        });
    }

    fn has_unbound_deform_modifier(&self, object: ObjectHandle) -> bool {
        matches!(
            &self.objects[object.0].data,
            ObjectData::Mesh {
                modifier: Some(DeformModifier { target: None }),
                ..
            }
        )
    }

    fn bind_deform_modifier(&mut self, object: ObjectHandle, skeleton: ObjectHandle) {
        if let ObjectData::Mesh {
            modifier: Some(modifier),
            ..
        } = &mut self.objects[object.0].data
        {
            modifier.target = Some(skeleton);
        }
    }
}
