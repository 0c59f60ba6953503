use std::collections::HashMap;

use tracing::info;

use super::ImportState;
use super::types::{Diagnostic, SceneNode, Severity};
use crate::scene::{ObjectHandle, SceneSink};

// ─── Plain object hierarchy ───────────────────────────────────────────────────

/// Parents placed objects to each other by claimed parent name. Bone-named
/// parents are left for the skeleton reparenter; missing parents silently
/// stay at root level. Local transforms are kept so parent-relative source
/// transforms compose through the chain.
pub(super) fn link_object_hierarchy(
    nodes: &[SceneNode],
    state: &mut ImportState,
    sink: &mut dyn SceneSink,
) {
    let mut objects_by_name: HashMap<&str, ObjectHandle> = HashMap::new();
    for &(node_index, object) in &state.object_pairs {
        objects_by_name
            .entry(nodes[node_index].name.as_str())
            .or_insert(object);
    }

    for &(node_index, object) in &state.object_pairs {
        let node = &nodes[node_index];
        if node.parent_name.is_empty()
            || node.parent_name == node.name
            || state.valid_bones.contains(&node.parent_name)
        {
            continue;
        }
        if let Some(&parent) = objects_by_name.get(node.parent_name.as_str()) {
            sink.set_parent_object(object, parent);
        }
    }
}

// ─── Object-to-bone reparenting ───────────────────────────────────────────────

/// Re-parents every object whose claimed parent is a valid bone onto the
/// skeleton with bone-space parenting, preserving its world transform so
/// placement is visually unchanged. Dummy nodes already promoted to bones
/// are skipped; unresolved targets produce an informational diagnostic.
pub(super) fn reparent_objects_to_bones(
    nodes: &[SceneNode],
    state: &mut ImportState,
    sink: &mut dyn SceneSink,
) {
    let Some(skeleton) = state.skeleton else {
        return;
    };

    for &(node_index, object) in &state.object_pairs {
        let node = &nodes[node_index];
        let is_bone = state.valid_bones.contains(&node.name);

        if !state.valid_bones.contains(&node.parent_name) || (is_bone && node.is_dummy) {
            continue;
        }

        let target_name = if is_bone {
            node.name.as_str()
        } else {
            node.parent_name.as_str()
        };

        let found = sink
            .armature(skeleton)
            .is_some_and(|armature| armature.find_bone(target_name).is_some());

        if found {
            let world = sink.world_matrix(object);
            sink.set_parent_bone(object, skeleton, target_name);
            sink.set_world_matrix(object, &world);
            state.reparented += 1;
        } else {
            let message = format!(
                "bone parent not found: {}, {}, {}",
                node.name, node.parent_name, node.is_dummy
            );
            info!("{message}");
            state.diagnostics.push(Diagnostic {
                severity: Severity::Info,
                code: "OBJECT_BONE_PARENT_NOT_FOUND".to_string(),
                message,
            });
        }
    }
}

// ─── Deform modifier binding ──────────────────────────────────────────────────

/// Binds every unbound deform-modifier placeholder to the skeleton object.
/// No-op for meshes without one.
pub(super) fn bind_deform_modifiers(state: &mut ImportState, sink: &mut dyn SceneSink) {
    let Some(skeleton) = state.skeleton else {
        return;
    };

    for &object in &state.mesh_objects {
        if sink.has_unbound_deform_modifier(object) {
            sink.bind_deform_modifier(object, skeleton);
        }
    }
}
