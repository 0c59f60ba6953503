use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use super::ImportState;
use super::armature::{Armature, Bone, ConstraintSpace, TrackAxis, TrackConstraint, UpAxis};
use super::math_utils::{bone_reorientation, with_roll_toward_global_z};
use super::types::{
    BONE_CONNECT_EPSILON, BONE_NAME_PREFIXES, Diagnostic, ROOT_BONE_NAME, SceneNode, Severity,
    TWIST_NAME_FRAGMENT,
};
use crate::scene::SceneSink;

// ─── Bone set classification ──────────────────────────────────────────────────

/// Collects the names of all bone candidates. Membership is purely
/// name-based; a node qualifies even when its claimed parent never existed.
pub(super) fn collect_valid_bones(nodes: &[SceneNode]) -> HashSet<String> {
    nodes
        .iter()
        .filter(|node| {
            BONE_NAME_PREFIXES
                .iter()
                .any(|prefix| node.name.starts_with(prefix))
        })
        .map(|node| node.name.clone())
        .collect()
}

// ─── Skeleton building ────────────────────────────────────────────────────────

/// Creates one bone per valid-bone node, in first-seen order. The rest
/// matrix is the placed object's world transform composed with the fixed
/// reorientation; dummy objects promoted to bones are unlinked from every
/// collection so no placeholder marker stays visible.
pub(super) fn build_bones(
    nodes: &[SceneNode],
    state: &mut ImportState,
    armature: &mut Armature,
    sink: &mut dyn SceneSink,
) {
    let reorient = bone_reorientation();

    for &(node_index, object) in &state.object_pairs {
        let node = &nodes[node_index];
        if !state.valid_bones.contains(&node.name) {
            continue;
        }

        let matrix = sink.world_matrix(object) * reorient;
        let bone_index = armature.add_bone(Bone::new(node.name.clone(), matrix));

        if node.is_dummy {
            sink.unlink_from_all(object);
        }

        state.bone_pairs.push((node_index, bone_index));
    }

    debug!(bones = armature.len(), "synthesized bones");
}

// ─── Parent linking ───────────────────────────────────────────────────────────

/// Resolves bone-to-bone parents by matching each bone's claimed parent name
/// against the synthesized set. The designated root is exempt. Unresolved
/// parents are informational only; the bone stays parentless.
pub(super) fn link_bone_parents(
    nodes: &[SceneNode],
    state: &mut ImportState,
    armature: &mut Armature,
) {
    // Insertion-ordered buckets per name give O(1) lookup while keeping the
    // first-match-wins behavior of a linear scan, duplicates included.
    let mut pairs_by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (pair_index, &(node_index, _)) in state.bone_pairs.iter().enumerate() {
        pairs_by_name
            .entry(nodes[node_index].name.as_str())
            .or_default()
            .push(pair_index);
    }

    for (pair_index, &(node_index, bone_index)) in state.bone_pairs.iter().enumerate() {
        let child = &nodes[node_index];
        if child.name == ROOT_BONE_NAME {
            continue;
        }

        let matched = pairs_by_name
            .get(child.parent_name.as_str())
            .and_then(|bucket| {
                bucket
                    .iter()
                    .copied()
                    .find(|&candidate| candidate != pair_index)
            });

        match matched {
            Some(parent_pair) => {
                let (_, parent_bone) = state.bone_pairs[parent_pair];
                armature.bone_mut(bone_index).parent = Some(parent_bone);
            }
            None => {
                let message = format!(
                    "parent not found for bone: {}, {}",
                    child.name, child.parent_name
                );
                info!("{message}");
                state.diagnostics.push(Diagnostic {
                    severity: Severity::Info,
                    code: "BONE_PARENT_NOT_FOUND".to_string(),
                    message,
                });
            }
        }
    }
}

// ─── Geometry resolution ──────────────────────────────────────────────────────

/// Resolves bone lengths and head/tail connectivity. Runs strictly after
/// parent linking; connectivity runs strictly after all lengths, since a
/// parent's tail position depends on its resolved length.
pub(super) fn resolve_bone_geometry(armature: &mut Armature) {
    for index in 0..armature.len() {
        let children = armature.children_of(index);
        if !children.is_empty() {
            // Reach at least to the farthest child so the rig reads as
            // one continuous chain.
            let head = armature.bone(index).head();
            let mut length = 0.0f32;
            for child in children {
                length = length.max((armature.bone(child).head() - head).norm());
            }
            armature.bone_mut(index).length = length;
        } else if let Some(parent) = armature.bone(index).parent {
            armature.bone_mut(index).length = armature.bone(parent).length / 2.0;
        }
    }

    for index in 0..armature.len() {
        let Some(parent) = armature.bone(index).parent else {
            continue;
        };
        let gap = (armature.bone(parent).tail() - armature.bone(index).head()).norm();
        if gap < BONE_CONNECT_EPSILON {
            armature.bone_mut(index).connected = true;
        }
    }
}

// ─── Roll pass ────────────────────────────────────────────────────────────────

/// Re-rolls every bone so local Z leans toward global +Z.
pub(super) fn apply_bone_rolls(armature: &mut Armature) {
    for index in 0..armature.len() {
        let rolled = with_roll_toward_global_z(&armature.bone(index).matrix);
        armature.bone_mut(index).matrix = rolled;
    }
}

// ─── Twist constraint synthesis ───────────────────────────────────────────────

/// Gives each twist bone a tracking constraint aimed at the first child of
/// its first sibling that has children. One constraint per twist bone;
/// absence of a qualifying sibling is silently accepted.
pub(super) fn synthesize_twist_constraints(armature: &mut Armature) {
    for index in 0..armature.len() {
        if !armature
            .bone(index)
            .name
            .to_ascii_lowercase()
            .contains(TWIST_NAME_FRAGMENT)
        {
            continue;
        }
        let Some(parent) = armature.bone(index).parent else {
            continue;
        };

        let target = armature
            .children_of(parent)
            .into_iter()
            .filter(|&sibling| sibling != index)
            .find_map(|sibling| armature.children_of(sibling).first().copied());

        if let Some(target) = target {
            armature.bone_mut(index).constraint = Some(TrackConstraint {
                target,
                track_axis: TrackAxis::Y,
                up_axis: UpAxis::Z,
                target_space: ConstraintSpace::Pose,
                owner_space: ConstraintSpace::Pose,
            });
        }
    }
}
