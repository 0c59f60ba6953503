//! Hierarchy reconstruction and skeletal rig synthesis.
//!
//! Stages run strictly in sequence over one explicit [`ImportState`] record:
//! classify bone candidates, place objects, link the plain object hierarchy,
//! synthesize the skeleton (bones, parents, geometry, rolls, twist
//! constraints), re-parent bone-claimed objects onto it, and bind deform
//! modifiers. Structural inconsistencies degrade to informational
//! diagnostics; the import always produces a best-effort complete scene once
//! the loader succeeds.

pub mod armature;
mod diagnostic;
pub(crate) mod math_utils;
mod reparent;
mod skeleton;
pub mod types;

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, error};

use crate::scene::{ObjectHandle, SceneSink};
use crate::source::{NodeSource, ParsedEluScene};
use armature::Armature;

pub use diagnostic::{report_path_for_input, write_import_report};
pub use types::{
    Diagnostic, ImportOptions, ImportOutcome, ImportReport, ImportStatus, SceneNode, Severity,
};

// ─── Per-import context ───────────────────────────────────────────────────────

/// Transient state accumulated over one import. All mutations are
/// append-only or single-assignment; stages execute strictly sequentially.
#[derive(Debug, Default)]
pub(crate) struct ImportState {
    pub(crate) valid_bones: HashSet<String>,
    /// (node index, placed object), first-seen order.
    pub(crate) object_pairs: Vec<(usize, ObjectHandle)>,
    /// (node index, bone index), first-seen order.
    pub(crate) bone_pairs: Vec<(usize, usize)>,
    pub(crate) mesh_objects: Vec<ObjectHandle>,
    pub(crate) reparented: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) skeleton: Option<ObjectHandle>,
}

// ─── Entry points ─────────────────────────────────────────────────────────────

/// Loads `path` through the external loader and reconstructs the scene.
/// A loader failure cancels the import before any scene mutation.
pub fn run_import(
    source: &dyn NodeSource,
    path: &Path,
    sink: &mut dyn SceneSink,
    options: &ImportOptions,
) -> ImportOutcome {
    let parsed = match source.load(path) {
        Ok(parsed) => parsed,
        Err(err) => {
            error!("import cancelled: {err}");
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            return ImportOutcome {
                status: ImportStatus::Cancelled,
                skeleton: None,
                report: diagnostic::empty_report(&stem),
            };
        }
    };

    import_scene(&parsed, sink, options)
}

/// Reconstructs a scene from an already parsed node list.
pub fn import_scene(
    parsed: &ParsedEluScene,
    sink: &mut dyn SceneSink,
    options: &ImportOptions,
) -> ImportOutcome {
    let nodes = &parsed.nodes;
    let mut state = ImportState {
        valid_bones: skeleton::collect_valid_bones(nodes),
        ..ImportState::default()
    };
    debug!(
        nodes = nodes.len(),
        bone_candidates = state.valid_bones.len(),
        "starting scene reconstruction"
    );

    sink.undo_checkpoint();
    let collection = sink.create_collection(&parsed.file_stem);

    for (node_index, node) in nodes.iter().enumerate() {
        let object_name = format!("{}_{}", parsed.file_stem, node.name);
        let object = if node.is_dummy {
            sink.create_empty(&object_name, &node.local_transform)
        } else {
            let object = sink.create_mesh_object(
                &object_name,
                &node.local_transform,
                node.mesh,
                node.material,
                node.skinned,
            );
            state.mesh_objects.push(object);
            object
        };
        sink.link(collection, object);
        state.object_pairs.push((node_index, object));
    }

    reparent::link_object_hierarchy(nodes, &mut state, sink);

    if !state.valid_bones.is_empty() {
        let mut armature = Armature::new("Armature");
        skeleton::build_bones(nodes, &mut state, &mut armature, sink);
        skeleton::link_bone_parents(nodes, &mut state, &mut armature);
        skeleton::resolve_bone_geometry(&mut armature);

        if options.bone_rolls {
            skeleton::apply_bone_rolls(&mut armature);
            if options.twist_constraints {
                skeleton::synthesize_twist_constraints(&mut armature);
            }
        }

        let skeleton_object =
            sink.create_armature_object(&format!("{}_Armature", parsed.file_stem), armature);
        sink.link(collection, skeleton_object);
        state.skeleton = Some(skeleton_object);

        reparent::reparent_objects_to_bones(nodes, &mut state, sink);
        reparent::bind_deform_modifiers(&mut state, sink);
    }

    let report = diagnostic::build_report(parsed, &state);
    ImportOutcome {
        status: ImportStatus::Finished,
        skeleton: state.skeleton,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, Parent};
    use crate::source::LoadError;
    use nalgebra::{Matrix4, Translation3, Vector3};

    struct FailingSource;

    impl NodeSource for FailingSource {
        fn load(&self, path: &Path) -> Result<ParsedEluScene, LoadError> {
            Err(LoadError::Malformed {
                path: path.display().to_string(),
                message: "truncated header".to_string(),
            })
        }
    }

    fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Translation3::new(x, y, z).to_homogeneous()
    }

    fn node_at(name: &str, parent: &str, x: f32, y: f32, z: f32) -> SceneNode {
        let transform = translation(x, y, z);
        SceneNode {
            name: name.to_string(),
            parent_name: parent.to_string(),
            local_transform: transform,
            world_transform: transform,
            is_dummy: false,
            skinned: false,
            mesh: None,
            material: None,
        }
    }

    fn parsed(file_stem: &str, nodes: Vec<SceneNode>) -> ParsedEluScene {
        ParsedEluScene {
            file_stem: file_stem.to_string(),
            nodes,
        }
    }

    fn import(
        parsed_scene: &ParsedEluScene,
        scene: &mut MemoryScene,
    ) -> ImportOutcome {
        import_scene(parsed_scene, scene, &ImportOptions::default())
    }

    #[test]
    fn given_root_spine_and_thigh_when_importing_then_rig_matches_expectations() {
        let source = parsed(
            "knight",
            vec![
                node_at("Bip01", "", 0.0, 0.0, 0.0),
                node_at("Bip01 Spine", "Bip01", 0.0, 0.0, 0.9),
                node_at("Bip01 L Thigh", "Bip01", 0.4, 0.0, 0.0),
            ],
        );
        let mut scene = MemoryScene::new();

        let outcome = import(&source, &mut scene);

        assert_eq!(outcome.status, ImportStatus::Finished);
        let skeleton = outcome.skeleton.expect("skeleton should exist");
        let armature = scene.armature(skeleton).expect("armature object");
        assert_eq!(armature.len(), 3);

        let root = armature.find_bone("Bip01").unwrap();
        let spine = armature.find_bone("Bip01 Spine").unwrap();
        let thigh = armature.find_bone("Bip01 L Thigh").unwrap();
        assert!(armature.bone(root).parent.is_none());
        assert_eq!(armature.bone(spine).parent, Some(root));
        assert_eq!(armature.bone(thigh).parent, Some(root));

        let head = armature.bone(root).head();
        let spine_dist = (armature.bone(spine).head() - head).norm();
        let thigh_dist = (armature.bone(thigh).head() - head).norm();
        let expected = spine_dist.max(thigh_dist);
        assert!((armature.bone(root).length - expected).abs() < 1e-5);
        assert!(outcome.report.diagnostics.is_empty());
    }

    #[test]
    fn given_mesh_parented_to_bone_when_importing_then_world_placement_survives() {
        let source = parsed(
            "knight",
            vec![
                node_at("Bip01", "", 0.0, 0.0, 0.0),
                node_at("Bip01 Head", "Bip01", 0.0, 0.0, 1.7),
                node_at("Helmet", "Bip01 Head", 1.0, 2.0, 3.0),
            ],
        );
        let mut scene = MemoryScene::new();

        let outcome = import(&source, &mut scene);

        let skeleton = outcome.skeleton.expect("skeleton should exist");
        let helmet = scene.find_object("knight_Helmet").expect("placed helmet");
        match &scene.object(helmet).parent {
            Some(Parent::Bone {
                skeleton: parent_skeleton,
                bone,
            }) => {
                assert_eq!(*parent_skeleton, skeleton);
                assert_eq!(bone, "Bip01 Head");
            }
            other => panic!("helmet should be bone-parented, got {other:?}"),
        }

        let world = scene.world_matrix(helmet);
        let placement = Vector3::new(world[(0, 3)], world[(1, 3)], world[(2, 3)]);
        assert!((placement - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-4);
        assert_eq!(outcome.report.reparented_count, 2);
    }

    #[test]
    fn given_dangling_bone_parent_when_importing_then_one_diagnostic_and_finished() {
        let source = parsed(
            "knight",
            vec![
                node_at("Bip01", "", 0.0, 0.0, 0.0),
                node_at("Bone Stray", "Bip01 Nonexistent", 0.0, 1.0, 0.0),
            ],
        );
        let mut scene = MemoryScene::new();

        let outcome = import(&source, &mut scene);

        assert_eq!(outcome.status, ImportStatus::Finished);
        assert_eq!(outcome.report.diagnostics.len(), 1);
        assert_eq!(outcome.report.diagnostics[0].code, "BONE_PARENT_NOT_FOUND");

        let skeleton = outcome.skeleton.expect("skeleton should exist");
        let armature = scene.armature(skeleton).unwrap();
        let stray = armature.find_bone("Bone Stray").unwrap();
        assert!(armature.bone(stray).parent.is_none());
    }

    #[test]
    fn given_no_bone_named_nodes_when_importing_then_no_armature_and_no_diagnostics() {
        let mut marker = node_at("Marker", "", 0.0, 0.0, 0.0);
        marker.is_dummy = true;
        let source = parsed(
            "prop",
            vec![node_at("Crate", "", 1.0, 0.0, 0.0), marker],
        );
        let mut scene = MemoryScene::new();

        let outcome = import(&source, &mut scene);

        assert_eq!(outcome.status, ImportStatus::Finished);
        assert!(outcome.skeleton.is_none());
        assert_eq!(outcome.report.bone_count, 0);
        assert!(outcome.report.diagnostics.is_empty());
        // Objects were still placed and linked.
        assert!(scene.find_object("prop_Crate").is_some());
        assert!(scene.find_object("prop_Marker").is_some());
    }

    #[test]
    fn given_promoted_dummy_when_importing_then_its_placeholder_is_unlinked() {
        let mut head = node_at("Bip01 Head", "Bip01", 0.0, 0.0, 1.7);
        head.is_dummy = true;
        let source = parsed(
            "knight",
            vec![node_at("Bip01", "", 0.0, 0.0, 0.0), head],
        );
        let mut scene = MemoryScene::new();

        let outcome = import(&source, &mut scene);

        let placeholder = scene
            .find_object("knight_Bip01 Head")
            .expect("placeholder object");
        assert!(scene.collections_of(placeholder).is_empty());
        let armature = scene.armature(outcome.skeleton.unwrap()).unwrap();
        assert!(armature.find_bone("Bip01 Head").is_some());
    }

    #[test]
    fn given_skinned_mesh_when_importing_then_deform_modifier_binds_to_skeleton() {
        let mut body = node_at("Body", "Bip01", 0.0, 0.0, 0.0);
        body.skinned = true;
        let source = parsed(
            "knight",
            vec![node_at("Bip01", "", 0.0, 0.0, 0.0), body],
        );
        let mut scene = MemoryScene::new();

        let outcome = import(&source, &mut scene);

        let body_object = scene.find_object("knight_Body").unwrap();
        assert_eq!(
            scene.deform_modifier_target(body_object),
            outcome.skeleton
        );
    }

    #[test]
    fn given_failing_loader_when_running_then_import_cancels_without_mutation() {
        let mut scene = MemoryScene::new();

        let outcome = run_import(
            &FailingSource,
            Path::new("broken.elu.json"),
            &mut scene,
            &ImportOptions::default(),
        );

        assert_eq!(outcome.status, ImportStatus::Cancelled);
        assert!(outcome.skeleton.is_none());
        assert_eq!(scene.object_count(), 0);
        assert_eq!(scene.checkpoint_count(), 0);
    }

    #[test]
    fn given_disabled_rolls_when_importing_then_no_twist_constraints_appear() {
        let source = parsed(
            "knight",
            vec![
                node_at("Bip01", "", 0.0, 0.0, 0.0),
                node_at("Bip01 L Clavicle", "Bip01", 0.1, 0.0, 0.0),
                node_at("Bip01 L UpperArm", "Bip01 L Clavicle", 0.3, 0.0, 0.0),
                node_at("Bip01 L UpArmTwist", "Bip01 L Clavicle", 0.4, 0.0, 0.0),
                node_at("Bip01 L Forearm", "Bip01 L UpperArm", 0.6, 0.0, 0.0),
            ],
        );

        let options = ImportOptions {
            bone_rolls: false,
            twist_constraints: true,
        };
        let mut scene = MemoryScene::new();
        let outcome = import_scene(&source, &mut scene, &options);

        let armature = scene.armature(outcome.skeleton.unwrap()).unwrap();
        let twist = armature.find_bone("Bip01 L UpArmTwist").unwrap();
        assert!(armature.bone(twist).constraint.is_none());

        // With rolls enabled the same input produces the constraint.
        let mut scene = MemoryScene::new();
        let outcome = import_scene(&source, &mut scene, &ImportOptions::default());
        let armature = scene.armature(outcome.skeleton.unwrap()).unwrap();
        let twist = armature.find_bone("Bip01 L UpArmTwist").unwrap();
        let constraint = armature.bone(twist).constraint.as_ref().unwrap();
        let forearm = armature.find_bone("Bip01 L Forearm").unwrap();
        assert_eq!(constraint.target, forearm);
    }
}
