use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::scene::ObjectHandle;

// ─── Naming convention constants ──────────────────────────────────────────────

/// Designated skeleton root node name. Exempt from parent resolution.
pub const ROOT_BONE_NAME: &str = "Bip01";

/// A node whose name starts with one of these prefixes is a bone candidate,
/// independent of whether its claimed parent or any child actually exists.
pub const BONE_NAME_PREFIXES: [&str; 2] = ["Bip01", "Bone"];

/// Case-insensitive fragment identifying twist helper bones.
pub const TWIST_NAME_FRAGMENT: &str = "twist";

/// Parent-tail to child-head distance below which two bones chain rigidly.
pub const BONE_CONNECT_EPSILON: f32 = 1e-4;

/// Placeholder bone length before geometry resolution.
pub const DEFAULT_BONE_LENGTH: f32 = 0.1;

// ─── Node model ───────────────────────────────────────────────────────────────

/// One parsed mesh/dummy record from the external loader. Read-only after
/// load; the import never mutates node data, only the scene built from it.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name, unique within one import.
    pub name: String,
    /// Claimed parent name. May reference a node that does not exist.
    pub parent_name: String,
    /// Parent-relative transform as stored in the file.
    pub local_transform: Matrix4<f32>,
    /// World transform as resolved by the loader.
    pub world_transform: Matrix4<f32>,
    /// Non-rendering placeholder node.
    pub is_dummy: bool,
    /// Raw geometry carried deform weights; such meshes receive an unbound
    /// deform-modifier placeholder to be bound to the synthesized skeleton.
    pub skinned: bool,
    /// Opaque geometry handle owned by the loader.
    pub mesh: Option<usize>,
    /// Opaque material handle owned by the loader.
    pub material: Option<usize>,
}

// ─── Options ──────────────────────────────────────────────────────────────────

/// Per-import toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Re-roll synthesized bones so local Z leans toward global +Z.
    pub bone_rolls: bool,
    /// Synthesize tracking constraints for twist bones. Only evaluated when
    /// `bone_rolls` is also set, since constraints assume resolved rolls.
    pub twist_constraints: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            bone_rolls: true,
            twist_constraints: true,
        }
    }
}

// ─── Diagnostics & status ─────────────────────────────────────────────────────

/// Severity level attached to an import diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single non-fatal diagnostic surfaced during reconstruction. Structural
/// inconsistencies in the source data are reported this way and never abort
/// the import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

/// Two-value status signal exposed to the caller.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ImportStatus {
    /// The loader failed before any scene mutation.
    Cancelled,
    /// Reconstruction ran to completion, possibly with diagnostics.
    Finished,
}

/// Summary of one finished import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub file_stem: String,
    pub node_count: usize,
    pub dummy_count: usize,
    pub mesh_count: usize,
    pub bone_count: usize,
    pub reparented_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Full result of one import attempt.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub status: ImportStatus,
    /// The synthesized skeleton object, when any valid bones were found.
    pub skeleton: Option<ObjectHandle>,
    pub report: ImportReport,
}
