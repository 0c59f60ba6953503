//! External loader boundary.
//!
//! Mesh parsing, unit conversion and material resolution happen outside the
//! importer; what crosses this seam is a flat list of named node records in
//! a small JSON interchange shape. [`NodeSource`] abstracts the loader so
//! reconstruction can be driven from fixtures in tests.

use std::{fs, io, path::Path};

use nalgebra::Matrix4;
use serde::Deserialize;
use thiserror::Error;

use crate::import::SceneNode;

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Failures that cancel an import before any scene mutation.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed node data in {path}: {message}")]
    Malformed { path: String, message: String },
    #[error("missing material override table for {path}")]
    MissingMaterialOverride { path: String },
}

// ─── Interchange records ──────────────────────────────────────────────────────

/// One node as serialized by the loader. Matrices are column-major.
#[derive(Debug, Deserialize)]
struct NodeRecord {
    name: String,
    #[serde(default)]
    parent: String,
    local_matrix: [f32; 16],
    /// Absent when the loader already resolved nodes into world space.
    #[serde(default)]
    world_matrix: Option<[f32; 16]>,
    #[serde(default)]
    dummy: bool,
    #[serde(default)]
    skinned: bool,
    #[serde(default)]
    mesh: Option<usize>,
    #[serde(default)]
    material: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SceneRecord {
    nodes: Vec<NodeRecord>,
}

impl NodeRecord {
    fn into_node(self) -> SceneNode {
        let local = Matrix4::from_column_slice(&self.local_matrix);
        let world = self
            .world_matrix
            .map(|cells| Matrix4::from_column_slice(&cells))
            .unwrap_or(local);
        SceneNode {
            name: self.name,
            parent_name: self.parent,
            local_transform: local,
            world_transform: world,
            is_dummy: self.dummy,
            skinned: self.skinned,
            mesh: self.mesh,
            material: self.material,
        }
    }
}

/// A fully parsed scene ready for reconstruction.
#[derive(Debug, Clone)]
pub struct ParsedEluScene {
    /// Source file basename up to the first dot; prefixes every created
    /// object name so repeated imports stay distinguishable.
    pub file_stem: String,
    pub nodes: Vec<SceneNode>,
}

// ─── Loader trait ─────────────────────────────────────────────────────────────

pub trait NodeSource {
    fn load(&self, path: &Path) -> Result<ParsedEluScene, LoadError>;
}

/// Reads the JSON interchange shape from disk.
pub struct JsonNodeSource;

impl NodeSource for JsonNodeSource {
    fn load(&self, path: &Path) -> Result<ParsedEluScene, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let record: SceneRecord =
            serde_json::from_slice(&bytes).map_err(|err| LoadError::Malformed {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;

        Ok(ParsedEluScene {
            file_stem: file_stem_of(path),
            nodes: record.nodes.into_iter().map(NodeRecord::into_node).collect(),
        })
    }
}

/// Basename up to the first dot, so `knight.elu.json` yields `knight`.
fn file_stem_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .map(|name| {
            name.split('.')
                .next()
                .unwrap_or(name.as_ref())
                .to_string()
        })
        .unwrap_or_default()
}
