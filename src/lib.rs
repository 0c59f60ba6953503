//! ELU scene import: hierarchy reconstruction and skeletal rig synthesis.
//!
//! The ELU interchange format ships a flat list of named mesh/dummy nodes
//! with parent-name strings but no tree structure. This crate rebuilds a
//! coherent scene from that list: a rigged skeleton when bone-named nodes
//! are present, correctly parented mesh/dummy objects, and bone-space
//! bindings for skinned meshes. Decoding the binary ELU container is the
//! job of an external loader feeding the [`source::NodeSource`] boundary;
//! scene mutation goes through the [`scene::SceneSink`] capability trait.

pub mod import;
pub mod scene;
pub mod source;

pub use import::{
    ImportOptions, ImportOutcome, ImportStatus, import_scene, report_path_for_input, run_import,
    write_import_report,
};
pub use scene::{MemoryScene, SceneSink};
pub use source::{JsonNodeSource, LoadError, NodeSource};
