use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use super::ImportState;
use super::types::ImportReport;
use crate::source::ParsedEluScene;

// ─── Report assembly ──────────────────────────────────────────────────────────

pub(super) fn build_report(parsed: &ParsedEluScene, state: &ImportState) -> ImportReport {
    let dummy_count = parsed.nodes.iter().filter(|node| node.is_dummy).count();
    ImportReport {
        file_stem: parsed.file_stem.clone(),
        node_count: parsed.nodes.len(),
        dummy_count,
        mesh_count: parsed.nodes.len() - dummy_count,
        bone_count: state.bone_pairs.len(),
        reparented_count: state.reparented,
        diagnostics: state.diagnostics.clone(),
    }
}

/// Report for an import that was cancelled before any scene mutation.
pub(super) fn empty_report(file_stem: &str) -> ImportReport {
    ImportReport {
        file_stem: file_stem.to_string(),
        node_count: 0,
        dummy_count: 0,
        mesh_count: 0,
        bone_count: 0,
        reparented_count: 0,
        diagnostics: Vec::new(),
    }
}

// ─── Report sidecar ───────────────────────────────────────────────────────────

pub fn report_path_for_input(input_path: &Path) -> PathBuf {
    input_path.with_extension("import.json")
}

pub fn write_import_report(report_path: &Path, report: &ImportReport) -> Result<()> {
    let json_bytes =
        serde_json::to_vec_pretty(report).context("failed to serialize import report JSON")?;
    fs::write(report_path, json_bytes).with_context(|| {
        format!(
            "failed to write import report: {}",
            report_path.display()
        )
    })?;

    Ok(())
}
