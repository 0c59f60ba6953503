use std::{env, path::PathBuf, process};

use elu2scene::{
    ImportOptions, ImportStatus, JsonNodeSource, MemoryScene, report_path_for_input, run_import,
    write_import_report,
};

fn main() {
    tracing_subscriber::fmt().init();

    if let Err(err) = run() {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: elu2scene <nodes.json> [report.json]");
        process::exit(2);
    }

    let input = PathBuf::from(&args[1]);
    let report_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| report_path_for_input(&input));

    let mut scene = MemoryScene::new();
    let outcome = run_import(
        &JsonNodeSource,
        &input,
        &mut scene,
        &ImportOptions::default(),
    );

    if outcome.status == ImportStatus::Cancelled {
        eprintln!("import cancelled: {}", input.display());
        process::exit(1);
    }

    let report = &outcome.report;
    println!("Scene: {}", report.file_stem);
    println!(
        "Nodes: {} ({} dummies, {} meshes)",
        report.node_count, report.dummy_count, report.mesh_count
    );
    println!(
        "Bones: {}, Reparented objects: {}",
        report.bone_count, report.reparented_count
    );
    for diagnostic in &report.diagnostics {
        println!(
            "[{:?}] {}: {}",
            diagnostic.severity, diagnostic.code, diagnostic.message
        );
    }

    write_import_report(&report_path, report)?;
    println!("Report: {}", report_path.display());

    Ok(())
}
