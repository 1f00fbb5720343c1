//! LabGraph command-line interface.
//!
//! Compiles a containerlab-style topology file (plus an optional annotation
//! sidecar and an optional runtime snapshot) into the JSON graph model the
//! rendering layer consumes. See --help for details.

use std::fs;
use std::path::PathBuf;

use anyhow::{
    Context,
    Result,
};
use clap::Parser;
use lg_core::annotations::LabAnnotations;
use lg_core::runtime::{
    RuntimeDataProvider,
    SnapshotProvider,
};
use lg_graph::{
    CompileOptions,
    TopologyFile,
    compile,
};
use tracing::info;

/// Compile a containerlab topology into a renderable graph model.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the topology YAML file.
    topology: PathBuf,

    /// Path to the annotation sidecar (JSON).
    #[arg(short, long)]
    annotations: Option<PathBuf>,

    /// Path to a captured runtime snapshot (JSON list of containers).
    /// Without it the compiler runs in editor mode.
    #[arg(short, long)]
    runtime_snapshot: Option<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`).
    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

fn load_topology(path: &PathBuf) -> Result<TopologyFile> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading topology {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing topology {}", path.display()))
}

fn load_annotations(path: Option<&PathBuf>) -> Result<Option<LabAnnotations>> {
    let Some(path) = path else { return Ok(None) };
    let raw = fs::read_to_string(path).with_context(|| format!("reading annotations {}", path.display()))?;
    let annotations = serde_json::from_str(&raw).with_context(|| format!("parsing annotations {}", path.display()))?;
    Ok(Some(annotations))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Conform to crate-standard logging.
    lg_core::logging::setup(&args.verbosity);

    let doc = load_topology(&args.topology)?;
    let annotations = load_annotations(args.annotations.as_ref())?;
    let snapshot = args
        .runtime_snapshot
        .as_deref()
        .map(SnapshotProvider::from_file)
        .transpose()?;

    let graph = compile(&doc, CompileOptions {
        annotations: annotations.as_ref(),
        provider: snapshot.as_ref().map(|s| s as &dyn RuntimeDataProvider),
    });

    let rendered = serde_json::to_string_pretty(&graph)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
            info!("graph written to {}", path.display());
        },
        None => println!("{rendered}"),
    }
    Ok(())
}
