use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use carto_core::progress::BarReporter;
use carto_core::{CancelFlag, CartoConfig, CartoPipeline, IngestOptions, SourceTree};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Directory to ingest (default: current directory)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Write the graph JSON here instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Optional carto.toml to load
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only ingest paths under this directory (relative to --path)
    #[arg(long)]
    pub dir: Option<String>,

    /// Only ingest these file extensions (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ext: Option<Vec<String>>,

    /// Project node name (default: the directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Pretty-print the graph JSON
    #[arg(long)]
    pub pretty: bool,
}

pub fn run(args: &IngestArgs) -> anyhow::Result<()> {
    let root = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let config = match &args.config {
        Some(path) => CartoConfig::load(path)?,
        None => CartoConfig::default(),
    };

    let tree = SourceTree::from_directory(&root)
        .with_context(|| format!("Cannot read source tree at {}", root.display()))?;
    info!(files = tree.len(), root = %root.display(), "Source tree loaded");

    let project_name = args.name.clone().or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().to_string())
    });
    let options = IngestOptions {
        project_name,
        directory_filter: args.dir.clone(),
        file_extensions: args.ext.clone(),
    };

    let pipeline = CartoPipeline::new(config);
    let result = pipeline.run_with(&tree, &options, &CancelFlag::new(), &BarReporter::new())?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&result.graph)?
    } else {
        serde_json::to_string(&result.graph)?
    };

    match &args.out {
        Some(out) => {
            std::fs::write(out, json)
                .with_context(|| format!("Cannot write graph to {}", out.display()))?;
            eprintln!(
                "Wrote {} nodes, {} relationships to {}",
                result.graph.node_count(),
                result.graph.relationship_count(),
                out.display()
            );
        }
        None => println!("{json}"),
    }

    eprint!("{}", super::render_summary(&result.report));
    Ok(())
}
