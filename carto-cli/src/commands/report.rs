use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use carto_core::{CartoConfig, CartoPipeline, IngestOptions, SourceTree};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Directory to ingest (default: current directory)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Optional carto.toml to load
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit the full report as JSON instead of the text summary
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &ReportArgs) -> anyhow::Result<()> {
    let root = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let config = match &args.config {
        Some(path) => CartoConfig::load(path)?,
        None => CartoConfig::default(),
    };

    let tree = SourceTree::from_directory(&root)
        .with_context(|| format!("Cannot read source tree at {}", root.display()))?;
    let options = IngestOptions {
        project_name: root
            .file_name()
            .map(|n| n.to_string_lossy().to_string()),
        ..Default::default()
    };

    let pipeline = CartoPipeline::new(config);
    let result = pipeline.run(&tree, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
    } else {
        print!("{}", super::render_summary(&result.report));
    }
    Ok(())
}
