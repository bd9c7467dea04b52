// The four ingestion passes, in dependency order: structure → parsing →
// import resolution → call resolution. Each pass reads the shared context
// and appends to the graph/registry/report; none ever removes what an
// earlier pass produced.

pub mod calls;
pub mod imports;
pub mod parsing;
pub mod structure;

use std::collections::BTreeMap;
use std::time::Duration;

use carto_graphs::{FileOutline, LanguageRegistry};

use crate::cache::ParseCache;
use crate::config::CartoConfig;
use crate::diagnostics::IngestReport;
use crate::error::Result;
use crate::graph::KnowledgeGraph;
use crate::pipeline::{CancelFlag, IngestOptions, SourceTree};
use crate::progress::ProgressReporter;
use crate::registry::DefinitionRegistry;

pub use calls::CallPass;
pub use imports::{ImportMap, ImportPass, ResolvedImport};
pub use parsing::ParsingPass;
pub use structure::StructurePass;

/// Statistics returned by a pass after a run.
#[derive(Debug, Default)]
pub struct PassStats {
    pub nodes_created: u64,
    pub edges_created: u64,
    pub duration: Duration,
}

/// Shared state threaded through the passes of one ingestion run.
///
/// Inputs are borrowed; accumulating state (graph, registry, outlines,
/// import map, report) is owned here and handed back to the pipeline when
/// the run completes.
pub struct IngestContext<'a> {
    pub tree: &'a SourceTree,
    /// Paths surviving the explicit directory/extension filters, sorted.
    pub files: &'a [String],
    pub options: &'a IngestOptions,
    pub config: &'a CartoConfig,
    pub languages: &'a LanguageRegistry,
    pub cache: &'a ParseCache,
    pub cancel: &'a CancelFlag,
    pub progress: &'a dyn ProgressReporter,
    pub graph: KnowledgeGraph,
    pub registry: DefinitionRegistry,
    /// Outlines of parsed files, kept for the resolution passes.
    pub outlines: BTreeMap<String, FileOutline>,
    pub import_map: ImportMap,
    pub report: IngestReport,
}

impl std::fmt::Debug for IngestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestContext")
            .field("files", &self.files.len())
            .field("nodes", &self.graph.node_count())
            .field("definitions", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// One ingestion pass.
pub trait Pass {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &mut IngestContext<'_>) -> Result<PassStats>;
}
