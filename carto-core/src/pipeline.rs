// Pipeline orchestrator — structure → parsing → imports → calls →
// validation, with batching, cancellation at batch boundaries, and
// all-or-nothing semantics: a cancelled run returns an error and the
// partial graph is dropped.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{info, instrument};

use carto_graphs::LanguageRegistry;

use crate::cache::ParseCache;
use crate::config::CartoConfig;
use crate::diagnostics::{IngestReport, SkipCounts};
use crate::error::{PipelineError, Result};
use crate::graph::KnowledgeGraph;
use crate::passes::{CallPass, ImportMap, ImportPass, IngestContext, ParsingPass, Pass, StructurePass};
use crate::progress::{NoopReporter, ProgressReporter};
use crate::registry::DefinitionRegistry;
use crate::validate::validate;

// ── Input contract ─────────────────────────────────────────────────

/// The ingestion input: an arbitrary set of file paths and text contents.
/// Acquisition (git, archives, APIs) is a collaborator's concern; anything
/// able to produce paths and text can feed the pipeline.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    pub file_paths: Vec<String>,
    pub file_contents: HashMap<String, String>,
}

impl SourceTree {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut tree = Self::default();
        for (path, content) in entries {
            tree.file_paths.push(path.clone());
            tree.file_contents.insert(path, content);
        }
        tree
    }

    /// Convenience constructor walking a local directory. Non-UTF-8 files
    /// are skipped (the input contract is text); `.git` is never descended.
    pub fn from_directory(root: &Path) -> Result<Self> {
        let mut tree = Self::default();
        collect_files(root, root, &mut tree)?;
        tree.file_paths.sort();
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.file_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_paths.is_empty()
    }
}

fn collect_files(root: &Path, dir: &Path, tree: &mut SourceTree) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        if path.is_dir() {
            if name != ".git" {
                collect_files(root, &path, tree)?;
            }
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue; // binary or unreadable
        };
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        tree.file_paths.push(relative.clone());
        tree.file_contents.insert(relative, content);
    }
    Ok(())
}

/// Caller-supplied ingestion options.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Name for the Project root node.
    pub project_name: Option<String>,
    /// Restrict ingestion to paths under this directory.
    pub directory_filter: Option<String>,
    /// Restrict ingestion to these extensions (with or without a dot).
    pub file_extensions: Option<Vec<String>>,
}

/// Cooperative cancellation handle, checked at batch boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The ingestion output: the immutable graph plus its diagnostic report.
#[derive(Debug)]
pub struct IngestResult {
    pub graph: KnowledgeGraph,
    pub report: IngestReport,
}

// ── Pipeline ───────────────────────────────────────────────────────

/// Orchestrates one or more ingestion runs over a shared language registry
/// and an injected parse cache.
#[derive(Debug)]
pub struct CartoPipeline {
    config: CartoConfig,
    languages: LanguageRegistry,
    cache: Arc<ParseCache>,
}

impl CartoPipeline {
    pub fn new(config: CartoConfig) -> Self {
        let cache = Arc::new(ParseCache::with_capacity(config.ingestion.cache_capacity));
        Self::with_cache(config, cache)
    }

    /// Construct with an explicit cache instance — shared across runs or
    /// scoped to one, at the caller's discretion.
    pub fn with_cache(config: CartoConfig, cache: Arc<ParseCache>) -> Self {
        Self {
            config,
            languages: LanguageRegistry::new(),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ParseCache> {
        &self.cache
    }

    /// Run the full pipeline with default progress/cancellation handles.
    pub fn run(&self, tree: &SourceTree, options: &IngestOptions) -> Result<IngestResult> {
        self.run_with(tree, options, &CancelFlag::new(), &NoopReporter)
    }

    /// Run the full pipeline.
    ///
    /// Pass ordering is a correctness requirement, not a convenience: the
    /// structure pass fully completes before parsing (File nodes must exist
    /// before DEFINES edges attach), and parsing fully completes before the
    /// resolution passes (the registry must be complete before lookups).
    #[instrument(skip_all, name = "ingest")]
    pub fn run_with(
        &self,
        tree: &SourceTree,
        options: &IngestOptions,
        cancel: &CancelFlag,
        progress: &dyn ProgressReporter,
    ) -> Result<IngestResult> {
        let start = Instant::now();
        self.config.validate()?;

        let mut report = IngestReport::new();
        let files = apply_explicit_filters(tree, options, &mut report.files_skipped);
        if files.is_empty() {
            return Err(PipelineError::NoSourceFiles.into());
        }
        info!(files = files.len(), "Ingestion starting");

        let mut ctx = IngestContext {
            tree,
            files: &files,
            options,
            config: &self.config,
            languages: &self.languages,
            cache: &self.cache,
            cancel,
            progress,
            graph: KnowledgeGraph::new(),
            registry: DefinitionRegistry::new(),
            outlines: BTreeMap::new(),
            import_map: ImportMap::default(),
            report,
        };

        let passes: [&dyn Pass; 4] = [&StructurePass, &ParsingPass, &ImportPass, &CallPass];
        for pass in passes {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled.into());
            }
            pass.run(&mut ctx)?;
        }

        ctx.report.integrity = validate(&ctx.graph);
        ctx.report.duplicate_nodes = ctx.graph.duplicate_nodes();
        ctx.report.duplicate_relationships = ctx.graph.duplicate_relationships();
        ctx.report.cache = self.cache.stats();
        ctx.report.finalize(start.elapsed());

        info!(
            nodes = ctx.graph.node_count(),
            relationships = ctx.graph.relationship_count(),
            duration_ms = ctx.report.duration_ms,
            "Ingestion complete"
        );

        Ok(IngestResult {
            graph: ctx.graph,
            report: ctx.report,
        })
    }
}

/// Apply the explicit directory/extension filters from the input options.
/// These narrow the whole ingestion (including structure), unlike the
/// parsing-stage filters which only suppress definition extraction.
fn apply_explicit_filters(
    tree: &SourceTree,
    options: &IngestOptions,
    skips: &mut SkipCounts,
) -> Vec<String> {
    let dir = options
        .directory_filter
        .as_deref()
        .map(|d| d.trim_matches('/').to_string());
    let extensions: Option<Vec<String>> = options.file_extensions.as_ref().map(|exts| {
        exts.iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    });

    let mut files: Vec<String> = Vec::new();
    for path in &tree.file_paths {
        if let Some(dir) = &dir {
            if !dir.is_empty() && *path != *dir && !path.starts_with(&format!("{dir}/")) {
                skips.directory_filter += 1;
                continue;
            }
        }
        if let Some(extensions) = &extensions {
            let ext = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            if !ext.is_some_and(|e| extensions.contains(&e)) {
                skips.extension_filter += 1;
                continue;
            }
        }
        files.push(path.clone());
    }
    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeKind, RelKind};

    fn two_file_tree() -> SourceTree {
        SourceTree::new([
            (
                "pkg/a.py".to_string(),
                "def foo():\n    return 1\n".to_string(),
            ),
            (
                "pkg/b.py".to_string(),
                "from pkg.a import foo\n\ndef run():\n    foo()\n".to_string(),
            ),
        ])
    }

    #[test]
    fn explicit_directory_filter_narrows_ingestion() {
        let tree = SourceTree::new([
            ("src/a.py".to_string(), "def a():\n    pass\n".to_string()),
            ("docs/b.py".to_string(), "def b():\n    pass\n".to_string()),
        ]);
        let options = IngestOptions {
            directory_filter: Some("src".into()),
            ..Default::default()
        };
        let mut skips = SkipCounts::default();
        let files = apply_explicit_filters(&tree, &options, &mut skips);
        assert_eq!(files, vec!["src/a.py".to_string()]);
        assert_eq!(skips.directory_filter, 1);
    }

    #[test]
    fn extension_filter_accepts_dotted_and_bare() {
        let tree = SourceTree::new([
            ("a.py".to_string(), "x = 1\n".to_string()),
            ("b.rs".to_string(), "fn b() {}\n".to_string()),
        ]);
        let options = IngestOptions {
            file_extensions: Some(vec![".py".into()]),
            ..Default::default()
        };
        let mut skips = SkipCounts::default();
        let files = apply_explicit_filters(&tree, &options, &mut skips);
        assert_eq!(files, vec!["a.py".to_string()]);
        assert_eq!(skips.extension_filter, 1);
    }

    #[test]
    fn empty_filter_result_is_a_config_error() {
        let pipeline = CartoPipeline::new(CartoConfig::default());
        let tree = SourceTree::default();
        let err = pipeline.run(&tree, &IngestOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CartoError::Pipeline(PipelineError::NoSourceFiles)
        ));
    }

    #[test]
    fn cancelled_flag_aborts_the_run() {
        let pipeline = CartoPipeline::new(CartoConfig::default());
        let tree = two_file_tree();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = pipeline
            .run_with(&tree, &IngestOptions::default(), &cancel, &NoopReporter)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CartoError::Pipeline(PipelineError::Cancelled)
        ));
    }

    #[test]
    fn pipeline_produces_structure_and_definitions() {
        let pipeline = CartoPipeline::new(CartoConfig::default());
        let result = pipeline
            .run(&two_file_tree(), &IngestOptions::default())
            .unwrap();

        assert_eq!(result.graph.nodes_of_kind(NodeKind::Project).count(), 1);
        assert_eq!(result.graph.nodes_of_kind(NodeKind::Folder).count(), 1);
        assert_eq!(result.graph.nodes_of_kind(NodeKind::File).count(), 2);
        assert!(result.graph.nodes_of_kind(NodeKind::Function).count() >= 2);
        assert!(result.report.integrity.is_clean());
    }

    #[test]
    fn ingestion_is_idempotent() {
        let pipeline = CartoPipeline::new(CartoConfig::default());
        let tree = two_file_tree();
        let first = pipeline.run(&tree, &IngestOptions::default()).unwrap();
        let second = pipeline.run(&tree, &IngestOptions::default()).unwrap();

        let ids = |g: &KnowledgeGraph| {
            let mut node_ids: Vec<String> =
                g.nodes().iter().map(|n| n.id.0.clone()).collect();
            let mut rel_ids: Vec<String> =
                g.relationships().iter().map(|r| r.id.0.clone()).collect();
            node_ids.sort();
            rel_ids.sort();
            (node_ids, rel_ids)
        };
        assert_eq!(ids(&first.graph), ids(&second.graph));
    }

    #[test]
    fn import_and_call_edges_link_the_two_files() {
        let pipeline = CartoPipeline::new(CartoConfig::default());
        let result = pipeline
            .run(&two_file_tree(), &IngestOptions::default())
            .unwrap();

        let imports: Vec<_> = result
            .graph
            .relationships_of_kind(RelKind::Imports)
            .collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source.0, "File:pkg/b.py");
        assert_eq!(imports[0].target.0, "File:pkg/a.py");

        let calls: Vec<_> = result.graph.relationships_of_kind(RelKind::Calls).collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].properties.get("call_type").unwrap(),
            &serde_json::json!("ImportResolved")
        );
        assert_eq!(result.report.call_resolution.import_resolved, 1);
    }
}
