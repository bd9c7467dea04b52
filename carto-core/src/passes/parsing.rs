// Parsing pass — runs grammar adapters over filtered source files, extracts
// definitions, and populates the graph and the registry.
//
// Files move through an ordered, short-circuiting filter: ignore patterns →
// empty content → generated/minified heuristic. Whatever is excluded keeps
// its File node from the structure pass (flagged `no_definitions`) so
// structural containment stays intact, and the exclusion is counted.
//
// Batches parse on the rayon pool; graph and registry writes happen on the
// coordinating thread. The cache is consulted before parsing and trimmed
// between batches. Cancellation is honored at batch boundaries.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use carto_graphs::languages::hash_string;
use carto_graphs::{DefKind, FileOutline, GrammarAdapter, GraphError, OutlineDef};

use crate::config::CartoConfig;
use crate::diagnostics::{IngestReport, ParseFailure, QueryFailure};
use crate::error::{PipelineError, Result};
use crate::graph::KnowledgeGraph;
use crate::registry::{Definition, DefinitionRegistry};
use crate::types::{GraphNode, GraphRelationship, NodeId, NodeKind, RelKind};

use super::{IngestContext, Pass, PassStats};

#[derive(Debug)]
pub struct ParsingPass;

enum Disposition {
    Parse(Arc<GrammarAdapter>),
    /// No grammar for this extension: File node only.
    Fallback,
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Ignored,
    Empty,
    Generated,
}

impl Pass for ParsingPass {
    fn name(&self) -> &'static str {
        "parsing"
    }

    #[instrument(skip_all, name = "parsing_pass")]
    fn run(&self, ctx: &mut IngestContext<'_>) -> Result<PassStats> {
        let start = Instant::now();
        let mut stats = PassStats::default();
        ctx.progress
            .begin_pass("parsing", Some(ctx.files.len() as u64));

        let ignore_patterns = compile_patterns(&ctx.config.filtering.ignore_patterns);
        let timeout_micros = ctx.config.ingestion.parse_timeout_ms.saturating_mul(1_000);
        let mut reported_languages: HashSet<&'static str> = HashSet::new();

        for batch in ctx.files.chunks(ctx.config.ingestion.batch_size) {
            if ctx.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled.into());
            }

            // Classify the batch and satisfy what the cache can.
            let mut pending: Vec<(&String, Arc<GrammarAdapter>, u64, &str)> = Vec::new();
            let mut ready: HashMap<&String, std::result::Result<FileOutline, GraphError>> =
                HashMap::new();

            for path in batch {
                let content = ctx
                    .tree
                    .file_contents
                    .get(path)
                    .map_or("", String::as_str);
                match classify(path, content, ctx, &ignore_patterns) {
                    Disposition::Skip(reason) => {
                        match reason {
                            SkipReason::Ignored => ctx.report.files_skipped.ignored += 1,
                            SkipReason::Empty => ctx.report.files_skipped.empty += 1,
                            SkipReason::Generated => ctx.report.files_skipped.generated += 1,
                        }
                        flag_no_definitions(&mut ctx.graph, path);
                        ctx.progress.advance(1);
                    }
                    Disposition::Fallback => {
                        ctx.report.fallback_files += 1;
                        flag_no_definitions(&mut ctx.graph, path);
                        ctx.progress.advance(1);
                    }
                    Disposition::Parse(adapter) => {
                        if reported_languages.insert(adapter.id()) {
                            for failure in adapter.query_failures() {
                                let GraphError::Query {
                                    language,
                                    query,
                                    message,
                                } = failure
                                else {
                                    continue;
                                };
                                ctx.report.query_failures.push(QueryFailure {
                                    language: language.clone(),
                                    query: query.clone(),
                                    message: message.clone(),
                                });
                            }
                        }
                        let content_hash = hash_string(content);
                        if let Some(outline) = ctx.cache.get(path, content_hash) {
                            ready.insert(path, Ok(outline));
                        } else {
                            pending.push((path, adapter, content_hash, content));
                        }
                    }
                }
            }

            // Parse cache misses in parallel; extraction is pure.
            let parsed: Vec<_> = pending
                .par_iter()
                .map(|(path, adapter, _, content)| {
                    let result = adapter
                        .parse(content, path, timeout_micros)
                        .map(|tree| adapter.outline(&tree, content, path));
                    (path.as_str(), result)
                })
                .collect();
            let hashes: HashMap<&str, (u64, usize)> = pending
                .iter()
                .map(|(path, _, hash, content)| (path.as_str(), (*hash, content.len())))
                .collect();
            for (path, result) in parsed {
                let result = result.map(|outline| {
                    let (hash, size) = hashes[path];
                    ctx.cache.insert(path, hash, size, outline)
                });
                let key = batch.iter().find(|p| p.as_str() == path).expect("batch path");
                ready.insert(key, result);
            }

            // Apply results in batch order so emission stays deterministic.
            for path in batch {
                let Some(result) = ready.remove(path) else {
                    continue;
                };
                match result {
                    Ok(outline) => {
                        ctx.report.files_processed += 1;
                        apply_outline(
                            &mut ctx.graph,
                            &mut ctx.registry,
                            &mut ctx.report,
                            path,
                            &outline,
                            &mut stats,
                        );
                        ctx.outlines.insert(path.clone(), outline);
                    }
                    Err(e) => {
                        debug!(path = %path, error = %e, "Parse failed, falling back");
                        ctx.report.files_processed += 1;
                        ctx.report.parse_failures.push(ParseFailure {
                            path: path.clone(),
                            reason: e.to_string(),
                        });
                        flag_no_definitions(&mut ctx.graph, path);
                    }
                }
                ctx.progress.advance(1);
            }

            // Memory-pressure hook between batches.
            ctx.cache.trim();
        }

        ctx.progress.end_pass();
        stats.duration = start.elapsed();
        info!(
            files = ctx.report.files_processed,
            skipped = ctx.report.files_skipped.total(),
            definitions = ctx.registry.len(),
            "Parsing pass complete"
        );
        Ok(stats)
    }
}

fn compile_patterns(sources: &[String]) -> Vec<glob::Pattern> {
    sources
        .iter()
        .filter_map(|s| match glob::Pattern::new(s) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(pattern = %s, error = %e, "Invalid ignore pattern");
                None
            }
        })
        .collect()
}

/// Ordered, short-circuiting filter policy for one file.
///
/// Basenames on the config allow-list bypass the ignore and generated
/// filters: those files must keep their graph presence even under
/// aggressive ignore globs.
fn classify(
    path: &str,
    content: &str,
    ctx: &IngestContext<'_>,
    ignore_patterns: &[glob::Pattern],
) -> Disposition {
    let basename = path.rsplit('/').next().unwrap_or(path);
    let allowlisted = ctx
        .config
        .filtering
        .config_allowlist
        .iter()
        .any(|name| name == basename);

    if !allowlisted && ignore_patterns.iter().any(|p| p.matches(path)) {
        return Disposition::Skip(SkipReason::Ignored);
    }
    if content.is_empty() {
        return Disposition::Skip(SkipReason::Empty);
    }
    if !allowlisted && looks_generated(content, ctx.config) {
        return Disposition::Skip(SkipReason::Generated);
    }
    match ctx.languages.for_file(Path::new(path)) {
        Some(adapter) if ctx.config.languages.allows(adapter.id()) => {
            Disposition::Parse(adapter)
        }
        _ => Disposition::Fallback,
    }
}

/// Generated/minified detection: a pathologically long first line or a known
/// bundler signature. Such files are never parsed — query costs on minified
/// bundles are pathological and the output would be noise anyway.
fn looks_generated(content: &str, config: &CartoConfig) -> bool {
    let first_line_len = content.lines().next().map_or(0, str::len);
    if first_line_len > config.ingestion.max_first_line_len {
        return true;
    }
    config
        .filtering
        .generated_signatures
        .iter()
        .any(|sig| content.contains(sig.as_str()))
}

fn flag_no_definitions(graph: &mut KnowledgeGraph, path: &str) {
    graph.set_node_property(&NodeId::file(path), "no_definitions", serde_json::json!(true));
}

/// Emit one parsed file's outline into the graph and the registry.
fn apply_outline(
    graph: &mut KnowledgeGraph,
    registry: &mut DefinitionRegistry,
    report: &mut IngestReport,
    path: &str,
    outline: &FileOutline,
    stats: &mut PassStats,
) {
    let file_id = NodeId::file(path);
    graph.set_node_property(&file_id, "parsed", serde_json::json!(true));

    // Qualified name → node id, for intra-file BELONGS_TO/EXTENDS edges.
    let mut local_ids: HashMap<&str, (&OutlineDef, NodeId)> = HashMap::new();

    for def in &outline.definitions {
        let kind = NodeKind::from_def(def.kind);
        let id = NodeId::definition(kind, path, &def.qualified_name, def.span);

        let mut node = GraphNode::new(id.clone(), kind, def.qualified_name.as_str())
            .in_file(path)
            .with_span(def.span);
        if let Some(params) = &def.params {
            node = node.with_property("params", serde_json::json!(params));
        }
        if !def.extends.is_empty() {
            node = node.with_property("extends", serde_json::json!(def.extends));
        }
        if !def.implements.is_empty() {
            node = node.with_property("implements", serde_json::json!(def.implements));
        }
        if !def.decorators.is_empty() {
            node = node.with_property("decorators", serde_json::json!(def.decorators));
        }

        // Duplicate ids (overlapping query captures) are skipped entirely:
        // no second node, edge, or registry entry.
        if !graph.add_node(node) {
            continue;
        }
        stats.nodes_created += 1;
        report.count_definition(kind.as_str());

        if graph.add_relationship(GraphRelationship::new(
            RelKind::Defines,
            file_id.clone(),
            id.clone(),
        )) {
            stats.edges_created += 1;
        }

        registry.add_definition(Definition {
            node_id: id.clone(),
            qualified_name: def.qualified_name.clone(),
            file_path: path.to_string(),
            name: def.name.clone(),
            kind: def.kind,
            start_line: def.span.start_row + 1,
            end_line: def.span.end_row + 1,
        });
        local_ids.insert(def.qualified_name.as_str(), (def, id));
    }

    // Intra-file hierarchy edges, in extraction order so emission stays
    // deterministic. Cross-file inference is deliberately not attempted
    // here; unresolved targets stay as node properties.
    for def in &outline.definitions {
        let Some((_, id)) = local_ids.get(def.qualified_name.as_str()) else {
            continue; // dropped as a duplicate above
        };
        if def.kind == DefKind::Method {
            if let Some(owner) = parent_qualified(&def.qualified_name) {
                if let Some((owner_def, owner_id)) = local_ids.get(owner) {
                    if is_type_like(owner_def.kind)
                        && graph.add_relationship(GraphRelationship::new(
                            RelKind::BelongsTo,
                            id.clone(),
                            owner_id.clone(),
                        ))
                    {
                        stats.edges_created += 1;
                    }
                }
            }
        }
        for (targets, rel_kind) in [
            (&def.extends, RelKind::Extends),
            (&def.implements, RelKind::Implements),
        ] {
            for target in targets {
                let Some((target_def, target_id)) = local_ids.get(target.as_str()) else {
                    continue;
                };
                if is_type_like(target_def.kind)
                    && graph.add_relationship(GraphRelationship::new(
                        rel_kind,
                        id.clone(),
                        target_id.clone(),
                    ))
                {
                    stats.edges_created += 1;
                }
            }
        }
    }

    for import in &outline.imports {
        let id = NodeId::import(path, &import.module, import.span);
        let exposed: Vec<&str> = import.names.iter().map(|n| n.exposed()).collect();
        let mut node = GraphNode::new(id.clone(), NodeKind::Import, import.module.as_str())
            .in_file(path)
            .with_span(import.span)
            .with_property("line", serde_json::json!(import.span.start_row + 1));
        if !exposed.is_empty() {
            node = node.with_property("names", serde_json::json!(exposed));
        }
        if let Some(alias) = &import.alias {
            node = node.with_property("alias", serde_json::json!(alias));
        }
        if import.wildcard {
            node = node.with_property("wildcard", serde_json::json!(true));
        }
        if !graph.add_node(node) {
            continue;
        }
        stats.nodes_created += 1;
        report.count_definition(NodeKind::Import.as_str());
        if graph.add_relationship(GraphRelationship::new(
            RelKind::Defines,
            file_id.clone(),
            id,
        )) {
            stats.edges_created += 1;
        }
    }

    if outline.definitions.is_empty() && outline.imports.is_empty() {
        graph.set_node_property(&file_id, "no_definitions", serde_json::json!(true));
    }
}

/// The qualified name one segment up: `Greeter.greet` → `Greeter`,
/// `config::load` → `config`.
fn parent_qualified(qualified: &str) -> Option<&str> {
    if let Some(idx) = qualified.rfind("::") {
        return Some(&qualified[..idx]);
    }
    qualified.rfind('.').map(|idx| &qualified[..idx])
}

fn is_type_like(kind: DefKind) -> bool {
    matches!(
        kind,
        DefKind::Class | DefKind::Interface | DefKind::Enum | DefKind::Type
    )
}
