// Call resolution pass — classifies every extracted call site and emits
// CALLS edges for the ones that resolve.
//
// Per call site, first match wins:
//   1. built-in filter (curated per-language allow-list; no edge, no failure),
//   2. import-based resolution (exposed names and module bindings, aliases
//      respected),
//   3. local resolution (same-file definition by name),
//   4. unresolved — recorded with caller location and attempted name. This
//      is a legitimate outcome, not a pipeline defect.

use std::time::Instant;

use tracing::{info, instrument};

use carto_graphs::OutlineCall;

use crate::diagnostics::UnresolvedCall;
use crate::error::Result;
use crate::registry::{Definition, DefinitionRegistry};
use crate::types::{GraphRelationship, NodeId, RelKind};

use super::imports::ResolvedImport;
use super::{IngestContext, Pass, PassStats};

#[derive(Debug)]
pub struct CallPass;

impl Pass for CallPass {
    fn name(&self) -> &'static str {
        "calls"
    }

    #[instrument(skip_all, name = "call_pass")]
    fn run(&self, ctx: &mut IngestContext<'_>) -> Result<PassStats> {
        let start = Instant::now();
        let mut stats = PassStats::default();
        ctx.progress
            .begin_pass("calls", Some(ctx.outlines.len() as u64));

        let outlines = &ctx.outlines;
        let registry = &ctx.registry;
        let import_map = &ctx.import_map;
        let graph = &mut ctx.graph;
        let report = &mut ctx.report;

        for (path, outline) in outlines {
            let builtins = ctx
                .languages
                .get(&outline.language)
                .map(|a| a.builtin_calls())
                .unwrap_or(&[]);
            let file_defs = registry.definitions_in_file(path);

            for call in &outline.calls {
                let line = call.span.start_row + 1;

                if builtins.contains(&call.callee.as_str()) {
                    report.call_resolution.builtin_ignored += 1;
                    continue;
                }

                let resolved = resolve_via_imports(call, import_map.entries(path), registry)
                    .or_else(|| resolve_locally(call, &file_defs));

                let (caller_id, caller_name) = enclosing_definition(&file_defs, line)
                    .map_or_else(
                        || (NodeId::file(path), path.clone()),
                        |d| (d.node_id.clone(), d.qualified_name.clone()),
                    );

                match resolved {
                    Some((target, call_type, confidence)) => {
                        let edge = GraphRelationship::at_row(
                            RelKind::Calls,
                            caller_id,
                            target.node_id.clone(),
                            call.span.start_row,
                        )
                        .with_property("call_type", serde_json::json!(call_type))
                        .with_property("callee", serde_json::json!(call.callee))
                        .with_property("line", serde_json::json!(line))
                        .with_property("confidence", serde_json::json!(confidence));
                        if graph.add_relationship(edge) {
                            stats.edges_created += 1;
                        }
                        if call_type == "ImportResolved" {
                            report.call_resolution.import_resolved += 1;
                        } else {
                            report.call_resolution.local_resolved += 1;
                        }
                    }
                    None => {
                        report.call_resolution.unresolved += 1;
                        report.unresolved_calls.push(UnresolvedCall {
                            file_path: path.clone(),
                            caller: caller_name,
                            callee: call.callee.clone(),
                            line,
                        });
                    }
                }
            }
            ctx.progress.advance(1);
        }

        ctx.progress.end_pass();
        stats.duration = start.elapsed();
        info!(
            import_resolved = ctx.report.call_resolution.import_resolved,
            local_resolved = ctx.report.call_resolution.local_resolved,
            builtin_ignored = ctx.report.call_resolution.builtin_ignored,
            unresolved = ctx.report.call_resolution.unresolved,
            "Call pass complete"
        );
        Ok(stats)
    }
}

/// Stage 2: the enclosing file has a resolved import exposing the called
/// name, or the call's receiver matches an imported module binding.
fn resolve_via_imports<'r>(
    call: &OutlineCall,
    imports: &[ResolvedImport],
    registry: &'r DefinitionRegistry,
) -> Option<(&'r Definition, &'static str, f64)> {
    for entry in imports {
        for (exposed, original) in &entry.exposed {
            if *exposed == call.callee {
                if let Some(def) = registry
                    .find_by_name_in_file(&entry.target_path, original)
                    .into_iter()
                    .next()
                {
                    return Some((def, "ImportResolved", entry.confidence));
                }
            }
        }
        if let (Some(qualifier), Some(binding)) = (&call.qualifier, &entry.module_binding) {
            if qualifier == binding {
                if let Some(def) = registry
                    .find_by_name_in_file(&entry.target_path, &call.callee)
                    .into_iter()
                    .next()
                {
                    return Some((def, "ImportResolved", entry.confidence));
                }
            }
        }
    }
    None
}

/// Stage 3: a same-file definition with the matching name.
fn resolve_locally<'r>(
    call: &OutlineCall,
    file_defs: &[&'r Definition],
) -> Option<(&'r Definition, &'static str, f64)> {
    file_defs
        .iter()
        .find(|d| d.name == call.callee)
        .map(|d| (*d, "LocalResolved", 1.0))
}

/// The smallest definition whose line range contains the call site.
fn enclosing_definition<'r>(file_defs: &[&'r Definition], line: usize) -> Option<&'r Definition> {
    file_defs
        .iter()
        .filter(|d| d.start_line <= line && line <= d.end_line)
        .min_by_key(|d| d.end_line - d.start_line)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_graphs::DefKind;
    use crate::types::NodeKind;

    fn def(file: &str, name: &str, start: usize, end: usize) -> Definition {
        let span = carto_graphs::TextRange {
            start_byte: 0,
            end_byte: 0,
            start_row: start.saturating_sub(1),
            start_col: 0,
            end_row: end.saturating_sub(1),
            end_col: 0,
        };
        Definition {
            node_id: NodeId::definition(NodeKind::Function, file, name, span),
            qualified_name: name.to_string(),
            file_path: file.to_string(),
            name: name.to_string(),
            kind: DefKind::Function,
            start_line: start,
            end_line: end,
        }
    }

    #[test]
    fn enclosing_definition_picks_smallest_span() {
        let outer = def("a.py", "outer", 1, 20);
        let inner = def("a.py", "inner", 5, 10);
        let defs = vec![&outer, &inner];

        assert_eq!(enclosing_definition(&defs, 7).unwrap().name, "inner");
        assert_eq!(enclosing_definition(&defs, 15).unwrap().name, "outer");
        assert!(enclosing_definition(&defs, 30).is_none());
    }

    #[test]
    fn local_resolution_matches_by_name() {
        let helper = def("a.py", "helper", 1, 3);
        let defs = vec![&helper];
        let call = OutlineCall {
            callee: "helper".into(),
            qualifier: None,
            span: carto_graphs::TextRange {
                start_byte: 0,
                end_byte: 0,
                start_row: 5,
                start_col: 0,
                end_row: 5,
                end_col: 8,
            },
        };
        let (resolved, call_type, _) = resolve_locally(&call, &defs).unwrap();
        assert_eq!(resolved.name, "helper");
        assert_eq!(call_type, "LocalResolved");

        let miss = OutlineCall {
            callee: "absent".into(),
            ..call
        };
        assert!(resolve_locally(&miss, &defs).is_none());
    }
}
