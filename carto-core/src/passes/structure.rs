// Structure pass — Project/Folder/File nodes and CONTAINS edges from the
// filtered path list. Runs to completion before parsing begins so every
// DEFINES edge has a File node to attach to.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument};

use crate::error::Result;
use crate::types::{GraphNode, GraphRelationship, NodeId, NodeKind, RelKind};

use super::{IngestContext, Pass, PassStats};

#[derive(Debug)]
pub struct StructurePass;

impl Pass for StructurePass {
    fn name(&self) -> &'static str {
        "structure"
    }

    #[instrument(skip_all, name = "structure_pass")]
    fn run(&self, ctx: &mut IngestContext<'_>) -> Result<PassStats> {
        let start = Instant::now();
        let mut stats = PassStats::default();
        ctx.progress
            .begin_pass("structure", Some(ctx.files.len() as u64));

        let project_name = ctx
            .options
            .project_name
            .clone()
            .unwrap_or_else(|| "project".to_string());
        let project_id = NodeId::project(&project_name);
        if ctx.graph.add_node(GraphNode::new(
            project_id.clone(),
            NodeKind::Project,
            &project_name,
        )) {
            stats.nodes_created += 1;
        }

        let mut seen_folders: HashSet<String> = HashSet::new();

        for path in ctx.files {
            ctx.registry.register_file(path);

            // Folder chain from the project root down to the file's parent.
            let mut parent_id = project_id.clone();
            let components: Vec<&str> = path.split('/').collect();
            let mut prefix = String::new();
            for dir in &components[..components.len().saturating_sub(1)] {
                if prefix.is_empty() {
                    prefix.push_str(dir);
                } else {
                    prefix.push('/');
                    prefix.push_str(dir);
                }
                let folder_id = NodeId::folder(&prefix);
                if seen_folders.insert(prefix.clone()) {
                    let node = GraphNode::new(folder_id.clone(), NodeKind::Folder, *dir)
                        .with_property("path", serde_json::json!(prefix));
                    if ctx.graph.add_node(node) {
                        stats.nodes_created += 1;
                    }
                    if ctx.graph.add_relationship(GraphRelationship::new(
                        RelKind::Contains,
                        parent_id.clone(),
                        folder_id.clone(),
                    )) {
                        stats.edges_created += 1;
                    }
                }
                parent_id = folder_id;
            }

            let file_id = NodeId::file(path);
            let size = ctx.tree.file_contents.get(path).map_or(0, String::len);
            let mut node = GraphNode::new(file_id.clone(), NodeKind::File, path.as_str())
                .in_file(path)
                .with_property("size_bytes", serde_json::json!(size));
            if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
                node = node.with_property("extension", serde_json::json!(ext));
            }
            if let Some(adapter) = ctx.languages.for_file(Path::new(path)) {
                node = node.with_property("language", serde_json::json!(adapter.id()));
            }
            if ctx.graph.add_node(node) {
                stats.nodes_created += 1;
            }
            if ctx.graph.add_relationship(GraphRelationship::new(
                RelKind::Contains,
                parent_id,
                file_id,
            )) {
                stats.edges_created += 1;
            }
            ctx.progress.advance(1);
        }

        ctx.progress.end_pass();
        stats.duration = start.elapsed();
        info!(
            nodes = stats.nodes_created,
            edges = stats.edges_created,
            "Structure pass complete"
        );
        Ok(stats)
    }
}
