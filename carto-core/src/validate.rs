// Graph integrity validator — runs once after all passes, never fails the
// pipeline. One sweep over relationships and one over nodes; no repeated
// traversals.
//
// Violations indicate a pipeline bug and are surfaced for operator
// attention, never auto-fixed.

use std::collections::HashSet;

use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::diagnostics::IntegrityReport;
use crate::graph::KnowledgeGraph;
use crate::types::{NodeId, NodeKind};

pub fn validate(graph: &KnowledgeGraph) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    // Adjacency projection over node ids. Relationships with a missing
    // endpoint are recorded and excluded from the projection.
    let mut adjacency: DiGraphMap<&str, ()> = DiGraphMap::new();
    for node in graph.nodes() {
        adjacency.add_node(node.id.0.as_str());
    }

    let mut defines_sources: HashSet<&NodeId> = HashSet::new();
    for rel in graph.relationships() {
        let source_ok = graph.contains_node(&rel.source);
        let target_ok = graph.contains_node(&rel.target);
        if source_ok && target_ok {
            adjacency.add_edge(rel.source.0.as_str(), rel.target.0.as_str(), ());
        } else {
            warn!(relationship = %rel.id, "Relationship endpoint missing");
            report.missing_endpoints.push(rel.id.0.clone());
        }
        if rel.kind == crate::types::RelKind::Defines {
            defines_sources.insert(&rel.source);
        }
    }

    for node in graph.nodes() {
        let isolated = adjacency
            .neighbors_directed(node.id.0.as_str(), Direction::Outgoing)
            .next()
            .is_none()
            && adjacency
                .neighbors_directed(node.id.0.as_str(), Direction::Incoming)
                .next()
                .is_none();
        if isolated {
            *report
                .isolated_nodes
                .entry(node.kind.as_str().to_string())
                .or_insert(0) += 1;
        }

        // A parsed source file must either define something or carry the
        // explicit no-definitions flag (expected for pure-config/doc files).
        if node.kind == NodeKind::File
            && node.flag("parsed")
            && !node.flag("no_definitions")
            && !defines_sources.contains(&node.id)
        {
            report.unflagged_files.push(node.id.0.clone());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphNode, GraphRelationship, RelKind};

    fn file_node(path: &str) -> GraphNode {
        GraphNode::new(NodeId::file(path), NodeKind::File, path)
    }

    #[test]
    fn clean_graph_validates_clean() {
        let mut g = KnowledgeGraph::new();
        g.add_node(file_node("a.py"));
        g.add_node(file_node("b.py"));
        g.add_relationship(GraphRelationship::new(
            RelKind::Imports,
            NodeId::file("b.py"),
            NodeId::file("a.py"),
        ));

        let report = validate(&g);
        assert!(report.is_clean());
        assert!(report.missing_endpoints.is_empty());
    }

    #[test]
    fn dangling_endpoint_is_reported() {
        let mut g = KnowledgeGraph::new();
        g.add_node(file_node("a.py"));
        g.add_relationship(GraphRelationship::new(
            RelKind::Imports,
            NodeId::file("a.py"),
            NodeId::file("ghost.py"),
        ));

        let report = validate(&g);
        assert_eq!(report.missing_endpoints.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn isolated_nodes_counted_by_label() {
        let mut g = KnowledgeGraph::new();
        g.add_node(file_node("a.py"));
        g.add_node(file_node("b.py"));
        g.add_node(GraphNode::new(
            NodeId::project("p"),
            NodeKind::Project,
            "p",
        ));
        g.add_relationship(GraphRelationship::new(
            RelKind::Contains,
            NodeId::project("p"),
            NodeId::file("a.py"),
        ));

        let report = validate(&g);
        assert_eq!(report.isolated_nodes.get("File"), Some(&1));
        assert!(report.isolated_nodes.get("Project").is_none());
    }

    #[test]
    fn parsed_file_without_defines_needs_flag() {
        let mut g = KnowledgeGraph::new();
        let mut unflagged = file_node("a.py");
        unflagged
            .properties
            .insert("parsed".into(), serde_json::json!(true));
        g.add_node(unflagged);

        let mut flagged = file_node("b.py");
        flagged
            .properties
            .insert("parsed".into(), serde_json::json!(true));
        flagged
            .properties
            .insert("no_definitions".into(), serde_json::json!(true));
        g.add_node(flagged);

        let report = validate(&g);
        assert_eq!(report.unflagged_files, vec![NodeId::file("a.py").0]);
    }
}
