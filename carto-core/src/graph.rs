// The knowledge graph container.
//
// Append-only during ingestion: passes add nodes and relationships, nothing
// is ever removed or rewritten. The pipeline owns the graph exclusively while
// it runs and hands it off immutably afterward. Duplicate ids are rejected at
// insert (first writer wins) and counted, which is what makes overlapping
// query captures harmless.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::{GraphNode, GraphRelationship, NodeId, NodeKind, RelId, RelKind};

#[derive(Debug, Default, Serialize)]
pub struct KnowledgeGraph {
    nodes: Vec<GraphNode>,
    relationships: Vec<GraphRelationship>,
    #[serde(skip)]
    node_index: HashMap<NodeId, usize>,
    #[serde(skip)]
    rel_ids: HashSet<RelId>,
    #[serde(skip)]
    duplicate_nodes: u64,
    #[serde(skip)]
    duplicate_relationships: u64,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Returns `false` (and counts the duplicate) if a node
    /// with the same id is already present.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.node_index.contains_key(&node.id) {
            self.duplicate_nodes += 1;
            return false;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Insert a relationship. Duplicate ids are skipped and counted.
    /// Endpoint existence is *not* checked here; that is the integrity
    /// validator's job, so violations surface in diagnostics instead of
    /// being silently dropped at insert time.
    pub fn add_relationship(&mut self, rel: GraphRelationship) -> bool {
        if self.rel_ids.contains(&rel.id) {
            self.duplicate_relationships += 1;
            return false;
        }
        self.rel_ids.insert(rel.id.clone());
        self.relationships.push(rel);
        true
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// Set a property on an existing node.
    pub fn set_node_property(&mut self, id: &NodeId, key: &str, value: serde_json::Value) -> bool {
        if let Some(&i) = self.node_index.get(id) {
            self.nodes[i].properties.insert(key.to_string(), value);
            true
        } else {
            false
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[GraphRelationship] {
        &self.relationships
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn relationships_of_kind(&self, kind: RelKind) -> impl Iterator<Item = &GraphRelationship> {
        self.relationships.iter().filter(move |r| r.kind == kind)
    }

    pub fn duplicate_nodes(&self) -> u64 {
        self.duplicate_nodes
    }

    pub fn duplicate_relationships(&self) -> u64 {
        self.duplicate_relationships
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode::new(NodeId(id.to_string()), NodeKind::File, id)
    }

    #[test]
    fn duplicate_node_ids_are_rejected() {
        let mut g = KnowledgeGraph::new();
        assert!(g.add_node(node("File:a.py")));
        assert!(!g.add_node(node("File:a.py")));
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.duplicate_nodes(), 1);
    }

    #[test]
    fn duplicate_relationship_ids_are_rejected() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("File:a.py"));
        g.add_node(node("File:b.py"));
        let rel = || {
            GraphRelationship::new(
                RelKind::Imports,
                NodeId("File:b.py".into()),
                NodeId("File:a.py".into()),
            )
        };
        assert!(g.add_relationship(rel()));
        assert!(!g.add_relationship(rel()));
        assert_eq!(g.relationship_count(), 1);
        assert_eq!(g.duplicate_relationships(), 1);
    }

    #[test]
    fn set_property_reaches_stored_node() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("File:a.py"));
        let id = NodeId("File:a.py".into());
        assert!(g.set_node_property(&id, "no_definitions", serde_json::json!(true)));
        assert!(g.node(&id).unwrap().flag("no_definitions"));
    }

    #[test]
    fn serializes_nodes_and_relationships_only() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("File:a.py"));
        let json = serde_json::to_value(&g).unwrap();
        assert!(json.get("nodes").is_some());
        assert!(json.get("relationships").is_some());
        assert!(json.get("node_index").is_none());
    }
}
