use std::collections::HashMap;

use carto_graphs::{DefKind, TextRange};
use serde::{Deserialize, Serialize};

// ── Identifiers ────────────────────────────────────────────────────

/// Stable node identifier, derived from content rather than emission order:
/// the same `(kind, file path, name, span)` always produces the same id.
/// This is what makes re-ingestion of identical input reproduce an identical
/// graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn project(name: &str) -> Self {
        Self(format!("Project:{name}"))
    }

    pub fn folder(path: &str) -> Self {
        Self(format!("Folder:{path}"))
    }

    pub fn file(path: &str) -> Self {
        Self(format!("File:{path}"))
    }

    pub fn definition(kind: NodeKind, file_path: &str, qualified_name: &str, span: TextRange) -> Self {
        Self(format!(
            "{}:{file_path}:{qualified_name}:{}-{}",
            kind.as_str(),
            span.start_row,
            span.end_row
        ))
    }

    pub fn import(file_path: &str, module: &str, span: TextRange) -> Self {
        Self(format!("Import:{file_path}:{module}:{}", span.start_row))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable relationship identifier, derived from kind and endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelId(pub String);

impl RelId {
    pub fn derive(kind: RelKind, source: &NodeId, target: &NodeId) -> Self {
        Self(format!("{}:{source}->{target}", kind.as_str()))
    }

    /// Variant with a source-row discriminator, for relationships that can
    /// legitimately repeat between the same endpoints (one per call site).
    pub fn derive_at(kind: RelKind, source: &NodeId, target: &NodeId, row: usize) -> Self {
        Self(format!("{}:{source}->{target}@{row}", kind.as_str()))
    }
}

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Node kinds ─────────────────────────────────────────────────────

/// Every entity the knowledge graph tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root of one ingested source tree.
    Project,
    /// A distributable unit inside a project (reserved for manifest-derived
    /// grouping).
    Package,
    /// A logical module grouping (reserved; folders cover the common case).
    Module,
    /// A directory.
    Folder,
    /// A source or non-source file.
    File,
    Class,
    Function,
    Method,
    Variable,
    Interface,
    Enum,
    Decorator,
    /// An import statement extracted from a file.
    Import,
    /// A named type that is not a class/interface/enum (aliases, etc.).
    Type,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Package => "Package",
            Self::Module => "Module",
            Self::Folder => "Folder",
            Self::File => "File",
            Self::Class => "Class",
            Self::Function => "Function",
            Self::Method => "Method",
            Self::Variable => "Variable",
            Self::Interface => "Interface",
            Self::Enum => "Enum",
            Self::Decorator => "Decorator",
            Self::Import => "Import",
            Self::Type => "Type",
        }
    }

    /// The node kind a definition of the given kind maps to.
    pub fn from_def(kind: DefKind) -> Self {
        match kind {
            DefKind::Function => Self::Function,
            DefKind::Method => Self::Method,
            DefKind::Class => Self::Class,
            DefKind::Interface => Self::Interface,
            DefKind::Enum => Self::Enum,
            DefKind::Type => Self::Type,
            DefKind::Variable => Self::Variable,
            DefKind::Decorator => Self::Decorator,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Relationship kinds ─────────────────────────────────────────────

/// Typed relationships between graph nodes. Serialized names match the
/// labels downstream consumers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelKind {
    /// Project → Folder → File containment.
    Contains,
    /// File → definition extracted from it.
    Defines,
    /// Importing file → imported file.
    Imports,
    /// Caller definition → callee definition.
    Calls,
    /// Subtype → supertype.
    Extends,
    /// Type → implemented interface.
    Implements,
    /// Method → owning class.
    BelongsTo,
}

impl RelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "CONTAINS",
            Self::Defines => "DEFINES",
            Self::Imports => "IMPORTS",
            Self::Calls => "CALLS",
            Self::Extends => "EXTENDS",
            Self::Implements => "IMPLEMENTS",
            Self::BelongsTo => "BELONGS_TO",
        }
    }
}

impl std::fmt::Display for RelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Graph elements ─────────────────────────────────────────────────

/// A node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Display name: file path for files, qualified name for definitions.
    pub name: String,
    /// Owning file, when the node belongs to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Source span, when the node has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<TextRange>,
    /// Heuristic metadata (parameter lists, extends targets, flags).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
}

impl GraphNode {
    pub fn new(id: NodeId, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            file_path: None,
            span: None,
            properties: HashMap::new(),
        }
    }

    pub fn in_file(mut self, path: &str) -> Self {
        self.file_path = Some(path.to_string());
        self
    }

    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// A typed, directed relationship between two graph nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub id: RelId,
    pub kind: RelKind,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
}

impl GraphRelationship {
    pub fn new(kind: RelKind, source: NodeId, target: NodeId) -> Self {
        Self {
            id: RelId::derive(kind, &source, &target),
            kind,
            source,
            target,
            properties: HashMap::new(),
        }
    }

    pub fn at_row(kind: RelKind, source: NodeId, target: NodeId, row: usize) -> Self {
        Self {
            id: RelId::derive_at(kind, &source, &target, row),
            kind,
            source,
            target,
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn span(start: usize, end: usize) -> TextRange {
        TextRange {
            start_byte: 0,
            end_byte: 0,
            start_row: start,
            start_col: 0,
            end_row: end,
            end_col: 0,
        }
    }

    #[test]
    fn definition_ids_encode_identity() {
        let a = NodeId::definition(NodeKind::Function, "src/a.py", "foo", span(3, 9));
        let b = NodeId::definition(NodeKind::Function, "src/a.py", "foo", span(3, 9));
        assert_eq!(a, b);

        let moved = NodeId::definition(NodeKind::Function, "src/a.py", "foo", span(4, 10));
        assert_ne!(a, moved);

        let other_kind = NodeId::definition(NodeKind::Variable, "src/a.py", "foo", span(3, 9));
        assert_ne!(a, other_kind);
    }

    #[test]
    fn rel_kind_serializes_screaming() {
        let json = serde_json::to_string(&RelKind::BelongsTo).unwrap();
        assert_eq!(json, "\"BELONGS_TO\"");
    }

    proptest! {
        #[test]
        fn node_ids_are_deterministic(
            path in "[a-z/]{1,20}",
            name in "[a-zA-Z_]{1,12}",
            start in 0usize..5000,
            len in 0usize..200,
        ) {
            let s = span(start, start + len);
            let first = NodeId::definition(NodeKind::Class, &path, &name, s);
            let second = NodeId::definition(NodeKind::Class, &path, &name, s);
            prop_assert_eq!(first, second);
        }
    }
}
