pub mod adapter;
pub mod languages;

use serde::{Deserialize, Serialize};

pub use adapter::GrammarAdapter;
pub use languages::{LanguageRegistry, LanguageSupport};

/// Error type for the grammar adapter layer.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Query '{query}' failed for {language}: {message}")]
    Query {
        language: String,
        query: String,
        message: String,
    },

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ── Span type ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl From<tree_sitter::Range> for TextRange {
    fn from(r: tree_sitter::Range) -> Self {
        Self {
            start_byte: r.start_byte,
            end_byte: r.end_byte,
            start_row: r.start_point.row,
            start_col: r.start_point.column,
            end_row: r.end_point.row,
            end_col: r.end_point.column,
        }
    }
}

// ── Definition kinds ───────────────────────────────────────────────

/// Classification of an extracted definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefKind {
    Function,
    Method,
    Class,
    Interface,
    Enum,
    Type,
    Variable,
    Decorator,
}

impl DefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Method => "Method",
            Self::Class => "Class",
            Self::Interface => "Interface",
            Self::Enum => "Enum",
            Self::Type => "Type",
            Self::Variable => "Variable",
            Self::Decorator => "Decorator",
        }
    }
}

impl std::fmt::Display for DefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Named queries ──────────────────────────────────────────────────

/// The fixed set of query names every language table draws from.
///
/// Capture-name conventions are shared across languages so the extraction
/// logic stays language-agnostic: `@name` (declared identifier), `@definition`
/// (whole definition node), `@callee` + `@reference` (call sites), `@module`
/// + `@import` (+ optional `@name`/`@alias`/`@wildcard`) for imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    Functions,
    Methods,
    Classes,
    Interfaces,
    Enums,
    Types,
    Variables,
    Decorators,
    Imports,
    Calls,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Functions => "functions",
            Self::Methods => "methods",
            Self::Classes => "classes",
            Self::Interfaces => "interfaces",
            Self::Enums => "enums",
            Self::Types => "types",
            Self::Variables => "variables",
            Self::Decorators => "decorators",
            Self::Imports => "imports",
            Self::Calls => "calls",
        }
    }

    /// The definition kind a match of this query produces, if any.
    /// `Functions` matches may be reclassified as methods when the definition
    /// sits inside a class-like container.
    pub fn def_kind(self) -> Option<DefKind> {
        match self {
            Self::Functions => Some(DefKind::Function),
            Self::Methods => Some(DefKind::Method),
            Self::Classes => Some(DefKind::Class),
            Self::Interfaces => Some(DefKind::Interface),
            Self::Enums => Some(DefKind::Enum),
            Self::Types => Some(DefKind::Type),
            Self::Variables => Some(DefKind::Variable),
            Self::Decorators => Some(DefKind::Decorator),
            Self::Imports | Self::Calls => None,
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a language's fixed query table.
#[derive(Debug, Clone, Copy)]
pub struct NamedQuery {
    pub kind: QueryKind,
    pub source: &'static str,
}

// ── Outline extraction output ──────────────────────────────────────

/// Everything extracted from one parsed file: definitions, call sites, and
/// raw import statements. This is the unit the parse cache stores, so it must
/// be fully deterministic for a given `(path, content)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutline {
    pub file_path: String,
    pub language: String,
    pub definitions: Vec<OutlineDef>,
    pub calls: Vec<OutlineCall>,
    pub imports: Vec<OutlineImport>,
}

impl FileOutline {
    pub fn empty(path: &str, language: &str) -> Self {
        Self {
            file_path: path.to_string(),
            language: language.to_string(),
            definitions: Vec::new(),
            calls: Vec::new(),
            imports: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineDef {
    pub name: String,
    /// Container-qualified name, e.g. `Greeter.greet` or `config::load`.
    pub qualified_name: String,
    pub kind: DefKind,
    pub span: TextRange,
    /// Parameter list text, when the grammar exposes one directly.
    pub params: Option<String>,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub decorators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineCall {
    /// Name at the call site (unqualified).
    pub callee: String,
    /// Receiver/object identifier for qualified calls (`obj.method()`),
    /// when it is a plain identifier.
    pub qualifier: Option<String>,
    pub span: TextRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineImport {
    /// Raw module reference as written (`./util`, `os.path`, `crate::cfg`).
    pub module: String,
    /// Named bindings imported from the module.
    pub names: Vec<ImportedName>,
    /// Local alias for the module binding itself (`import numpy as np`).
    pub alias: Option<String>,
    /// Wildcard import (`from x import *`, `use x::*`).
    pub wildcard: bool,
    pub span: TextRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// The name this import exposes inside the importing file.
    pub fn exposed(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Metadata read off a definition node by the language support.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefMetadata {
    pub params: Option<String>,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub decorators: Vec<String>,
}
