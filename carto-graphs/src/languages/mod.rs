mod ecma;
pub mod go;
mod helpers;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tree_sitter::Node;

use crate::adapter::{CaptureMap, GrammarAdapter};
use crate::{DefMetadata, ImportedName, NamedQuery, OutlineImport};

pub use helpers::{
    child_by_field, collect_identifiers, find_child_by_kind, hash_string, node_range, node_text,
    strip_quotes,
};

/// Trait implemented by each language's extraction support.
///
/// A language contributes a tree-sitter grammar, a fixed table of named
/// queries (shared capture-name conventions, see [`crate::QueryKind`]), and a
/// handful of policy hooks: which calls are built-ins, which node kinds form
/// qualified-name containers, and how import statements decompose.
pub trait LanguageSupport: Send + Sync + std::fmt::Debug {
    /// Language identifier (e.g., "rust", "python").
    fn id(&self) -> &'static str;

    /// File extensions this language handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Tree-sitter grammar for parsing.
    fn grammar(&self) -> tree_sitter::Language;

    /// The fixed query table for this language.
    fn queries(&self) -> &'static [NamedQuery];

    /// Curated allow-list of standard-library and framework call names that
    /// call resolution suppresses instead of reporting as unresolved.
    fn builtin_calls(&self) -> &'static [&'static str];

    /// `(node kind, name field)` pairs whose names contribute qualified-name
    /// segments for definitions nested inside them.
    fn container_kinds(&self) -> &'static [(&'static str, &'static str)];

    /// Node kinds whose directly contained functions are methods.
    fn class_kinds(&self) -> &'static [&'static str];

    /// Separator joining qualified-name segments.
    fn separator(&self) -> &'static str {
        "."
    }

    /// Build an import from one `imports` query match. The default reads the
    /// shared `@module` / `@name` / `@alias` / `@wildcard` captures; languages
    /// whose import grammar needs walking override this.
    fn build_import(&self, caps: &CaptureMap<'_>) -> Option<OutlineImport> {
        default_import(caps)
    }

    /// Read metadata off a captured definition node. The default pulls the
    /// `parameters` field when present.
    fn definition_metadata(&self, node: Node<'_>, source: &str) -> DefMetadata {
        let mut meta = DefMetadata::default();
        if let Some(params) = child_by_field(node, "parameters") {
            meta.params = Some(node_text(params, source).to_string());
        }
        meta
    }
}

/// Default import builder over the shared capture conventions.
pub(crate) fn default_import(caps: &CaptureMap<'_>) -> Option<OutlineImport> {
    let module = caps.text("module")?.to_string();
    let mut names = Vec::new();
    if let Some(name) = caps.text("name") {
        names.push(ImportedName {
            name: name.to_string(),
            alias: caps.text("alias").map(str::to_string),
        });
    }
    // A module-level alias only applies when no named binding consumed it.
    let alias = if names.is_empty() {
        caps.text("alias").map(str::to_string)
    } else {
        None
    };
    Some(OutlineImport {
        module,
        names,
        alias,
        wildcard: caps.node("wildcard").is_some(),
        span: caps.span("import").or_else(|| caps.span("module"))?,
    })
}

/// Registry of all supported languages, with queries compiled once.
#[derive(Debug)]
pub struct LanguageRegistry {
    adapters: HashMap<String, Arc<GrammarAdapter>>,
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            adapters: HashMap::new(),
            extension_map: HashMap::new(),
        };
        reg.register(Arc::new(rust::RustSupport));
        reg.register(Arc::new(python::PythonSupport));
        reg.register(Arc::new(typescript::TypeScriptSupport));
        reg.register(Arc::new(javascript::JavaScriptSupport));
        reg.register(Arc::new(go::GoSupport));
        reg.register(Arc::new(java::JavaSupport));
        reg
    }

    fn register(&mut self, lang: Arc<dyn LanguageSupport>) {
        for ext in lang.extensions() {
            self.extension_map
                .insert((*ext).to_string(), lang.id().to_string());
        }
        let adapter = Arc::new(GrammarAdapter::new(lang.clone()));
        self.adapters.insert(lang.id().to_string(), adapter);
    }

    /// Look up the grammar adapter for a file by its extension.
    pub fn for_file(&self, path: &Path) -> Option<Arc<GrammarAdapter>> {
        let ext = path.extension()?.to_str()?;
        let lang_id = self.extension_map.get(ext)?;
        self.adapters.get(lang_id).cloned()
    }

    /// Get an adapter by its language identifier.
    pub fn get(&self, id: &str) -> Option<Arc<GrammarAdapter>> {
        self.adapters.get(id).cloned()
    }

    /// Like [`Self::get`], for callers that treat an unregistered language
    /// as an error instead of falling back.
    pub fn require(&self, id: &str) -> crate::Result<Arc<GrammarAdapter>> {
        self.get(id)
            .ok_or_else(|| crate::GraphError::UnsupportedLanguage(id.to_string()))
    }

    /// List all registered language IDs.
    pub fn language_ids(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// Whether an extension maps to a supported language.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.extension_map.contains_key(ext)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_maps_extensions() {
        let reg = LanguageRegistry::new();
        assert_eq!(reg.for_file(Path::new("main.rs")).unwrap().id(), "rust");
        assert_eq!(reg.for_file(Path::new("app.py")).unwrap().id(), "python");
        assert_eq!(
            reg.for_file(Path::new("web/app.tsx")).unwrap().id(),
            "typescript"
        );
        assert!(reg.for_file(Path::new("notes.txt")).is_none());
        assert!(reg.for_file(Path::new("Makefile")).is_none());
    }

    #[test]
    fn unregistered_language_is_an_error() {
        let reg = LanguageRegistry::new();
        let err = reg.require("cobol").unwrap_err();
        assert!(matches!(
            err,
            crate::GraphError::UnsupportedLanguage(ref id) if id == "cobol"
        ));
    }

    #[test]
    fn all_query_tables_compile() {
        let reg = LanguageRegistry::new();
        for id in reg.language_ids() {
            let adapter = reg.get(id).unwrap();
            assert!(
                adapter.query_failures().is_empty(),
                "{id} query table failed to compile: {:?}",
                adapter.query_failures()
            );
        }
    }
}
