// Language-agnostic extraction over per-language query tables.
//
// A `GrammarAdapter` owns one language's compiled queries. Extraction walks
// every query's matches and reads the shared capture names (`@name`,
// `@definition`, `@callee`, `@reference`, `@module`, ...), so the logic here
// never branches on a concrete language. Language-specific shape lives in the
// query tables and the `LanguageSupport` hooks.

use std::collections::HashSet;
use std::sync::Arc;

use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

use crate::languages::{LanguageSupport, collect_identifiers, node_range, node_text};
use crate::{
    DefKind, FileOutline, GraphError, OutlineCall, OutlineDef, QueryKind, Result, TextRange,
};

// ── Capture map ────────────────────────────────────────────────────

/// Captures of a single query match, keyed by capture name.
pub struct CaptureMap<'a> {
    source: &'a str,
    caps: Vec<(&'a str, Node<'a>)>,
}

impl<'a> CaptureMap<'a> {
    pub(crate) fn from_match(
        query: &'a Query,
        m: &tree_sitter::QueryMatch<'_, 'a>,
        source: &'a str,
    ) -> Self {
        let names = query.capture_names();
        let caps = m
            .captures
            .iter()
            .map(|c| (names[c.index as usize], c.node))
            .collect();
        Self { source, caps }
    }

    /// First captured node under the given name.
    pub fn node(&self, name: &str) -> Option<Node<'a>> {
        self.caps.iter().find(|(n, _)| *n == name).map(|(_, n)| *n)
    }

    /// Source text of the first capture under the given name.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.node(name).map(|n| node_text(n, self.source))
    }

    pub fn span(&self, name: &str) -> Option<TextRange> {
        self.node(name).map(node_range)
    }

    pub fn source(&self) -> &'a str {
        self.source
    }
}

impl std::fmt::Debug for CaptureMap<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.caps.iter().map(|(n, _)| n))
            .finish()
    }
}

// ── Grammar adapter ────────────────────────────────────────────────

/// One language's parse-and-extract surface: grammar plus compiled queries.
///
/// Queries compile once at registry construction; a query that fails to
/// compile is skipped (its contribution is lost, everything else continues)
/// and surfaced through [`GrammarAdapter::query_failures`].
pub struct GrammarAdapter {
    lang: Arc<dyn LanguageSupport>,
    queries: Vec<(QueryKind, Query)>,
    failures: Vec<GraphError>,
}

impl std::fmt::Debug for GrammarAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GrammarAdapter({})", self.lang.id())
    }
}

impl GrammarAdapter {
    pub fn new(lang: Arc<dyn LanguageSupport>) -> Self {
        let grammar = lang.grammar();
        let mut queries = Vec::new();
        let mut failures = Vec::new();
        for nq in lang.queries() {
            match Query::new(&grammar, nq.source) {
                Ok(q) => queries.push((nq.kind, q)),
                Err(e) => {
                    debug!(
                        language = lang.id(),
                        query = %nq.kind,
                        error = %e,
                        "Query failed to compile"
                    );
                    failures.push(GraphError::Query {
                        language: lang.id().to_string(),
                        query: nq.kind.as_str().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Self {
            lang,
            queries,
            failures,
        }
    }

    pub fn id(&self) -> &'static str {
        self.lang.id()
    }

    pub fn support(&self) -> &Arc<dyn LanguageSupport> {
        &self.lang
    }

    pub fn builtin_calls(&self) -> &'static [&'static str] {
        self.lang.builtin_calls()
    }

    /// Queries that failed to compile for this language, if any.
    pub fn query_failures(&self) -> &[GraphError] {
        &self.failures
    }

    /// Parse file content into a concrete syntax tree.
    ///
    /// A tree containing error nodes is a success; only a parser that gives
    /// up entirely (fatal grammar fault or timeout overrun) is an error.
    pub fn parse(&self, content: &str, path: &str, timeout_micros: u64) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.lang.grammar())
            .map_err(|e| GraphError::TreeSitter(e.to_string()))?;
        if timeout_micros > 0 {
            #[allow(deprecated)]
            parser.set_timeout_micros(timeout_micros);
        }
        parser.parse(content, None).ok_or_else(|| GraphError::Parse {
            path: path.to_string(),
            message: "parser produced no tree (timeout or grammar fault)".to_string(),
        })
    }

    /// Run every compiled query over a parsed tree and extract the outline.
    ///
    /// Output is deterministic for a given `(path, content)`: queries run in
    /// table order, matches arrive in tree order, and a per-file duplicate
    /// guard keyed by `(qualified name, start row)` drops overlapping
    /// captures (first query in the table wins).
    pub fn outline(&self, tree: &Tree, source: &str, path: &str) -> FileOutline {
        let mut out = FileOutline::empty(path, self.lang.id());
        let mut seen: HashSet<(String, usize)> = HashSet::new();

        for (qkind, query) in &self.queries {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());
            while let Some(m) = matches.next() {
                let caps = CaptureMap::from_match(query, m, source);
                match qkind {
                    QueryKind::Imports => {
                        if let Some(imp) = self.lang.build_import(&caps) {
                            out.imports.push(imp);
                        }
                    }
                    QueryKind::Calls => {
                        if let Some(call) = extract_call(&caps, source) {
                            out.calls.push(call);
                        }
                    }
                    _ => {
                        if let Some(def) = self.extract_definition(*qkind, &caps, source) {
                            if seen.insert((def.qualified_name.clone(), def.span.start_row)) {
                                out.definitions.push(def);
                            }
                        }
                    }
                }
            }
        }

        out
    }

    fn extract_definition(
        &self,
        qkind: QueryKind,
        caps: &CaptureMap<'_>,
        source: &str,
    ) -> Option<OutlineDef> {
        let name_node = caps.node("name")?;
        let name = definition_name(name_node, source)?;
        let def_node = caps.node("definition").unwrap_or(name_node);

        let mut kind = qkind.def_kind()?;
        if kind == DefKind::Function && self.directly_inside_class(def_node) {
            kind = DefKind::Method;
        }

        let sep = self.lang.separator();
        let context = self.container_context(def_node, source);
        let qualified_name = if context.is_empty() {
            name.clone()
        } else {
            format!("{}{sep}{name}", context.join(sep))
        };

        let meta = self.lang.definition_metadata(def_node, source);
        Some(OutlineDef {
            name,
            qualified_name,
            kind,
            span: node_range(def_node),
            params: meta.params,
            extends: meta.extends,
            implements: meta.implements,
            decorators: meta.decorators,
        })
    }

    /// Qualified-name segments from enclosing containers, outermost first.
    fn container_context(&self, node: Node<'_>, source: &str) -> Vec<String> {
        let containers = self.lang.container_kinds();
        let mut segments = Vec::new();
        let mut current = node.parent();
        while let Some(n) = current {
            if let Some((_, field)) = containers.iter().find(|(k, _)| *k == n.kind()) {
                if let Some(name_node) = n.child_by_field_name(field) {
                    segments.push(node_text(name_node, source).trim().to_string());
                }
            }
            current = n.parent();
        }
        segments.reverse();
        segments
    }

    /// Whether the nearest enclosing container is class-like.
    fn directly_inside_class(&self, node: Node<'_>) -> bool {
        let containers = self.lang.container_kinds();
        let classes = self.lang.class_kinds();
        let mut current = node.parent();
        while let Some(n) = current {
            if classes.contains(&n.kind()) {
                return true;
            }
            if containers.iter().any(|(k, _)| *k == n.kind()) {
                return false;
            }
            current = n.parent();
        }
        false
    }
}

/// Naming strategy for a captured `@name` node.
///
/// Plain identifiers use their text; destructuring patterns join their
/// element names; anonymous, zero-length, and whitespace-only names are
/// rejected (they are not valid definitions).
fn definition_name(node: Node<'_>, source: &str) -> Option<String> {
    const NAMED_KINDS: &[&str] = &[
        "identifier",
        "type_identifier",
        "field_identifier",
        "property_identifier",
        "package_identifier",
        "dotted_name",
        "attribute",
        "scoped_identifier",
        "member_expression",
    ];

    let text = if node.child_count() == 0 || NAMED_KINDS.contains(&node.kind()) {
        node_text(node, source).to_string()
    } else {
        collect_identifiers(node, source).join(",")
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn extract_call(caps: &CaptureMap<'_>, source: &str) -> Option<OutlineCall> {
    let callee_node = caps.node("callee")?;
    let callee = node_text(callee_node, source).trim().to_string();
    if callee.is_empty() {
        return None;
    }
    let reference = caps.node("reference").unwrap_or(callee_node);
    Some(OutlineCall {
        callee,
        qualifier: call_qualifier(reference, source),
        span: node_range(reference),
    })
}

/// Receiver identifier for a qualified call, when it is a plain identifier.
///
/// The receiver lives on the function expression (python `attribute`, js
/// `member_expression`, go `selector_expression`, rust `field_expression`) or
/// on the invocation node itself (java `method_invocation`).
fn call_qualifier(reference: Node<'_>, source: &str) -> Option<String> {
    let holders = [reference.child_by_field_name("function"), Some(reference)];
    for holder in holders.into_iter().flatten() {
        for field in ["object", "operand", "value"] {
            if let Some(obj) = holder.child_by_field_name(field) {
                if obj.child_count() == 0 && obj.kind().ends_with("identifier") {
                    return Some(node_text(obj, source).to_string());
                }
                return None;
            }
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::languages::LanguageRegistry;
    use crate::{DefKind, FileOutline};

    fn outline(lang: &str, path: &str, source: &str) -> FileOutline {
        let reg = LanguageRegistry::new();
        let adapter = reg.get(lang).unwrap();
        let tree = adapter.parse(source, path, 0).unwrap();
        adapter.outline(&tree, source, path)
    }

    #[test]
    fn python_outline_has_defs_calls_imports() {
        let source = "\
import os
from util import helper

def top():
    helper()

class Greeter:
    def greet(self):
        top()
";
        let out = outline("python", "app.py", source);

        let names: Vec<&str> = out.definitions.iter().map(|d| d.name.as_str()).collect();
        assert!(names.contains(&"top"), "got {names:?}");
        assert!(names.contains(&"Greeter"), "got {names:?}");
        assert!(names.contains(&"greet"), "got {names:?}");

        let greet = out.definitions.iter().find(|d| d.name == "greet").unwrap();
        assert_eq!(greet.kind, DefKind::Method);
        assert_eq!(greet.qualified_name, "Greeter.greet");

        assert!(out.imports.iter().any(|i| i.module == "os"));
        assert!(
            out.imports
                .iter()
                .any(|i| i.module == "util" && i.names.iter().any(|n| n.name == "helper"))
        );

        let callees: Vec<&str> = out.calls.iter().map(|c| c.callee.as_str()).collect();
        assert!(callees.contains(&"helper"), "got {callees:?}");
        assert!(callees.contains(&"top"), "got {callees:?}");
    }

    #[test]
    fn python_qualified_call_carries_receiver() {
        let source = "import requests\n\ndef fetch():\n    requests.get('x')\n";
        let out = outline("python", "fetch.py", source);
        let call = out.calls.iter().find(|c| c.callee == "get").unwrap();
        assert_eq!(call.qualifier.as_deref(), Some("requests"));
    }

    #[test]
    fn anonymous_definitions_are_rejected() {
        // A lambda bound to nothing produces no definition.
        let out = outline("python", "anon.py", "sorted([1], key=lambda x: x)\n");
        assert!(
            out.definitions.is_empty(),
            "got {:?}",
            out.definitions
        );
    }

    #[test]
    fn javascript_destructuring_joins_element_names() {
        let source = "const { host, port } = loadConfig();\n";
        let out = outline("javascript", "cfg.js", source);
        let def = out
            .definitions
            .iter()
            .find(|d| d.kind == DefKind::Variable)
            .expect("destructuring should produce a variable definition");
        assert_eq!(def.name, "host,port");
    }

    #[test]
    fn overlapping_captures_produce_one_definition() {
        // An arrow function assigned to a const is matched by both the
        // functions table and the variables table; only one survives.
        let source = "const ship = () => {};\n";
        let out = outline("javascript", "dup.js", source);
        let ships: Vec<_> = out
            .definitions
            .iter()
            .filter(|d| d.name == "ship")
            .collect();
        assert_eq!(ships.len(), 1, "got {ships:?}");
    }

    #[test]
    fn outline_is_deterministic() {
        let source = "def a():\n    b()\n\ndef b():\n    pass\n";
        let first = outline("python", "same.py", source);
        let second = outline("python", "same.py", source);
        assert_eq!(first, second);
    }
}
