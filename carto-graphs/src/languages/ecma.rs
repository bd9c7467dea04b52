// Query fragments and import plumbing shared by JavaScript and TypeScript.
//
// The two grammars agree on every node kind used here (function_declaration,
// method_definition, lexical_declaration, import_statement, call_expression,
// member_expression), so the tables live in one place and each language adds
// its own type-level declarations on top.

use tree_sitter::Node;

use crate::adapter::CaptureMap;
use crate::languages::{child_by_field, collect_identifiers, find_child_by_kind, node_text, strip_quotes};
use crate::{DefMetadata, ImportedName, OutlineImport};

pub(crate) const FUNCTIONS: &str = r"
(function_declaration name: (identifier) @name) @definition
(generator_function_declaration name: (identifier) @name) @definition
(method_definition name: (property_identifier) @name) @definition
(lexical_declaration (variable_declarator name: (identifier) @name value: (arrow_function)) @definition)
";

pub(crate) const VARIABLES: &str = r"
(lexical_declaration (variable_declarator name: (identifier) @name) @definition)
(variable_declaration (variable_declarator name: (identifier) @name) @definition)
(lexical_declaration (variable_declarator name: (object_pattern) @name) @definition)
(lexical_declaration (variable_declarator name: (array_pattern) @name) @definition)
";

pub(crate) const DECORATORS: &str = r"
(decorator (identifier) @name) @definition
(decorator (member_expression) @name) @definition
(decorator (call_expression function: (identifier) @name)) @definition
(decorator (call_expression function: (member_expression) @name)) @definition
";

pub(crate) const IMPORTS: &str = r#"
(import_statement) @import
(variable_declarator
  name: (_) @name
  value: (call_expression
    function: (identifier) @require_fn
    arguments: (arguments (string) @module_string))) @import
"#;

pub(crate) const CALLS: &str = r"
(call_expression function: (identifier) @callee) @reference
(call_expression function: (member_expression property: (property_identifier) @callee)) @reference
";

pub(crate) const CONTAINERS: &[(&str, &str)] = &[
    ("class_declaration", "name"),
    ("function_declaration", "name"),
    ("method_definition", "name"),
];

pub(crate) const CLASS_KINDS: &[&str] = &["class_declaration"];

pub(crate) const BUILTIN_CALLS: &[&str] = &[
    // console + globals
    "log", "warn", "error", "info", "debug", "trace", "assert", "require", "parseInt",
    "parseFloat", "isNaN", "isFinite", "String", "Number", "Boolean", "Array", "Object",
    "Symbol", "Error", "Promise", "setTimeout", "setInterval", "clearTimeout", "clearInterval",
    "queueMicrotask", "structuredClone", "fetch", "alert", "decodeURIComponent",
    "encodeURIComponent",
    // Array / iterable
    "push", "pop", "shift", "unshift", "slice", "splice", "concat", "join", "map", "filter",
    "reduce", "reduceRight", "forEach", "find", "findIndex", "some", "every", "includes",
    "indexOf", "lastIndexOf", "keys", "values", "entries", "sort", "reverse", "flat",
    "flatMap", "fill", "from", "isArray",
    // String
    "split", "replace", "replaceAll", "trim", "trimStart", "trimEnd", "toLowerCase",
    "toUpperCase", "charAt", "charCodeAt", "codePointAt", "substring", "substr",
    "startsWith", "endsWith", "padStart", "padEnd", "repeat", "match", "matchAll", "search",
    "localeCompare",
    // Object / JSON / number
    "toString", "valueOf", "hasOwnProperty", "toFixed", "toPrecision", "stringify", "parse",
    "assign", "freeze", "create", "defineProperty", "getOwnPropertyNames",
    // Map / Set
    "has", "get", "set", "add", "delete", "clear",
    // Promise / function
    "then", "catch", "finally", "resolve", "reject", "all", "allSettled", "race", "any",
    "bind", "call", "apply",
];

/// Build an import from one ECMAScript `imports` match.
///
/// `import_statement` matches are walked for their clause shape (default,
/// namespace, named specifiers); `require()` declarators are accepted only
/// when the called identifier is literally `require`.
pub(crate) fn build_import(caps: &CaptureMap<'_>) -> Option<OutlineImport> {
    let source = caps.source();
    let import_node = caps.node("import")?;

    if let Some(require_fn) = caps.node("require_fn") {
        if node_text(require_fn, source) != "require" {
            return None;
        }
        let module = strip_quotes(caps.text("module_string")?).to_string();
        let binding = caps.node("name")?;
        let names = if binding.kind() == "identifier" {
            vec![ImportedName::plain(node_text(binding, source))]
        } else {
            collect_identifiers(binding, source)
                .into_iter()
                .map(ImportedName::plain)
                .collect()
        };
        return Some(OutlineImport {
            module,
            names,
            alias: None,
            wildcard: false,
            span: crate::languages::node_range(import_node),
        });
    }

    // Plain `import ... from '...'` statement.
    let source_node = child_by_field(import_node, "source")?;
    let module = strip_quotes(node_text(source_node, source)).to_string();

    let mut names = Vec::new();
    let mut alias = None;
    if let Some(clause) = find_child_by_kind(import_node, "import_clause") {
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                // Default import binds the module's default export to a
                // local name; assume the local name matches the export.
                "identifier" => names.push(ImportedName::plain(node_text(child, source))),
                "namespace_import" => {
                    alias = find_child_by_kind(child, "identifier")
                        .map(|n| node_text(n, source).to_string());
                }
                "named_imports" => {
                    let mut inner = child.walk();
                    for spec in child.children(&mut inner) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name_node) = child_by_field(spec, "name") else {
                            continue;
                        };
                        names.push(ImportedName {
                            name: node_text(name_node, source).to_string(),
                            alias: child_by_field(spec, "alias")
                                .map(|n| node_text(n, source).to_string()),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Some(OutlineImport {
        module,
        names,
        alias,
        wildcard: false,
        span: crate::languages::node_range(import_node),
    })
}

/// Shared metadata reader: parameter list plus class heritage.
///
/// JS puts the extended expression directly under `class_heritage`; TS nests
/// `extends_clause` / `implements_clause` inside it. Both shapes are handled.
pub(crate) fn definition_metadata(node: Node<'_>, source: &str) -> DefMetadata {
    let mut meta = DefMetadata::default();
    if let Some(params) = child_by_field(node, "parameters") {
        meta.params = Some(node_text(params, source).to_string());
    }
    let Some(heritage) = find_child_by_kind(node, "class_heritage") else {
        return meta;
    };
    let mut cursor = heritage.walk();
    for child in heritage.children(&mut cursor) {
        if !child.is_named() {
            continue;
        }
        match child.kind() {
            "extends_clause" => push_named_children(child, source, &mut meta.extends),
            "implements_clause" => push_named_children(child, source, &mut meta.implements),
            _ => meta.extends.push(node_text(child, source).to_string()),
        }
    }
    meta
}

fn push_named_children(node: Node<'_>, source: &str, out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_named() {
            out.push(node_text(child, source).to_string());
        }
    }
}
