use tree_sitter::Node;

use crate::adapter::CaptureMap;
use crate::{DefMetadata, ImportedName, NamedQuery, OutlineImport, QueryKind};

use super::LanguageSupport;
use super::helpers::{child_by_field, find_child_by_kind, node_text};

static QUERIES: &[NamedQuery] = &[
    NamedQuery {
        kind: QueryKind::Methods,
        source: r"
(method_declaration name: (identifier) @name) @definition
(constructor_declaration name: (identifier) @name) @definition
",
    },
    NamedQuery {
        kind: QueryKind::Classes,
        source: "(class_declaration name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Interfaces,
        source: "(interface_declaration name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Enums,
        source: "(enum_declaration name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Variables,
        source: "(field_declaration declarator: (variable_declarator name: (identifier) @name)) @definition",
    },
    NamedQuery {
        kind: QueryKind::Decorators,
        source: r"
(marker_annotation name: (identifier) @name) @definition
(annotation name: (identifier) @name) @definition
",
    },
    NamedQuery {
        kind: QueryKind::Imports,
        source: "(import_declaration) @import",
    },
    NamedQuery {
        kind: QueryKind::Calls,
        source: r"
(method_invocation name: (identifier) @callee) @reference
(object_creation_expression type: (type_identifier) @callee) @reference
",
    },
];

static BUILTIN_CALLS: &[&str] = &[
    // Object / String
    "println", "printf", "print", "format", "valueOf", "equals", "hashCode", "toString",
    "getClass", "clone", "length", "charAt", "substring", "indexOf", "lastIndexOf",
    "contains", "startsWith", "endsWith", "replace", "replaceAll", "split", "trim", "strip",
    "toLowerCase", "toUpperCase", "isEmpty", "isBlank", "matches", "concat", "compareTo",
    "parseInt", "parseLong", "parseDouble", "parseBoolean", "join", "chars",
    // collections
    "size", "add", "addAll", "remove", "removeAll", "get", "put", "putAll", "putIfAbsent",
    "set", "clear", "containsKey", "containsValue", "keySet", "entrySet", "getKey",
    "getValue", "getOrDefault", "iterator", "hasNext", "next", "toArray", "asList", "sort",
    "of", "copyOf", "stream", "forEach",
    // streams
    "map", "filter", "collect", "reduce", "flatMap", "distinct", "sorted", "limit", "skip",
    "count", "findFirst", "findAny", "anyMatch", "allMatch", "toList", "orElse",
    "orElseThrow", "ifPresent",
    // misc
    "requireNonNull", "currentTimeMillis", "nanoTime", "getProperty", "getenv", "emptyList",
    "singletonList", "unmodifiableList", "max", "min", "abs", "append",
];

#[derive(Debug)]
pub struct JavaSupport;

impl LanguageSupport for JavaSupport {
    fn id(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn queries(&self) -> &'static [NamedQuery] {
        QUERIES
    }

    fn builtin_calls(&self) -> &'static [&'static str] {
        BUILTIN_CALLS
    }

    fn container_kinds(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("class_declaration", "name"),
            ("interface_declaration", "name"),
            ("enum_declaration", "name"),
            ("method_declaration", "name"),
        ]
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &[
            "class_declaration",
            "interface_declaration",
            "enum_declaration",
        ]
    }

    fn build_import(&self, caps: &CaptureMap<'_>) -> Option<OutlineImport> {
        let decl = caps.node("import")?;
        let source = caps.source();
        let path_node = find_child_by_kind(decl, "scoped_identifier")
            .or_else(|| find_child_by_kind(decl, "identifier"))?;
        let module = node_text(path_node, source).to_string();
        let wildcard = find_child_by_kind(decl, "asterisk").is_some();

        // `import java.util.List` binds the simple name List.
        let names = if wildcard {
            Vec::new()
        } else {
            let leaf = module.rsplit('.').next().unwrap_or(&module);
            vec![ImportedName::plain(leaf)]
        };

        Some(OutlineImport {
            module,
            names,
            alias: None,
            wildcard,
            span: super::node_range(decl),
        })
    }

    fn definition_metadata(&self, node: Node<'_>, source: &str) -> DefMetadata {
        let mut meta = DefMetadata::default();
        if let Some(params) = child_by_field(node, "parameters") {
            meta.params = Some(node_text(params, source).to_string());
        }
        // class A extends B
        if let Some(superclass) = child_by_field(node, "superclass") {
            let mut cursor = superclass.walk();
            for child in superclass.children(&mut cursor) {
                if child.is_named() {
                    meta.extends.push(node_text(child, source).to_string());
                }
            }
        }
        // class A implements X, Y — the `interfaces` field wraps a type_list.
        if let Some(interfaces) = child_by_field(node, "interfaces") {
            if let Some(list) = find_child_by_kind(interfaces, "type_list") {
                let mut cursor = list.walk();
                for child in list.children(&mut cursor) {
                    if child.is_named() {
                        meta.implements.push(node_text(child, source).to_string());
                    }
                }
            }
        }
        meta
    }
}
