use crate::adapter::CaptureMap;
use crate::{ImportedName, NamedQuery, OutlineImport, QueryKind};

use super::LanguageSupport;

static QUERIES: &[NamedQuery] = &[
    NamedQuery {
        kind: QueryKind::Functions,
        source: "(function_item name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Classes,
        source: r"
(struct_item name: (type_identifier) @name) @definition
(union_item name: (type_identifier) @name) @definition
",
    },
    NamedQuery {
        kind: QueryKind::Enums,
        source: "(enum_item name: (type_identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Interfaces,
        source: "(trait_item name: (type_identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Types,
        source: "(type_item name: (type_identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Variables,
        source: r"
(const_item name: (identifier) @name) @definition
(static_item name: (identifier) @name) @definition
",
    },
    NamedQuery {
        kind: QueryKind::Imports,
        source: "(use_declaration argument: (_) @module) @import",
    },
    NamedQuery {
        kind: QueryKind::Calls,
        source: r"
(call_expression function: (identifier) @callee) @reference
(call_expression function: (scoped_identifier name: (identifier) @callee)) @reference
(call_expression function: (field_expression field: (field_identifier) @callee)) @reference
",
    },
];

/// Ubiquitous std trait/collection methods. Suppressing them keeps the
/// unresolved tally focused on project symbols.
static BUILTIN_CALLS: &[&str] = &[
    // conversions and cloning
    "clone", "to_string", "to_owned", "into", "from", "try_from", "try_into", "as_ref",
    "as_mut", "borrow", "borrow_mut", "to_vec", "as_str", "as_bytes", "as_slice", "as_deref",
    // Option / Result
    "unwrap", "unwrap_or", "unwrap_or_else", "unwrap_or_default", "expect", "ok", "err",
    "is_some", "is_none", "is_ok", "is_err", "map_err", "and_then", "or_else", "ok_or",
    "ok_or_else", "take", "replace", "as_mut_ref",
    // iterators
    "iter", "iter_mut", "into_iter", "collect", "map", "filter", "filter_map", "flat_map",
    "flatten", "fold", "for_each", "enumerate", "zip", "rev", "skip", "chain", "find",
    "position", "any", "all", "count", "sum", "product", "last", "next", "peekable",
    "cloned", "copied", "max_by", "min_by", "max_by_key", "min_by_key", "partition",
    // collections and strings
    "push", "pop", "insert", "remove", "get", "get_mut", "contains", "contains_key", "len",
    "is_empty", "clear", "extend", "entry", "or_insert", "or_default", "retain", "drain",
    "sort", "sort_by", "sort_by_key", "dedup", "join", "split", "splitn", "trim",
    "trim_start", "trim_end", "starts_with", "ends_with", "strip_prefix", "strip_suffix",
    "to_lowercase", "to_uppercase", "chars", "bytes", "lines", "parse", "push_str", "repeat",
    "with_capacity", "reserve", "first", "keys", "values", "sorted",
    // misc std
    "format", "write", "writeln", "min", "max", "abs", "clamp", "swap", "drop", "eq", "ne",
    "cmp", "partial_cmp", "hash", "fmt", "default", "lock", "read", "send", "recv",
];

#[derive(Debug)]
pub struct RustSupport;

impl LanguageSupport for RustSupport {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn queries(&self) -> &'static [NamedQuery] {
        QUERIES
    }

    fn builtin_calls(&self) -> &'static [&'static str] {
        BUILTIN_CALLS
    }

    fn container_kinds(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("mod_item", "name"),
            ("impl_item", "type"),
            ("trait_item", "name"),
            ("function_item", "name"),
        ]
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["impl_item", "trait_item"]
    }

    fn separator(&self) -> &'static str {
        "::"
    }

    fn build_import(&self, caps: &CaptureMap<'_>) -> Option<OutlineImport> {
        let text = caps.text("module")?;
        let span = caps.span("import").or_else(|| caps.span("module"))?;
        Some(parse_use_tree(text, span))
    }
}

/// Decompose a `use` tree's text into a module path and leaf bindings.
///
/// Handles the shapes that matter for resolution: plain paths, `as` renames,
/// `*` globs, and one level of brace groups (`use a::b::{c, d as e}`).
/// Deeper nesting keeps the group's leaf names, which is enough for
/// name-based call matching.
fn parse_use_tree(text: &str, span: crate::TextRange) -> OutlineImport {
    let text = text.trim();

    if let Some(base) = text.strip_suffix("::*") {
        return OutlineImport {
            module: base.to_string(),
            names: Vec::new(),
            alias: None,
            wildcard: true,
            span,
        };
    }

    if let Some(brace_start) = text.find("::{") {
        let module = text[..brace_start].to_string();
        let inner = text[brace_start + 3..].trim_end_matches('}');
        let mut names = Vec::new();
        for item in split_group_items(inner) {
            let item = item.trim();
            if item.is_empty() || item == "*" {
                continue;
            }
            if item == "self" {
                if let Some(last) = module.rsplit("::").next() {
                    names.push(ImportedName::plain(last));
                }
                continue;
            }
            names.push(leaf_binding(item));
        }
        return OutlineImport {
            module,
            names,
            alias: None,
            wildcard: false,
            span,
        };
    }

    let (path, alias) = match text.split_once(" as ") {
        Some((p, a)) => (p.trim(), Some(a.trim().to_string())),
        None => (text, None),
    };
    let leaf = path.rsplit("::").next().unwrap_or(path).to_string();
    OutlineImport {
        module: path.to_string(),
        names: vec![ImportedName { name: leaf, alias }],
        alias: None,
        wildcard: false,
        span,
    }
}

/// Split brace-group items on top-level commas, ignoring commas inside
/// nested braces.
fn split_group_items(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&inner[start..]);
    items
}

/// The local binding a group item introduces: its last path segment, renamed
/// when an `as` clause is present.
fn leaf_binding(item: &str) -> ImportedName {
    let (path, alias) = match item.split_once(" as ") {
        Some((p, a)) => (p.trim(), Some(a.trim().to_string())),
        None => (item, None),
    };
    let path = path.trim_end_matches('}');
    let leaf = path
        .rsplit("::")
        .next()
        .unwrap_or(path)
        .trim_start_matches('{')
        .trim();
    ImportedName {
        name: leaf.to_string(),
        alias,
    }
}
