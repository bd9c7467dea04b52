use tree_sitter::Node;

use crate::{DefMetadata, NamedQuery, QueryKind};

use super::LanguageSupport;
use super::helpers::{child_by_field, node_text};

static QUERIES: &[NamedQuery] = &[
    NamedQuery {
        kind: QueryKind::Functions,
        source: "(function_definition name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Classes,
        source: "(class_definition name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Variables,
        source: "(module (expression_statement (assignment left: (identifier) @name) @definition))",
    },
    NamedQuery {
        kind: QueryKind::Decorators,
        source: r"
(decorator (identifier) @name) @definition
(decorator (attribute) @name) @definition
(decorator (call function: (identifier) @name)) @definition
(decorator (call function: (attribute) @name)) @definition
",
    },
    NamedQuery {
        kind: QueryKind::Imports,
        source: r"
(import_statement name: (dotted_name) @module) @import
(import_statement name: (aliased_import name: (dotted_name) @module alias: (identifier) @alias)) @import
(import_from_statement module_name: (dotted_name) @module name: (dotted_name) @name) @import
(import_from_statement module_name: (relative_import) @module name: (dotted_name) @name) @import
(import_from_statement module_name: (dotted_name) @module name: (aliased_import name: (dotted_name) @name alias: (identifier) @alias)) @import
(import_from_statement module_name: (relative_import) @module name: (aliased_import name: (dotted_name) @name alias: (identifier) @alias)) @import
(import_from_statement module_name: (dotted_name) @module (wildcard_import) @wildcard) @import
(import_from_statement module_name: (relative_import) @module (wildcard_import) @wildcard) @import
",
    },
    NamedQuery {
        kind: QueryKind::Calls,
        source: r"
(call function: (identifier) @callee) @reference
(call function: (attribute attribute: (identifier) @callee)) @reference
",
    },
];

/// Standard-library and dunder names suppressed during call resolution.
/// Unfiltered, these dominate the unresolved tally and drown the real signal.
static BUILTIN_CALLS: &[&str] = &[
    // builtins
    "print", "len", "range", "str", "int", "float", "bool", "list", "dict", "set", "tuple",
    "frozenset", "bytes", "bytearray", "type", "isinstance", "issubclass", "super", "getattr",
    "setattr", "hasattr", "delattr", "callable", "repr", "hash", "id", "iter", "next",
    "enumerate", "zip", "map", "filter", "sorted", "reversed", "sum", "min", "max", "abs",
    "round", "divmod", "pow", "any", "all", "open", "input", "format", "vars", "dir", "exec",
    "eval", "globals", "locals", "ord", "chr", "hex", "oct", "bin",
    // common methods on str / list / dict / set
    "append", "extend", "insert", "remove", "pop", "clear", "index", "count", "sort",
    "reverse", "copy", "keys", "values", "items", "get", "update", "setdefault", "add",
    "discard", "union", "intersection", "join", "split", "rsplit", "splitlines", "strip",
    "lstrip", "rstrip", "replace", "startswith", "endswith", "find", "rfind", "lower",
    "upper", "title", "capitalize", "casefold", "encode", "decode", "zfill", "ljust",
    "rjust", "isdigit", "isalpha", "isalnum",
    // dunder-style special methods
    "__init__", "__new__", "__repr__", "__str__", "__eq__", "__ne__", "__lt__", "__le__",
    "__gt__", "__ge__", "__hash__", "__len__", "__iter__", "__next__", "__contains__",
    "__getitem__", "__setitem__", "__delitem__", "__enter__", "__exit__", "__call__",
];

#[derive(Debug)]
pub struct PythonSupport;

impl LanguageSupport for PythonSupport {
    fn id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn queries(&self) -> &'static [NamedQuery] {
        QUERIES
    }

    fn builtin_calls(&self) -> &'static [&'static str] {
        BUILTIN_CALLS
    }

    fn container_kinds(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("class_definition", "name"),
            ("function_definition", "name"),
        ]
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["class_definition"]
    }

    fn definition_metadata(&self, node: Node<'_>, source: &str) -> DefMetadata {
        let mut meta = DefMetadata::default();

        if let Some(params) = child_by_field(node, "parameters") {
            meta.params = Some(node_text(params, source).to_string());
        }

        // class Foo(Base1, Base2):
        if let Some(supers) = child_by_field(node, "superclasses") {
            let mut cursor = supers.walk();
            for child in supers.children(&mut cursor) {
                if child.is_named() && child.kind() != "keyword_argument" {
                    meta.extends.push(node_text(child, source).to_string());
                }
            }
        }

        // Decorated definitions hang under a decorated_definition parent.
        if let Some(parent) = node.parent() {
            if parent.kind() == "decorated_definition" {
                let mut cursor = parent.walk();
                for child in parent.children(&mut cursor) {
                    if child.kind() == "decorator" {
                        let text = node_text(child, source).trim_start_matches('@').trim();
                        meta.decorators.push(text.to_string());
                    }
                }
            }
        }

        meta
    }
}

#[cfg(test)]
mod tests {
    use crate::languages::LanguageRegistry;
    use crate::{DefKind, FileOutline};

    fn outline(source: &str) -> FileOutline {
        let reg = LanguageRegistry::new();
        let adapter = reg.get("python").unwrap();
        let tree = adapter.parse(source, "test.py", 0).unwrap();
        adapter.outline(&tree, source, "test.py")
    }

    #[test]
    fn extracts_function_and_class() {
        let source = "\
def hello():
    print('hi')

class Greeter:
    def greet(self):
        pass
";
        let out = outline(source);
        let hello = out.definitions.iter().find(|d| d.name == "hello").unwrap();
        assert_eq!(hello.kind, DefKind::Function);

        let greet = out.definitions.iter().find(|d| d.name == "greet").unwrap();
        assert_eq!(greet.kind, DefKind::Method);
        assert_eq!(greet.qualified_name, "Greeter.greet");
        assert_eq!(greet.params.as_deref(), Some("(self)"));
    }

    #[test]
    fn extracts_superclasses() {
        let out = outline("class Admin(User, Auditable):\n    pass\n");
        let admin = out.definitions.iter().find(|d| d.name == "Admin").unwrap();
        assert_eq!(
            admin.extends,
            vec!["User".to_string(), "Auditable".to_string()]
        );
    }

    #[test]
    fn extracts_decorators() {
        let source = "@staticmethod\ndef compute():\n    pass\n";
        let out = outline(source);
        let compute = out
            .definitions
            .iter()
            .find(|d| d.name == "compute")
            .unwrap();
        assert_eq!(compute.decorators, vec!["staticmethod".to_string()]);
        // The decorator itself is also a definition.
        assert!(
            out.definitions
                .iter()
                .any(|d| d.kind == DefKind::Decorator && d.name == "staticmethod")
        );
    }

    #[test]
    fn import_variants_decompose() {
        let source = "\
import os
import numpy as np
from pathlib import Path
from .local import helper as aid
from util import *
";
        let out = outline(source);

        let os = out.imports.iter().find(|i| i.module == "os").unwrap();
        assert!(os.names.is_empty());
        assert!(os.alias.is_none());

        let np = out.imports.iter().find(|i| i.module == "numpy").unwrap();
        assert_eq!(np.alias.as_deref(), Some("np"));

        let pathlib = out.imports.iter().find(|i| i.module == "pathlib").unwrap();
        assert_eq!(pathlib.names[0].name, "Path");

        let local = out.imports.iter().find(|i| i.module == ".local").unwrap();
        assert_eq!(local.names[0].name, "helper");
        assert_eq!(local.names[0].exposed(), "aid");

        let wild = out.imports.iter().find(|i| i.module == "util").unwrap();
        assert!(wild.wildcard);
    }

    #[test]
    fn module_level_assignment_is_a_variable() {
        let out = outline("MAX_RETRIES = 5\n\ndef use():\n    local = 1\n");
        let max_retries = out
            .definitions
            .iter()
            .find(|d| d.name == "MAX_RETRIES")
            .unwrap();
        assert_eq!(max_retries.kind, DefKind::Variable);
        // Function-local assignments are not module variables.
        assert!(!out.definitions.iter().any(|d| d.name == "local"));
    }

    #[test]
    fn nested_function_is_not_a_method() {
        let out = outline("def outer():\n    def inner():\n        pass\n");
        let inner = out.definitions.iter().find(|d| d.name == "inner").unwrap();
        assert_eq!(inner.kind, DefKind::Function);
        assert_eq!(inner.qualified_name, "outer.inner");
    }
}
