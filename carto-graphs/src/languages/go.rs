use crate::adapter::CaptureMap;
use crate::{NamedQuery, OutlineImport, QueryKind};

use super::LanguageSupport;
use super::helpers::{child_by_field, node_text, strip_quotes};

static QUERIES: &[NamedQuery] = &[
    NamedQuery {
        kind: QueryKind::Functions,
        source: "(function_declaration name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Methods,
        source: "(method_declaration name: (field_identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Classes,
        source: "(type_declaration (type_spec name: (type_identifier) @name type: (struct_type)) @definition)",
    },
    NamedQuery {
        kind: QueryKind::Interfaces,
        source: "(type_declaration (type_spec name: (type_identifier) @name type: (interface_type)) @definition)",
    },
    NamedQuery {
        // Remaining type specs (aliases, named basic types). Struct and
        // interface specs match first and win the duplicate guard.
        kind: QueryKind::Types,
        source: "(type_declaration (type_spec name: (type_identifier) @name) @definition)",
    },
    NamedQuery {
        kind: QueryKind::Variables,
        source: r"
(var_declaration (var_spec name: (identifier) @name) @definition)
(const_declaration (const_spec name: (identifier) @name) @definition)
",
    },
    NamedQuery {
        kind: QueryKind::Imports,
        source: "(import_spec) @import",
    },
    NamedQuery {
        kind: QueryKind::Calls,
        source: r"
(call_expression function: (identifier) @callee) @reference
(call_expression function: (selector_expression field: (field_identifier) @callee)) @reference
",
    },
];

static BUILTIN_CALLS: &[&str] = &[
    // language builtins
    "make", "len", "cap", "append", "new", "copy", "delete", "panic", "recover", "print",
    "println", "close", "complex", "real", "imag", "min", "max", "clear",
    // fmt / errors / strings / strconv staples
    "Printf", "Println", "Print", "Sprintf", "Sprint", "Sprintln", "Fprintf", "Fprintln",
    "Errorf", "Error", "Fatal", "Fatalf", "Panic", "Panicf", "New", "Is", "As", "Unwrap",
    "Join", "Split", "Contains", "HasPrefix", "HasSuffix", "TrimSpace", "Trim", "ToLower",
    "ToUpper", "Replace", "ReplaceAll", "Itoa", "Atoi", "Quote", "Marshal", "Unmarshal",
    "MarshalIndent",
];

#[derive(Debug)]
pub struct GoSupport;

impl LanguageSupport for GoSupport {
    fn id(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn queries(&self) -> &'static [NamedQuery] {
        QUERIES
    }

    fn builtin_calls(&self) -> &'static [&'static str] {
        BUILTIN_CALLS
    }

    fn container_kinds(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("function_declaration", "name"),
            ("method_declaration", "name"),
        ]
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        // Methods are declared at top level with receivers; the Methods
        // query classifies them directly.
        &[]
    }

    fn build_import(&self, caps: &CaptureMap<'_>) -> Option<OutlineImport> {
        let spec = caps.node("import")?;
        let source = caps.source();
        let path_node = child_by_field(spec, "path")?;
        let module = strip_quotes(node_text(path_node, source)).to_string();

        let mut alias = None;
        let mut wildcard = false;
        if let Some(name_node) = child_by_field(spec, "name") {
            match name_node.kind() {
                "package_identifier" => alias = Some(node_text(name_node, source).to_string()),
                "dot" => wildcard = true,
                _ => {} // blank identifier: side-effect import
            }
        }

        Some(OutlineImport {
            module,
            names: Vec::new(),
            alias,
            wildcard,
            span: super::node_range(spec),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::languages::LanguageRegistry;
    use crate::{DefKind, FileOutline};

    fn outline(source: &str) -> FileOutline {
        let reg = LanguageRegistry::new();
        let adapter = reg.get("go").unwrap();
        let tree = adapter.parse(source, "main.go", 0).unwrap();
        adapter.outline(&tree, source, "main.go")
    }

    #[test]
    fn extracts_functions_methods_and_types() {
        let source = "\
package main

type Server struct{}

type Handler interface{}

func (s *Server) Start() {
    run()
}

func run() {}
";
        let out = outline(source);
        let kind_of = |name: &str| {
            out.definitions
                .iter()
                .find(|d| d.name == name)
                .map(|d| d.kind)
        };
        assert_eq!(kind_of("Server"), Some(DefKind::Class));
        assert_eq!(kind_of("Handler"), Some(DefKind::Interface));
        assert_eq!(kind_of("Start"), Some(DefKind::Method));
        assert_eq!(kind_of("run"), Some(DefKind::Function));
    }

    #[test]
    fn struct_spec_is_not_double_counted_as_type() {
        let out = outline("package main\n\ntype Server struct{}\n");
        let servers: Vec<_> = out
            .definitions
            .iter()
            .filter(|d| d.name == "Server")
            .collect();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].kind, DefKind::Class);
    }

    #[test]
    fn import_specs_decompose() {
        let source = "\
package main

import (
    \"fmt\"
    log \"github.com/rs/zerolog\"
)
";
        let out = outline(source);
        let fmt = out.imports.iter().find(|i| i.module == "fmt").unwrap();
        assert!(fmt.alias.is_none());

        let zerolog = out
            .imports
            .iter()
            .find(|i| i.module == "github.com/rs/zerolog")
            .unwrap();
        assert_eq!(zerolog.alias.as_deref(), Some("log"));
    }

    #[test]
    fn selector_call_carries_package_qualifier() {
        let source = "package main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(\"hi\")\n}\n";
        let out = outline(source);
        let call = out.calls.iter().find(|c| c.callee == "Println").unwrap();
        assert_eq!(call.qualifier.as_deref(), Some("fmt"));
    }
}
