use tree_sitter::Node;

use crate::adapter::CaptureMap;
use crate::{DefMetadata, NamedQuery, OutlineImport, QueryKind};

use super::LanguageSupport;
use super::ecma;

static QUERIES: &[NamedQuery] = &[
    NamedQuery {
        kind: QueryKind::Functions,
        source: ecma::FUNCTIONS,
    },
    NamedQuery {
        kind: QueryKind::Classes,
        source: "(class_declaration name: (type_identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Interfaces,
        source: "(interface_declaration name: (type_identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Enums,
        source: "(enum_declaration name: (identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Types,
        source: "(type_alias_declaration name: (type_identifier) @name) @definition",
    },
    NamedQuery {
        kind: QueryKind::Variables,
        source: ecma::VARIABLES,
    },
    NamedQuery {
        kind: QueryKind::Decorators,
        source: ecma::DECORATORS,
    },
    NamedQuery {
        kind: QueryKind::Imports,
        source: ecma::IMPORTS,
    },
    NamedQuery {
        kind: QueryKind::Calls,
        source: ecma::CALLS,
    },
];

#[derive(Debug)]
pub struct TypeScriptSupport;

impl LanguageSupport for TypeScriptSupport {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn queries(&self) -> &'static [NamedQuery] {
        QUERIES
    }

    fn builtin_calls(&self) -> &'static [&'static str] {
        ecma::BUILTIN_CALLS
    }

    fn container_kinds(&self) -> &'static [(&'static str, &'static str)] {
        ecma::CONTAINERS
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        ecma::CLASS_KINDS
    }

    fn build_import(&self, caps: &CaptureMap<'_>) -> Option<OutlineImport> {
        ecma::build_import(caps)
    }

    fn definition_metadata(&self, node: Node<'_>, source: &str) -> DefMetadata {
        ecma::definition_metadata(node, source)
    }
}

#[cfg(test)]
mod tests {
    use crate::DefKind;
    use crate::languages::LanguageRegistry;

    fn outline(source: &str) -> crate::FileOutline {
        let reg = LanguageRegistry::new();
        let adapter = reg.get("typescript").unwrap();
        let tree = adapter.parse(source, "test.ts", 0).unwrap();
        adapter.outline(&tree, source, "test.ts")
    }

    #[test]
    fn extracts_type_level_declarations() {
        let source = "\
interface Shape {
    area(): number;
}

type Point = { x: number; y: number };

enum Color {
    Red,
    Green,
}

class Circle implements Shape {
    area(): number {
        return 0;
    }
}
";
        let out = outline(source);
        let kind_of = |name: &str| {
            out.definitions
                .iter()
                .find(|d| d.name == name)
                .map(|d| d.kind)
        };
        assert_eq!(kind_of("Shape"), Some(DefKind::Interface));
        assert_eq!(kind_of("Point"), Some(DefKind::Type));
        assert_eq!(kind_of("Color"), Some(DefKind::Enum));
        assert_eq!(kind_of("Circle"), Some(DefKind::Class));

        let circle = out.definitions.iter().find(|d| d.name == "Circle").unwrap();
        assert_eq!(circle.implements, vec!["Shape".to_string()]);
    }

    #[test]
    fn arrow_function_const_is_a_function() {
        let out = outline("const handler = (req: Request) => {\n    route(req);\n};\n");
        let handler = out
            .definitions
            .iter()
            .find(|d| d.name == "handler")
            .unwrap();
        assert_eq!(handler.kind, DefKind::Function);
    }

    #[test]
    fn extracts_imports_with_aliases() {
        let out = outline("import { parse as parseToml } from './toml';\n");
        let imp = out.imports.first().unwrap();
        assert_eq!(imp.module, "./toml");
        assert_eq!(imp.names[0].name, "parse");
        assert_eq!(imp.names[0].exposed(), "parseToml");
    }
}
