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
        source: "(class_declaration name: (identifier) @name) @definition",
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
pub struct JavaScriptSupport;

impl LanguageSupport for JavaScriptSupport {
    fn id(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
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
        let adapter = reg.get("javascript").unwrap();
        let tree = adapter.parse(source, "test.js", 0).unwrap();
        adapter.outline(&tree, source, "test.js")
    }

    #[test]
    fn extracts_function_class_and_method() {
        let source = "\
function greet(name) {
    console.log(name);
}

class Greeter {
    greet() {
        greet('hi');
    }
}
";
        let out = outline(source);
        let greet_fn = out
            .definitions
            .iter()
            .find(|d| d.name == "greet" && d.kind == DefKind::Function)
            .expect("top-level greet");
        assert_eq!(greet_fn.qualified_name, "greet");

        let method = out
            .definitions
            .iter()
            .find(|d| d.kind == DefKind::Method)
            .expect("class method");
        assert_eq!(method.qualified_name, "Greeter.greet");

        let class = out
            .definitions
            .iter()
            .find(|d| d.kind == DefKind::Class)
            .expect("class def");
        assert_eq!(class.name, "Greeter");
    }

    #[test]
    fn extracts_named_and_default_imports() {
        let source = "\
import { readFile, writeFile as write } from './fs-utils';
import config from './config';
import * as path from 'path';
";
        let out = outline(source);
        assert_eq!(out.imports.len(), 3);

        let named = &out.imports[0];
        assert_eq!(named.module, "./fs-utils");
        assert_eq!(named.names.len(), 2);
        assert_eq!(named.names[0].name, "readFile");
        assert_eq!(named.names[1].exposed(), "write");

        let default = &out.imports[1];
        assert_eq!(default.module, "./config");
        assert_eq!(default.names[0].name, "config");

        let namespace = &out.imports[2];
        assert_eq!(namespace.module, "path");
        assert_eq!(namespace.alias.as_deref(), Some("path"));
    }

    #[test]
    fn extracts_require_import() {
        let out = outline("const utils = require('./utils');\n");
        let imp = out.imports.first().expect("require import");
        assert_eq!(imp.module, "./utils");
        assert_eq!(imp.names[0].name, "utils");
    }

    #[test]
    fn non_require_call_is_not_an_import() {
        let out = outline("const body = fetchSync('./utils');\n");
        assert!(out.imports.is_empty(), "got {:?}", out.imports);
    }

    #[test]
    fn member_call_carries_receiver() {
        let out = outline("function run() {\n    api.send('x');\n}\n");
        let call = out.calls.iter().find(|c| c.callee == "send").unwrap();
        assert_eq!(call.qualifier.as_deref(), Some("api"));
    }

    #[test]
    fn class_extends_is_recorded() {
        let out = outline("class Admin extends User {}\n");
        let admin = out.definitions.iter().find(|d| d.name == "Admin").unwrap();
        assert_eq!(admin.extends, vec!["User".to_string()]);
    }
}
