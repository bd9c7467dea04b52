// Integration fixtures and helpers for Carto pipeline tests.

use carto_core::{CartoConfig, CartoPipeline, IngestOptions, IngestResult, SourceTree};

/// In-memory source-tree fixtures. Built as plain `(path, content)` sets —
/// the pipeline's input contract — so no filesystem is involved.
#[derive(Debug)]
pub struct TestTree;

impl TestTree {
    /// Two files: `a` defines `foo`, `b` imports `a` and calls `foo()`.
    pub fn import_call() -> SourceTree {
        SourceTree::new([
            (
                "pkg/a.py".to_string(),
                "def foo():\n    return 1\n".to_string(),
            ),
            (
                "pkg/b.py".to_string(),
                "from pkg.a import foo\n\ndef run():\n    foo()\n".to_string(),
            ),
        ])
    }

    /// One file calling a name with no import and no local definition.
    pub fn unresolved_call() -> SourceTree {
        SourceTree::new([(
            "solo.py".to_string(),
            "def caller():\n    do_something_domain_specific()\n".to_string(),
        )])
    }

    /// One file whose only calls are curated built-ins.
    pub fn builtin_calls_only() -> SourceTree {
        SourceTree::new([(
            "fmt.py".to_string(),
            "def shout(items):\n    print(len(items))\n".to_string(),
        )])
    }

    /// Rust, Python, and TypeScript files with local call chains.
    pub fn multi_lang() -> SourceTree {
        SourceTree::new([
            (
                "src/main.rs".to_string(),
                "fn main() {\n    greet();\n}\n\nfn greet() {\n    println!(\"hello\");\n}\n"
                    .to_string(),
            ),
            (
                "scripts/fetch.py".to_string(),
                "def fetch_data():\n    return parse_data()\n\ndef parse_data():\n    return []\n"
                    .to_string(),
            ),
            (
                "web/app.ts".to_string(),
                "function start(): void {\n    helper();\n}\n\nfunction helper(): void {}\n"
                    .to_string(),
            ),
        ])
    }

    /// A normal file next to an empty one.
    pub fn with_empty_file() -> SourceTree {
        SourceTree::new([
            (
                "real.py".to_string(),
                "def real():\n    pass\n".to_string(),
            ),
            ("empty.py".to_string(), String::new()),
        ])
    }

    /// Deeply nested paths for structure-pass assertions.
    pub fn nested() -> SourceTree {
        SourceTree::new([
            (
                "a/b/c/deep.py".to_string(),
                "def deep():\n    pass\n".to_string(),
            ),
            ("a/top.py".to_string(), "def top():\n    pass\n".to_string()),
        ])
    }
}

/// Run the pipeline over a fixture with defaults.
pub fn run_pipeline(tree: &SourceTree) -> IngestResult {
    CartoPipeline::new(CartoConfig::default())
        .run(tree, &IngestOptions::default())
        .expect("pipeline run")
}

/// Run with a specific pipeline instance (for warm-cache scenarios).
pub fn run_on(pipeline: &CartoPipeline, tree: &SourceTree) -> IngestResult {
    pipeline
        .run(tree, &IngestOptions::default())
        .expect("pipeline run")
}
