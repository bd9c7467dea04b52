// Import resolution pass — maps module references to concrete File nodes and
// emits IMPORTS edges.
//
// Resolution ladder, first hit wins:
//   1. exact relative-path match against known file paths,
//   2. package-root-relative match, stripping leading segments one at a time,
//   3. basename match via the registry's path index (lower confidence).
// Unresolved imports are not errors — many legitimately target external
// dependencies outside the ingested set. They are tallied for the
// resolution-rate diagnostic.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{info, instrument};

use carto_graphs::OutlineImport;

use crate::diagnostics::UnresolvedImport;
use crate::error::Result;
use crate::registry::DefinitionRegistry;
use crate::types::{GraphRelationship, NodeId, RelKind};

use super::{IngestContext, Pass, PassStats};

/// One resolved import, as the call-resolution pass consumes it.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub module: String,
    pub target_path: String,
    pub confidence: f64,
    /// `(exposed local name, original name in the target file)` pairs.
    pub exposed: Vec<(String, String)>,
    /// Local name the module itself is bound to, when the import binds one
    /// (`import numpy as np`, Go package imports).
    pub module_binding: Option<String>,
}

/// Per-file view of resolved imports.
#[derive(Debug, Default)]
pub struct ImportMap {
    by_file: HashMap<String, Vec<ResolvedImport>>,
}

impl ImportMap {
    pub fn record(&mut self, file: &str, import: ResolvedImport) {
        self.by_file.entry(file.to_string()).or_default().push(import);
    }

    pub fn entries(&self, file: &str) -> &[ResolvedImport] {
        self.by_file.get(file).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug)]
pub struct ImportPass;

impl Pass for ImportPass {
    fn name(&self) -> &'static str {
        "imports"
    }

    #[instrument(skip_all, name = "import_pass")]
    fn run(&self, ctx: &mut IngestContext<'_>) -> Result<PassStats> {
        let start = Instant::now();
        let mut stats = PassStats::default();
        ctx.progress
            .begin_pass("imports", Some(ctx.outlines.len() as u64));

        let outlines = &ctx.outlines;
        let registry = &ctx.registry;
        let graph = &mut ctx.graph;
        let report = &mut ctx.report;
        let import_map = &mut ctx.import_map;

        for (path, outline) in outlines {
            for import in &outline.imports {
                let resolved = resolve_module(&import.module, path, &outline.language, registry);

                match resolved {
                    Some((target, confidence, stage)) => {
                        report.import_resolution.resolved += 1;
                        if target == *path {
                            continue; // self-import, no edge
                        }
                        let edge = GraphRelationship::new(
                            RelKind::Imports,
                            NodeId::file(path),
                            NodeId::file(&target),
                        )
                        .with_property("module", serde_json::json!(import.module))
                        .with_property("confidence", serde_json::json!(confidence))
                        .with_property("stage", serde_json::json!(stage));
                        if graph.add_relationship(edge) {
                            stats.edges_created += 1;
                        }
                        import_map.record(
                            path,
                            ResolvedImport {
                                module: import.module.clone(),
                                target_path: target,
                                confidence,
                                exposed: import
                                    .names
                                    .iter()
                                    .map(|n| (n.exposed().to_string(), n.name.clone()))
                                    .collect(),
                                module_binding: module_binding(&outline.language, import),
                            },
                        );
                    }
                    None => {
                        report.import_resolution.unresolved += 1;
                        report.unresolved_imports.push(UnresolvedImport {
                            file_path: path.clone(),
                            module: import.module.clone(),
                            line: import.span.start_row + 1,
                        });
                    }
                }
            }
            ctx.progress.advance(1);
        }

        ctx.progress.end_pass();
        stats.duration = start.elapsed();
        info!(
            resolved = ctx.report.import_resolution.resolved,
            unresolved = ctx.report.import_resolution.unresolved,
            "Import pass complete"
        );
        Ok(stats)
    }
}

/// The name an import binds the module itself to, when no named bindings
/// consumed the statement.
fn module_binding(language: &str, import: &OutlineImport) -> Option<String> {
    if let Some(alias) = &import.alias {
        return Some(alias.clone());
    }
    if !import.names.is_empty() {
        return None;
    }
    match language {
        // `import os.path` binds the first component.
        "python" => import.module.split('.').next().map(str::to_string),
        // `import "net/http"` binds the last path segment.
        "go" => import.module.rsplit('/').next().map(str::to_string),
        _ => None,
    }
}

/// Resolve a raw module reference to a known file path.
pub(crate) fn resolve_module(
    module: &str,
    importing_path: &str,
    language: &str,
    registry: &DefinitionRegistry,
) -> Option<(String, f64, &'static str)> {
    // Stage 1: exact relative-path resolution.
    for candidate in relative_candidates(module, importing_path, language) {
        if registry.is_known_file(&candidate) {
            return Some((candidate, 1.0, "relative"));
        }
    }

    // Stage 2: package-root-relative, stripping leading segments.
    let normalized = normalize_module(module, language);
    if !normalized.is_empty() {
        let segments: Vec<&str> = normalized.split('/').collect();
        for strip in 0..segments.len() {
            let suffix = segments[strip..].join("/");
            // Single-segment suffixes only match from the tree root; matching
            // them anywhere would shadow the lower-confidence basename stage.
            let allow_interior = suffix.contains('/');
            for ext in extension_candidates(language) {
                let candidate = format!("{suffix}{ext}");
                if let Some(found) = registry.known_files().iter().find(|f| {
                    **f == candidate
                        || (allow_interior && f.ends_with(&format!("/{candidate}")))
                }) {
                    return Some((found.clone(), 0.8, "root"));
                }
            }
        }
    }

    // Stage 3: basename match against the path index. Only an unambiguous
    // stem counts; guessing among several files would fabricate edges.
    let stem = normalized.rsplit('/').next().unwrap_or(&normalized);
    if !stem.is_empty() {
        let matches = registry.files_with_stem(stem);
        if matches.len() == 1 {
            return Some((matches[0].clone(), 0.5, "basename"));
        }
    }

    None
}

/// Candidate known-file paths for stage-1 relative resolution.
fn relative_candidates(module: &str, importing_path: &str, language: &str) -> Vec<String> {
    let dir = parent_dir(importing_path);
    let mut candidates = Vec::new();

    match language {
        "python" => {
            // Leading dots walk up from the importing file's package.
            let dots = module.len() - module.trim_start_matches('.').len();
            if dots > 0 {
                let mut base = dir.to_string();
                for _ in 1..dots {
                    base = parent_dir(&base).to_string();
                }
                let rest = module.trim_start_matches('.').replace('.', "/");
                let prefix = join(&base, &rest);
                if rest.is_empty() {
                    candidates.push(join(&base, "__init__.py"));
                } else {
                    candidates.push(format!("{prefix}.py"));
                    candidates.push(join(&prefix, "__init__.py"));
                }
            }
        }
        "javascript" | "typescript" => {
            if module.starts_with("./") || module.starts_with("../") {
                if let Some(base) = normalize_dotted_path(dir, module) {
                    candidates.push(base.clone());
                    for ext in extension_candidates(language) {
                        candidates.push(format!("{base}{ext}"));
                    }
                }
            }
        }
        "rust" => {
            if let Some(rest) = module.strip_prefix("crate::") {
                let root = crate_src_root(importing_path);
                candidates.extend(rust_module_candidates(&root, rest));
            } else if module.starts_with("super::") {
                let mut base = parent_dir(importing_path).to_string();
                let mut rest = module;
                while let Some(stripped) = rest.strip_prefix("super::") {
                    base = parent_dir(&base).to_string();
                    rest = stripped;
                }
                candidates.extend(rust_module_candidates(&base, rest));
            } else if let Some(rest) = module.strip_prefix("self::") {
                candidates.extend(rust_module_candidates(dir, rest));
            }
        }
        _ => {}
    }

    candidates
}

/// Progressively shorter module paths under a root: the trailing segments of
/// a `use` path are often item names, not modules.
fn rust_module_candidates(root: &str, rest: &str) -> Vec<String> {
    let segments: Vec<&str> = rest.split("::").filter(|s| !s.is_empty()).collect();
    let mut candidates = Vec::new();
    for take in (1..=segments.len()).rev() {
        let module_path = segments[..take].join("/");
        candidates.push(join(root, &format!("{module_path}.rs")));
        candidates.push(join(root, &format!("{module_path}/mod.rs")));
    }
    candidates
}

/// The `src/` root governing `crate::` paths for a file, e.g.
/// `backend/src/db/query.rs` → `backend/src`.
fn crate_src_root(importing_path: &str) -> String {
    if let Some(idx) = importing_path.find("/src/") {
        return format!("{}/src", &importing_path[..idx]);
    }
    if importing_path.starts_with("src/") {
        return "src".to_string();
    }
    parent_dir(importing_path).to_string()
}

fn normalize_module(module: &str, language: &str) -> String {
    match language {
        "python" | "java" => module.trim_start_matches('.').replace('.', "/"),
        "rust" => module
            .trim_start_matches("crate::")
            .trim_start_matches("self::")
            .trim_start_matches("super::")
            .replace("::", "/"),
        "javascript" | "typescript" => module
            .trim_start_matches("./")
            .trim_start_matches("../")
            .to_string(),
        _ => module.to_string(),
    }
}

fn extension_candidates(language: &str) -> &'static [&'static str] {
    match language {
        "python" => &[".py", "/__init__.py"],
        "typescript" => &[".ts", ".tsx", ".js", "/index.ts", "/index.tsx"],
        "javascript" => &[".js", ".jsx", ".mjs", ".cjs", "/index.js"],
        "rust" => &[".rs", "/mod.rs"],
        "java" => &[".java"],
        "go" => &["/main.go", ".go"],
        _ => &[""],
    }
}

fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

fn join(base: &str, rest: &str) -> String {
    if base.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{rest}")
    }
}

/// Resolve `./`/`../` segments against a base directory.
fn normalize_dotted_path(base_dir: &str, module: &str) -> Option<String> {
    let mut parts: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };
    for segment in module.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(files: &[&str]) -> DefinitionRegistry {
        let mut reg = DefinitionRegistry::new();
        let mut sorted: Vec<&str> = files.to_vec();
        sorted.sort_unstable();
        for f in sorted {
            reg.register_file(f);
        }
        reg
    }

    #[test]
    fn relative_js_import_resolves_exactly() {
        let reg = registry_with(&["src/app.js", "src/util.js"]);
        let hit = resolve_module("./util", "src/app.js", "javascript", &reg).unwrap();
        assert_eq!(hit.0, "src/util.js");
        assert_eq!(hit.2, "relative");
        assert!((hit.1 - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parent_relative_import_walks_up() {
        let reg = registry_with(&["src/lib/a.js", "src/shared.js"]);
        let hit = resolve_module("../shared", "src/lib/a.js", "javascript", &reg).unwrap();
        assert_eq!(hit.0, "src/shared.js");
    }

    #[test]
    fn python_dotted_module_resolves_root_relative() {
        let reg = registry_with(&["pkg/util/helpers.py", "pkg/app.py"]);
        let hit = resolve_module("pkg.util.helpers", "pkg/app.py", "python", &reg).unwrap();
        assert_eq!(hit.0, "pkg/util/helpers.py");
        assert_eq!(hit.2, "root");
    }

    #[test]
    fn python_relative_import_uses_importing_dir() {
        let reg = registry_with(&["pkg/app.py", "pkg/local.py"]);
        let hit = resolve_module(".local", "pkg/app.py", "python", &reg).unwrap();
        assert_eq!(hit.0, "pkg/local.py");
        assert_eq!(hit.2, "relative");
    }

    #[test]
    fn rust_crate_import_finds_module_file() {
        let reg = registry_with(&["src/config.rs", "src/lib.rs"]);
        let hit = resolve_module("crate::config::Settings", "src/lib.rs", "rust", &reg).unwrap();
        assert_eq!(hit.0, "src/config.rs");
    }

    #[test]
    fn rust_mod_rs_layout_resolves() {
        let reg = registry_with(&["src/store/mod.rs", "src/lib.rs"]);
        let hit = resolve_module("crate::store::Store", "src/lib.rs", "rust", &reg).unwrap();
        assert_eq!(hit.0, "src/store/mod.rs");
    }

    #[test]
    fn unique_basename_matches_with_low_confidence() {
        let reg = registry_with(&["deep/nested/helpers.py", "app.py"]);
        let hit = resolve_module("helpers", "app.py", "python", &reg).unwrap();
        assert_eq!(hit.0, "deep/nested/helpers.py");
        assert_eq!(hit.2, "basename");
        assert!(hit.1 < 0.8);
    }

    #[test]
    fn ambiguous_basename_does_not_resolve() {
        let reg = registry_with(&["a/util.py", "b/util.py", "app.py"]);
        assert!(resolve_module("util", "app.py", "python", &reg).is_none());
    }

    #[test]
    fn external_dependency_stays_unresolved() {
        let reg = registry_with(&["src/app.py"]);
        assert!(resolve_module("numpy", "src/app.py", "python", &reg).is_none());
    }

    #[test]
    fn module_binding_rules() {
        use carto_graphs::TextRange;
        let span = TextRange {
            start_byte: 0,
            end_byte: 0,
            start_row: 0,
            start_col: 0,
            end_row: 0,
            end_col: 0,
        };
        let plain = OutlineImport {
            module: "os.path".into(),
            names: Vec::new(),
            alias: None,
            wildcard: false,
            span,
        };
        assert_eq!(module_binding("python", &plain).as_deref(), Some("os"));

        let aliased = OutlineImport {
            alias: Some("np".into()),
            ..plain.clone()
        };
        assert_eq!(module_binding("python", &aliased).as_deref(), Some("np"));

        let go = OutlineImport {
            module: "net/http".into(),
            names: Vec::new(),
            alias: None,
            wildcard: false,
            span,
        };
        assert_eq!(module_binding("go", &go).as_deref(), Some("http"));
    }
}
