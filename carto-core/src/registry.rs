// Cross-file definition registry.
//
// Indexes every extracted definition two ways: a trie over the segments of
// the file-path-qualified name (for exact and prefix lookup during
// resolution) and a per-file map (for local call resolution). Trie nodes are
// arena-indexed — integer handles into a flat vector, no pointer links — so
// the whole registry drops trivially at end-of-run.
//
// The registry is append-only: built fresh per ingestion, no deletions.

use std::collections::HashMap;

use carto_graphs::DefKind;
use serde::Serialize;

use crate::types::NodeId;

/// One registered definition. Created during the parsing pass, read-only
/// afterward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub node_id: NodeId,
    pub qualified_name: String,
    pub file_path: String,
    pub name: String,
    pub kind: DefKind,
    /// 1-based source lines.
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<String, usize>,
    /// Definitions terminating at this node (indices into the arena).
    defs: Vec<usize>,
}

#[derive(Debug)]
pub struct DefinitionRegistry {
    defs: Vec<Definition>,
    /// Trie arena; index 0 is the root.
    arena: Vec<TrieNode>,
    by_file: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
    /// All known file paths (sorted), used by import resolution.
    files: Vec<String>,
    /// File stem → paths, the trie's path index for basename matching.
    stems: HashMap<String, Vec<String>>,
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self {
            defs: Vec::new(),
            arena: vec![TrieNode::default()],
            by_file: HashMap::new(),
            by_name: HashMap::new(),
            files: Vec::new(),
            stems: HashMap::new(),
        }
    }

    /// Record a known file path. Paths must be registered in sorted order
    /// (the structure pass walks a sorted list) so lookups stay
    /// deterministic.
    pub fn register_file(&mut self, path: &str) {
        self.files.push(path.to_string());
        let stem = file_stem(path);
        if !stem.is_empty() {
            self.stems
                .entry(stem.to_string())
                .or_default()
                .push(path.to_string());
        }
    }

    pub fn add_definition(&mut self, def: Definition) {
        let idx = self.defs.len();

        let mut node = 0usize;
        for segment in qualified_key(&def.file_path, &def.qualified_name) {
            node = match self.arena[node].children.get(segment) {
                Some(&child) => child,
                None => {
                    let child = self.arena.len();
                    self.arena.push(TrieNode::default());
                    self.arena[node].children.insert(segment.to_string(), child);
                    child
                }
            };
        }
        self.arena[node].defs.push(idx);

        self.by_file
            .entry(def.file_path.clone())
            .or_default()
            .push(idx);
        self.by_name.entry(def.name.clone()).or_default().push(idx);
        self.defs.push(def);
    }

    /// Exact lookup by file-path-qualified name, e.g.
    /// `src/greet.py::Greeter.greet`.
    pub fn find_by_qualified_name(&self, file_path: &str, qualified: &str) -> Vec<&Definition> {
        let Some(node) = self.descend(file_path, qualified) else {
            return Vec::new();
        };
        self.arena[node].defs.iter().map(|&i| &self.defs[i]).collect()
    }

    /// Prefix lookup: every definition whose qualified key starts with the
    /// given prefix (e.g. all members of a class, all definitions in a
    /// folder).
    pub fn find_by_qualified_prefix(&self, file_path: &str, prefix: &str) -> Vec<&Definition> {
        let Some(node) = self.descend(file_path, prefix) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            found.extend(self.arena[n].defs.iter().copied());
            stack.extend(self.arena[n].children.values().copied());
        }
        found.sort_unstable();
        found.into_iter().map(|i| &self.defs[i]).collect()
    }

    /// All definitions with the given name in one file, in extraction order.
    pub fn find_by_name_in_file(&self, file_path: &str, name: &str) -> Vec<&Definition> {
        self.by_file
            .get(file_path)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.defs[i])
                    .filter(|d| d.name == name)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All definitions with the given name, anywhere. Ambiguous by design;
    /// callers apply their own disambiguation.
    pub fn find_by_name(&self, name: &str) -> Vec<&Definition> {
        self.by_name
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.defs[i]).collect())
            .unwrap_or_default()
    }

    pub fn definitions_in_file(&self, file_path: &str) -> Vec<&Definition> {
        self.by_file
            .get(file_path)
            .map(|indices| indices.iter().map(|&i| &self.defs[i]).collect())
            .unwrap_or_default()
    }

    pub fn known_files(&self) -> &[String] {
        &self.files
    }

    pub fn is_known_file(&self, path: &str) -> bool {
        self.files.binary_search_by(|f| f.as_str().cmp(path)).is_ok()
    }

    /// Files whose stem matches, from the path index.
    pub fn files_with_stem(&self, stem: &str) -> &[String] {
        self.stems.get(stem).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn descend(&self, file_path: &str, qualified: &str) -> Option<usize> {
        let mut node = 0usize;
        for segment in qualified_key(file_path, qualified) {
            node = *self.arena[node].children.get(segment)?;
        }
        Some(node)
    }
}

/// Segment a file-path-qualified name for trie keying. Path components split
/// on `/`; name components split on both `::` and `.` so mixed-language
/// lookups use one key shape.
fn qualified_key<'a>(file_path: &'a str, qualified: &'a str) -> impl Iterator<Item = &'a str> {
    segments(file_path).chain(segments(qualified))
}

fn segments(s: &str) -> impl Iterator<Item = &str> {
    s.split('/')
        .flat_map(|p| p.split("::"))
        .flat_map(|p| p.split('.'))
        .filter(|p| !p.is_empty())
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}
