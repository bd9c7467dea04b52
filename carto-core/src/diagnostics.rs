// The diagnostic report — the single surface for every resolution and
// parsing shortfall. No silent data loss: every excluded file and every
// unresolved reference is counted and categorized here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;

/// Files excluded from parsing, by filter stage.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SkipCounts {
    /// Outside the explicit directory filter.
    pub directory_filter: u64,
    /// Outside the explicit extension filter.
    pub extension_filter: u64,
    /// Matched an ignore pattern (vendor/build trees, lock files, binaries).
    pub ignored: u64,
    /// Zero-length content.
    pub empty: u64,
    /// Generated/minified content (long first line or bundler signature).
    pub generated: u64,
}

impl SkipCounts {
    pub fn total(&self) -> u64 {
        self.directory_filter + self.extension_filter + self.ignored + self.empty + self.generated
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryFailure {
    pub language: String,
    pub query: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedImport {
    pub file_path: String,
    pub module: String,
    /// 1-based source line of the import statement.
    pub line: usize,
}

/// An expected outcome, not a defect: dynamic dispatch, external libraries,
/// and incomplete type information all land here.
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedCall {
    pub file_path: String,
    /// Qualified name of the enclosing definition, or the file itself for
    /// top-level calls.
    pub caller: String,
    pub callee: String,
    /// 1-based source line of the call site.
    pub line: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportResolutionStats {
    pub resolved: u64,
    pub unresolved: u64,
    pub rate: f64,
}

impl ImportResolutionStats {
    pub fn recompute(&mut self) {
        let total = self.resolved + self.unresolved;
        self.rate = if total == 0 {
            1.0
        } else {
            self.resolved as f64 / total as f64
        };
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CallResolutionStats {
    pub import_resolved: u64,
    pub local_resolved: u64,
    /// Built-in calls filtered before resolution; excluded from the rate so
    /// the failure signal stays meaningful.
    pub builtin_ignored: u64,
    pub unresolved: u64,
    pub rate: f64,
}

impl CallResolutionStats {
    pub fn recompute(&mut self) {
        let resolved = self.import_resolved + self.local_resolved;
        let total = resolved + self.unresolved;
        self.rate = if total == 0 {
            1.0
        } else {
            resolved as f64 / total as f64
        };
    }
}

/// Output of the graph integrity validator. Violations are surfaced for
/// operator attention, never auto-fixed: they indicate a pipeline bug.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    /// Relationship ids whose source or target node is missing.
    pub missing_endpoints: Vec<String>,
    /// Parsed File nodes with no DEFINES edge and no `no_definitions` flag.
    pub unflagged_files: Vec<String>,
    /// Nodes with no incident relationships, counted by label.
    pub isolated_nodes: BTreeMap<String, u64>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.missing_endpoints.is_empty() && self.unflagged_files.is_empty()
    }
}

/// The diagnostic report handed to operators and tests alongside the graph.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub files_processed: u64,
    pub files_skipped: SkipCounts,
    /// Files with no supported grammar: File node only, no definitions.
    pub fallback_files: u64,
    pub definitions_by_kind: BTreeMap<String, u64>,
    pub parse_failures: Vec<ParseFailure>,
    pub query_failures: Vec<QueryFailure>,
    pub import_resolution: ImportResolutionStats,
    pub call_resolution: CallResolutionStats,
    pub unresolved_imports: Vec<UnresolvedImport>,
    pub unresolved_calls: Vec<UnresolvedCall>,
    pub duplicate_nodes: u64,
    pub duplicate_relationships: u64,
    pub cache: CacheStats,
    pub integrity: IntegrityReport,
}

impl IngestReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            duration_ms: 0,
            files_processed: 0,
            files_skipped: SkipCounts::default(),
            fallback_files: 0,
            definitions_by_kind: BTreeMap::new(),
            parse_failures: Vec::new(),
            query_failures: Vec::new(),
            import_resolution: ImportResolutionStats::default(),
            call_resolution: CallResolutionStats::default(),
            unresolved_imports: Vec::new(),
            unresolved_calls: Vec::new(),
            duplicate_nodes: 0,
            duplicate_relationships: 0,
            cache: CacheStats::default(),
            integrity: IntegrityReport::default(),
        }
    }

    pub fn count_definition(&mut self, kind: &str) {
        *self.definitions_by_kind.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Recompute derived rates and stamp the run duration.
    pub fn finalize(&mut self, duration: std::time::Duration) {
        self.import_resolution.recompute();
        self.call_resolution.recompute();
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    }
}

impl Default for IngestReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_handle_zero_totals() {
        let mut stats = ImportResolutionStats::default();
        stats.recompute();
        assert!((stats.rate - 1.0).abs() < f64::EPSILON);

        let mut calls = CallResolutionStats {
            builtin_ignored: 10,
            ..Default::default()
        };
        calls.recompute();
        assert!(
            (calls.rate - 1.0).abs() < f64::EPSILON,
            "builtins alone should not depress the rate"
        );
    }

    #[test]
    fn call_rate_excludes_builtins() {
        let mut calls = CallResolutionStats {
            import_resolved: 1,
            local_resolved: 2,
            builtin_ignored: 100,
            unresolved: 1,
            ..Default::default()
        };
        calls.recompute();
        assert!((calls.rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn report_serializes() {
        let mut report = IngestReport::new();
        report.count_definition("Function");
        report.count_definition("Function");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["definitions_by_kind"]["Function"], 2);
    }
}
