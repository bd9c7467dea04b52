pub mod ingest;
pub mod report;

use clap::Subcommand;

use carto_core::diagnostics::IngestReport;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest a directory and write the knowledge graph as JSON
    Ingest(ingest::IngestArgs),
    /// Ingest a directory and print only the diagnostic report
    Report(report::ReportArgs),
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ingest(args) => ingest::run(&args),
        Command::Report(args) => report::run(&args),
    }
}

/// Human-readable one-screen summary of a run's diagnostics.
pub fn render_summary(report: &IngestReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "files processed   {}", report.files_processed);
    let _ = writeln!(
        out,
        "files skipped     {} (ignored {}, empty {}, generated {}, filtered {})",
        report.files_skipped.total(),
        report.files_skipped.ignored,
        report.files_skipped.empty,
        report.files_skipped.generated,
        report.files_skipped.directory_filter + report.files_skipped.extension_filter,
    );
    if report.fallback_files > 0 {
        let _ = writeln!(out, "no grammar        {}", report.fallback_files);
    }

    let _ = writeln!(out, "definitions");
    for (kind, count) in &report.definitions_by_kind {
        let _ = writeln!(out, "  {kind:<15} {count}");
    }

    let _ = writeln!(
        out,
        "imports           {:.0}% resolved ({}/{})",
        report.import_resolution.rate * 100.0,
        report.import_resolution.resolved,
        report.import_resolution.resolved + report.import_resolution.unresolved,
    );
    let _ = writeln!(
        out,
        "calls             {:.0}% resolved (import {}, local {}, builtin {}, unresolved {})",
        report.call_resolution.rate * 100.0,
        report.call_resolution.import_resolved,
        report.call_resolution.local_resolved,
        report.call_resolution.builtin_ignored,
        report.call_resolution.unresolved,
    );

    if !report.parse_failures.is_empty() {
        let _ = writeln!(out, "parse failures    {}", report.parse_failures.len());
        for failure in report.parse_failures.iter().take(5) {
            let _ = writeln!(out, "  {}: {}", failure.path, failure.reason);
        }
    }

    if report.integrity.is_clean() {
        let _ = writeln!(out, "integrity         clean");
    } else {
        let _ = writeln!(
            out,
            "integrity         {} missing endpoints, {} unflagged files",
            report.integrity.missing_endpoints.len(),
            report.integrity.unflagged_files.len(),
        );
    }

    let _ = writeln!(out, "duration          {}ms", report.duration_ms);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_key_sections() {
        let mut report = IngestReport::new();
        report.files_processed = 3;
        report.count_definition("Function");
        report.finalize(std::time::Duration::from_millis(12));

        let summary = render_summary(&report);
        assert!(summary.contains("files processed   3"));
        assert!(summary.contains("Function"));
        assert!(summary.contains("integrity         clean"));
    }
}
