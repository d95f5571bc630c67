//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fingerprint code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::cluster::ClusterGroup;
use crate::domain::Level;
use crate::fingerprint::FingerprintStack;
use crate::fit::GuessReport;
use crate::io::IngestReport;

/// Format the dataset summary after ingest or generation.
pub fn format_set_summary(report: &IngestReport, source: &str) -> String {
    let mut out = String::new();

    out.push_str("=== bcurves - benchmark curve analysis ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Rows: read={} used={} rejected={}\n",
        report.rows_read,
        report.rows_used,
        report.row_errors.len()
    ));
    out.push_str(&format!(
        "Set: experiments={} instances={} runs={} dims={}\n",
        report.set.experiments().len(),
        report.set.instances().len(),
        report.set.total_runs(),
        report.set.dimensions().len()
    ));

    for err in report.row_errors.iter().take(5) {
        out.push_str(&format!("  row {}: {}\n", err.line, err.message));
    }
    if report.row_errors.len() > 5 {
        out.push_str(&format!(
            "  ... and {} more rejected rows\n",
            report.row_errors.len() - 5
        ));
    }

    out
}

/// Format one line per fingerprint row: entity name, width, value range.
pub fn format_fingerprint_summary(stack: &FingerprintStack, level: Level) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\nFingerprints ({}, {} rows):\n",
        level.display_name(),
        stack.len()
    ));

    let name_width = stack
        .rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max(6);
    for row in &stack.rows {
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in &row.values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        out.push_str(&format!(
            "  {:name_width$}  width={:3}  values=[{:.4}, {:.4}]\n",
            row.name,
            row.values.len(),
            lo,
            hi
        ));
    }

    out
}

/// Format the cluster partition.
pub fn format_groups(groups: &[ClusterGroup], level: Level, k: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\nClusters ({}, k={k}):\n",
        level.display_name()
    ));
    for group in groups {
        out.push_str(&format!(
            "  group {}: {} member(s)\n",
            group.label,
            group.members.len()
        ));
        for member in &group.members {
            out.push_str(&format!("    {member}\n"));
        }
    }

    out
}

/// Format a multi-start guess result, with the generating parameters when the
/// series was synthesized.
pub fn format_guess_report(
    model_name: &str,
    report: &GuessReport,
    truth: Option<&[f64]>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("\nGuess ({model_name}, {} starts):\n", report.starts));
    out.push_str(&format!("  params: {}\n", format_params(&report.params)));
    out.push_str(&format!("  sse:    {:.6e}\n", report.sse));
    if let Some(refined) = report.refined_sse {
        out.push_str(&format!("  refined sse: {refined:.6e}\n"));
    }
    if let Some(truth) = truth {
        out.push_str(&format!("  truth:  {}\n", format_params(truth)));
    }

    out
}

fn format_params(params: &[f64]) -> String {
    let parts: Vec<String> = params.iter().map(|p| format!("{p:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
