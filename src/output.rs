//! CLI output formatting for search reports and transforms.
//!
//! # Output Format
//!
//! ## Search
//!
//! ```text
//! Results for /catalog/a.jpg:
//!     Dimensions: 135x191
//!     Best matching quality: 51
//!     Size difference: 404 bytes
//!     Reference size: 50000 bytes
//!     Dimensions: 249x352
//!     Error: reference fetch failed: https://... returned HTTP 404
//! -----
//! ```
//!
//! A non-monotonic search adds a `Note:` line under its dimensions.
//!
//! ## Transform
//!
//! ```text
//! out.jpg: image/jpeg 300x150 (12345 bytes)
//!     filter=lanczos3 strategy=preserve
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{TransformConfig, TransformOutput};
use crate::search::{JobOutcome, JobReport, SearchEvent};
use serde::Serialize;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Search output
// ============================================================================

/// Format one finished job as a results block.
pub fn format_job_report(report: &JobReport) -> Vec<String> {
    let mut lines = vec![format!("Results for {}:", report.image_path)];
    let pad = indent(1);

    for (dimensions, result) in &report.results {
        lines.push(format!("{pad}Dimensions: {dimensions}"));
        match result {
            Ok(found) => {
                match found.best {
                    Some(best) => {
                        lines.push(format!("{pad}Best matching quality: {}", best.quality));
                        lines.push(format!("{pad}Size difference: {} bytes", best.difference));
                    }
                    None => lines.push(format!("{pad}Best matching quality: none")),
                }
                lines.push(format!(
                    "{pad}Reference size: {} bytes",
                    found.reference_size
                ));
                if !found.monotonic {
                    lines.push(format!(
                        "{pad}Note: candidate size was not monotonic in quality"
                    ));
                }
            }
            Err(e) => lines.push(format!("{pad}Error: {e}")),
        }
    }
    if report.results.is_empty() {
        lines.push(format!("{pad}No dimensions configured"));
    }
    lines.push("-----".to_string());
    lines
}

pub fn format_job_outcome(outcome: &JobOutcome) -> Vec<String> {
    format_job_report(&outcome.report())
}

/// Format a live batch event: the finished job's full results block.
pub fn format_search_event(event: &SearchEvent) -> Vec<String> {
    match event {
        SearchEvent::JobFinished(report) => format_job_report(report),
    }
}

/// Final summary line for a batch.
pub fn format_search_summary(outcomes: &[JobOutcome]) -> String {
    let searches: usize = outcomes.iter().map(|o| o.results.len()).sum();
    let failed: usize = outcomes.iter().map(JobOutcome::failures).sum();
    format!(
        "Searched {} images at {} sizes, {} failed",
        outcomes.len(),
        searches,
        failed
    )
}

pub fn print_search_summary(outcomes: &[JobOutcome]) {
    println!("{}", format_search_summary(outcomes));
}

/// One row of the machine-readable report: one image at one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub best_quality: Option<u8>,
    pub difference: Option<u64>,
    pub reference_size: Option<u64>,
    pub probes: usize,
    pub monotonic: Option<bool>,
    pub error: Option<String>,
}

/// Flatten outcomes into report rows, in job then dimension order.
pub fn report_rows(outcomes: &[JobOutcome]) -> Vec<ReportRow> {
    outcomes
        .iter()
        .flat_map(|outcome| {
            outcome.results.iter().map(move |dim| {
                let base = ReportRow {
                    image: outcome.job.image_path.clone(),
                    width: dim.dimensions.width,
                    height: dim.dimensions.height,
                    best_quality: None,
                    difference: None,
                    reference_size: None,
                    probes: 0,
                    monotonic: None,
                    error: None,
                };
                match &dim.result {
                    Ok(found) => ReportRow {
                        best_quality: found.best_quality(),
                        difference: found.difference(),
                        reference_size: Some(found.reference_size),
                        probes: found.probes.len(),
                        monotonic: Some(found.monotonic),
                        ..base
                    },
                    Err(e) => ReportRow {
                        error: Some(e.to_string()),
                        ..base
                    },
                }
            })
        })
        .collect()
}

/// Print the report as pretty JSON.
pub fn print_search_json(outcomes: &[JobOutcome]) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(&report_rows(outcomes))?);
    Ok(())
}

// ============================================================================
// Transform output
// ============================================================================

pub fn format_transform_summary(
    output_path: &Path,
    output: &TransformOutput,
    config: &TransformConfig,
) -> Vec<String> {
    vec![
        format!(
            "{}: {} {} ({} bytes)",
            output_path.display(),
            output.content_type(),
            output.dimensions,
            output.bytes.len()
        ),
        format!("{}{}", indent(1), config.describe()),
    ]
}

pub fn print_transform_summary(
    output_path: &Path,
    output: &TransformOutput,
    config: &TransformConfig,
) {
    for line in format_transform_summary(output_path, output, config) {
        println!("{}", line);
    }
}
