//! Stamps report values into the dashboard HTML.
//!
//! Plain single-occurrence text replacement, in a fixed order with the report
//! JSON last, so values substituted earlier are never rescanned.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::reporter;
use crate::types::{Report, ReportSummary};

pub const TOTAL_POSITIONS: &str = "%TOTAL_POSITIONS%";
pub const PATTERNS_FOUND: &str = "%PATTERNS_FOUND%";
pub const GENERATED_AT: &str = "%GENERATED_AT%";
pub const DATA_JSON: &str = "%DATA_JSON%";

/// Timestamp layout used on the dashboard (pt-BR).
pub fn format_generated_at(at: DateTime<Local>) -> String {
    at.format("%d/%m/%Y, %H:%M:%S").to_string()
}

/// Report as compact JSON, safe to drop inside a `<script>` element.
fn embeddable_json(report: &Report) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(report)?.replace("</", "<\\/"))
}

fn replace_once(html: String, token: &str, value: &str) -> String {
    if html.contains(token) {
        html.replacen(token, value, 1)
    } else {
        warn!("Template has no {token} placeholder");
        html
    }
}

/// Substitute the four placeholders in `html`.
pub fn stamp(html: &str, report: &Report, generated_at: &str) -> Result<String, serde_json::Error> {
    let json = embeddable_json(report)?;
    let html = replace_once(
        html.to_string(),
        TOTAL_POSITIONS,
        &report.summary.total_positions.to_string(),
    );
    let html = replace_once(html, PATTERNS_FOUND, &report.summary.patterns_found.to_string());
    let html = replace_once(html, GENERATED_AT, generated_at);
    Ok(replace_once(html, DATA_JSON, &json))
}

/// Read the report at `data_path`, stamp `template_path` and write it back
/// in place.
pub fn stamp_file(data_path: &Path, template_path: &Path) -> Result<ReportSummary> {
    let report = reporter::read_report(data_path)?;
    info!(
        "Building analytics dashboard with {} positions",
        report.summary.total_positions
    );

    let html = std::fs::read_to_string(template_path)
        .with_context(|| format!("failed to read {}", template_path.display()))?;
    let stamped = stamp(&html, &report, &format_generated_at(Local::now()))
        .context("failed to serialize report")?;
    std::fs::write(template_path, stamped)
        .with_context(|| format!("failed to write {}", template_path.display()))?;

    info!("{} stamped", template_path.display());
    Ok(report.summary)
}
