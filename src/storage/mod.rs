//! Persistence layer.
//!
//! Saves and loads analysis reports to/from a pretty-printed JSON file.
//! Only the latest report is kept; each run overwrites the previous one.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::engine::analysis::AnalysisReport;

/// Default result file path.
pub const DEFAULT_RESULT_FILE: &str = "team_result.json";

/// Save a report to a JSON file.
pub fn save_report(report: &AnalysisReport, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_RESULT_FILE);
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialise analysis report")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write report to {path}"))?;

    debug!(
        path,
        players = report.meta.player_count,
        difference = report.teams.difference(),
        "Report saved"
    );
    Ok(())
}

/// Load a report from a JSON file.
/// Returns None if the file doesn't exist (no run yet).
pub fn load_report(path: Option<&str>) -> Result<Option<AnalysisReport>> {
    let path = path.unwrap_or(DEFAULT_RESULT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved report found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read report from {path}"))?;

    let report: AnalysisReport = serde_json::from_str(&json)
        .context(format!("Failed to parse report from {path}"))?;

    info!(
        path,
        players = report.meta.player_count,
        generated_at = %report.meta.generated_at,
        "Report loaded from disk"
    );

    Ok(Some(report))
}

/// Delete the report file.
pub fn delete_report(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_RESULT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete report file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
