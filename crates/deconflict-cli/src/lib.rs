//! Deconfliction CLI - run demo scenarios or scenario files from the terminal.
//!
//! This crate provides the `deconflict` binary:
//! - demo: built-in conflict/clear scenarios through the screening pipeline
//! - verify: a `{primary, others}` JSON file

use anyhow::{Context, Result};
use deconflict_core::{DeconflictionReport, DroneMission, LogisticClassifier, ScreeningStats};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

/// A primary mission and its traffic, as stored on disk.
#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub primary: DroneMission,
    #[serde(default)]
    pub others: Vec<DroneMission>,
}

pub fn load_scenario_file(path: &Path) -> Result<ScenarioFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid scenario file {}", path.display()))
}

pub fn load_classifier(path: &Path) -> Result<LogisticClassifier> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read classifier weights {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid classifier weights in {}", path.display()))
}

/// Banner, verdict and timing for one verification.
pub fn format_report(title: &str, report: &DeconflictionReport<'_>) -> String {
    let rule = "=".repeat(70);
    let mut out = format!("{rule}\n{title}\n{rule}\n");
    let _ = writeln!(out, "Primary mission: {}", report.primary_mission.id());
    let _ = writeln!(out, "Status: {}", report.status);
    let _ = writeln!(out, "{}", report.conflict_summary());
    if let Some(screening) = &report.screening {
        let _ = writeln!(
            out,
            "Screened {} mission(s): {} filtered, {} checked",
            screening.candidates, screening.filtered, screening.checked
        );
        if let Some(err) = &screening.classifier_error {
            let _ = writeln!(out, "Classifier failed, all missions checked: {err}");
        }
    }
    let _ = writeln!(
        out,
        "Analysis time: {:.2}ms",
        report.analysis_time.as_secs_f64() * 1000.0
    );
    out
}

/// Cumulative pipeline statistics block.
pub fn format_stats(stats: &ScreeningStats) -> String {
    let mut out = String::from("Pipeline statistics\n");
    let _ = writeln!(out, "  Total checks:        {}", stats.total_checks);
    let _ = writeln!(out, "  Filtered by ML:      {}", stats.ml_filtered);
    let _ = writeln!(out, "  Geometric checks:    {}", stats.geometric_checks);
    let _ = writeln!(out, "  Classifier failures: {}", stats.classifier_failures);
    let _ = writeln!(out, "  Filter rate:         {:.1}%", stats.filter_rate() * 100.0);
    let _ = writeln!(
        out,
        "  Avg ML time:         {:.2}ms",
        stats.avg_ml_time().as_secs_f64() * 1000.0
    );
    let _ = writeln!(
        out,
        "  Avg geometric time:  {:.2}ms",
        stats.avg_geometric_time().as_secs_f64() * 1000.0
    );
    let _ = writeln!(
        out,
        "  Avg total time:      {:.2}ms",
        stats.avg_total_time().as_secs_f64() * 1000.0
    );
    out
}
