/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Assemble the per-run report describing what the custodian
    concluded for every tracked plugin, and persist it as JSON
    for the Syn-Plug orchestrator.

  Security / Safety Notes:
    Report data is written to operator-controlled paths; no
    privileged operations are performed.

  Dependencies:
    serde for JSON serialization.

  Operational Scope:
    Consumed by the Bash orchestrator and by operators keeping
    an audit trail of update runs.

  Revision History:
    2026-05-18 COD  Authored run report builder.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible reports
    - Explicit outcome attribution for each plugin
    - Rich metadata for audit and observability
============================================================*/

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{Result, SynplugError};

/// Wrapper representing the full run report document.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub plugins: BTreeMap<String, PluginReport>,
}

/// Metadata block describing run context.
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub generated_at: String,
    pub generated_by: String,
    pub command: String,
    pub total_plugins: usize,
    pub downloads: usize,
    pub up_to_date: usize,
    pub manual_required: usize,
    pub failures: usize,
}

/// Per-plugin report entry.
#[derive(Debug, Serialize)]
pub struct PluginReport {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub installed_version: Option<String>,
    pub remote_version: Option<String>,
    pub action: ReportAction,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Outcome classification for one tracked plugin.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportAction {
    Download,
    None,
    ManualRequired,
    Failed,
}

impl fmt::Display for ReportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportAction::Download => "DOWNLOAD",
            ReportAction::None => "NONE",
            ReportAction::ManualRequired => "MANUAL_REQUIRED",
            ReportAction::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Accumulates per-plugin outcomes into a finished report.
pub struct ReportBuilder {
    command: String,
    plugins: BTreeMap<String, PluginReport>,
}

impl ReportBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            plugins: BTreeMap::new(),
        }
    }

    /// Record the outcome for one tracked plugin by name.
    pub fn record(&mut self, name: impl Into<String>, entry: PluginReport) {
        self.plugins.insert(name.into(), entry);
    }

    /// Seal the report, tallying outcome counters.
    pub fn finish(self) -> RunReport {
        let mut downloads = 0usize;
        let mut up_to_date = 0usize;
        let mut manual_required = 0usize;
        let mut failures = 0usize;
        for entry in self.plugins.values() {
            match entry.action {
                ReportAction::Download => downloads += 1,
                ReportAction::None => up_to_date += 1,
                ReportAction::ManualRequired => manual_required += 1,
                ReportAction::Failed => failures += 1,
            }
        }

        RunReport {
            metadata: RunMetadata {
                generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                generated_by: "synplug_core".to_string(),
                command: self.command,
                total_plugins: self.plugins.len(),
                downloads,
                up_to_date,
                manual_required,
                failures,
            },
            plugins: self.plugins,
        }
    }
}

/// Persist the report to the given path.
pub fn write_report(document: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| {
                SynplugError::Filesystem(format!(
                    "Failed to create report directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
    }
    let file = File::create(path).map_err(|err| {
        SynplugError::Filesystem(format!(
            "Failed to create report file {}: {err}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, document).map_err(|err| {
        SynplugError::Filesystem(format!(
            "Failed to write report {}: {err}",
            path.display()
        ))
    })?;
    Ok(())
}
