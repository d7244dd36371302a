/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::store
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Persist the tracked-plugin roster as a block-style YAML
    document and expose the entry type shared across the
    runtime.

  Security / Safety Notes:
    Saves are written to a sidecar temp file and renamed into
    place so a crash cannot leave a truncated roster.

  Dependencies:
    serde + serde_yaml for the document format.

  Operational Scope:
    Loaded once per invocation; saved after any roster
    mutation (add, remove).

  Revision History:
    2026-05-13 COD  Authored tracking store and entry model.
    2026-06-19 COD  Validated entry names at load time.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Lossless round-trip of operator-authored documents
    - Atomic replacement on save
    - Validation at the trust boundary
============================================================*/

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynplugError};

/// Provider-specific selector stored alongside an entry.
///
/// Spiget wants a numeric resource id while GitHub and Jenkins
/// want textual locators; the YAML scalar keeps whichever shape
/// the operator wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceRef {
    Number(i64),
    Text(String),
}

impl ResourceRef {
    /// Parse a CLI argument, preferring the numeric shape.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(number) => ResourceRef::Number(number),
            Err(_) => ResourceRef::Text(raw.to_string()),
        }
    }

    /// Numeric view; numeric-looking text is accepted too.
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            ResourceRef::Number(number) => Some(*number),
            ResourceRef::Text(text) => text.parse().ok(),
        }
    }

    /// Textual view for providers that take locator strings.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResourceRef::Text(text) => Some(text),
            ResourceRef::Number(_) => None,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Number(number) => write!(f, "{number}"),
            ResourceRef::Text(text) => f.write_str(text),
        }
    }
}

/// One tracked plugin as persisted in the roster document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl PluginEntry {
    pub fn new(
        type_tag: impl Into<String>,
        name: impl Into<String>,
        resource: Option<ResourceRef>,
        prefix: Option<String>,
    ) -> Result<Self> {
        let entry = Self {
            type_tag: type_tag.into(),
            name: name.into(),
            resource,
            prefix,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Reject names that would escape the plugins directory.
    pub fn validate(&self) -> Result<()> {
        if self.name.contains('/') {
            return Err(SynplugError::InvalidName {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Human-facing label; falls back to the tracked name.
    pub fn display_name(&self) -> &str {
        self.prefix.as_deref().unwrap_or(&self.name)
    }

    /// Archive filename derived from the tracked name.
    pub fn jar_name(&self) -> String {
        format!("{}.jar", self.name.replace(" -", "_"))
    }

    /// Where the managed archive lives under `plugins_dir`.
    pub fn default_file_path(&self, plugins_dir: &Path) -> PathBuf {
        plugins_dir.join(self.jar_name())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackingDocument {
    #[serde(default)]
    plugins: Vec<PluginEntry>,
}

/// YAML-backed roster of tracked plugins.
pub struct TrackingStore {
    path: PathBuf,
}

impl TrackingStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the roster; a missing or empty document is an empty
    /// roster, not an error.
    pub fn load(&self) -> Result<Vec<PluginEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            SynplugError::Filesystem(format!(
                "Failed to read tracking file {}: {err}",
                self.path.display()
            ))
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let document: TrackingDocument = serde_yaml::from_str(&raw).map_err(|err| {
            SynplugError::Serialization(format!(
                "Failed to parse tracking file {}: {err}",
                self.path.display()
            ))
        })?;
        for entry in &document.plugins {
            entry.validate()?;
        }
        Ok(document.plugins)
    }

    /// Write the roster as block-style YAML, replacing the old
    /// document atomically.
    pub fn save(&self, entries: &[PluginEntry]) -> Result<()> {
        let document = TrackingDocument {
            plugins: entries.to_vec(),
        };
        let rendered = serde_yaml::to_string(&document).map_err(|err| {
            SynplugError::Serialization(format!("Failed to render tracking document: {err}"))
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    SynplugError::Filesystem(format!(
                        "Failed to create tracking directory {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }

        let mut temp = self.path.as_os_str().to_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        std::fs::write(&temp, rendered).map_err(|err| {
            SynplugError::Filesystem(format!(
                "Failed to write tracking file {}: {err}",
                temp.display()
            ))
        })?;
        std::fs::rename(&temp, &self.path).map_err(|err| {
            SynplugError::Filesystem(format!(
                "Failed to replace tracking file {}: {err}",
                self.path.display()
            ))
        })?;
        Ok(())
    }
}
