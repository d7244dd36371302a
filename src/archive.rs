/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::archive
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Inspect locally installed plugin archives, detect which
    server platform they target, and derive a comparable
    version record from the embedded manifest.

  Security / Safety Notes:
    Archives are read only; no entry is ever extracted to
    disk, so hostile entry names cannot escape the plugins
    directory.

  Dependencies:
    zip for archive access, serde_yaml + serde_json for the
    manifest formats.

  Operational Scope:
    Invoked per tracked entry before the update decision;
    files are opened and closed within each call.

  Revision History:
    2026-05-14 COD  Authored platform detection and local
                    version inspection.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Absent files are a state, not an error
    - Closed set of recognised manifest layouts
    - Scoped file handles, nothing held across calls
============================================================*/

use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use zip::ZipArchive;

use crate::error::{Result, SynplugError};
use crate::version::VersionRecord;

/// Server platforms whose archive manifests we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginPlatform {
    Paper,
    Velocity,
}

impl PluginPlatform {
    /// Probe order; the first manifest present wins.
    pub const ALL: [PluginPlatform; 2] = [PluginPlatform::Paper, PluginPlatform::Velocity];

    /// Manifest entry name inside the archive.
    pub fn manifest_name(self) -> &'static str {
        match self {
            PluginPlatform::Paper => "plugin.yml",
            PluginPlatform::Velocity => "velocity-plugin.json",
        }
    }

    /// Pull the declared version out of a raw manifest body.
    ///
    /// Both formats allow the scalar to be written unquoted, in
    /// which case it arrives as a number; render it back to the
    /// string form used everywhere else.
    fn parse_version(self, raw: &[u8]) -> Result<String> {
        match self {
            PluginPlatform::Paper => {
                let doc: serde_yaml::Value = serde_yaml::from_slice(raw).map_err(|err| {
                    SynplugError::Serialization(format!(
                        "Failed to parse {}: {err}",
                        self.manifest_name()
                    ))
                })?;
                match doc.get("version") {
                    Some(serde_yaml::Value::String(version)) => Ok(version.clone()),
                    Some(serde_yaml::Value::Number(version)) => Ok(version.to_string()),
                    _ => Err(self.missing_version()),
                }
            }
            PluginPlatform::Velocity => {
                let doc: serde_json::Value = serde_json::from_slice(raw).map_err(|err| {
                    SynplugError::Serialization(format!(
                        "Failed to parse {}: {err}",
                        self.manifest_name()
                    ))
                })?;
                match doc.get("version") {
                    Some(serde_json::Value::String(version)) => Ok(version.clone()),
                    Some(serde_json::Value::Number(version)) => Ok(version.to_string()),
                    _ => Err(self.missing_version()),
                }
            }
        }
    }

    fn missing_version(self) -> SynplugError {
        SynplugError::Serialization(format!(
            "{} does not declare a usable version",
            self.manifest_name()
        ))
    }
}

fn open_archive(file: &Path) -> Result<ZipArchive<fs::File>> {
    let handle = fs::File::open(file).map_err(|err| {
        SynplugError::Filesystem(format!("Failed to open {}: {err}", file.display()))
    })?;
    ZipArchive::new(handle).map_err(|err| {
        SynplugError::Filesystem(format!(
            "Failed to read {} as an archive: {err}",
            file.display()
        ))
    })
}

/// Identify which platform manifest an archive carries.
///
/// A missing file means "nothing installed yet" and returns
/// `None`; an archive with no recognised manifest is an error.
pub fn detect_platform(file: &Path) -> Result<Option<PluginPlatform>> {
    if !file.exists() {
        return Ok(None);
    }
    let archive = open_archive(file)?;
    for platform in PluginPlatform::ALL {
        if archive
            .file_names()
            .any(|name| name == platform.manifest_name())
        {
            return Ok(Some(platform));
        }
    }
    Err(SynplugError::NotAPlugin {
        path: file.to_path_buf(),
    })
}

/// Build a version record for the installed archive at `file`.
///
/// The record's name is the archive's file stem and its date is
/// the filesystem modification time, so it compares against
/// upstream records on recency without trusting local clocks
/// for anything stronger.
pub fn read_local_version(file: &Path) -> Result<Option<VersionRecord>> {
    let Some(platform) = detect_platform(file)? else {
        return Ok(None);
    };

    let mut archive = open_archive(file)?;
    let mut raw = Vec::new();
    {
        let mut manifest = archive.by_name(platform.manifest_name()).map_err(|err| {
            SynplugError::Filesystem(format!(
                "Failed to open {} inside {}: {err}",
                platform.manifest_name(),
                file.display()
            ))
        })?;
        manifest.read_to_end(&mut raw)?;
    }
    let version = platform.parse_version(&raw)?;

    let Some(stem) = file.file_stem() else {
        return Err(SynplugError::Filesystem(format!(
            "{} has no usable file name",
            file.display()
        )));
    };
    let modified = fs::metadata(file)
        .and_then(|meta| meta.modified())
        .map_err(|err| {
            SynplugError::Filesystem(format!(
                "Failed to read modification time of {}: {err}",
                file.display()
            ))
        })?;
    let date: DateTime<Utc> = modified.into();

    VersionRecord::new(stem.to_string_lossy().into_owned(), version, date).map(Some)
}
