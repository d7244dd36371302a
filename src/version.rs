/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structure describing one discovered plugin build,
    whether read from a local archive or reported upstream.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    chrono for release timestamps.

  Operational Scope:
    Used across source providers, archive inspection, and the
    update decision engine to pass release metadata.

  Revision History:
    2026-05-12 COD  Introduced shared VersionRecord type.
    2026-06-02 COD  Attached optional artifact URLs for
                    providers that publish direct links.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Identity semantics decoupled from recency semantics
============================================================*/

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::error::{Result, SynplugError};

/// Immutable metadata for one plugin build.
///
/// Equality covers name and version only; recency is answered
/// separately through release dates so that two records naming
/// the same build compare equal even when their timestamps come
/// from different clocks (file mtime versus upstream publish).
#[derive(Debug, Clone)]
pub struct VersionRecord {
    name: String,
    version: String,
    date: DateTime<Utc>,
    artifact_url: Option<String>,
}

impl VersionRecord {
    /// Build a record, rejecting names that could escape the
    /// plugins directory when used as a file stem.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.into();
        if name.contains('/') {
            return Err(SynplugError::InvalidName { name });
        }
        Ok(Self {
            name,
            version: version.into(),
            date,
            artifact_url: None,
        })
    }

    /// Build a record from a Unix timestamp in whole seconds.
    pub fn from_epoch(
        name: impl Into<String>,
        version: impl Into<String>,
        seconds: i64,
    ) -> Result<Self> {
        let date = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            SynplugError::Runtime(format!("Timestamp {seconds}s is outside the supported range"))
        })?;
        Self::new(name, version, date)
    }

    /// Build a record from a Unix timestamp in milliseconds.
    pub fn from_epoch_millis(
        name: impl Into<String>,
        version: impl Into<String>,
        millis: i64,
    ) -> Result<Self> {
        let date = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            SynplugError::Runtime(format!("Timestamp {millis}ms is outside the supported range"))
        })?;
        Self::new(name, version, date)
    }

    /// Attach the direct artifact URL reported by an upstream.
    pub fn with_artifact_url(mut self, url: impl Into<String>) -> Self {
        self.artifact_url = Some(url.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn artifact_url(&self) -> Option<&str> {
        self.artifact_url.as_deref()
    }

    /// Expose the identity and date as one tuple for display.
    pub fn as_tuple(&self) -> (&str, &str, DateTime<Utc>) {
        (&self.name, &self.version, self.date)
    }

    /// True when both records name the same plugin, ignoring case.
    pub fn same_series(&self, other: &VersionRecord) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }

    /// Order two records by release date alone.
    pub fn release_ordering(&self, other: &VersionRecord) -> Ordering {
        self.date.cmp(&other.date)
    }

    /// True when this record was released strictly after `other`.
    pub fn is_newer_than(&self, other: &VersionRecord) -> bool {
        self.release_ordering(other) == Ordering::Greater
    }
}

impl PartialEq for VersionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for VersionRecord {}
