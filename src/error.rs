/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Plug-Core error types to provide consistent
    diagnostics and exit semantics.

  Security / Safety Notes:
    Error contexts redact potentially sensitive data such as
    credentials or tokens; only high-level paths and URLs are
    exposed.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate recoverable failures and
    consolidate exit codes for the binary entry point.

  Revision History:
    2026-05-12 COD  Established shared error definitions.
    2026-06-02 COD  Added archive inspection and manual-download
                    variants for the custodian loop.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-Plug-Core operations.
pub type Result<T> = std::result::Result<T, SynplugError>;

/// Enumerates high-level error domains surfaced by Syn-Plug-Core.
#[derive(Debug, Error)]
pub enum SynplugError {
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Unable to find plugin of type {tag}")]
    UnknownProviderType { tag: String },
    #[error("{name:?} contains invalid character - '/'")]
    InvalidName { name: String },
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Upstream request {url} failed with status {status}")]
    Upstream { url: String, status: u16 },
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error("{} is not a recognised plugin archive", path.display())]
    NotAPlugin { path: PathBuf },
    #[error("No usable release for {name}: {reason}")]
    InvalidSource { name: String, reason: String },
    #[error("{message} {url}")]
    ManualDownloadRequired { message: String, url: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SynplugError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SynplugError::Config(_) => ExitCode::from(20),
            SynplugError::UnknownProviderType { .. } => ExitCode::from(21),
            SynplugError::InvalidName { .. } => ExitCode::from(22),
            SynplugError::Network(_) => ExitCode::from(30),
            SynplugError::Serialization(_) => ExitCode::from(31),
            SynplugError::Upstream { .. } => ExitCode::from(32),
            SynplugError::Filesystem(_) => ExitCode::from(40),
            SynplugError::Io(_) => ExitCode::from(41),
            SynplugError::Runtime(_) => ExitCode::from(50),
            SynplugError::NotAPlugin { .. } => ExitCode::from(60),
            SynplugError::InvalidSource { .. } => ExitCode::from(61),
            SynplugError::ManualDownloadRequired { .. } => ExitCode::from(62),
        }
    }
}
