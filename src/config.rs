/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load and validate Syn-Plug-Core configuration from TOML,
    providing defaults for paths, HTTP behaviour, and upstream
    source endpoints.

  Security / Safety Notes:
    Configuration may name local paths only; no secrets are
    read or stored by this module.

  Dependencies:
    serde + toml for parsing, dirs for platform directories.

  Operational Scope:
    Parsed once at startup; the resulting struct is shared
    read-only across the runtime.

  Revision History:
    2026-05-12 COD  Authored configuration loader.
    2026-06-19 COD  Added [sources] endpoint overrides for
                    air-gapped mirrors.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Defaults first, overrides explicit
    - Fail loudly on malformed operator input
    - No hidden environment coupling
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SynplugError};

/// Top-level Syn-Plug-Core configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SynplugConfig {
    pub paths: PathsConfig,
    pub http: HttpConfig,
    pub sources: SourcesConfig,
}

/// Filesystem locations used by the custodian.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub plugins_dir: PathBuf,
    pub tracking_file: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            plugins_dir: PathBuf::from("./plugins"),
            tracking_file: PathBuf::from("./plugins.yml"),
            log_dir: default_log_dir(),
        }
    }
}

/// Shared HTTP session behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Syn-Plug-Core/0.4 (linux)".to_string(),
        }
    }
}

/// Upstream endpoints and query behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub modrinth_base: String,
    pub spiget_base: String,
    pub github_base: String,
    pub target_loader: String,
    pub max_parallel_requests: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            modrinth_base: "https://api.modrinth.com/v2".to_string(),
            spiget_base: "https://api.spiget.org/v2".to_string(),
            github_base: "https://api.github.com".to_string(),
            target_loader: "paper".to_string(),
            max_parallel_requests: 4,
        }
    }
}

impl SynplugConfig {
    /// Load configuration from an explicit path, the default
    /// location, or built-in defaults when neither exists.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(SynplugError::Config(format!(
                        "Configuration file {} does not exist",
                        explicit.display()
                    )));
                }
                Self::load_from_file(explicit)
            }
            None => match default_config_path() {
                Some(ref default) if default.exists() => Self::load_from_file(default),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            SynplugError::Filesystem(format!(
                "Failed to read configuration {}: {err}",
                path.display()
            ))
        })?;
        toml::from_str(&raw).map_err(|err| {
            SynplugError::Config(format!(
                "Failed to parse configuration {}: {err}",
                path.display()
            ))
        })
    }

    /// Directory that holds the managed plugin archives.
    pub fn plugins_dir(&self) -> PathBuf {
        self.paths.plugins_dir.clone()
    }

    /// YAML document naming the tracked plugins.
    pub fn tracking_path(&self) -> PathBuf {
        self.paths.tracking_file.clone()
    }

    /// Directory receiving session log files.
    pub fn log_dir(&self) -> PathBuf {
        self.paths.log_dir.clone()
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("syn-plug").join("config.toml"))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("syn-plug").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_every_section() {
        let config = SynplugConfig::default();
        assert_eq!(config.paths.plugins_dir, PathBuf::from("./plugins"));
        assert_eq!(config.paths.tracking_file, PathBuf::from("./plugins.yml"));
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.sources.modrinth_base, "https://api.modrinth.com/v2");
        assert_eq!(config.sources.spiget_base, "https://api.spiget.org/v2");
        assert_eq!(config.sources.github_base, "https://api.github.com");
        assert_eq!(config.sources.target_loader, "paper");
        assert_eq!(config.sources.max_parallel_requests, 4);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(
            file,
            "[paths]\nplugins_dir = \"/srv/paper/plugins\"\n\n[sources]\ntarget_loader = \"velocity\"\n"
        )
        .expect("write");

        let config = SynplugConfig::load_from_optional_path(Some(&path)).expect("load");
        assert_eq!(config.plugins_dir(), PathBuf::from("/srv/paper/plugins"));
        assert_eq!(config.tracking_path(), PathBuf::from("./plugins.yml"));
        assert_eq!(config.sources.target_loader, "velocity");
        assert_eq!(config.sources.max_parallel_requests, 4);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err =
            SynplugConfig::load_from_optional_path(Some(Path::new("/nonexistent/syn-plug.toml")))
                .unwrap_err();
        assert!(matches!(err, SynplugError::Config(_)));
    }

    #[test]
    fn malformed_document_is_reported_as_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\ntimeout_secs = \"soon\"\n").expect("write");

        let err = SynplugConfig::load_from_optional_path(Some(&path)).unwrap_err();
        assert!(matches!(err, SynplugError::Config(_)));
    }
}
