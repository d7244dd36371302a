/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::provider
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Define the contract every upstream source integration
    fulfils, plus the shared HTTP context and the memoizing
    wrapper that drives queries and downloads.

  Security / Safety Notes:
    Performs read-only HTTPS GET requests. Downloads stream to
    a sidecar temp file and are renamed into place so a failed
    transfer never clobbers a working plugin archive.

  Dependencies:
    reqwest for HTTP, async-trait for the object-safe contract.

  Operational Scope:
    One provider instance per tracked entry per invocation;
    the HTTP client is shared across all of them.

  Revision History:
    2026-05-15 COD  Authored provider contract and wrapper.
    2026-06-19 COD  Routed downloads through temp-and-rename.
  ------------------------------------------------------------
  SSE Principles Observed:
    - One narrow trait seam per upstream integration
    - Explicit cache invalidation, no hidden refresh
    - CDN interference surfaced as an outcome, not a crash
============================================================*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, SERVER};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::config::SynplugConfig;
use crate::error::{Result, SynplugError};
use crate::store::PluginEntry;
use crate::version::VersionRecord;

/// Shared state handed to every provider instance.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub client: reqwest::Client,
    pub modrinth_base: String,
    pub spiget_base: String,
    pub github_base: String,
    pub target_loader: String,
    pub max_parallel_requests: usize,
}

impl SourceContext {
    /// Construct the process-wide HTTP session and endpoint set.
    pub fn new(config: &SynplugConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .user_agent(&config.http.user_agent)
            .build()
            .map_err(|err| SynplugError::Network(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            modrinth_base: trim_base(&config.sources.modrinth_base),
            spiget_base: trim_base(&config.sources.spiget_base),
            github_base: trim_base(&config.sources.github_base),
            target_loader: config.sources.target_loader.clone(),
            max_parallel_requests: config.sources.max_parallel_requests.max(1),
        })
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Contract each upstream integration implements.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// The tracked entry this provider was built for.
    fn entry(&self) -> &PluginEntry;

    /// Query the upstream API for the newest published build.
    async fn get_latest_version_info(&self) -> Result<VersionRecord>;

    /// Derive the direct artifact URL for a previously fetched
    /// record without further network calls.
    fn download_url(&self, version: &VersionRecord) -> Result<String>;
}

/// Memoizing front over a boxed source integration.
pub struct Provider {
    source: Box<dyn SourceProvider>,
    client: reqwest::Client,
    default_file: PathBuf,
    cached_latest: Option<VersionRecord>,
}

impl Provider {
    pub fn new(
        source: Box<dyn SourceProvider>,
        client: reqwest::Client,
        default_file: PathBuf,
    ) -> Self {
        Self {
            source,
            client,
            default_file,
            cached_latest: None,
        }
    }

    pub fn entry(&self) -> &PluginEntry {
        self.source.entry()
    }

    /// Where this plugin's archive lives when no override is given.
    pub fn default_file(&self) -> &Path {
        &self.default_file
    }

    /// Latest upstream record, queried at most once until the
    /// cache is cleared.
    pub async fn latest_version(&mut self) -> Result<&VersionRecord> {
        if self.cached_latest.is_none() {
            let record = self.source.get_latest_version_info().await?;
            self.cached_latest = Some(record);
        }
        self.cached_latest
            .as_ref()
            .ok_or_else(|| SynplugError::Runtime("Latest-version cache unavailable".into()))
    }

    /// Drop the memoized record, forcing the next query to hit
    /// the upstream again. Reserved for long-lived callers; the
    /// CLI builds fresh providers per invocation.
    #[allow(dead_code)]
    pub fn clear_cache(&mut self) {
        self.cached_latest = None;
    }

    pub fn download_url(&self, version: &VersionRecord) -> Result<String> {
        self.source.download_url(version)
    }

    /// Fetch an artifact, defaulting to the latest record and the
    /// entry's standard path when either is omitted.
    pub async fn download(
        &mut self,
        version: Option<&VersionRecord>,
        file: Option<&Path>,
    ) -> Result<PathBuf> {
        let record = match version {
            Some(record) => record.clone(),
            None => self.latest_version().await?.clone(),
        };
        let target = file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_file.clone());
        let url = self.source.download_url(&record)?;
        fetch_to_path(&self.client, &url, &target).await?;
        Ok(target)
    }
}

/// GET `url` and decode the JSON body, mapping non-success
/// statuses to an upstream error carrying URL and status.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| SynplugError::Network(format!("Request to {url} failed: {err}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(SynplugError::Upstream {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response.json::<T>().await.map_err(|err| {
        SynplugError::Serialization(format!("Failed to decode response from {url}: {err}"))
    })
}

/// Stream `url` into `dest`, intercepting anti-automation edges.
pub(crate) async fn fetch_to_path(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|err| SynplugError::Network(format!("Request to {url} failed: {err}")))?;
    let status = response.status();
    if !status.is_success() {
        if served_by_cloudflare(response.headers()) {
            return Err(SynplugError::ManualDownloadRequired {
                message: "Cloudflare blocked automatic download.".to_string(),
                url: url.to_string(),
            });
        }
        return Err(SynplugError::Upstream {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                SynplugError::Filesystem(format!(
                    "Failed to create plugin directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
    }

    let part = dest.with_extension("jar.part");
    let mut out = tokio::fs::File::create(&part).await.map_err(|err| {
        SynplugError::Filesystem(format!("Failed to create {}: {err}", part.display()))
    })?;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|err| SynplugError::Network(format!("Transfer from {url} failed: {err}")))?
    {
        out.write_all(&chunk).await.map_err(|err| {
            SynplugError::Filesystem(format!("Failed to write {}: {err}", part.display()))
        })?;
    }
    out.flush().await.map_err(|err| {
        SynplugError::Filesystem(format!("Failed to flush {}: {err}", part.display()))
    })?;
    drop(out);
    tokio::fs::rename(&part, dest).await.map_err(|err| {
        SynplugError::Filesystem(format!(
            "Failed to move download into place at {}: {err}",
            dest.display()
        ))
    })?;
    Ok(())
}

fn served_by_cloudflare(headers: &HeaderMap) -> bool {
    headers
        .get(SERVER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("cloudflare"))
        .unwrap_or(false)
}
