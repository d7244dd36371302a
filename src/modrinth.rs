/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::modrinth
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query the Modrinth v2 API for the newest published build
    of a tracked project that targets our server loader.

  Security / Safety Notes:
    Performs read-only HTTPS requests to the public Modrinth
    API. No credentials are transmitted.

  Dependencies:
    reqwest via the shared source context, serde for response
    parsing.

  Operational Scope:
    Serves tracked entries whose type tag is `modrinth`; the
    entry name doubles as the project slug or opaque id.

  Revision History:
    2026-05-16 COD  Implemented Modrinth source provider.
    2026-06-19 COD  Always filter the version list by the
                    configured target loader.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Single authoritative query path, no legacy fallbacks
    - Structured response parsing with explicit error paths
    - Loader compatibility enforced before any download
============================================================*/

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use urlencoding::encode;

use crate::error::{Result, SynplugError};
use crate::provider::{get_json, SourceContext, SourceProvider};
use crate::store::PluginEntry;
use crate::version::VersionRecord;

/// Modrinth marketplace integration.
///
/// The version list is served newest first, so the first entry
/// whose loader set matches the configured target is the latest
/// compatible build.
#[derive(Debug)]
pub struct ModrinthProvider {
    entry: PluginEntry,
    context: SourceContext,
}

impl ModrinthProvider {
    pub fn new(entry: PluginEntry, context: SourceContext) -> Self {
        Self { entry, context }
    }

    fn versions_url(&self) -> String {
        format!(
            "{}/project/{}/version",
            self.context.modrinth_base,
            encode(&self.entry.name)
        )
    }
}

#[async_trait]
impl SourceProvider for ModrinthProvider {
    fn entry(&self) -> &PluginEntry {
        &self.entry
    }

    async fn get_latest_version_info(&self) -> Result<VersionRecord> {
        let url = self.versions_url();
        let versions: Vec<ModrinthVersion> = get_json(&self.context.client, &url).await?;

        let target = &self.context.target_loader;
        let Some(hit) = versions.iter().find(|version| {
            version
                .loaders
                .iter()
                .any(|loader| loader.eq_ignore_ascii_case(target))
        }) else {
            return Err(SynplugError::InvalidSource {
                name: self.entry.name.clone(),
                reason: format!("no published {target} build"),
            });
        };

        let file = hit
            .files
            .iter()
            .find(|file| file.primary)
            .or_else(|| hit.files.first())
            .ok_or_else(|| SynplugError::InvalidSource {
                name: self.entry.name.clone(),
                reason: "matching version lists no files".to_string(),
            })?;

        let date = DateTime::parse_from_rfc3339(&hit.date_published)
            .map_err(|err| {
                SynplugError::Serialization(format!(
                    "Failed to parse publish date `{}`: {err}",
                    hit.date_published
                ))
            })?
            .with_timezone(&Utc);

        Ok(
            VersionRecord::new(self.entry.name.clone(), hit.version_number.clone(), date)?
                .with_artifact_url(file.url.clone()),
        )
    }

    fn download_url(&self, version: &VersionRecord) -> Result<String> {
        version.artifact_url().map(str::to_owned).ok_or_else(|| {
            SynplugError::Runtime(format!(
                "Version record for {} carries no artifact URL",
                self.entry.name
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ModrinthVersion {
    version_number: String,
    date_published: String,
    #[serde(default)]
    loaders: Vec<String>,
    #[serde(default)]
    files: Vec<ModrinthFile>,
}

#[derive(Debug, Deserialize)]
struct ModrinthFile {
    url: String,
    #[serde(default)]
    primary: bool,
}
