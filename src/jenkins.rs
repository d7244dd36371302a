/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::jenkins
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query a Jenkins job for its last successful build and
    derive the archived jar artifact URL.

  Security / Safety Notes:
    Performs read-only HTTPS requests against the operator's
    configured job URL only; no other paths are derived.

  Dependencies:
    reqwest via the shared source context, serde for response
    parsing.

  Operational Scope:
    Serves tracked entries whose type tag is `jenkins`; the
    resource field must carry the job URL.

  Revision History:
    2026-05-16 COD  Implemented Jenkins source provider.
    2026-06-19 COD  Fall back to the sole artifact when no jar
                    suffix matches.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Build numbers as version tokens, timestamps as recency
    - Artifact selection by explicit suffix, not position
    - Operator-supplied URLs used verbatim, never rewritten
============================================================*/

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, SynplugError};
use crate::provider::{get_json, SourceContext, SourceProvider};
use crate::store::{PluginEntry, ResourceRef};
use crate::version::VersionRecord;

/// Jenkins CI-artifact integration.
#[derive(Debug)]
pub struct JenkinsProvider {
    entry: PluginEntry,
    context: SourceContext,
    job_url: String,
}

impl JenkinsProvider {
    /// Build the provider, insisting on a textual job URL.
    pub fn new(entry: PluginEntry, context: SourceContext) -> Result<Self> {
        let job_url = entry
            .resource
            .as_ref()
            .and_then(ResourceRef::as_text)
            .map(|raw| raw.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                SynplugError::Config(format!(
                    "Jenkins entry {} requires a job URL resource",
                    entry.name
                ))
            })?;
        Ok(Self {
            entry,
            context,
            job_url,
        })
    }

    fn last_successful_url(&self) -> String {
        format!("{}/lastSuccessfulBuild/api/json", self.job_url)
    }
}

#[async_trait]
impl SourceProvider for JenkinsProvider {
    fn entry(&self) -> &PluginEntry {
        &self.entry
    }

    async fn get_latest_version_info(&self) -> Result<VersionRecord> {
        let url = self.last_successful_url();
        let build: JenkinsBuild = get_json(&self.context.client, &url).await?;

        let artifact = build
            .artifacts
            .iter()
            .find(|artifact| artifact.file_name.ends_with(".jar"))
            .or_else(|| match build.artifacts.as_slice() {
                [only] => Some(only),
                _ => None,
            })
            .ok_or_else(|| SynplugError::InvalidSource {
                name: self.entry.name.clone(),
                reason: format!(
                    "last successful build {} archives no jar artifact",
                    build.number
                ),
            })?;

        Ok(VersionRecord::from_epoch_millis(
            self.entry.name.clone(),
            build.number.to_string(),
            build.timestamp,
        )?
        .with_artifact_url(artifact_url(&build.url, &artifact.relative_path)))
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

fn artifact_url(build_url: &str, relative_path: &str) -> String {
    if build_url.ends_with('/') {
        format!("{build_url}artifact/{relative_path}")
    } else {
        format!("{build_url}/artifact/{relative_path}")
    }
}

#[derive(Debug, Deserialize)]
struct JenkinsBuild {
    number: i64,
    timestamp: i64,
    url: String,
    #[serde(default)]
    artifacts: Vec<JenkinsArtifact>,
}

#[derive(Debug, Deserialize)]
struct JenkinsArtifact {
    #[serde(rename = "fileName")]
    file_name: String,
    #[serde(rename = "relativePath")]
    relative_path: String,
}
