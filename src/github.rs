/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::github
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query the GitHub releases API for the newest published
    release of a tracked repository and select its jar asset.

  Security / Safety Notes:
    Performs unauthenticated read-only HTTPS requests; subject
    to the public rate limits. No tokens are read or sent.

  Dependencies:
    reqwest via the shared source context, serde for response
    parsing.

  Operational Scope:
    Serves tracked entries whose type tag is `github`; the
    resource field must carry an `owner/repo` locator.

  Revision History:
    2026-05-16 COD  Implemented GitHub source provider.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Locators validated before any network traffic
    - Asset selection by explicit suffix, not position
    - Structured response parsing with explicit error paths
============================================================*/

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use urlencoding::encode;

use crate::error::{Result, SynplugError};
use crate::provider::{get_json, SourceContext, SourceProvider};
use crate::store::{PluginEntry, ResourceRef};
use crate::version::VersionRecord;

/// GitHub releases integration.
#[derive(Debug)]
pub struct GithubProvider {
    entry: PluginEntry,
    context: SourceContext,
    owner: String,
    repo: String,
}

impl GithubProvider {
    /// Build the provider, insisting on an `owner/repo` locator.
    pub fn new(entry: PluginEntry, context: SourceContext) -> Result<Self> {
        let locator = entry
            .resource
            .as_ref()
            .and_then(ResourceRef::as_text)
            .ok_or_else(|| {
                SynplugError::Config(format!(
                    "GitHub entry {} requires an owner/repo resource",
                    entry.name
                ))
            })?;
        let (owner, repo) = parse_locator(locator).ok_or_else(|| {
            SynplugError::Config(format!(
                "GitHub resource `{locator}` for {} is not of the form owner/repo",
                entry.name
            ))
        })?;
        Ok(Self {
            entry,
            context,
            owner,
            repo,
        })
    }

    fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.context.github_base,
            encode(&self.owner),
            encode(&self.repo)
        )
    }
}

fn parse_locator(locator: &str) -> Option<(String, String)> {
    let (owner, repo) = locator.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

#[async_trait]
impl SourceProvider for GithubProvider {
    fn entry(&self) -> &PluginEntry {
        &self.entry
    }

    async fn get_latest_version_info(&self) -> Result<VersionRecord> {
        let url = self.latest_release_url();
        let release: GithubRelease = get_json(&self.context.client, &url).await?;

        let asset = release
            .assets
            .iter()
            .find(|asset| asset.name.ends_with(".jar"))
            .ok_or_else(|| SynplugError::InvalidSource {
                name: self.entry.name.clone(),
                reason: format!("latest release {} publishes no jar asset", release.tag_name),
            })?;

        let date = DateTime::parse_from_rfc3339(&release.published_at)
            .map_err(|err| {
                SynplugError::Serialization(format!(
                    "Failed to parse publish date `{}`: {err}",
                    release.published_at
                ))
            })?
            .with_timezone(&Utc);

        Ok(
            VersionRecord::new(self.entry.name.clone(), release.tag_name.clone(), date)?
                .with_artifact_url(asset.browser_download_url.clone()),
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
struct GithubRelease {
    tag_name: String,
    published_at: String,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(server: &mockito::ServerGuard) -> SourceContext {
        SourceContext {
            client: reqwest::Client::new(),
            modrinth_base: server.url(),
            spiget_base: server.url(),
            github_base: server.url(),
            target_loader: "paper".to_string(),
            max_parallel_requests: 1,
        }
    }

    fn provider(server: &mockito::ServerGuard, locator: &str) -> Result<GithubProvider> {
        let entry = PluginEntry::new(
            "github",
            "ViaVersion",
            Some(ResourceRef::Text(locator.to_string())),
            None,
        )?;
        GithubProvider::new(entry, context(server))
    }

    #[tokio::test]
    async fn latest_release_yields_tag_date_and_jar_asset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/ViaVersion/ViaVersion/releases/latest")
            .with_status(200)
            .with_body(
                json!({
                    "tag_name": "5.0.1",
                    "published_at": "2026-06-30T18:45:00Z",
                    "assets": [
                        {
                            "name": "checksums.txt",
                            "browser_download_url": "https://gh.invalid/checksums.txt"
                        },
                        {
                            "name": "ViaVersion-5.0.1.jar",
                            "browser_download_url": "https://gh.invalid/ViaVersion-5.0.1.jar"
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let record = provider(&server, "ViaVersion/ViaVersion")
            .expect("provider")
            .get_latest_version_info()
            .await
            .expect("record");

        assert_eq!(record.name(), "ViaVersion");
        assert_eq!(record.version(), "5.0.1");
        assert_eq!(
            record.artifact_url(),
            Some("https://gh.invalid/ViaVersion-5.0.1.jar")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn release_without_jar_assets_is_an_invalid_source() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/ViaVersion/ViaVersion/releases/latest")
            .with_status(200)
            .with_body(
                json!({
                    "tag_name": "5.0.1",
                    "published_at": "2026-06-30T18:45:00Z",
                    "assets": [
                        {
                            "name": "source.tar.gz",
                            "browser_download_url": "https://gh.invalid/source.tar.gz"
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = provider(&server, "ViaVersion/ViaVersion")
            .expect("provider")
            .get_latest_version_info()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SynplugError::InvalidSource { ref name, .. } if name == "ViaVersion"
        ));
    }

    #[tokio::test]
    async fn malformed_locators_are_config_errors() {
        let server = mockito::Server::new_async().await;
        for locator in ["justaname", "owner/", "/repo", "a/b/c"] {
            let err = provider(&server, locator).unwrap_err();
            assert!(
                matches!(err, SynplugError::Config(_)),
                "locator {locator} should be rejected"
            );
        }

        let numeric = PluginEntry::new(
            "github",
            "ViaVersion",
            Some(ResourceRef::Number(42)),
            None,
        )
        .expect("entry");
        let err = GithubProvider::new(numeric, context(&server)).unwrap_err();
        assert!(matches!(err, SynplugError::Config(_)));
    }

    #[tokio::test]
    async fn missing_repository_surfaces_the_upstream_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/ViaVersion/Ghost/releases/latest")
            .with_status(404)
            .with_body(json!({"message": "Not Found"}).to_string())
            .create_async()
            .await;

        let err = provider(&server, "ViaVersion/Ghost")
            .expect("provider")
            .get_latest_version_info()
            .await
            .unwrap_err();
        assert!(matches!(err, SynplugError::Upstream { status: 404, .. }));
    }
}
