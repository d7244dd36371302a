/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::spiget
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query the Spiget API for the newest release of a SpigotMC
    resource and derive its download endpoint.

  Security / Safety Notes:
    Performs read-only HTTPS requests. The download endpoint
    redirects to SpigotMC behind Cloudflare; blocked transfers
    surface as manual-download outcomes, never as crashes.

  Dependencies:
    reqwest via the shared source context, serde for response
    parsing.

  Operational Scope:
    Serves tracked entries whose type tag is `spiget`; the
    resource field must carry the numeric SpigotMC id.

  Revision History:
    2026-05-16 COD  Implemented Spiget source provider.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Resource ids validated before any network traffic
    - Download URLs derived, never guessed per call
    - Epoch timestamps converted once, at the boundary
============================================================*/

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, SynplugError};
use crate::provider::{get_json, SourceContext, SourceProvider};
use crate::store::{PluginEntry, ResourceRef};
use crate::version::VersionRecord;

/// Spiget package-index integration.
#[derive(Debug)]
pub struct SpigetProvider {
    entry: PluginEntry,
    context: SourceContext,
    resource_id: i64,
}

impl SpigetProvider {
    /// Build the provider, insisting on a numeric resource id.
    pub fn new(entry: PluginEntry, context: SourceContext) -> Result<Self> {
        let resource_id = entry
            .resource
            .as_ref()
            .and_then(ResourceRef::as_numeric)
            .ok_or_else(|| {
                SynplugError::Config(format!(
                    "Spiget entry {} requires a numeric resource id",
                    entry.name
                ))
            })?;
        Ok(Self {
            entry,
            context,
            resource_id,
        })
    }

    fn latest_url(&self) -> String {
        format!(
            "{}/resources/{}/versions/latest",
            self.context.spiget_base, self.resource_id
        )
    }
}

#[async_trait]
impl SourceProvider for SpigetProvider {
    fn entry(&self) -> &PluginEntry {
        &self.entry
    }

    async fn get_latest_version_info(&self) -> Result<VersionRecord> {
        let url = self.latest_url();
        let latest: SpigetLatestVersion = get_json(&self.context.client, &url).await?;
        VersionRecord::from_epoch(self.entry.name.clone(), latest.name, latest.release_date)
    }

    /// Spiget never embeds artifact URLs; the endpoint is a pure
    /// function of the resource id.
    fn download_url(&self, _version: &VersionRecord) -> Result<String> {
        Ok(format!(
            "{}/resources/{}/download",
            self.context.spiget_base, self.resource_id
        ))
    }
}

#[derive(Debug, Deserialize)]
struct SpigetLatestVersion {
    name: String,
    #[serde(rename = "releaseDate")]
    release_date: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
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

    fn provider(server: &mockito::ServerGuard, resource: ResourceRef) -> Result<SpigetProvider> {
        let entry = PluginEntry::new("spiget", "EssentialsX", Some(resource), None)?;
        SpigetProvider::new(entry, context(server))
    }

    #[tokio::test]
    async fn latest_maps_version_name_and_release_epoch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/resources/9089/versions/latest")
            .with_status(200)
            .with_body(
                json!({
                    "name": "2.20.1",
                    "releaseDate": 1_688_495_420,
                    "downloads": 52144
                })
                .to_string(),
            )
            .create_async()
            .await;

        let record = provider(&server, ResourceRef::Number(9089))
            .expect("provider")
            .get_latest_version_info()
            .await
            .expect("record");

        assert_eq!(record.name(), "EssentialsX");
        assert_eq!(record.version(), "2.20.1");
        assert_eq!(
            record.date(),
            DateTime::from_timestamp(1_688_495_420, 0).expect("date")
        );
        assert_eq!(record.artifact_url(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn download_url_is_derived_from_the_resource_id() {
        let server = mockito::Server::new_async().await;
        let provider = provider(&server, ResourceRef::Number(9089)).expect("provider");
        let record = VersionRecord::from_epoch("EssentialsX", "2.20.1", 1_688_495_420)
            .expect("record");

        assert_eq!(
            provider.download_url(&record).expect("url"),
            format!("{}/resources/9089/download", server.url())
        );
    }

    #[tokio::test]
    async fn numeric_text_resource_is_accepted() {
        let server = mockito::Server::new_async().await;
        let provider =
            provider(&server, ResourceRef::Text("9089".to_string())).expect("provider");
        let record = VersionRecord::from_epoch("EssentialsX", "2.20.1", 1_688_495_420)
            .expect("record");
        assert!(provider.download_url(&record).expect("url").contains("/resources/9089/"));
    }

    #[tokio::test]
    async fn missing_or_textual_resource_is_a_config_error() {
        let server = mockito::Server::new_async().await;

        let entry = PluginEntry::new("spiget", "EssentialsX", None, None).expect("entry");
        let err = SpigetProvider::new(entry, context(&server)).unwrap_err();
        assert!(matches!(err, SynplugError::Config(_)));

        let err = provider(&server, ResourceRef::Text("essentials".to_string())).unwrap_err();
        assert!(matches!(err, SynplugError::Config(_)));
    }

    #[tokio::test]
    async fn upstream_failure_carries_url_and_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/resources/9089/versions/latest")
            .with_status(503)
            .create_async()
            .await;

        let err = provider(&server, ResourceRef::Number(9089))
            .expect("provider")
            .get_latest_version_info()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SynplugError::Upstream { ref url, status: 503 }
                if url.contains("/resources/9089/versions/latest")
        ));
    }
}
