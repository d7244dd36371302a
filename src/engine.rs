/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::engine
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Decide per tracked plugin whether the upstream build
    supersedes the installed archive, and execute the
    resulting download when asked to.

  Security / Safety Notes:
    Downgrades are never performed; an upstream reporting an
    older date than the installed archive is a no-op.

  Dependencies:
    archive inspection and the provider wrapper.

  Operational Scope:
    Driven sequentially by the CLI after the parallel query
    phase has produced remote records.

  Revision History:
    2026-05-18 COD  Authored decision and execution paths.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Decisions separated from side effects
    - Manual intervention is an outcome, not a failure
    - Per-entry isolation; one failure never cascades
============================================================*/

use std::path::{Path, PathBuf};

use crate::archive;
use crate::error::{Result, SynplugError};
use crate::logger::Logger;
use crate::provider::Provider;
use crate::version::VersionRecord;

/// What the comparison concluded for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    Download,
    Skip,
}

/// Comparison inputs and conclusion for one entry.
#[derive(Debug)]
pub struct Evaluation {
    pub local: Option<VersionRecord>,
    pub remote: VersionRecord,
    pub action: UpdateAction,
}

/// Result of carrying an evaluation out.
#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Downloaded { version: String, file: PathBuf },
    UpToDate { installed: Option<String> },
    ManualRequired { message: String, url: String },
}

/// Compare local and remote records by release date.
///
/// A missing local record always downloads. Records naming
/// different plugins are a caller mix-up; the mismatch is
/// logged and the date comparison proceeds regardless.
pub fn decide(
    local: Option<&VersionRecord>,
    remote: &VersionRecord,
    label: &str,
    logger: &Logger,
) -> UpdateAction {
    let action = match local {
        None => UpdateAction::Download,
        Some(local) => {
            if !local.same_series(remote) {
                logger.warn(
                    "COMPARE",
                    format!(
                        "{label}: local record `{}` and remote record `{}` name different plugins",
                        local.name(),
                        remote.name()
                    ),
                );
            }
            if remote.is_newer_than(local) {
                UpdateAction::Download
            } else {
                UpdateAction::Skip
            }
        }
    };
    logger.debug(
        "DECIDE",
        format!(
            "{label}: local={} remote={} published {} action={action:?}",
            local.map(VersionRecord::version).unwrap_or("absent"),
            remote.version(),
            remote.date().to_rfc3339()
        ),
    );
    action
}

/// Inspect the installed archive at `file` and decide against
/// the already-fetched remote record.
pub fn evaluate(
    file: &Path,
    remote: VersionRecord,
    label: &str,
    logger: &Logger,
) -> Result<Evaluation> {
    let local = archive::read_local_version(file)?;
    let action = decide(local.as_ref(), &remote, label, logger);
    Ok(Evaluation {
        local,
        remote,
        action,
    })
}

/// Carry out an evaluation through the entry's provider.
///
/// `file` overrides the provider's default target path; the
/// caller that inspected an alternate location passes it here
/// so the download lands where the comparison looked.
pub async fn execute(
    provider: &mut Provider,
    evaluation: &Evaluation,
    file: Option<&Path>,
    logger: &Logger,
) -> Result<UpdateOutcome> {
    match evaluation.action {
        UpdateAction::Skip => Ok(UpdateOutcome::UpToDate {
            installed: evaluation
                .local
                .as_ref()
                .map(|record| record.version().to_string()),
        }),
        UpdateAction::Download => {
            logger.info(
                "DOWNLOAD",
                format!(
                    "Fetching {} {}",
                    evaluation.remote.name(),
                    evaluation.remote.version()
                ),
            );
            match provider.download(Some(&evaluation.remote), file).await {
                Ok(file) => Ok(UpdateOutcome::Downloaded {
                    version: evaluation.remote.version().to_string(),
                    file,
                }),
                Err(SynplugError::ManualDownloadRequired { message, url }) => {
                    logger.warn("MANUAL", format!("{message} {url}"));
                    Ok(UpdateOutcome::ManualRequired { message, url })
                }
                Err(err) => Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynplugConfig;
    use crate::provider::SourceContext;
    use crate::registry;
    use crate::store::{PluginEntry, ResourceRef};
    use std::io::Write;

    fn logger() -> Logger {
        Logger::new(None, false).expect("logger")
    }

    fn record(name: &str, version: &str, seconds: i64) -> VersionRecord {
        VersionRecord::from_epoch(name, version, seconds).expect("record")
    }

    fn write_archive(path: &Path, manifest: &str) {
        let file = std::fs::File::create(path).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("plugin.yml", zip::write::FileOptions::default())
            .expect("start entry");
        writer.write_all(manifest.as_bytes()).expect("write entry");
        writer.finish().expect("finish archive");
    }

    #[test]
    fn absent_local_always_downloads() {
        let remote = record("Chunky", "1.4.10", 1_700_500_000);
        assert_eq!(
            decide(None, &remote, "Chunky", &logger()),
            UpdateAction::Download
        );
    }

    #[test]
    fn newer_remote_downloads_older_and_equal_skip() {
        let local = record("Chunky", "1.3.92", 1_700_000_000);
        let log = logger();

        let newer = record("Chunky", "1.4.10", 1_700_500_000);
        assert_eq!(
            decide(Some(&local), &newer, "Chunky", &log),
            UpdateAction::Download
        );

        let same_date = record("Chunky", "1.4.10", 1_700_000_000);
        assert_eq!(
            decide(Some(&local), &same_date, "Chunky", &log),
            UpdateAction::Skip
        );

        let older = record("Chunky", "1.2.0", 1_600_000_000);
        assert_eq!(
            decide(Some(&local), &older, "Chunky", &log),
            UpdateAction::Skip
        );
    }

    #[test]
    fn name_mismatch_warns_and_still_compares_by_date() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_path = dir.path().join("session.log");
        let log = Logger::new(Some(log_path.clone()), false).expect("logger");

        let local = record("chunky", "1.3.92", 1_700_000_000);
        let remote = record("ChunkyBorder", "1.1.0", 1_700_500_000);
        assert_eq!(
            decide(Some(&local), &remote, "Chunky", &log),
            UpdateAction::Download
        );

        let body = std::fs::read_to_string(&log_path).expect("log body");
        assert!(
            body.contains("[WARN] [COMPARE]"),
            "comparison warning missing from: {body}"
        );
        assert!(body.contains("local record `chunky` and remote record `ChunkyBorder`"));
    }

    #[test]
    fn evaluate_reads_the_installed_archive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("Chunky.jar");
        write_archive(&file, "name: Chunky\nversion: 1.3.92\n");

        // Far-future remote date keeps the test clock-independent.
        let evaluation = evaluate(
            &file,
            record("Chunky", "1.4.10", 4_000_000_000),
            "Chunky",
            &logger(),
        )
        .expect("evaluation");
        assert_eq!(evaluation.action, UpdateAction::Download);
        assert_eq!(
            evaluation.local.as_ref().map(VersionRecord::version),
            Some("1.3.92")
        );

        let evaluation = evaluate(
            &file,
            record("Chunky", "1.0.0", 1_000_000),
            "Chunky",
            &logger(),
        )
        .expect("evaluation");
        assert_eq!(evaluation.action, UpdateAction::Skip);
    }

    #[test]
    fn evaluate_treats_missing_file_as_no_prior_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let evaluation = evaluate(
            &dir.path().join("Ghost.jar"),
            record("Ghost", "1.0.0", 1_700_000_000),
            "Ghost",
            &logger(),
        )
        .expect("evaluation");
        assert!(evaluation.local.is_none());
        assert_eq!(evaluation.action, UpdateAction::Download);
    }

    fn spiget_provider(server: &mockito::ServerGuard, plugins_dir: &Path) -> Provider {
        let mut config = SynplugConfig::default();
        config.sources.spiget_base = server.url();
        let context = SourceContext::new(&config).expect("context");
        let entry = PluginEntry::new(
            "spiget",
            "EssentialsX",
            Some(ResourceRef::Number(9089)),
            None,
        )
        .expect("entry");
        registry::provider_for(&entry, &context, plugins_dir).expect("provider")
    }

    #[tokio::test]
    async fn download_action_writes_through_the_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/resources/9089/download")
            .with_status(200)
            .with_body("fresh jar")
            .create_async()
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let mut provider = spiget_provider(&server, dir.path());
        let evaluation = Evaluation {
            local: None,
            remote: record("EssentialsX", "2.20.1", 1_700_000_000),
            action: UpdateAction::Download,
        };

        let outcome = execute(&mut provider, &evaluation, None, &logger())
            .await
            .expect("outcome");
        let expected = dir.path().join("EssentialsX.jar");
        assert_eq!(
            outcome,
            UpdateOutcome::Downloaded {
                version: "2.20.1".to_string(),
                file: expected.clone(),
            }
        );
        assert_eq!(
            std::fs::read_to_string(expected).expect("body"),
            "fresh jar"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn cloudflare_block_is_a_manual_outcome_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/resources/9089/download")
            .with_status(403)
            .with_header("server", "cloudflare")
            .create_async()
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let mut provider = spiget_provider(&server, dir.path());
        let evaluation = Evaluation {
            local: None,
            remote: record("EssentialsX", "2.20.1", 1_700_000_000),
            action: UpdateAction::Download,
        };

        let outcome = execute(&mut provider, &evaluation, None, &logger())
            .await
            .expect("outcome");
        assert_eq!(
            outcome,
            UpdateOutcome::ManualRequired {
                message: "Cloudflare blocked automatic download.".to_string(),
                url: format!("{}/resources/9089/download", server.url()),
            }
        );
    }

    #[tokio::test]
    async fn skip_action_reports_the_installed_version() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let mut provider = spiget_provider(&server, dir.path());
        let evaluation = Evaluation {
            local: Some(record("EssentialsX", "2.20.1", 1_700_000_000)),
            remote: record("EssentialsX", "2.20.1", 1_700_000_000),
            action: UpdateAction::Skip,
        };

        let outcome = execute(&mut provider, &evaluation, None, &logger())
            .await
            .expect("outcome");
        assert_eq!(
            outcome,
            UpdateOutcome::UpToDate {
                installed: Some("2.20.1".to_string()),
            }
        );
    }
}
