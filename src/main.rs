/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Syn-Plug Core. Maintains the tracked-plugin
    roster, queries upstream sources, and reconciles installed
    archives against the newest compatible builds.

  Security / Safety Notes:
    Operates within user privileges. Performs HTTPS GET
    requests only and writes solely beneath operator-configured
    paths.

  Dependencies:
    clap for CLI parsing, tokio for the async runtime.

  Operational Scope:
    Invoked by operators or server cron via `syn-plug` to keep
    the plugins directory current.

  Revision History:
    2026-05-12 COD  Authored Syn-Plug Core runtime.
    2026-06-19 COD  Bounded the remote-query fan-out.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Per-entry isolation across roster passes
============================================================*/

mod archive;
mod config;
mod engine;
mod error;
mod github;
mod jenkins;
mod logger;
mod modrinth;
mod provider;
mod registry;
mod report;
mod spiget;
mod store;
mod version;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use tokio::sync::Semaphore;

use config::SynplugConfig;
use engine::{UpdateAction, UpdateOutcome};
use error::{Result, SynplugError};
use logger::Logger;
use provider::{Provider, SourceContext};
use report::{write_report, PluginReport, ReportAction, ReportBuilder};
use store::{PluginEntry, ResourceRef, TrackingStore};
use version::VersionRecord;

/// Command-line arguments for Syn-Plug-Core.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-Plug-Core",
    version,
    author = "Synavera Systems",
    about = "Plugin update custodian for Syn-Plug"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Override the tracked-plugin roster path.
    #[arg(long, value_name = "PATH", global = true)]
    tracking: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH", global = true)]
    log: Option<PathBuf>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the tracked-plugin roster.
    List,
    /// Track a new plugin and fetch its current build.
    Add {
        /// Provider type tag (spiget, github, jenkins, modrinth).
        #[arg(value_name = "TYPE")]
        type_tag: String,
        /// Identity the provider is queried with.
        name: String,
        /// Provider-specific selector (resource id, owner/repo, job URL).
        resource: Option<String>,
        /// Human-facing name override.
        #[arg(long)]
        prefix: Option<String>,
        /// Download target overriding the standard plugins path.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Track only; skip the initial download.
        #[arg(long, action = ArgAction::SetTrue)]
        no_download: bool,
    },
    /// Stop tracking a plugin, leaving its archive in place.
    Remove {
        /// Tracked name to drop.
        name: String,
    },
    /// Query upstreams and report pending actions without downloading.
    Check {
        /// Limit the pass to specific tracked plugins.
        #[arg(long = "plugin", value_name = "NAME", action = ArgAction::Append)]
        plugins: Vec<String>,
        /// Write a JSON run report to this path.
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },
    /// Download every tracked plugin with a newer upstream build.
    Update {
        /// Limit the pass to specific tracked plugins.
        #[arg(long = "plugin", value_name = "NAME", action = ArgAction::Append)]
        plugins: Vec<String>,
        /// Decide only; do not write any archive.
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
        /// Write a JSON run report to this path.
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },
}

/// How a roster pass executes and reports.
struct RosterMode<'a> {
    command: &'a str,
    execute: bool,
    report_path: Option<&'a Path>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-Plug-Core] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = SynplugConfig::load_from_optional_path(cli.config.as_deref())?;
    let plugins_dir = config.plugins_dir();
    let tracking_path = cli
        .tracking
        .clone()
        .unwrap_or_else(|| config.tracking_path());
    let store = TrackingStore::new(tracking_path);

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .or_else(|| Some(config.log_dir().join(format!("core_{session_stamp}.log"))));
    let logger = Logger::new(log_path, cli.verbose)?;
    logger.info("INIT", "Syn-Plug Core awakening.");

    let resolved = match cli.command {
        Commands::List => run_list(&store, &plugins_dir, &logger)?,
        Commands::Add {
            type_tag,
            name,
            resource,
            prefix,
            file,
            no_download,
        } => {
            let entry = PluginEntry::new(
                type_tag,
                name,
                resource.map(|raw| ResourceRef::parse(&raw)),
                prefix,
            )?;
            run_add(&config, &store, entry, file, no_download, &logger).await?
        }
        Commands::Remove { name } => run_remove(&store, &name, &logger)?,
        Commands::Check { plugins, report } => {
            let context = SourceContext::new(&config)?;
            run_roster(
                &store,
                &context,
                &plugins_dir,
                &plugins,
                RosterMode {
                    command: "check",
                    execute: false,
                    report_path: report.as_deref(),
                },
                &logger,
            )
            .await?
        }
        Commands::Update {
            plugins,
            dry_run,
            report,
        } => {
            if dry_run {
                println!("→ Update dry-run; deciding without writing archives.");
            }
            let context = SourceContext::new(&config)?;
            run_roster(
                &store,
                &context,
                &plugins_dir,
                &plugins,
                RosterMode {
                    command: "update",
                    execute: !dry_run,
                    report_path: report.as_deref(),
                },
                &logger,
            )
            .await?
        }
    };

    logger.info("COMPLETE", "Custodial sweep complete.");
    logger.finalize()?;

    Ok(if resolved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_list(store: &TrackingStore, plugins_dir: &Path, logger: &Logger) -> Result<bool> {
    let entries = store.load()?;
    logger.info("ROSTER", format!("{} plugins tracked", entries.len()));

    if entries.is_empty() {
        let tags: Vec<&str> = registry::known_tags().collect();
        println!(
            "→ No plugins tracked. Known source types: {}.",
            tags.join(", ")
        );
        return Ok(true);
    }

    for entry in &entries {
        let resource = entry
            .resource
            .as_ref()
            .map(|resource| resource.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "→ {} [{}] resource={} file={}",
            entry.display_name(),
            entry.type_tag,
            resource,
            entry.default_file_path(plugins_dir).display()
        );
    }
    Ok(true)
}

async fn run_add(
    config: &SynplugConfig,
    store: &TrackingStore,
    entry: PluginEntry,
    file: Option<PathBuf>,
    no_download: bool,
    logger: &Logger,
) -> Result<bool> {
    let mut entries = store.load()?;
    if entries.iter().any(|existing| existing.name == entry.name) {
        return Err(SynplugError::Config(format!(
            "{} is already tracked",
            entry.name
        )));
    }

    let context = SourceContext::new(config)?;
    let plugins_dir = config.plugins_dir();
    // Provider construction validates the tag and resource shape
    // before the roster is touched.
    let mut provider = registry::provider_for(&entry, &context, &plugins_dir)?;
    let label = provider.entry().display_name().to_string();

    entries.push(entry.clone());
    store.save(&entries)?;
    logger.info(
        "TRACK",
        format!(
            "Tracking {label} [{}] in {}",
            entry.type_tag,
            store.path().display()
        ),
    );
    println!("→ Tracking {label} [{}]", entry.type_tag);

    if no_download {
        return Ok(true);
    }

    let record = provider.latest_version().await?.clone();
    let target = file
        .clone()
        .unwrap_or_else(|| provider.default_file().to_path_buf());
    let evaluation = engine::evaluate(&target, record, &label, logger)?;
    match engine::execute(&mut provider, &evaluation, file.as_deref(), logger).await? {
        UpdateOutcome::Downloaded { version, file } => {
            println!("→ {label} DOWNLOAD: {version} → {}", file.display());
        }
        UpdateOutcome::UpToDate { installed } => {
            println!(
                "→ {label} NONE: {} is current",
                installed.unwrap_or_else(|| "absent".to_string())
            );
        }
        UpdateOutcome::ManualRequired { message, url } => {
            println!("→ {label} MANUAL_REQUIRED: {message} Open {url} in a browser.");
        }
    }
    Ok(true)
}

fn run_remove(store: &TrackingStore, name: &str, logger: &Logger) -> Result<bool> {
    let mut entries = store.load()?;
    let before = entries.len();
    entries.retain(|entry| entry.name != name);
    if entries.len() == before {
        return Err(SynplugError::Config(format!("{name} is not tracked")));
    }

    store.save(&entries)?;
    logger.info("UNTRACK", format!("Stopped tracking {name}"));
    println!("→ Stopped tracking {name}; the installed archive was left in place.");
    Ok(true)
}

/// Run the decision engine over the selected roster entries.
///
/// Upstream queries fan out first; inspection, decisions, and
/// downloads then run sequentially in roster order so output and
/// on-disk effects stay deterministic. Returns false when any
/// entry failed.
async fn run_roster(
    store: &TrackingStore,
    context: &SourceContext,
    plugins_dir: &Path,
    requested: &[String],
    mode: RosterMode<'_>,
    logger: &Logger,
) -> Result<bool> {
    let entries = store.load()?;
    logger.info("ROSTER", format!("{} plugins tracked", entries.len()));

    let selected = select_entries(entries, requested, logger);
    if selected.is_empty() {
        logger.warn("EMPTY", "No plugins selected; nothing to reconcile");
        println!("→ No plugins selected.");
        return Ok(true);
    }

    let queries = query_remote_versions(&selected, context, plugins_dir, logger).await?;

    let mut builder = ReportBuilder::new(mode.command);
    let mut downloads = 0usize;
    let mut up_to_date = 0usize;
    let mut manual = 0usize;
    let mut failed = 0usize;

    for (entry, query) in selected.iter().zip(queries) {
        let label = entry.display_name();
        let file = entry.default_file_path(plugins_dir);
        let (action, installed, remote, detail) = match query {
            Err(err) => {
                logger.error("ENTRY", format!("{label}: {err}"));
                (ReportAction::Failed, None, None, Some(err.to_string()))
            }
            Ok((mut provider, record)) => {
                logger.debug("REMOTE", format!("{label}: {:?}", record.as_tuple()));
                let remote_version = record.version().to_string();
                match engine::evaluate(&file, record, &label, logger) {
                    Err(err) => {
                        logger.error("ENTRY", format!("{label}: {err}"));
                        (
                            ReportAction::Failed,
                            None,
                            Some(remote_version),
                            Some(err.to_string()),
                        )
                    }
                    Ok(evaluation) => {
                        let installed = evaluation
                            .local
                            .as_ref()
                            .map(|record| record.version().to_string());
                        if mode.execute {
                            match engine::execute(&mut provider, &evaluation, None, logger).await {
                                Ok(UpdateOutcome::Downloaded { .. }) => (
                                    ReportAction::Download,
                                    installed,
                                    Some(remote_version),
                                    None,
                                ),
                                Ok(UpdateOutcome::UpToDate { .. }) => {
                                    (ReportAction::None, installed, Some(remote_version), None)
                                }
                                Ok(UpdateOutcome::ManualRequired { message, url }) => (
                                    ReportAction::ManualRequired,
                                    installed,
                                    Some(remote_version),
                                    Some(format!("{message} Open {url} in a browser.")),
                                ),
                                Err(err) => {
                                    logger.error("ENTRY", format!("{label}: {err}"));
                                    (
                                        ReportAction::Failed,
                                        installed,
                                        Some(remote_version),
                                        Some(err.to_string()),
                                    )
                                }
                            }
                        } else {
                            match evaluation.action {
                                UpdateAction::Download => (
                                    ReportAction::Download,
                                    installed,
                                    Some(remote_version),
                                    provider.download_url(&evaluation.remote).ok(),
                                ),
                                UpdateAction::Skip => {
                                    (ReportAction::None, installed, Some(remote_version), None)
                                }
                            }
                        }
                    }
                }
            }
        };

        match action {
            ReportAction::Download => downloads += 1,
            ReportAction::None => up_to_date += 1,
            ReportAction::ManualRequired => manual += 1,
            ReportAction::Failed => failed += 1,
        }
        print_entry_line(
            &label,
            &entry.type_tag,
            action,
            installed.as_deref(),
            remote.as_deref(),
            detail.as_deref(),
        );

        builder.record(
            entry.name.clone(),
            PluginReport {
                type_tag: entry.type_tag.clone(),
                installed_version: installed,
                remote_version: remote,
                action,
                file: file.display().to_string(),
                detail,
            },
        );
    }

    if let Some(path) = mode.report_path {
        write_report(&builder.finish(), path)?;
        logger.info("REPORT", format!("Run report written to {}", path.display()));
    }

    logger.info(
        "SUMMARY",
        format!(
            "plugins={} downloads={downloads} current={up_to_date} manual={manual} failed={failed}",
            selected.len()
        ),
    );
    println!(
        "→ {}: plugins={} downloads={downloads} up-to-date={up_to_date} manual={manual} failed={failed}",
        mode.command,
        selected.len()
    );

    Ok(failed == 0)
}

fn select_entries(
    entries: Vec<PluginEntry>,
    requested: &[String],
    logger: &Logger,
) -> Vec<PluginEntry> {
    if requested.is_empty() {
        return entries;
    }

    let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let selected: Vec<PluginEntry> = entries
        .into_iter()
        .filter(|entry| requested_set.contains(entry.name.as_str()))
        .collect();

    let missing: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|name| !selected.iter().any(|entry| entry.name == *name))
        .collect();
    if !missing.is_empty() {
        logger.warn(
            "SELECT",
            format!("Requested plugins not tracked: {}", missing.join(", ")),
        );
    }

    selected
}

/// Query every selected entry's upstream, bounded by the
/// configured parallel-request ceiling.
///
/// Results come back in roster order; each slot carries either
/// the provider with its memoized record or that entry's
/// failure, so one broken source never blocks the rest.
async fn query_remote_versions(
    entries: &[PluginEntry],
    context: &SourceContext,
    plugins_dir: &Path,
    logger: &Logger,
) -> Result<Vec<Result<(Provider, VersionRecord)>>> {
    logger.debug(
        "QUERY",
        format!(
            "Querying {} upstreams, at most {} in flight",
            entries.len(),
            context.max_parallel_requests
        ),
    );

    let semaphore = Arc::new(Semaphore::new(context.max_parallel_requests));
    let mut tasks = Vec::with_capacity(entries.len());
    for entry in entries {
        let constructed = registry::provider_for(entry, context, plugins_dir);
        let semaphore = semaphore.clone();
        tasks.push(tokio::spawn(async move {
            let mut provider = constructed?;
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| SynplugError::Runtime("Query semaphore closed".into()))?;
            let record = provider.latest_version().await?.clone();
            Ok((provider, record))
        }));
    }

    let mut queries = Vec::with_capacity(tasks.len());
    for task in tasks {
        let outcome = task
            .await
            .map_err(|err| SynplugError::Runtime(format!("Query task failed: {err}")))?;
        queries.push(outcome);
    }
    Ok(queries)
}

fn print_entry_line(
    label: &str,
    type_tag: &str,
    action: ReportAction,
    installed: Option<&str>,
    remote: Option<&str>,
    detail: Option<&str>,
) {
    let installed = installed.unwrap_or("absent");
    match action {
        ReportAction::Download => println!(
            "→ {label} [{type_tag}] {action}: {installed} → {}",
            remote.unwrap_or("unknown")
        ),
        ReportAction::None => println!("→ {label} [{type_tag}] {action}: {installed} is current"),
        ReportAction::ManualRequired => println!(
            "→ {label} [{type_tag}] {action}: {}",
            detail.unwrap_or("manual download required")
        ),
        ReportAction::Failed => println!(
            "→ {label} [{type_tag}] {action}: {}",
            detail.unwrap_or("unspecified failure")
        ),
    }
}
