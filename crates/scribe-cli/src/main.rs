//! Scribe CLI - writer/reviewer documentation generator
//!
//! Usage:
//!   scribe init [path]          Write a default .scribe/config.toml
//!   scribe run <project>        Document a project and write the result
//!   scribe serve                Start the HTTP surface

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scribe_agent::AnthropicClient;
use scribe_core::{RunOutcome, ScribeConfig};
use scribe_memory::MemoryStore;
use scribe_orchestrator::{Orchestrator, OrchestratorConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(author, version, about = "Writer/reviewer documentation generator")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding .scribe/config.toml (defaults to the project or current directory)
    #[arg(long, global = true, value_name = "DIR")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Repository path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Document every matching file of a project
    Run {
        /// Project root to document
        project: PathBuf,

        /// Where to write the final document
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Writer/reviewer round-trips per file
        #[arg(long)]
        max_revisions: Option<usize>,

        /// Pause between files in seconds
        #[arg(long)]
        delay_secs: Option<u64>,

        /// Extension of the files to document
        #[arg(long)]
        extension: Option<String>,

        /// Record the run in <project>/.scribe/activity.md
        #[arg(long)]
        activity_log: bool,
    },

    /// Start the HTTP surface
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress lines go to stdout during a run, so tracing stays quiet there
    let level = match (&cli.command, cli.verbose) {
        (_, true) => Level::DEBUG,
        (Commands::Run { .. }, false) => Level::WARN,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => cmd_init(path).await,
        Commands::Run {
            project,
            output,
            max_revisions,
            delay_secs,
            extension,
            activity_log,
        } => {
            let overrides = RunOverrides {
                output,
                max_revisions,
                delay_secs,
                extension,
                activity_log,
            };
            cmd_run(cli.config, project, overrides).await
        }
        Commands::Serve { host, port } => cmd_serve(cli.config, host, port).await,
    }
}

/// Command-line values that take precedence over the config file
struct RunOverrides {
    output: Option<PathBuf>,
    max_revisions: Option<usize>,
    delay_secs: Option<u64>,
    extension: Option<String>,
    activity_log: bool,
}

fn load_config(dir: &Path) -> Result<ScribeConfig> {
    ScribeConfig::load_or_default(dir)
        .with_context(|| format!("Failed to load config from {}", dir.display()))
}

/// Wire client, memory store and orchestrator from configuration
fn build_orchestrator(config: &ScribeConfig, orch_config: OrchestratorConfig) -> Result<Orchestrator> {
    let generator = Arc::new(AnthropicClient::from_settings(&config.models));
    let memory = MemoryStore::from_settings(&config.memory).context("Invalid memory settings")?;

    Ok(Orchestrator::new(
        orch_config,
        generator,
        Arc::new(memory),
        Default::default(),
    ))
}

async fn cmd_init(path: PathBuf) -> Result<()> {
    info!("Initializing Scribe in {:?}", path);

    ScribeConfig::write_default(&path).context("Failed to write default config")?;

    println!("Initialized Scribe in {:?}", path);
    println!("Created:");
    println!("  .scribe/config.toml");
    println!("\nNext steps:");
    println!("  1. Export ANTHROPIC_API_KEY (or the variable named by models.api_key_env)");
    println!("  2. Run 'scribe run <project>' to document a project");
    Ok(())
}

async fn cmd_run(config_dir: Option<PathBuf>, project: PathBuf, overrides: RunOverrides) -> Result<()> {
    let config = load_config(config_dir.as_deref().unwrap_or(project.as_path()))?;

    let mut orch_config = OrchestratorConfig::from_config(&config)?;
    if let Some(max_revisions) = overrides.max_revisions {
        orch_config = orch_config.with_max_revisions(max_revisions);
    }
    if let Some(secs) = overrides.delay_secs {
        orch_config = orch_config.with_inter_file_delay(Duration::from_secs(secs));
    }
    if let Some(extension) = overrides.extension {
        orch_config = orch_config.with_extension(extension);
    }

    let mut orchestrator = build_orchestrator(&config, orch_config)?;
    if overrides.activity_log {
        orchestrator = orchestrator.with_activity_logging(project.join(".scribe"));
    }

    let outcome = run_with_feed(&orchestrator, &project).await;

    let output = overrides
        .output
        .unwrap_or_else(|| PathBuf::from(&config.run.output_file));
    if outcome.report.is_complete() && !outcome.document.is_empty() {
        tokio::fs::write(&output, &outcome.document)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("\nDocumentation written to {}", output.display());
    }

    println!("\n{}", serde_json::to_string_pretty(&outcome.report)?);

    if !outcome.report.is_complete() {
        bail!("Documentation run failed: {}", outcome.report.summary);
    }
    Ok(())
}

/// Drive a run while printing its progress events
async fn run_with_feed(orchestrator: &Orchestrator, project: &Path) -> RunOutcome {
    let mut rx = orchestrator.progress().subscribe();
    let run = orchestrator.run(project);
    tokio::pin!(run);

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            event = rx.recv() => {
                if let Ok(event) = event {
                    println!("{}", event);
                }
            }
        }
    };

    loop {
        match rx.try_recv() {
            Ok(event) => println!("{}", event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    outcome
}

async fn cmd_serve(config_dir: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(config_dir.as_deref().unwrap_or(Path::new(".")))?;

    let mut settings = config.server.clone();
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }

    let orchestrator = build_orchestrator(&config, OrchestratorConfig::from_config(&config)?)?;
    scribe_server::run(settings, Arc::new(orchestrator)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "scribe",
            "--verbose",
            "run",
            "shop",
            "--max-revisions",
            "1",
            "--delay-secs",
            "0",
            "--extension",
            ".kt",
            "--activity-log",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                project,
                output,
                max_revisions,
                delay_secs,
                extension,
                activity_log,
            } => {
                assert_eq!(project, PathBuf::from("shop"));
                assert!(output.is_none());
                assert_eq!(max_revisions, Some(1));
                assert_eq!(delay_secs, Some(0));
                assert_eq!(extension.as_deref(), Some(".kt"));
                assert!(activity_log);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_serve_arguments() {
        let cli = Cli::try_parse_from(["scribe", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }
}
