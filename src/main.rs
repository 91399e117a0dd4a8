//! aac - CLI entry point.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use aac::commands::{
    initialize, prompt_api_key, prompt_custom_prompt, set_api_key, set_custom_prompt,
    settings_menu, status_line, toggle_auto_commit,
};
use aac::commit::DEFAULT_PROMPT;
use aac::config::{ConfigStore, FileSettings, SecretStore};
use aac::gemini::GeminiClient;
use aac::git::GitCli;
use aac::orchestrator::{ChangeOrchestrator, CycleOutcome, PromptApprover};
use aac::watch::{IndexWatcher, RepositoryRegistry, dispatch, report, resolve};

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "AAC_LOG";

/// Draft commit messages for staged changes with Gemini.
#[derive(Parser, Debug)]
#[command(name = "aac")]
#[command(about = "Draft commit messages for staged changes with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch repositories and generate a message whenever changes are staged (default)
    Watch {
        /// Paths inside the repositories to watch (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Milliseconds between checks of each repository's index
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Generate a message for what is staged now, once
    Run {
        /// Path inside the repository (defaults to the current directory)
        path: Option<PathBuf>,
    },
    /// Turn committing without confirmation on or off
    ToggleAutoCommit,
    /// Store the Gemini API key (asks for it when omitted)
    SetApiKey {
        key: Option<String>,
    },
    /// Set the prompt template placed before the diff
    SetPrompt {
        /// Template text (asks for it when omitted)
        text: Option<String>,

        /// Read the template from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Restore the built-in template
        #[arg(long, conflicts_with_all = ["text", "file"])]
        reset: bool,
    },
    /// Open the interactive settings menu
    Settings,
    /// Show the current settings
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Arc::new(FileSettings::from_env().context("Failed to locate settings")?);

    match cli.command.unwrap_or(Command::Watch {
        paths: Vec::new(),
        interval_ms: 1000,
    }) {
        Command::Watch { paths, interval_ms } => watch(settings, paths, interval_ms).await,
        Command::Run { path } => run_once(settings, path).await,
        Command::ToggleAutoCommit => {
            let enabled = toggle_auto_commit(settings.as_ref())?;
            println!("Auto-commit {}.", if enabled { "enabled" } else { "disabled" });
            Ok(())
        }
        Command::SetApiKey { key } => {
            let saved = match key {
                Some(key) => set_api_key(settings.as_ref(), &key)?,
                None => prompt_api_key(settings.as_ref())?,
            };
            if saved {
                println!("Gemini API key saved to {}", settings.credentials_path().display());
            } else {
                eprintln!("No API key given; nothing saved.");
            }
            Ok(())
        }
        Command::SetPrompt { text, file, reset } => {
            if reset {
                set_custom_prompt(settings.as_ref(), DEFAULT_PROMPT)?;
            } else if let Some(file) = file {
                let prompt = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                set_custom_prompt(settings.as_ref(), &prompt)?;
            } else if let Some(text) = text {
                set_custom_prompt(settings.as_ref(), &text)?;
            } else {
                prompt_custom_prompt(settings.as_ref())?;
            }
            println!("Prompt template saved.");
            Ok(())
        }
        Command::Settings => settings_menu(settings.as_ref(), settings.as_ref()),
        Command::Status => {
            println!("{}", status_line(settings.as_ref(), settings.as_ref())?);
            println!("Settings: {}", settings.dir().display());
            Ok(())
        }
    }
}

/// Install the tracing subscriber. `--verbose` wins over `AAC_LOG`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("aac=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

type Orchestrator = ChangeOrchestrator<GitCli, GeminiClient, PromptApprover>;

fn build_orchestrator(settings: Arc<FileSettings>) -> Orchestrator {
    let config: Arc<dyn ConfigStore> = settings.clone();
    let secrets: Arc<dyn SecretStore> = settings;
    ChangeOrchestrator::new(
        GitCli,
        GeminiClient::new(),
        PromptApprover::new(),
        config,
        secrets,
    )
}

async fn watch(settings: Arc<FileSettings>, paths: Vec<PathBuf>, interval_ms: u64) -> Result<()> {
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let (registry, errors) = RepositoryRegistry::discover(&paths);
    for e in &errors {
        eprintln!("aac: {}", e);
    }

    let interactive = std::io::stdin().is_terminal();
    initialize(&registry, settings.as_ref(), interactive).await?;
    if registry.is_empty() {
        return Ok(());
    }

    println!("{}", status_line(settings.as_ref(), settings.as_ref())?);

    let orchestrator = Arc::new(build_orchestrator(settings));
    for id in registry.ids() {
        orchestrator.observe(id);
        println!("Watching {}", id);
    }
    println!("Stage changes to generate a commit message. Press Ctrl-C to stop.");

    let (tx, rx) = mpsc::channel(64);
    let watcher = IndexWatcher::new(Duration::from_millis(interval_ms));
    let watcher = tokio::spawn(watcher.run(registry, tx));

    tokio::select! {
        _ = dispatch(orchestrator, rx) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            println!();
            println!("Stopped.");
        }
    }

    watcher.abort();
    Ok(())
}

async fn run_once(settings: Arc<FileSettings>, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from("."));
    let watched = resolve(&path).context("Not a git repository. Run aac from within a git repository.")?;

    let orchestrator = build_orchestrator(settings);
    let outcome = orchestrator.handle_change(&watched.id).await;

    match &outcome {
        CycleOutcome::NothingStaged => println!("Nothing staged."),
        CycleOutcome::EmptyDiff => println!("Staged diff is empty; nothing to commit."),
        other => report(other),
    }

    if outcome.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}
