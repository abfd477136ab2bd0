//! Command-line interface for opsdesk.
//!
//! Provides commands for processing single feedback items, running batch
//! files, and inspecting the service descriptor, rule book and configuration.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::core::{load_batch, run_batch, BatchSummary, Orchestrator};
use crate::domain::{FeedbackRequest, DEFAULT_API_SOURCE};

/// opsdesk - Operational feedback triage pipeline
#[derive(Parser, Debug)]
#[command(name = "opsdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one feedback item and print the result as JSON
    Process {
        /// Feedback text (reads --input or stdin if not provided)
        #[arg(short, long)]
        text: Option<String>,

        /// Input file containing the feedback text
        #[arg(short, long, conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Read feedback text from stdin
        #[arg(long)]
        stdin: bool,

        /// Origin tag (e.g. fan_survey, X_post)
        #[arg(short, long)]
        source: Option<String>,

        /// Event date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        event_date: Option<String>,

        /// Feedback id (generated if not provided)
        #[arg(long)]
        id: Option<String>,
    },

    /// Process a JSON array of feedback items
    Batch {
        /// Batch file
        file: PathBuf,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Items processed concurrently (order is preserved)
        #[arg(short, long, default_value = "1")]
        concurrency: usize,
    },

    /// Print the service descriptor
    Health,

    /// Print the effective rule book
    Rules,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Process {
                text,
                input,
                stdin,
                source,
                event_date,
                id,
            } => {
                let text = read_text(text, input, stdin)?;
                let request = FeedbackRequest {
                    feedback_id: id,
                    title: None,
                    feedback_text: text,
                    source,
                    event_date,
                };
                process_feedback(request).await
            }
            Commands::Batch {
                file,
                output,
                concurrency,
            } => process_batch(&file, output.as_deref(), concurrency).await,
            Commands::Health => show_health(),
            Commands::Rules => show_rules(),
            Commands::Config => show_config(),
        }
    }
}

/// Resolve feedback text from the flag, a file, or stdin
fn read_text(text: Option<String>, input_file: Option<PathBuf>, use_stdin: bool) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    if let Some(path) = input_file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()));
    }

    // Read from stdin if --stdin flag or if stdin is piped
    if use_stdin || !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        return Ok(buffer);
    }

    anyhow::bail!("No feedback provided. Use --text, --input <file> or pipe to stdin");
}

fn orchestrator() -> Result<Orchestrator> {
    let cfg = config::config()?;
    Orchestrator::from_config(cfg)
}

/// Process one item and print its result
async fn process_feedback(request: FeedbackRequest) -> Result<()> {
    let orchestrator = orchestrator()?;
    let result = orchestrator
        .process_request(request, DEFAULT_API_SOURCE)
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        eprintln!("\n[{}]", result.message);
        std::process::exit(1);
    }

    Ok(())
}

/// Run a batch file and write the entries
async fn process_batch(file: &Path, output: Option<&Path>, concurrency: usize) -> Result<()> {
    let orchestrator = orchestrator()?;
    let items = load_batch(file, orchestrator.limits())?;

    let entries = run_batch(&orchestrator, items, concurrency).await;
    let rendered = serde_json::to_string_pretty(&entries)?;

    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write batch output: {}", path.display()))?,
        None => println!("{}", rendered),
    }

    let summary = BatchSummary::from_entries(&entries);
    eprintln!(
        "\n[Batch complete: {} items, {} succeeded, {} failed, {} tickets]",
        summary.total, summary.succeeded, summary.failed, summary.tickets
    );

    Ok(())
}

fn show_health() -> Result<()> {
    let descriptor = orchestrator()?.descriptor();
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}

fn show_rules() -> Result<()> {
    let orchestrator = orchestrator()?;
    print!("{}", serde_yaml::to_string(orchestrator.rules())?);
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("{}", serde_json::to_string_pretty(cfg)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process_flags() {
        let cli = Cli::parse_from([
            "opsdesk",
            "process",
            "--text",
            "Scoreboard froze",
            "--source",
            "X_post",
            "--event-date",
            "2025-11-16",
        ]);

        match cli.command {
            Commands::Process {
                text,
                source,
                event_date,
                id,
                ..
            } => {
                assert_eq!(text.as_deref(), Some("Scoreboard froze"));
                assert_eq!(source.as_deref(), Some("X_post"));
                assert_eq!(event_date.as_deref(), Some("2025-11-16"));
                assert!(id.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_batch_defaults_to_sequential() {
        let cli = Cli::parse_from(["opsdesk", "batch", "feedback.json"]);
        match cli.command {
            Commands::Batch {
                file, concurrency, ..
            } => {
                assert_eq!(file, PathBuf::from("feedback.json"));
                assert_eq!(concurrency, 1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_read_text_prefers_flag_then_file() {
        assert_eq!(
            read_text(Some("inline".to_string()), None, false).unwrap(),
            "inline"
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from file").unwrap();
        assert_eq!(
            read_text(None, Some(file.path().to_path_buf()), false).unwrap(),
            "from file"
        );
    }
}
