//! Wikinotes CLI - Wikipedia study notes
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use wikinotes::{export, pipeline, ui, Config, Mode, Topic, WikipediaClient};

#[derive(Parser)]
#[command(name = "wikinotes")]
#[command(author, version, about = "TUI study assistant built on Wikipedia summaries", long_about = None)]
struct Cli {
    /// Path to a wikinotes.toml file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate notes, a summary, a quiz or tips without the TUI
    Generate {
        /// Output template
        #[arg(value_enum)]
        mode: Mode,
        /// Topic, or several separated by commas (prompted for when omitted)
        topics: Option<String>,
        /// Also save the output as a PDF at this path
        #[arg(long)]
        export: Option<PathBuf>,
        /// Seed for quiz word selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Generate {
            mode,
            topics,
            export: export_path,
            seed,
        }) => {
            init_tracing(None)?;

            let input = match topics {
                Some(topics) => topics,
                None => dialoguer::Input::<String>::new()
                    .with_prompt("Enter Topic")
                    .interact_text()?,
            };
            let topics = Topic::parse_batch(&input)?;

            if mode.needs_summary() {
                eprintln!("{}", format!("Fetching {} topic(s)...", topics.len()).dimmed());
            }
            let client = WikipediaClient::new(&config.wiki)?;
            let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
            let output = pipeline::generate(&client, mode, &topics, &mut rng).await;
            println!("{}", output);

            if let Some(path) = export_path {
                export::export(&output, &path, &config.export)?;
                eprintln!("{}", format!("Notes saved as {}", path.display()).green());
            }
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "wikinotes", &mut std::io::stdout());
        }
        None => {
            // Default: Launch the TUI, logging to a file so the screen stays clean
            let log_path = std::env::temp_dir().join("wikinotes.log");
            init_tracing(Some(&log_path))?;
            ui::run(&config).await?;
        }
    }

    Ok(())
}

/// Log to stderr for the CLI, or to a file while the TUI owns the terminal
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_level = if log_file.is_some() { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match log_file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
