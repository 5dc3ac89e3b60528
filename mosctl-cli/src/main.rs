//! mosctl CLI - operator tooling for MOS listening-test evaluations
//!
//! Drives the evaluation store without the web form:
//! - Schema setup (`init`) and one-shot legacy migration (`migrate`)
//! - Scripted submissions from a ratings file (`submit`)
//! - Review listings and per-model statistics (`evaluations`, `participants`, `stats`)

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use mosctl_core::{DbConfig, MosError, Store};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "mosctl",
    author,
    version,
    about = "Collect and aggregate Mean Opinion Score ratings for synthesized speech",
    long_about = "Store each participant's MOS ratings as one JSON document in PostgreSQL, \
                  review submissions, compute per-model statistics, and migrate databases \
                  from the legacy one-row-per-rating layout."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the participants and evaluations tables if they are missing
    Init,
    /// Convert a legacy per-rating evaluations table into documents (destructive)
    Migrate(commands::schema::MigrateArgs),
    /// Submit one participant's ratings from a JSON file
    Submit(commands::submit::SubmitArgs),
    /// List evaluation documents with their participants, newest first
    Evaluations(commands::report::ReportArgs),
    /// List participants with their evaluation counts
    Participants(commands::report::ReportArgs),
    /// Show per-model rating statistics
    Stats(commands::report::ReportArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: clap_complete::Shell,
}

/// Output format shared by the listing commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let correctable = err
                .downcast_ref::<MosError>()
                .map(MosError::is_user_correctable)
                .unwrap_or(false);
            if correctable {
                eprintln!("⚠️  {:#}", err);
                ExitCode::from(2)
            } else {
                eprintln!("❌ {:#}", err);
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    if let Commands::Completions(args) = command {
        clap_complete::generate(args.shell, &mut Cli::command(), "mosctl", &mut io::stdout());
        return Ok(());
    }

    let store = Store::new(DbConfig::load()?);

    match command {
        Commands::Init => commands::schema::run_init(&store).await,
        Commands::Migrate(args) => commands::schema::run_migrate(&store, args).await,
        Commands::Submit(args) => commands::submit::run_submit(&store, args).await,
        Commands::Evaluations(args) => commands::report::run_evaluations(&store, args).await,
        Commands::Participants(args) => commands::report::run_participants(&store, args).await,
        Commands::Stats(args) => commands::report::run_stats(&store, args).await,
        Commands::Completions(_) => unreachable!("handled above"),
    }
}
