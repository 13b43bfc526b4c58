//! Command-line entry point for MemoryBench.
//!
//! Grounded on the teacher's `apps/copilot-cli::main` shape (`clap` derive
//! root command, subcommand dispatch, `ExitCode` on error) trimmed to the
//! single `eval` surface this engine exposes.

mod commands;
mod demo_provider;

use clap::{Parser, Subcommand};
use commands::eval::EvalArgs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "membench",
    author,
    version,
    about = "Memory-system evaluation engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run providers against benchmarks and produce a durable run directory.
    Eval {
        /// Provider names to run (each is registered against the bundled
        /// in-memory reference provider).
        #[arg(long = "providers", num_args = 1.., required = true)]
        providers: Vec<String>,

        /// Benchmark manifest file paths.
        #[arg(long = "benchmarks", num_args = 1.., required = true)]
        benchmarks: Vec<PathBuf>,

        /// Executor concurrency (defaults to the engine config).
        #[arg(long)]
        concurrency: Option<usize>,

        /// Resume a previously checkpointed run by its run ID.
        #[arg(long)]
        resume: Option<String>,

        /// Root directory under which run directories are created.
        #[arg(long)]
        runs_dir: Option<PathBuf>,

        /// Output format.
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval { providers, benchmarks, concurrency, resume, runs_dir, format } => {
            commands::eval::run(EvalArgs {
                providers,
                benchmark_manifests: benchmarks,
                concurrency,
                resume,
                runs_dir,
                format,
            })
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
