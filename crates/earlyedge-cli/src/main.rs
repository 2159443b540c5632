//! earlyedge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "earlyedge", version, about = "Learning-difficulty screening harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a screening session
    Run {
        /// Test to run (e.g. "arithmetic", "spelling", "letter-tracing")
        #[arg(long)]
        test: String,

        /// Arithmetic operation category (addition, subtraction, ...)
        #[arg(long)]
        category: Option<String>,

        /// Question bank TOML for bank-driven tests
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Scripted responses TOML (non-interactive run)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Output directory for session reports
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report formats: text, html, json (comma-separated) or "all"
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// List available screening tests
    ListTests,

    /// Create starter config and an example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("earlyedge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            test,
            category,
            bank,
            script,
            output,
            format,
            config,
        } => commands::run::execute(test, category, bank, script, output, format, config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::ListTests => commands::list_tests::execute(),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
