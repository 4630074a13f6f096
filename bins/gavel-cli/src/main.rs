mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gavel-cli")]
#[command(about = "Gavel CLI - Judge source files against test cases locally", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge a source file against a JSON test-case file
    Judge {
        /// Path to the source file
        file: PathBuf,

        /// Language name (e.g., C, C++, Python)
        #[arg(short, long)]
        language: String,

        /// Path to a JSON file with [{"input": ..., "expected_output": ...}]
        #[arg(short, long)]
        tests: PathBuf,

        /// Memory limit in KB
        #[arg(long, default_value = "131072")]
        mem: u64,

        /// CPU time limit in seconds
        #[arg(long, default_value = "2.0")]
        time: f64,

        /// Wall-clock time limit in seconds
        #[arg(long, default_value = "3.0")]
        wall: f64,
    },

    /// Run a source file once against raw input, without judging
    Run {
        /// Path to the source file
        file: PathBuf,

        /// Language name (e.g., C, C++, Python)
        #[arg(short, long)]
        language: String,

        /// Path to a file with the program's stdin (empty if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List configured languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Judge {
            file,
            language,
            tests,
            mem,
            time,
            wall,
        } => {
            commands::judge(&file, &language, &tests, mem, time, wall).await?;
        }
        Commands::Run {
            file,
            language,
            input,
        } => {
            commands::run(&file, &language, input.as_deref()).await?;
        }
        Commands::Languages => {
            commands::languages()?;
        }
    }

    Ok(())
}
