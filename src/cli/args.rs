use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the dynscope binary.
#[derive(Parser, Debug)]
#[command(
    name = "dynscope",
    version,
    about = "Resolve names and dispatch expando members from JSON descriptions"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Disable colored diagnostics.
    #[arg(long = "noColor", alias = "no-color", global = true)]
    pub no_color: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve every query in a program description.
    Resolve {
        /// Path to the program JSON.
        path: PathBuf,
    },
    /// Run a dispatch script against host classes and the side table.
    Dispatch {
        /// Path to the script JSON.
        path: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
