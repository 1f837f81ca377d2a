//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;

/// promptex - Turn raw prompt text into platform-ready export files
#[derive(Parser, Debug)]
#[command(name = "promptex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (human, json)
    #[arg(long, short = 'O', global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ./promptex.toml, then ~/.config/promptex/config.toml)
    #[arg(long, global = true, env = "PROMPTEX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run text or a file through the pipeline and write one export file
    Export(commands::export::ExportArgs),

    /// Export every document in a source folder as one collection file
    Batch(commands::batch::BatchArgs),

    /// Check a prompt against a platform's rules without exporting
    Validate(commands::validate::ValidateArgs),

    /// List supported target platforms
    Platforms(commands::platforms::PlatformsArgs),

    /// List supported export formats
    Formats(commands::formats::FormatsArgs),

    /// Serve the HTTP API
    Serve(commands::serve::ServeArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["promptex", "platforms", "-O", "json", "-vv"]);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Platforms(_)));
    }
}
