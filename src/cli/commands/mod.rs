//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::{PexError, Result};
use crate::pipeline::source::kind_for_path;
use crate::pipeline::{EnhancementRequest, RawInput, SourceKind};

pub mod batch;
pub mod completions;
pub mod export;
pub mod formats;
pub mod platforms;
pub mod serve;
pub mod validate;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<ExitCode> {
    match command {
        Commands::Export(args) => export::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Batch(args) => batch::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Validate(args) => validate::run(ctx, args),
        Commands::Platforms(args) => platforms::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Formats(args) => formats::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Serve(args) => serve::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Completions(args) => completions::run(args).map(|()| ExitCode::SUCCESS),
    }
}

/// Target and enhancement flags shared by the pipeline commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Target platform id (default: export.default_platform)
    #[arg(long, short = 'p')]
    pub platform: Option<String>,

    /// Export format: json, txt, csv, xml (default: export.default_format)
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Run the keyword enhancer
    #[arg(long, overrides_with = "no_enhance")]
    pub enhance: bool,

    /// Skip enhancement even if enabled in config
    #[arg(long, overrides_with = "enhance")]
    pub no_enhance: bool,

    /// Enhancement detail level: basic, standard, detailed
    #[arg(long)]
    pub detail_level: Option<String>,
}

impl TargetArgs {
    #[must_use]
    pub fn enhancement(&self) -> EnhancementRequest {
        let enabled = if self.enhance {
            Some(true)
        } else if self.no_enhance {
            Some(false)
        } else {
            None
        };
        EnhancementRequest {
            enabled,
            detail_level: self.detail_level.clone(),
        }
    }
}

/// Where a single prompt comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Prompt text (omit to use --input)
    pub text: Option<String>,

    /// Read the prompt from a file, or `-` for stdin
    #[arg(long, short = 'i', conflicts_with = "text")]
    pub input: Option<PathBuf>,

    /// How to interpret the content: text, document, structured
    /// (default: from the file extension, else text)
    #[arg(long, alias = "source-type")]
    pub source_kind: Option<String>,
}

impl InputArgs {
    pub fn read(&self, ctx: &AppContext) -> Result<RawInput> {
        let (content, inferred) = match (&self.text, &self.input) {
            (Some(text), _) => (text.clone(), SourceKind::Text),
            (None, Some(path)) if path == Path::new("-") => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                (buf, SourceKind::Text)
            }
            (None, Some(path)) => {
                let path = ctx.resolve_path(path);
                let content = std::fs::read_to_string(&path).map_err(|err| match err.kind() {
                    std::io::ErrorKind::NotFound => {
                        PexError::NotFound(format!("input file {}", path.display()))
                    }
                    _ => PexError::Io(err),
                })?;
                (content, kind_for_path(&path))
            }
            (None, None) => {
                return Err(PexError::InvalidInput(
                    "provide prompt text or --input <FILE>".to_string(),
                ));
            }
        };

        let kind = match self.source_kind.as_deref() {
            Some(kind) => kind.parse()?,
            None => inferred,
        };
        Ok(RawInput::new(content, kind))
    }
}
