//! promptex export - Run one prompt source through the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::pipeline::{ExportOutcome, ExportRequest, ExportSink, FileSink, MemorySink, ValidationStatus};

use super::{InputArgs, TargetArgs};

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Directory for the export file (default: export.output_dir)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print the rendered file to stdout instead of writing it
    #[arg(long)]
    pub print: bool,
}

pub fn run(ctx: &AppContext, args: &ExportArgs) -> Result<()> {
    let raw = args.input.read(ctx)?;
    let request = ExportRequest {
        source_content: raw.content,
        source_kind: Some(raw.source_kind.id().to_string()),
        target_platform: args.target.platform.clone(),
        export_format: args.target.format.clone(),
        enhancement_options: Some(args.target.enhancement()),
    };

    let out = Output::new(ctx, args.out_dir.as_ref(), args.print);
    let outcome = ctx.block_on(ctx.pipeline(out.sink()).export(request))?;
    out.finish(ctx, "Export", &outcome)
}

/// Sink selection and reporting shared with `batch`.
pub(super) struct Output {
    sink: Arc<dyn ExportSink>,
    printed: Option<Arc<MemorySink>>,
}

impl Output {
    pub(super) fn new(ctx: &AppContext, out_dir: Option<&PathBuf>, print: bool) -> Self {
        if print {
            let memory = Arc::new(MemorySink::new());
            return Self {
                sink: memory.clone(),
                printed: Some(memory),
            };
        }
        let dir = ctx.resolve_path(out_dir.unwrap_or(&ctx.config.export.output_dir));
        Self {
            sink: Arc::new(FileSink::new(dir)),
            printed: None,
        }
    }

    pub(super) fn sink(&self) -> Arc<dyn ExportSink> {
        self.sink.clone()
    }

    pub(super) fn finish(&self, ctx: &AppContext, title: &str, outcome: &ExportOutcome) -> Result<()> {
        if let Some(memory) = &self.printed {
            // --print: the rendered file is the whole output.
            for upload in memory.uploads() {
                print!("{}", String::from_utf8_lossy(&upload.content));
            }
            return Ok(());
        }

        if ctx.robot_mode {
            return emit_json(&robot_ok(outcome));
        }
        emit_human(outcome_layout(title, outcome));
        Ok(())
    }
}

fn outcome_layout(title: &str, outcome: &ExportOutcome) -> HumanLayout {
    let summary = &outcome.summary;
    let mut layout = HumanLayout::new();
    layout
        .title(title)
        .kv("Prompts", &summary.total_prompts.to_string())
        .kv("Valid", &summary.valid_prompts.to_string())
        .kv("Warnings", &summary.warning_prompts.to_string())
        .kv("Errors", &summary.error_prompts.to_string())
        .kv("File", &outcome.export_url);

    if let Some(first) = outcome.exported_prompts.first() {
        layout
            .kv("Platform", first.platform.profile().display_name)
            .kv("Format", first.format.id());
    }

    for prompt in &outcome.exported_prompts {
        layout.blank().section(status_label(prompt.validation.status));
        layout.push_line(prompt.content.clone());
        for warning in &prompt.validation.warnings {
            layout.bullet(&format!("warning: {warning}"));
        }
        for error in &prompt.validation.errors {
            layout.bullet(&format!("error: {error}"));
        }
    }
    layout
}

pub(super) const fn status_label(status: ValidationStatus) -> &'static str {
    match status {
        ValidationStatus::Valid => "valid",
        ValidationStatus::Warning => "warning",
        ValidationStatus::Error => "error",
    }
}
