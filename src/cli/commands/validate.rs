//! promptex validate - Check prompts against platform rules without exporting.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::pipeline::{MemorySink, ValidationStatus, ValidationVerdict, split_source};
use crate::rules::Platform;

use super::export::status_label;
use super::{InputArgs, TargetArgs};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport {
    platform: Platform,
    status: ValidationStatus,
    prompts: Vec<ValidatedPrompt>,
}

#[derive(Serialize)]
struct ValidatedPrompt {
    content: String,
    validation: ValidationVerdict,
}

/// Exits with failure when any prompt has error status.
pub fn run(ctx: &AppContext, args: &ValidateArgs) -> Result<ExitCode> {
    let raw = args.input.read(ctx)?;
    let pipeline = ctx.pipeline(Arc::new(MemorySink::new()));
    let options = pipeline.resolve_options(
        args.target.platform.as_deref(),
        args.target.format.as_deref(),
        Some(&args.target.enhancement()),
    )?;

    let now = Utc::now();
    let mut prompts = Vec::new();
    for item in split_source(&raw) {
        let processed = ctx.block_on(pipeline.process(&item, &options, now))?;
        prompts.push(ValidatedPrompt {
            content: processed.content,
            validation: processed.validation,
        });
    }

    let status = prompts
        .iter()
        .map(|prompt| prompt.validation.status)
        .max()
        .unwrap_or_default();
    let report = ValidationReport {
        platform: options.platform,
        status,
        prompts,
    };

    if ctx.robot_mode {
        emit_json(&robot_ok(&report))?;
    } else {
        emit_human(report_layout(&report));
    }

    Ok(if status == ValidationStatus::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn report_layout(report: &ValidationReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title("Validation")
        .kv("Platform", report.platform.profile().display_name)
        .kv("Status", status_label(report.status));

    for prompt in &report.prompts {
        layout
            .blank()
            .section(status_label(prompt.validation.status))
            .push_line(prompt.content.clone());
        if !prompt.validation.message.is_empty() {
            layout.push_line(prompt.validation.message.clone());
        }
        for warning in &prompt.validation.warnings {
            layout.bullet(&format!("warning: {warning}"));
        }
        for error in &prompt.validation.errors {
            layout.bullet(&format!("error: {error}"));
        }
    }
    layout
}
