//! promptex platforms - List target platforms and their limits.

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::rules::Platform;

#[derive(Args, Debug)]
pub struct PlatformsArgs {
    /// Include forbidden phrases, required elements and parameters
    #[arg(long)]
    pub details: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformEntry {
    id: &'static str,
    name: &'static str,
    max_length: usize,
    supports_style_tags: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    forbidden: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Vec<&'static str>>,
}

pub fn run(ctx: &AppContext, args: &PlatformsArgs) -> Result<()> {
    let entries: Vec<PlatformEntry> = Platform::ALL
        .iter()
        .map(|platform| {
            let profile = platform.profile();
            PlatformEntry {
                id: platform.id(),
                name: profile.display_name,
                max_length: profile.max_content_length,
                supports_style_tags: profile.supports_style_tags,
                forbidden: args.details.then_some(profile.forbidden_phrases),
                required: args.details.then_some(profile.required_elements),
                parameters: args.details.then(|| {
                    profile
                        .parameter_constraints
                        .iter()
                        .map(|constraint| constraint.name)
                        .collect()
                }),
            }
        })
        .collect();

    if ctx.robot_mode {
        return emit_json(&robot_ok(&entries));
    }

    let mut layout = HumanLayout::new();
    layout.title("Platforms");
    for entry in &entries {
        layout.kv(entry.id, &format!("{} (max {} chars)", entry.name, entry.max_length));
        if let Some(required) = entry.required.filter(|r| !r.is_empty()) {
            layout.bullet(&format!("requires: {}", required.join(", ")));
        }
        if let Some(forbidden) = entry.forbidden.filter(|f| !f.is_empty()) {
            layout.bullet(&format!("forbids: {}", forbidden.join(", ")));
        }
        if let Some(parameters) = entry.parameters.as_ref().filter(|p| !p.is_empty()) {
            layout.bullet(&format!("parameters: {}", parameters.join(", ")));
        }
    }
    emit_human(layout);
    Ok(())
}
