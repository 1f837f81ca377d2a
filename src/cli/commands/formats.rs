//! promptex formats - List export formats.

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::rules::ExportFormat;

#[derive(Args, Debug)]
pub struct FormatsArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatEntry {
    id: &'static str,
    name: &'static str,
    extension: &'static str,
    mime_type: &'static str,
}

pub fn run(ctx: &AppContext, _args: &FormatsArgs) -> Result<()> {
    let entries: Vec<FormatEntry> = ExportFormat::ALL
        .iter()
        .map(|format| {
            let profile = format.profile();
            FormatEntry {
                id: format.id(),
                name: profile.display_name,
                extension: profile.extension,
                mime_type: profile.mime_type,
            }
        })
        .collect();

    if ctx.robot_mode {
        return emit_json(&robot_ok(&entries));
    }

    let mut layout = HumanLayout::new();
    layout.title("Formats");
    for entry in &entries {
        layout.kv(entry.id, &format!("{} (.{}, {})", entry.name, entry.extension, entry.mime_type));
    }
    emit_human(layout);
    Ok(())
}
