//! promptex batch - Export a whole source folder as one collection.

use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::error::Result;
use crate::pipeline::{BatchRequest, DirectorySource};

use super::TargetArgs;
use super::export::Output;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Folder id: a subdirectory of the source root
    pub folder: String,

    /// Directory holding the source folders (default: export.source_root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Directory for the export file (default: export.output_dir)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print the rendered file to stdout instead of writing it
    #[arg(long)]
    pub print: bool,
}

pub fn run(ctx: &AppContext, args: &BatchArgs) -> Result<()> {
    let root = ctx.resolve_path(args.root.as_ref().unwrap_or(&ctx.config.export.source_root));
    let source = DirectorySource::new(root);

    let request = BatchRequest {
        folder_id: args.folder.clone(),
        target_platform: args.target.platform.clone(),
        export_format: args.target.format.clone(),
        enhancement_options: Some(args.target.enhancement()),
    };

    let out = Output::new(ctx, args.out_dir.as_ref(), args.print);
    let pipeline = ctx.pipeline(out.sink());
    let outcome = ctx.block_on(pipeline.export_batch(&source, request))?;
    out.finish(ctx, &format!("Batch: {}", args.folder), &outcome)
}
