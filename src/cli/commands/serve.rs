//! promptex serve - Run the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::error::Result;
use crate::pipeline::{DirectorySource, FileSink};
use crate::server::{self, AppState};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (default: server.bind)
    #[arg(long)]
    pub bind: Option<String>,

    /// Directory export files are written to (default: export.output_dir)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Directory holding the batch source folders (default: export.source_root)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &ServeArgs) -> Result<()> {
    let out_dir = ctx.resolve_path(args.out_dir.as_ref().unwrap_or(&ctx.config.export.output_dir));
    let root = ctx.resolve_path(args.root.as_ref().unwrap_or(&ctx.config.export.source_root));
    let bind = args.bind.as_deref().unwrap_or(&ctx.config.server.bind);

    info!(out_dir = %out_dir.display(), root = %root.display(), "starting server");
    let pipeline = ctx.pipeline(Arc::new(FileSink::new(out_dir)));
    let state = AppState::new(pipeline, Arc::new(DirectorySource::new(root)));
    ctx.block_on(server::serve(bind, state))
}
