//! Per-invocation state shared by CLI commands.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::debug;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{ExportSink, KeywordEnhancer, Pipeline, PipelineConfig};

#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub project_root: PathBuf,
    pub output_format: OutputFormat,
    pub robot_mode: bool,
    pub verbosity: u8,
    runtime: Runtime,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        Self::with_root(cli, project_root)
    }

    /// Like [`Self::from_cli`], resolving the project config under `project_root`.
    pub fn with_root(cli: &Cli, project_root: PathBuf) -> Result<Self> {
        let config = Config::load(cli.config.as_deref(), &project_root)?;
        debug!(root = %project_root.display(), "loaded configuration");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            config,
            config_path: cli.config.clone(),
            project_root,
            output_format: cli.output_format,
            robot_mode: cli.output_format.is_machine_readable(),
            verbosity: cli.verbose,
            runtime,
        })
    }

    /// Run an async pipeline call to completion from a sync command.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Pipeline over the loaded config, uploading into `sink`.
    pub fn pipeline(&self, sink: Arc<dyn ExportSink>) -> Pipeline {
        Pipeline::new(
            PipelineConfig::from_config(&self.config),
            Arc::new(KeywordEnhancer),
            sink,
        )
    }

    /// Resolve a possibly relative path against the project root.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
