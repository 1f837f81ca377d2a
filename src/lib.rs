pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rules;
pub mod server;
pub mod test_utils;

pub use error::{PexError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
