pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{HttpBackend, LocalStorage};
pub use config::toml_config::ImportConfig;
pub use core::{
    engine::ImportEngine, pipeline::ProductImportPipeline, report::BatchReport,
};
pub use utils::error::{ImportError, Result};
