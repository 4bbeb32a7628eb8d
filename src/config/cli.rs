use crate::config::toml_config::ImportConfig;
use crate::domain::model::{BatchFormat, ImagePolicy};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "product-import")]
#[command(about = "Bulk-import products from a CSV or JSON batch file")]
pub struct CliConfig {
    /// Batch file to import (.csv or .json)
    pub file: String,

    /// Batch format; inferred from the file extension when omitted
    #[arg(long)]
    pub format: Option<BatchFormat>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long)]
    pub api_base: Option<String>,

    /// Override import.concurrency
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override import.image_dir
    #[arg(long)]
    pub image_dir: Option<String>,

    /// Fail records that have no image
    #[arg(long)]
    pub require_images: bool,

    /// Do not check categories against the backend listing
    #[arg(long)]
    pub skip_category_check: bool,

    /// Write the JSON report to this path
    #[arg(long)]
    pub report_out: Option<String>,

    /// Parse and validate only; nothing is uploaded or created
    #[arg(long)]
    pub dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn batch_format(&self) -> Result<BatchFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => Ok(BatchFormat::from_path(&self.file)?),
        }
    }

    /// Loads the config file (or defaults), applies command-line overrides and
    /// validates the result.
    pub fn load_config(&self) -> Result<ImportConfig> {
        let mut config = match &self.config {
            Some(path) => ImportConfig::from_file(path)?,
            None => ImportConfig::default(),
        };

        if let Some(api_base) = &self.api_base {
            config.api.base_url = api_base.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.import.concurrency = concurrency;
        }
        if let Some(image_dir) = &self.image_dir {
            config.import.image_dir = image_dir.clone();
        }
        if self.require_images {
            config.import.image_policy = ImagePolicy::Required;
        }
        if self.skip_category_check {
            config.import.validate_categories = false;
        }

        config.validate()?;
        Ok(config)
    }
}
