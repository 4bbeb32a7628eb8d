use anyhow::Context;
use clap::Parser;
use product_import::domain::ports::Storage;
use product_import::utils::error::ImportError;
use product_import::utils::logger;
use product_import::{
    BatchReport, CliConfig, HttpBackend, ImportEngine, LocalStorage, ProductImportPipeline,
};

async fn run(cli: &CliConfig) -> Result<BatchReport, ImportError> {
    let format = cli.batch_format()?;
    let config = cli.load_config()?;
    tracing::debug!("Import config: {:?}", config);

    let backend = HttpBackend::new(config.api.clone())?;
    let storage = LocalStorage::new(".");
    let pipeline = ProductImportPipeline::new(storage, backend, config);
    let engine = ImportEngine::new(pipeline).with_dry_run(cli.dry_run);

    engine.run(&cli.file, format).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting product-import");

    let report = match run(&cli).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(
                "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    if let Some(path) = &cli.report_out {
        let json = report.to_json_pretty().context("serializing batch report")?;
        LocalStorage::new(".")
            .write_file(path, &json)
            .await
            .with_context(|| format!("writing batch report to {}", path))?;
        tracing::info!("📁 Report saved to: {}", path);
    }

    println!("{}", report.summary());

    if !report.is_complete_success() {
        std::process::exit(2);
    }
    Ok(())
}
