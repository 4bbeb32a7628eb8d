use crate::core::media::{MediaResolver, RetryPolicy};
use crate::core::normalizer::RecordNormalizer;
use crate::core::parser::parse_batch;
use crate::core::submitter::BatchSubmitter;
use crate::domain::model::{BatchFormat, BatchResult, RawRecord, StagedRecord};
use crate::domain::ports::{ConfigProvider, ImportPipeline, ProductBackend, Storage};
use crate::utils::error::Result;

/// The product import stages wired to a storage, a backend and settings.
pub struct ProductImportPipeline<S: Storage, B: ProductBackend, C: ConfigProvider> {
    storage: S,
    backend: B,
    config: C,
}

impl<S: Storage, B: ProductBackend, C: ConfigProvider> ProductImportPipeline<S, B, C> {
    pub fn new(storage: S, backend: B, config: C) -> Self {
        Self {
            storage,
            backend,
            config,
        }
    }

    async fn normalizer(&self) -> Result<RecordNormalizer> {
        let normalizer = RecordNormalizer::new(self.config.image_policy())
            .with_remote_prefix(self.config.remote_image_prefix());
        if !self.config.validate_categories() {
            return Ok(normalizer);
        }

        let categories = self.backend.list_categories().await?;
        tracing::debug!("Loaded {} categories", categories.len());
        Ok(normalizer.with_categories(categories))
    }
}

#[async_trait::async_trait]
impl<S: Storage, B: ProductBackend, C: ConfigProvider> ImportPipeline
    for ProductImportPipeline<S, B, C>
{
    async fn parse(&self, source: &str, format: BatchFormat) -> Result<Vec<RawRecord>> {
        tracing::debug!("Reading batch file: {}", source);
        let bytes = self.storage.read_file(source).await?;
        Ok(parse_batch(&bytes, format)?)
    }

    async fn normalize(&self, records: Vec<RawRecord>) -> Result<Vec<StagedRecord>> {
        let normalizer = self.normalizer().await?;

        let staged = records
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let state = normalizer.normalize(raw).map_err(|e| {
                    tracing::warn!("❌ Record {}: {}", index, e);
                    e.into()
                });
                StagedRecord::new(index, state)
            })
            .collect();

        Ok(staged)
    }

    async fn resolve(&self, staged: Vec<StagedRecord>) -> Vec<StagedRecord> {
        MediaResolver::new(&self.storage, &self.backend)
            .with_root(self.config.image_dir())
            .with_retry(RetryPolicy {
                attempts: self.config.upload_attempts(),
                delay: self.config.upload_retry_delay(),
            })
            .with_concurrency(self.config.concurrency())
            .resolve_all(staged)
            .await
    }

    async fn submit(&self, staged: Vec<StagedRecord>) -> BatchResult {
        BatchSubmitter::new(&self.backend)
            .with_concurrency(self.config.concurrency())
            .submit_all(staged)
            .await
    }
}
