use crate::core::report::BatchReport;
use crate::domain::model::{BatchFormat, BatchResult, RecordOutcome};
use crate::domain::ports::ImportPipeline;
use crate::utils::error::Result;

/// Stages of one batch run. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BatchStage {
    Idle,
    Parsing,
    Normalizing,
    Resolving,
    Submitting,
    Reported,
}

impl std::fmt::Display for BatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BatchStage::Idle => "idle",
            BatchStage::Parsing => "parsing",
            BatchStage::Normalizing => "normalizing",
            BatchStage::Resolving => "resolving",
            BatchStage::Submitting => "submitting",
            BatchStage::Reported => "reported",
        };
        f.write_str(name)
    }
}

struct StageTracker {
    current: BatchStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: BatchStage::Idle,
        }
    }

    fn advance(&mut self, next: BatchStage) {
        debug_assert!(next > self.current, "batch stage moved backwards");
        tracing::debug!("Batch stage: {} -> {}", self.current, next);
        self.current = next;
    }
}

pub struct ImportEngine<P: ImportPipeline> {
    pipeline: P,
    dry_run: bool,
}

impl<P: ImportPipeline> ImportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            dry_run: false,
        }
    }

    /// Parse and validate only; nothing is uploaded or created.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs one batch through every stage. Only batch-level failures (an
    /// unreadable or malformed file, an unavailable category listing) are
    /// returned as errors; record failures land in the result.
    pub async fn execute(&self, source: &str, format: BatchFormat) -> Result<BatchResult> {
        let mut stage = StageTracker::new();

        stage.advance(BatchStage::Parsing);
        tracing::info!("📂 Parsing {} batch: {}", format, source);
        let records = self.pipeline.parse(source, format).await?;
        tracing::info!("📊 Parsed {} records", records.len());

        stage.advance(BatchStage::Normalizing);
        let staged = self.pipeline.normalize(records).await?;
        let valid = staged.iter().filter(|record| record.state.is_ok()).count();
        tracing::info!("🔍 {} of {} records passed validation", valid, staged.len());

        if self.dry_run {
            stage.advance(BatchStage::Reported);
            tracing::info!("🔍 Dry run: skipping image upload and product creation");
            return Ok(staged
                .into_iter()
                .map(|record| match record.state {
                    Ok(_) => RecordOutcome::Validated {
                        index: record.index,
                    },
                    Err(error) => RecordOutcome::Failed {
                        index: record.index,
                        error,
                    },
                })
                .collect());
        }

        stage.advance(BatchStage::Resolving);
        tracing::info!("🖼️ Resolving images");
        let resolved = self.pipeline.resolve(staged).await;

        stage.advance(BatchStage::Submitting);
        tracing::info!("🚀 Submitting products");
        let result = self.pipeline.submit(resolved).await;

        stage.advance(BatchStage::Reported);
        Ok(result)
    }

    pub async fn run(&self, source: &str, format: BatchFormat) -> Result<BatchReport> {
        let result = self.execute(source, format).await?;
        let mut report = BatchReport::from_result(&result);
        report.dry_run = self.dry_run;

        tracing::info!(
            "✅ Batch finished: {} succeeded, {} failed of {}",
            report.succeeded,
            report.failed,
            report.total
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::ProductImportPipeline;
    use crate::core::report::FailureEntry;
    use crate::domain::model::{
        CategoryRef, CreatedProduct, ImagePolicy, MediaReference, ProductDraft,
    };
    use crate::domain::ports::{
        CategoryCatalog, ConfigProvider, MediaUploader, ProductCreator, Storage,
    };
    use crate::utils::error::{ImportError, MediaError, ParseError, SubmissionError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn with_file(self, path: &str, data: &[u8]) -> Self {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            self
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ImportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockBackend {
        catalog_down: bool,
        uploads: AtomicUsize,
        created: std::sync::Mutex<Vec<ProductDraft>>,
    }

    #[async_trait]
    impl CategoryCatalog for MockBackend {
        async fn list_categories(&self) -> Result<Vec<CategoryRef>> {
            if self.catalog_down {
                return Err(ImportError::CatalogError {
                    message: "503 Service Unavailable".to_string(),
                });
            }
            Ok(vec![CategoryRef {
                id: "c-lamps".to_string(),
                name: "Lamps".to_string(),
            }])
        }
    }

    #[async_trait]
    impl MediaUploader for MockBackend {
        async fn upload_image(
            &self,
            file_name: &str,
            _bytes: Vec<u8>,
        ) -> std::result::Result<MediaReference, MediaError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(MediaReference(format!("/uploads/{}", file_name)))
        }
    }

    #[async_trait]
    impl ProductCreator for MockBackend {
        async fn create_product(
            &self,
            draft: &ProductDraft,
        ) -> std::result::Result<CreatedProduct, SubmissionError> {
            let mut created = self.created.lock().unwrap();
            if created.iter().any(|existing| existing.name == draft.name) {
                return Err(SubmissionError::Backend("Product already exists".to_string()));
            }
            created.push(draft.clone());
            Ok(CreatedProduct {
                id: format!("p{}", created.len()),
                name: draft.name.clone(),
            })
        }
    }

    struct MockConfig {
        concurrency: usize,
        validate_categories: bool,
    }

    impl Default for MockConfig {
        fn default() -> Self {
            Self {
                concurrency: 2,
                validate_categories: true,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn concurrency(&self) -> usize {
            self.concurrency
        }

        fn image_policy(&self) -> ImagePolicy {
            ImagePolicy::Optional
        }

        fn validate_categories(&self) -> bool {
            self.validate_categories
        }

        fn image_dir(&self) -> &str {
            ""
        }

        fn remote_image_prefix(&self) -> &str {
            "/uploads/"
        }

        fn upload_attempts(&self) -> usize {
            1
        }

        fn upload_retry_delay(&self) -> Duration {
            Duration::ZERO
        }
    }

    type TestPipeline<'a> = ProductImportPipeline<MockStorage, &'a MockBackend, MockConfig>;

    fn engine<'a>(storage: MockStorage, backend: &'a MockBackend) -> ImportEngine<TestPipeline<'a>> {
        ImportEngine::new(ProductImportPipeline::new(
            storage,
            backend,
            MockConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_csv_with_one_negative_price() {
        let csv = "name,price,category,quantity\nLamp,10,c-lamps,1\nDesk,-5,c-lamps,1\nRug,30,Lamps,2\n";
        let storage = MockStorage::default().with_file("batch.csv", csv.as_bytes()).await;
        let backend = MockBackend::default();

        let report = engine(storage, &backend)
            .run("batch.csv", BatchFormat::Csv)
            .await
            .unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            report.failures,
            vec![FailureEntry {
                index: 1,
                stage: "validation",
                reason: "invalid price".to_string(),
            }]
        );
        assert_eq!(backend.created.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_json_missing_category_fails_only_that_record() {
        let json = r#"[
            {"name": "Lamp", "price": 10, "category": "c-lamps", "quantity": 1},
            {"name": "Desk", "price": 80, "quantity": 1},
            {"name": "Rug", "price": 30, "category": "c-lamps", "quantity": 2, "image": "rug.png"}
        ]"#;
        let storage = MockStorage::default()
            .with_file("batch.json", json.as_bytes())
            .await
            .with_file("rug.png", b"png")
            .await;
        let backend = MockBackend::default();

        let report = engine(storage, &backend)
            .run("batch.json", BatchFormat::Json)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].reason, "missing category");
        assert_eq!(backend.uploads.load(Ordering::SeqCst), 1);

        let created = backend.created.lock().unwrap();
        let rug = created.iter().find(|d| d.name == "Rug").unwrap();
        assert_eq!(
            rug.media_reference(),
            Some(&MediaReference("/uploads/rug.png".to_string()))
        );
    }

    #[tokio::test]
    async fn test_products_export_with_hosted_images() {
        let json = r#"{"products": [
            {"name": "Lamp", "price": 10, "category": "c-lamps", "quantity": 1,
             "image": "/uploads/image-1700000000000.jpg"},
            {"name": "Desk", "price": 80, "category": "Lamps", "quantity": 1}
        ]}"#;
        let storage = MockStorage::default().with_file("export.json", json.as_bytes()).await;
        let backend = MockBackend::default();

        let report = engine(storage, &backend)
            .run("export.json", BatchFormat::Json)
            .await
            .unwrap();

        assert!(report.is_complete_success());
        assert_eq!(report.total, 2);
        assert_eq!(backend.uploads.load(Ordering::SeqCst), 0);

        let created = backend.created.lock().unwrap();
        let lamp = created.iter().find(|d| d.name == "Lamp").unwrap();
        assert_eq!(
            lamp.media_reference(),
            Some(&MediaReference("/uploads/image-1700000000000.jpg".to_string()))
        );
    }

    #[tokio::test]
    async fn test_all_valid_records_succeed() {
        let rows: String = (0..10)
            .map(|i| format!("Item {},{}.50,c-lamps,{}\n", i, i, i))
            .collect();
        let csv = format!("name,price,category,quantity\n{}", rows);
        let storage = MockStorage::default().with_file("batch.csv", csv.as_bytes()).await;
        let backend = MockBackend::default();

        let result = engine(storage, &backend)
            .execute("batch.csv", BatchFormat::Csv)
            .await
            .unwrap();

        assert_eq!(result.len(), 10);
        let indices: Vec<usize> = result.outcomes().iter().map(RecordOutcome::index).collect();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
        assert!(result
            .outcomes()
            .iter()
            .all(|o| matches!(o, RecordOutcome::Created { .. })));
    }

    #[tokio::test]
    async fn test_malformed_file_aborts_before_any_call() {
        let storage = MockStorage::default()
            .with_file("batch.json", br#"{"name": "Lamp"}"#)
            .await;
        let backend = MockBackend::default();

        let err = engine(storage, &backend)
            .run("batch.json", BatchFormat::Json)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Parse(ParseError::NotAnArray)));
        assert!(backend.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_batch_file_is_fatal() {
        let backend = MockBackend::default();
        let err = engine(MockStorage::default(), &backend)
            .run("missing.csv", BatchFormat::Csv)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::IoError(_)));
    }

    #[tokio::test]
    async fn test_catalog_outage_aborts_batch() {
        let csv = "name,price,category,quantity\nLamp,10,c-lamps,1\n";
        let storage = MockStorage::default().with_file("batch.csv", csv.as_bytes()).await;
        let backend = MockBackend {
            catalog_down: true,
            ..Default::default()
        };

        let err = engine(storage, &backend)
            .run("batch.csv", BatchFormat::Csv)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::CatalogError { .. }));
        assert!(backend.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_check_can_be_skipped() {
        let csv = "name,price,category,quantity\nLamp,10,anything,1\n";
        let storage = MockStorage::default().with_file("batch.csv", csv.as_bytes()).await;
        let backend = MockBackend {
            catalog_down: true,
            ..Default::default()
        };
        let config = MockConfig {
            validate_categories: false,
            ..Default::default()
        };

        let report = ImportEngine::new(ProductImportPipeline::new(storage, &backend, config))
            .run("batch.csv", BatchFormat::Csv)
            .await
            .unwrap();
        assert!(report.is_complete_success());
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_backend_writes() {
        let csv = "name,price,category,quantity,image\nLamp,10,c-lamps,1,lamp.png\nDesk,x,c-lamps,1,\n";
        let storage = MockStorage::default().with_file("batch.csv", csv.as_bytes()).await;
        let backend = MockBackend::default();

        let report = engine(storage, &backend)
            .with_dry_run(true)
            .run("batch.csv", BatchFormat::Csv)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(report.created.is_empty());
        assert_eq!(backend.uploads.load(Ordering::SeqCst), 0);
        assert!(backend.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_does_not_duplicate_created_products() {
        let csv = "name,price,category,quantity\nLamp,10,c-lamps,1\n";
        let storage = MockStorage::default().with_file("batch.csv", csv.as_bytes()).await;
        let backend = MockBackend::default();
        let engine = engine(storage, &backend);

        let first = engine.run("batch.csv", BatchFormat::Csv).await.unwrap();
        assert!(first.is_complete_success());

        // a second run is an explicit caller action; the backend decides
        let second = engine.run("batch.csv", BatchFormat::Csv).await.unwrap();
        assert_eq!(second.failed, 1);
        assert_eq!(backend.created.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stage_order() {
        assert!(BatchStage::Idle < BatchStage::Parsing);
        assert!(BatchStage::Submitting < BatchStage::Reported);
        assert_eq!(BatchStage::Resolving.to_string(), "resolving");
    }
}
