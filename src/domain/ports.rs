use crate::domain::model::{
    BatchFormat, BatchResult, CategoryRef, CreatedProduct, ImagePolicy, MediaReference,
    ProductDraft, RawRecord, StagedRecord,
};
use crate::utils::error::{MediaError, Result, SubmissionError};
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn concurrency(&self) -> usize;
    fn image_policy(&self) -> ImagePolicy;
    fn validate_categories(&self) -> bool;
    fn image_dir(&self) -> &str;
    fn remote_image_prefix(&self) -> &str;
    fn upload_attempts(&self) -> usize;
    fn upload_retry_delay(&self) -> Duration;
}

/// Read-only category listing owned by the backend.
#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRef>>;
}

#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<MediaReference, MediaError>;
}

#[async_trait]
pub trait ProductCreator: Send + Sync {
    async fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> std::result::Result<CreatedProduct, SubmissionError>;
}

#[async_trait]
impl<T: CategoryCatalog + ?Sized> CategoryCatalog for &T {
    async fn list_categories(&self) -> Result<Vec<CategoryRef>> {
        (**self).list_categories().await
    }
}

#[async_trait]
impl<T: MediaUploader + ?Sized> MediaUploader for &T {
    async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<MediaReference, MediaError> {
        (**self).upload_image(file_name, bytes).await
    }
}

#[async_trait]
impl<T: ProductCreator + ?Sized> ProductCreator for &T {
    async fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> std::result::Result<CreatedProduct, SubmissionError> {
        (**self).create_product(draft).await
    }
}

/// Everything the import needs from the backend in one bound.
pub trait ProductBackend: CategoryCatalog + MediaUploader + ProductCreator {}

impl<T: CategoryCatalog + MediaUploader + ProductCreator> ProductBackend for T {}

#[async_trait]
pub trait ImportPipeline: Send + Sync {
    async fn parse(&self, source: &str, format: BatchFormat) -> Result<Vec<RawRecord>>;
    async fn normalize(&self, records: Vec<RawRecord>) -> Result<Vec<StagedRecord>>;
    async fn resolve(&self, staged: Vec<StagedRecord>) -> Vec<StagedRecord>;
    async fn submit(&self, staged: Vec<StagedRecord>) -> BatchResult;
}
