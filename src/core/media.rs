use crate::domain::model::{ImageField, MediaReference, ProductDraft, StagedRecord};
use crate::domain::ports::{MediaUploader, Storage};
use crate::utils::error::MediaError;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(250),
        }
    }
}

/// Uploads local images and swaps them for the backend's media reference.
pub struct MediaResolver<'a, S: Storage, U: MediaUploader> {
    storage: &'a S,
    uploader: &'a U,
    root: PathBuf,
    retry: RetryPolicy,
    concurrency: usize,
}

impl<'a, S: Storage, U: MediaUploader> MediaResolver<'a, S, U> {
    pub fn new(storage: &'a S, uploader: &'a U) -> Self {
        Self {
            storage,
            uploader,
            root: PathBuf::new(),
            retry: RetryPolicy::default(),
            concurrency: 1,
        }
    }

    /// Directory that relative image paths are resolved against.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn resolve(&self, mut draft: ProductDraft) -> Result<ProductDraft, MediaError> {
        let path_str = match &draft.image {
            Some(ImageField::Local(path)) => self.root.join(path).to_string_lossy().to_string(),
            _ => return Ok(draft),
        };

        let bytes = self
            .storage
            .read_file(&path_str)
            .await
            .map_err(|e| MediaError::Unreadable {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        let file_name = Path::new(&path_str)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path_str.clone());

        let reference = self.upload_with_retry(&file_name, bytes).await?;
        tracing::debug!("🖼️ Uploaded {} as {}", path_str, reference);

        draft.image = Some(ImageField::Remote(reference));
        Ok(draft)
    }

    async fn upload_with_retry(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaReference, MediaError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.uploader.upload_image(file_name, bytes.clone()).await {
                Ok(reference) => return Ok(reference),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        "⚠️ Upload of {} failed (attempt {}/{}): {}",
                        file_name,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Resolves every live record; records that already failed pass through
    /// untouched. Output is in index order.
    pub async fn resolve_all(&self, staged: Vec<StagedRecord>) -> Vec<StagedRecord> {
        let mut resolved: Vec<StagedRecord> = stream::iter(staged)
            .map(|record| async move {
                match record.state {
                    Ok(draft) => {
                        let state = self.resolve(draft).await.map_err(|e| {
                            tracing::warn!("❌ Record {}: {}", record.index, e);
                            e.into()
                        });
                        StagedRecord::new(record.index, state)
                    }
                    Err(e) => StagedRecord::new(record.index, Err(e)),
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        resolved.sort_by_key(|record| record.index);
        resolved
    }
}
