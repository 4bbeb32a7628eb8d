use crate::domain::model::{BatchResult, RecordOutcome, StagedRecord};
use crate::domain::ports::ProductCreator;
use crate::utils::error::SubmissionError;
use futures::stream::{self, StreamExt};

/// Sends each live draft to the creation endpoint exactly once. A rejected
/// record is recorded and the rest of the batch carries on.
pub struct BatchSubmitter<'a, P: ProductCreator> {
    creator: &'a P,
    concurrency: usize,
}

impl<'a, P: ProductCreator> BatchSubmitter<'a, P> {
    pub fn new(creator: &'a P) -> Self {
        Self {
            creator,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn submit_one(&self, record: StagedRecord) -> RecordOutcome {
        let index = record.index;
        let draft = match record.state {
            Ok(draft) => draft,
            Err(error) => return RecordOutcome::Failed { index, error },
        };

        if draft.has_pending_upload() {
            return RecordOutcome::Failed {
                index,
                error: SubmissionError::UnresolvedImage.into(),
            };
        }

        match self.creator.create_product(&draft).await {
            Ok(product) => {
                tracing::info!("✅ Record {}: created '{}' ({})", index, draft.name, product.id);
                RecordOutcome::Created { index, product }
            }
            Err(e) => {
                tracing::warn!("❌ Record {}: {}", index, e);
                RecordOutcome::Failed {
                    index,
                    error: e.into(),
                }
            }
        }
    }

    pub async fn submit_all(&self, staged: Vec<StagedRecord>) -> BatchResult {
        stream::iter(staged)
            .map(|record| self.submit_one(record))
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }
}
