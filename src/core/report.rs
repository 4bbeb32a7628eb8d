use crate::domain::model::{BatchResult, RecordOutcome};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub index: usize,
    pub stage: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEntry {
    pub index: usize,
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub failures: Vec<FailureEntry>,
    pub created: Vec<CreatedEntry>,
    pub generated_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn from_result(result: &BatchResult) -> Self {
        let mut failures = Vec::new();
        let mut created = Vec::new();
        let mut dry_run = false;

        for outcome in result.outcomes() {
            match outcome {
                RecordOutcome::Created { index, product } => created.push(CreatedEntry {
                    index: *index,
                    product_id: product.id.clone(),
                }),
                RecordOutcome::Validated { .. } => dry_run = true,
                RecordOutcome::Failed { index, error } => failures.push(FailureEntry {
                    index: *index,
                    stage: error.stage(),
                    reason: error.to_string(),
                }),
            }
        }

        let total = result.len();
        Self {
            total,
            succeeded: total - failures.len(),
            failed: failures.len(),
            dry_run,
            failures,
            created,
            generated_at: Utc::now(),
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "validated" } else { "imported" };
        let mut lines = vec![format!(
            "{} of {} records {}, {} failed",
            self.succeeded, self.total, verb, self.failed
        )];
        for failure in &self.failures {
            lines.push(format!(
                "  record {} [{}]: {}",
                failure.index, failure.stage, failure.reason
            ));
        }
        lines.join("\n")
    }
}
