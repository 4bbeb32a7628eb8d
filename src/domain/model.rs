use crate::utils::error::{ParseError, RecordError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One row or entry of a batch file, before any field is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub data: HashMap<String, serde_json::Value>,
}

impl RawRecord {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchFormat {
    Csv,
    Json,
}

impl BatchFormat {
    pub fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, ParseError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some(ext) => ext.parse(),
            None => Err(ParseError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl std::str::FromStr for BatchFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(BatchFormat::Csv),
            "json" => Ok(BatchFormat::Json),
            other => Err(ParseError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for BatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchFormat::Csv => write!(f, "csv"),
            BatchFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// Handle to an image held by the backend's media store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaReference(pub String);

impl MediaReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageField {
    /// A file to read and upload before submission.
    Local(PathBuf),
    Remote(MediaReference),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePolicy {
    #[default]
    Optional,
    Required,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub quantity: u32,
    pub brand: String,
    pub count_in_stock: u32,
    pub image: Option<ImageField>,
}

impl ProductDraft {
    pub fn media_reference(&self) -> Option<&MediaReference> {
        match &self.image {
            Some(ImageField::Remote(reference)) => Some(reference),
            _ => None,
        }
    }

    pub fn has_pending_upload(&self) -> bool {
        matches!(self.image, Some(ImageField::Local(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedProduct {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A record travelling between stages: either still alive as a draft or
/// already failed with the error that stopped it.
#[derive(Debug, Clone)]
pub struct StagedRecord {
    pub index: usize,
    pub state: std::result::Result<ProductDraft, RecordError>,
}

impl StagedRecord {
    pub fn new(index: usize, state: std::result::Result<ProductDraft, RecordError>) -> Self {
        Self { index, state }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Created { index: usize, product: CreatedProduct },
    Validated { index: usize },
    Failed { index: usize, error: RecordError },
}

impl RecordOutcome {
    pub fn index(&self) -> usize {
        match self {
            RecordOutcome::Created { index, .. }
            | RecordOutcome::Validated { index }
            | RecordOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, RecordOutcome::Failed { .. })
    }
}

/// Per-record outcomes of one batch, ordered by original record index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    outcomes: Vec<RecordOutcome>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: RecordOutcome) {
        self.outcomes.push(outcome);
    }

    /// Freezes the result in index order regardless of completion order.
    pub fn finish(mut self) -> Self {
        self.outcomes.sort_by_key(RecordOutcome::index);
        self
    }

    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl FromIterator<RecordOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = RecordOutcome>>(iter: I) -> Self {
        let mut result = BatchResult::new();
        for outcome in iter {
            result.push(outcome);
        }
        result.finish()
    }
}
