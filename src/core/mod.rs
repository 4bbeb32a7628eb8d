pub mod engine;
pub mod media;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod submitter;

pub use crate::domain::model::{BatchFormat, BatchResult, ProductDraft, RawRecord, RecordOutcome};
pub use crate::domain::ports::{ConfigProvider, ImportPipeline, ProductBackend, Storage};
pub use crate::utils::error::Result;
