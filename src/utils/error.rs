use thiserror::Error;

/// Batch-fatal: the file as a whole could not be decoded into records.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of product records, or an object with a `products` array")]
    NotAnArray,

    #[error("entry {index} is not a JSON object")]
    EntryNotObject { index: usize },

    #[error("unsupported batch format: {0}")]
    UnsupportedFormat(String),
}

/// One offending field of a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {0}")]
    Invalid(&'static str),

    #[error("unknown category")]
    UnknownCategory(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("image file '{path}' could not be read: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("image upload failed: {0}")]
    Transport(String),

    #[error("image upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("image upload returned an unexpected response: {0}")]
    InvalidResponse(String),
}

impl MediaError {
    /// Only transport failures are worth another attempt; the upload endpoint is
    /// safe to call again for the same bytes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MediaError::Transport(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("product creation rejected: {0}")]
    Backend(String),

    #[error("product creation failed ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("product creation request failed: {0}")]
    Transport(String),

    #[error("product creation returned an unexpected response: {0}")]
    InvalidResponse(String),

    #[error("image was not uploaded before submission")]
    UnresolvedImage,
}

/// Record-scoped failure, captured into the batch result instead of aborting it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl RecordError {
    pub fn stage(&self) -> &'static str {
        match self {
            RecordError::Validation(_) => "validation",
            RecordError::Media(_) => "media",
            RecordError::Submission(_) => "submission",
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Batch file could not be parsed: {0}")]
    Parse(#[from] ParseError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Category listing failed: {message}")]
    CatalogError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Configuration,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::Parse(_) => ErrorCategory::Input,
            ImportError::ApiError(_) | ImportError::CatalogError { .. } => ErrorCategory::Network,
            ImportError::IoError(_) => ErrorCategory::Storage,
            ImportError::SerializationError(_) => ErrorCategory::Internal,
            ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Storage => {
                ErrorSeverity::High
            }
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ImportError::Parse(ParseError::UnsupportedFormat(_)) => {
                "Use a .csv or .json file, or pass --format explicitly"
            }
            ImportError::Parse(_) => {
                "Check the batch file: CSV needs a header row and equal column counts, JSON must be an array of objects or {\"products\": [...]}"
            }
            ImportError::ApiError(_) | ImportError::CatalogError { .. } => {
                "Check that the backend is reachable at the configured base_url and try again"
            }
            ImportError::IoError(_) => "Check that the file exists and is readable",
            ImportError::SerializationError(_) => "Report this as a bug with the batch file attached",
            ImportError::ConfigValidationError { .. } | ImportError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags"
            }
        }
    }

    /// Process exit code for a batch that could not run. 2 is reserved for a
    /// batch that ran with failed records.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium | ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ImportError::Parse(e) => format!("The batch file is malformed: {}", e),
            ImportError::ApiError(e) => format!("Could not reach the backend: {}", e),
            ImportError::CatalogError { message } => {
                format!("Could not load the category list: {}", message)
            }
            ImportError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_joins_issues() {
        let err = ValidationError::new(vec![
            FieldIssue::Missing("category"),
            FieldIssue::Invalid("price"),
        ]);
        assert_eq!(err.to_string(), "missing category, invalid price");
    }

    #[test]
    fn test_record_error_stage() {
        let err: RecordError = MediaError::Transport("timeout".to_string()).into();
        assert_eq!(err.stage(), "media");
        let err: RecordError = SubmissionError::UnresolvedImage.into();
        assert_eq!(err.stage(), "submission");
    }

    #[test]
    fn test_only_transport_media_errors_retry() {
        assert!(MediaError::Transport("reset".to_string()).is_retryable());
        assert!(!MediaError::Rejected {
            status: 400,
            message: "bad".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_parse_errors_are_high_severity_input() {
        let err = ImportError::from(ParseError::NotAnArray);
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("malformed"));
    }

    #[test]
    fn test_outages_and_internal_errors_rank_by_severity() {
        let outage = ImportError::CatalogError {
            message: "503".to_string(),
        };
        assert_eq!(outage.severity(), ErrorSeverity::Medium);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let internal = ImportError::SerializationError(json_err);
        assert_eq!(internal.category(), ErrorCategory::Internal);
        assert_eq!(internal.severity(), ErrorSeverity::Critical);
        assert_eq!(internal.exit_code(), 3);
    }

    #[test]
    fn test_fatal_errors_never_use_partial_failure_code() {
        let outage = ImportError::CatalogError {
            message: "connection refused".to_string(),
        };
        assert_eq!(outage.exit_code(), 1);
        assert_eq!(ImportError::from(ParseError::NotAnArray).exit_code(), 1);
    }
}
