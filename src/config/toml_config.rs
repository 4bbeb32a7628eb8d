use crate::domain::model::ImagePolicy;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub api: ApiConfig,
    pub import: ImportSettings,
    pub retry: RetryConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub categories_path: String,
    pub upload_path: String,
    pub products_path: String,
    pub headers: HashMap<String, String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_seconds: 30,
            categories_path: "/api/category/categories".to_string(),
            upload_path: "/api/upload".to_string(),
            products_path: "/api/products".to_string(),
            headers: HashMap::new(),
        }
    }
}

/// Headers are listed by name only; values may hold substituted secrets.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut header_names: Vec<&String> = self.headers.keys().collect();
        header_names.sort();

        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("categories_path", &self.categories_path)
            .field("upload_path", &self.upload_path)
            .field("products_path", &self.products_path)
            .field("headers", &header_names)
            .finish()
    }
}

impl ApiConfig {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub concurrency: usize,
    pub image_policy: ImagePolicy,
    pub validate_categories: bool,
    /// Base directory for local image paths named in the batch.
    pub image_dir: String,
    /// Image values under this prefix are already stored by the backend.
    pub remote_image_prefix: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            image_policy: ImagePolicy::Optional,
            validate_categories: true,
            image_dir: ".".to_string(),
            remote_image_prefix: "/uploads/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub upload_attempts: usize,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            upload_attempts: 3,
            delay_ms: 250,
        }
    }
}

impl ImportConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ImportError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 600)?;
        validation::validate_endpoint_path("api.categories_path", &self.api.categories_path)?;
        validation::validate_endpoint_path("api.upload_path", &self.api.upload_path)?;
        validation::validate_endpoint_path("api.products_path", &self.api.products_path)?;
        validation::validate_positive_number("import.concurrency", self.import.concurrency, 1)?;
        validation::validate_path("import.image_dir", &self.import.image_dir)?;
        validation::validate_positive_number(
            "retry.upload_attempts",
            self.retry.upload_attempts,
            1,
        )?;
        Ok(())
    }
}

impl ConfigProvider for ImportConfig {
    fn concurrency(&self) -> usize {
        self.import.concurrency
    }

    fn image_policy(&self) -> ImagePolicy {
        self.import.image_policy
    }

    fn validate_categories(&self) -> bool {
        self.import.validate_categories
    }

    fn image_dir(&self) -> &str {
        &self.import.image_dir
    }

    fn remote_image_prefix(&self) -> &str {
        &self.import.remote_image_prefix
    }

    fn upload_attempts(&self) -> usize {
        self.retry.upload_attempts
    }

    fn upload_retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.delay_ms)
    }
}
