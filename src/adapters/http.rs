use crate::config::toml_config::ApiConfig;
use crate::domain::model::{CategoryRef, CreatedProduct, MediaReference, ProductDraft};
use crate::domain::ports::{CategoryCatalog, MediaUploader, ProductCreator};
use crate::utils::error::{ImportError, MediaError, Result, SubmissionError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    message: Option<String>,
    image: String,
}

/// Error bodies use either `error` or `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn reason(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error.or(parsed.message))
            .unwrap_or_else(|| body.trim().to_string())
    }
}

/// Client for the shop backend's category, upload and product endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    api: ApiConfig,
}

impl HttpBackend {
    pub fn new(api: ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &api.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                ImportError::InvalidConfigValueError {
                    field: "api.headers".to_string(),
                    value: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ImportError::InvalidConfigValueError {
                    field: format!("api.headers.{}", key),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, api })
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn product_form(draft: &ProductDraft) -> multipart::Form {
    let form = multipart::Form::new()
        .text("name", draft.name.clone())
        .text("description", draft.description.clone())
        .text("price", draft.price.to_string())
        .text("category", draft.category.clone())
        .text("quantity", draft.quantity.to_string())
        .text("brand", draft.brand.clone())
        .text("countInStock", draft.count_in_stock.to_string());

    match draft.media_reference() {
        Some(reference) => form.text("image", reference.as_str().to_string()),
        None => form,
    }
}

#[async_trait]
impl CategoryCatalog for HttpBackend {
    async fn list_categories(&self) -> Result<Vec<CategoryRef>> {
        let url = self.api.endpoint(&self.api.categories_path);
        tracing::debug!("Fetching categories from: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImportError::CatalogError {
                message: format!("{}: {}", status, ErrorBody::reason(&body)),
            });
        }

        Ok(response.json::<Vec<CategoryRef>>().await?)
    }
}

#[async_trait]
impl MediaUploader for HttpBackend {
    async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<MediaReference, MediaError> {
        let url = self.api.endpoint(&self.api.upload_path);

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .map_err(|e| MediaError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message: ErrorBody::reason(&body),
            });
        }

        let uploaded: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;
        if let Some(message) = &uploaded.message {
            tracing::debug!("Upload of {}: {}", file_name, message);
        }
        Ok(MediaReference(uploaded.image))
    }
}

#[async_trait]
impl ProductCreator for HttpBackend {
    async fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> std::result::Result<CreatedProduct, SubmissionError> {
        let url = self.api.endpoint(&self.api.products_path);

        let response = self
            .client
            .post(&url)
            .multipart(product_form(draft))
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: ErrorBody::reason(&body),
            });
        }

        // the backend reports validation failures in the body, sometimes with 200
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            let reason = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(SubmissionError::Backend(reason));
        }

        let created: CreatedProduct = serde_json::from_value(value)
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        tracing::debug!("Created product {} ({})", created.name, created.id);
        Ok(created)
    }
}
