use crate::domain::model::{
    CategoryRef, ImageField, ImagePolicy, MediaReference, ProductDraft, RawRecord,
};
use crate::utils::error::{FieldIssue, ValidationError};
use std::path::PathBuf;
use url::Url;

const COUNT_IN_STOCK_ALIASES: [&str; 3] = ["countInStock", "count_in_stock", "stock"];

/// Turns raw records into product drafts. Each record is judged on its own;
/// a failure here never affects its siblings.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    categories: Option<Vec<CategoryRef>>,
    image_policy: ImagePolicy,
    remote_prefix: Option<String>,
}

impl RecordNormalizer {
    pub fn new(image_policy: ImagePolicy) -> Self {
        Self {
            categories: None,
            image_policy,
            remote_prefix: None,
        }
    }

    /// Image values starting with `prefix` already live on the backend and
    /// are passed through instead of uploaded. An empty prefix is ignored.
    pub fn with_remote_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.remote_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Restricts `category` to the given listing. Without it any non-empty
    /// value is passed through as the category id.
    pub fn with_categories(mut self, categories: Vec<CategoryRef>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn normalize(&self, raw: &RawRecord) -> Result<ProductDraft, ValidationError> {
        let mut issues = Vec::new();

        let name = required_text(raw, "name", &mut issues);
        let category = required_text(raw, "category", &mut issues)
            .and_then(|value| self.resolve_category(&value, &mut issues));

        let price = match text_value(raw.get("price")) {
            None => {
                issues.push(FieldIssue::Missing("price"));
                None
            }
            Some(value) => match parse_price(&value) {
                Some(price) => Some(price),
                None => {
                    issues.push(FieldIssue::Invalid("price"));
                    None
                }
            },
        };

        let quantity = match text_value(raw.get("quantity")) {
            None => {
                issues.push(FieldIssue::Missing("quantity"));
                None
            }
            Some(value) => parse_count(&value, "quantity", &mut issues),
        };

        let count_in_stock = match COUNT_IN_STOCK_ALIASES
            .iter()
            .find_map(|alias| text_value(raw.get(alias)))
        {
            None => Some(0),
            Some(value) => parse_count(&value, "countInStock", &mut issues),
        };

        let image = text_value(raw.get("image")).map(|value| self.image_field(&value));
        if image.is_none() && self.image_policy == ImagePolicy::Required {
            issues.push(FieldIssue::Missing("image"));
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        match (name, category, price, quantity, count_in_stock) {
            (Some(name), Some(category), Some(price), Some(quantity), Some(count_in_stock)) => {
                Ok(ProductDraft {
                    name,
                    description: text_value(raw.get("description")).unwrap_or_default(),
                    price,
                    category,
                    quantity,
                    brand: text_value(raw.get("brand")).unwrap_or_default(),
                    count_in_stock,
                    image,
                })
            }
            // every None above pushed an issue
            _ => Err(ValidationError::new(issues)),
        }
    }

    fn image_field(&self, value: &str) -> ImageField {
        let already_hosted = match Url::parse(value) {
            Ok(url) => matches!(url.scheme(), "http" | "https"),
            Err(_) => self
                .remote_prefix
                .as_deref()
                .is_some_and(|prefix| value.starts_with(prefix)),
        };

        if already_hosted {
            ImageField::Remote(MediaReference(value.to_string()))
        } else {
            ImageField::Local(PathBuf::from(value))
        }
    }

    fn resolve_category(&self, value: &str, issues: &mut Vec<FieldIssue>) -> Option<String> {
        let Some(categories) = &self.categories else {
            return Some(value.to_string());
        };

        let found = categories
            .iter()
            .find(|c| c.id == value)
            .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(value)));

        match found {
            Some(category) => Some(category.id.clone()),
            None => {
                issues.push(FieldIssue::UnknownCategory(value.to_string()));
                None
            }
        }
    }
}

/// Scalar value as trimmed text; empty strings count as absent.
fn text_value(value: Option<&serde_json::Value>) -> Option<String> {
    let text = match value? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn required_text(
    raw: &RawRecord,
    field: &'static str,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    let value = text_value(raw.get(field));
    if value.is_none() {
        issues.push(FieldIssue::Missing(field));
    }
    value
}

fn parse_price(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
}

fn parse_count(value: &str, field: &'static str, issues: &mut Vec<FieldIssue>) -> Option<u32> {
    // JSON integers can arrive as 3.0
    let parsed = value.parse::<u32>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32)
    });

    if parsed.is_none() {
        issues.push(FieldIssue::Invalid(field));
    }
    parsed
}
