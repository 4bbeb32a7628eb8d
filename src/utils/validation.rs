use crate::utils::error::{ImportError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> ImportError {
    ImportError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

/// Endpoint paths are joined onto the base URL, so they must be absolute.
pub fn validate_endpoint_path(field_name: &str, path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(invalid(field_name, path, "Endpoint path must start with '/'"));
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
