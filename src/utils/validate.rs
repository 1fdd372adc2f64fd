//! Validation for configured endpoints.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL contains potentially dangerous characters")]
    DangerousUrl,
}

/// Validate an upstream endpoint URL.
///
/// Only absolute `http`/`https` URLs with a host are accepted.
pub fn validate_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::InvalidUrl("empty URL".to_string()));
    }

    if url.contains('\n') || url.contains('\r') || url.contains('\0') {
        return Err(ValidationError::DangerousUrl);
    }

    let parsed = url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::InvalidUrl(format!(
                "invalid scheme: {}",
                other
            )))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl("missing host".to_string()));
    }

    Ok(url.to_string())
}
