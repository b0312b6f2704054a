use crate::config::types::{BoundsConfig, Config, FetchConfig, LayoutConfig, SaveConfig, SearchConfig};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

const MAX_IMAGES_PER_ROW: usize = 100;
const MAX_ROWS: usize = 100;
const MAX_CONNECTION_LIMIT: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_layout_config(&config.layout)?;
    validate_bounds("thumbnail", &config.thumbnail)?;
    validate_save_config(&config.save)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout_ms must be >= 1".to_string(),
        ));
    }

    if let Some(limit) = config.connection_limit {
        if limit < 1 || limit > MAX_CONNECTION_LIMIT {
            return Err(ConfigError::Validation(format!(
                "connection_limit must be between 1 and {}, got {}",
                MAX_CONNECTION_LIMIT, limit
            )));
        }
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::InvalidHeader(format!("'{}': {}", name, e)))?;
        HeaderValue::from_str(value)
            .map_err(|e| ConfigError::InvalidHeader(format!("value of '{}': {}", name, e)))?;
    }

    Ok(())
}

/// Validates the gallery layout
fn validate_layout_config(config: &LayoutConfig) -> Result<(), ConfigError> {
    if config.images_per_row < 1 || config.images_per_row > MAX_IMAGES_PER_ROW {
        return Err(ConfigError::Validation(format!(
            "images_per_row must be between 1 and {}, got {}",
            MAX_IMAGES_PER_ROW, config.images_per_row
        )));
    }

    if config.rows < 1 || config.rows > MAX_ROWS {
        return Err(ConfigError::Validation(format!(
            "rows must be between 1 and {}, got {}",
            MAX_ROWS, config.rows
        )));
    }

    Ok(())
}

/// Rejects zero-sized bounds; absent bounds are fine
fn validate_bounds(section: &str, bounds: &BoundsConfig) -> Result<(), ConfigError> {
    if bounds.max_width == Some(0) || bounds.max_height == Some(0) {
        return Err(ConfigError::Validation(format!(
            "{} bounds must be positive when set",
            section
        )));
    }
    Ok(())
}

/// Validates save configuration
fn validate_save_config(config: &SaveConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "save directory cannot be empty".to_string(),
        ));
    }

    validate_name_pattern(&config.name_pattern)?;
    validate_bounds("save", &config.bounds)?;

    Ok(())
}

/// A name pattern needs exactly one `{}` placeholder and no path separators
fn validate_name_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.matches("{}").count() != 1 {
        return Err(ConfigError::Validation(format!(
            "name_pattern must contain exactly one '{{}}', got '{}'",
            pattern
        )));
    }

    if pattern.contains('/') || pattern.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "name_pattern cannot contain path separators, got '{}'",
            pattern
        )));
    }

    Ok(())
}

/// Validates the search endpoint and initial URLs
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &config.endpoint {
        validate_http_url(endpoint, "search endpoint")?;
    }

    for url in &config.init_urls {
        validate_http_url(url, "init URL")?;
    }

    Ok(())
}

fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, raw
        )));
    }

    Ok(())
}
