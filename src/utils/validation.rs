use std::path::Path;
use reqwest::Url;
use crate::core::{AppConfig, Dimensions, ImageConfig};
use crate::utils::{OptimizerError, OptimizerResult, ValidationError, format_from_extension};

/// Validates a loaded configuration before any connection is opened
pub fn validate_config(config: &AppConfig) -> OptimizerResult<()> {
    if config.host.trim().is_empty() {
        return Err(OptimizerError::validation("Host cannot be empty"));
    }

    Url::parse(&config.base_url).map_err(|e| OptimizerError::validation(
        format!("Invalid base url '{}': {}", config.base_url, e)
    ))?;

    if config.directories.is_empty() {
        return Err(OptimizerError::validation("At least one directory must be configured"));
    }

    if config.transform.api_key.trim().is_empty() {
        return Err(OptimizerError::validation("Transform api key cannot be empty"));
    }

    validate_settings(&config.image_settings)?;
    Ok(())
}

/// Validates the per-variant target dimensions
pub fn validate_settings(settings: &ImageConfig) -> OptimizerResult<()> {
    let variants = [
        ("product", &settings.product),
        ("related", &settings.related),
        ("thumbnail", &settings.thumbnail),
        ("popup", &settings.popup),
    ];

    for (name, dimensions) in variants {
        validate_dimensions(name, dimensions)?;
    }

    Ok(())
}

fn validate_dimensions(name: &str, dimensions: &Dimensions) -> OptimizerResult<()> {
    if dimensions.width == 0 {
        return Err(OptimizerError::validation(format!("{name} width cannot be 0")));
    }
    if dimensions.height == 0 {
        return Err(OptimizerError::validation(format!("{name} height cannot be 0")));
    }
    Ok(())
}

/// Validates a local image given to the direct upload entry point
pub fn validate_input_path(path: &Path) -> OptimizerResult<()> {
    if !path.exists() {
        return Err(ValidationError::path_not_found(path).into());
    }

    if !path.is_file() {
        return Err(ValidationError::not_a_file(path).into());
    }

    // This will validate the extension and format
    format_from_extension(path.to_str().unwrap_or_default())?;
    Ok(())
}
