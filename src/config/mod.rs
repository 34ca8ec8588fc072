//! Configuration module
//!
//! Handles timing settings and the script-level page graph definitions.

pub mod graph;
pub mod settings;

use std::path::{Path, PathBuf};

pub use graph::GraphSpec;
pub use settings::Settings;

use crate::ocr::KeywordError;
use crate::ui::UiError;

/// Errors loading settings or a graph definition
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to load template {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Invalid graph definition: {0}")]
    Invalid(String),
    #[error(transparent)]
    Keyword(#[from] KeywordError),
    #[error(transparent)]
    Ui(#[from] UiError),
}

/// Read settings from a JSON file
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Settings::from_json(&json)?)
}
