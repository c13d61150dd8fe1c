use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// Settings for opening an archive, usually received as JSON over FFI.
///
/// ```
/// use archive_core::config::ArchiveConfig;
///
/// let config = ArchiveConfig::from_json(r#"{"name":"city_archive"}"#)?;
/// assert_eq!(config.name, "city_archive");
/// assert!(config.seed_sample_data);
/// # Ok::<(), archive_core::app_response::AppResponse>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Database name; data lives in `<name>.lmdb`.
    pub name: String,
    pub map_size: usize,
    /// Write the sample fund tree when no tree is stored yet.
    pub seed_sample_data: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            name: "archive".to_string(),
            map_size: DEFAULT_MAP_SIZE,
            seed_sample_data: true,
        }
    }
}

impl ArchiveConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let config: ArchiveConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.name.trim().is_empty() {
            return Err(AppResponse::ValidationError("Archive name cannot be empty".to_string()));
        }
        if self.map_size == 0 {
            return Err(AppResponse::ValidationError("map_size must be positive".to_string()));
        }
        Ok(())
    }
}
