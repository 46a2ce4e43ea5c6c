//! Pipeline definition loading.

use crate::config::schema::PipelineConfig;
use crate::error::{Result, VanillaError};
use std::fs;
use std::path::Path;

/// Load a pipeline definition file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_pipeline_file(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VanillaError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            VanillaError::Io(e)
        }
    })?;

    parse_pipeline(&content, path)
}

/// Parse YAML content into a pipeline definition.
///
/// `source_path` is only used for error reporting. An empty document is an
/// empty pipeline.
pub fn parse_pipeline(content: &str, source_path: &Path) -> Result<PipelineConfig> {
    if content.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| VanillaError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
