//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::BTreeSet;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "ivy.toml";

/// Loads and validates an `ivy.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `ivy.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.output_dir.is_empty() {
        return Err(ConfigError::MissingField("project.output_dir".to_string()));
    }

    let mut seen = BTreeSet::new();
    for library in &config.libraries {
        if library.name.is_empty() {
            return Err(ConfigError::MissingField("libraries.name".to_string()));
        }
        if !seen.insert(library.name.as_str()) {
            return Err(ConfigError::DuplicateLibrary(library.name.clone()));
        }
    }

    if let Some(ref version) = config.toolchain.min_version {
        if !is_version_literal(version) {
            return Err(ConfigError::ValidationError(format!(
                "toolchain.min_version '{version}' is not of the form MAJOR.MINOR[.PATCH]"
            )));
        }
    }
    Ok(())
}

/// Returns true for `"10.2"` and `"10.2.1"` style strings whose parts each
/// fit in a `u32`.
fn is_version_literal(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| p.bytes().all(|b| b.is_ascii_digit()) && p.parse::<u32>().is_ok())
}
