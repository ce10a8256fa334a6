//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration overrides
//! from various locations (explicit path, local directory, system directory).
//! The file has the shape of the library configuration: global keys at the
//! top level and one table per diagram type.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;
use toml::Table;

use merrow::{MerrowError, config::Configuration};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for MerrowError {
    fn from(err: ConfigError) -> Self {
        MerrowError::Io(io::Error::new(io::ErrorKind::NotFound, err.to_string()))
    }
}

/// Find and load configuration overrides from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (merrow/config.toml)
/// 3. Platform-specific config directory
/// 4. No overrides if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<Table, MerrowError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("merrow/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "merrow", "merrow") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(Table::new())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<Table, MerrowError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    Ok(Configuration::parse_overrides(&content)?)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "cloneCssStyles = false\n[gantt]\nbarHeight = 30\n").unwrap();

        let table = load_config(Some(&path)).unwrap();
        assert_eq!(table["cloneCssStyles"].as_bool(), Some(false));
        assert_eq!(table["gantt"]["barHeight"].as_integer(), Some(30));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, MerrowError::Io(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[flowchart\nhtmlLabels = ").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, MerrowError::Config(_)));
    }
}
