//! Configuration loading and discovery for `mcpaint.toml`
//!
//! Provides functions to find and load the palette configuration.

use super::schema::RegistryConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for during discovery
pub const CONFIG_FILE_NAME: &str = "mcpaint.toml";

/// Configuration shipped with the crate, used when no file is found
pub const DEFAULT_CONFIG: &str = include_str!("../../config/mcpaint.toml");

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse mcpaint.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Locate `mcpaint.toml`: the nearest one in the current directory or an
/// ancestor, then `$XDG_CONFIG_HOME/mcpaint/` (or `~/.config/mcpaint/`).
pub fn find_config() -> Option<PathBuf> {
    let cwd = env::current_dir().ok();
    cwd.as_deref().and_then(nearest_config).or_else(user_config)
}

fn nearest_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(CONFIG_FILE_NAME)).find(|path| path.is_file())
}

fn user_config() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("mcpaint").join(CONFIG_FILE_NAME)).filter(|path| path.is_file())
}

/// Load configuration from a mcpaint.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, the bundled default
/// configuration is returned.
///
/// # Example
/// ```ignore
/// let config = load_config(Some(Path::new("mcpaint.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<RegistryConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            let config = load_config_file(&p)?;
            tracing::info!(path = %p.display(), "config file loaded");
            Ok(config)
        }
        None => {
            tracing::info!("no mcpaint.toml found, using bundled defaults");
            default_config()
        }
    }
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<RegistryConfig, ConfigError> {
    let config: RegistryConfig = toml::from_str(contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<RegistryConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// The bundled default configuration.
pub fn default_config() -> Result<RegistryConfig, ConfigError> {
    parse_config(DEFAULT_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = default_config().unwrap();
        assert!(config.image.blocks.contains_key(&config.image.default_colormap));
        assert!(config.is_valid());
    }

    #[test]
    fn test_nearest_config_in_ancestor() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), DEFAULT_CONFIG).unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(nearest_config(&nested), Some(temp.path().join(CONFIG_FILE_NAME)));

        fs::write(nested.join(CONFIG_FILE_NAME), DEFAULT_CONFIG).unwrap();
        assert_eq!(nearest_config(&nested), Some(nested.join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[image]
height = 80
default_colormap = "mono"
building_time_delay = 0.0

[image.size]
min = 8
max = 512
default = 64

[image.blocks]
mono = [[49, 0]]
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.image.default_colormap, "mono");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = load_config(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = parse_config("[image\nheight = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors_are_collected() {
        let err = parse_config(
            r#"
[image]
height = 80
default_colormap = "missing"
building_time_delay = 0.0

[image.size]
min = 8
max = 512
default = 64

[image.blocks]
empty = []
"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
