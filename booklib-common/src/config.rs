//! Configuration loading and root folder resolution
//!
//! The root folder holds the SQLite database and any service-local state.
//! Resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`BOOKLIB_ROOT`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_ENV_VAR: &str = "BOOKLIB_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "booklib.db";

/// TOML configuration file contents (`~/.config/booklib/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder override
    pub root_folder: Option<String>,
    /// HTTP listen port override
    pub port: Option<u16>,
    /// Default metadata provider name (e.g. "googlebooks")
    pub default_provider: Option<String>,
}

impl TomlConfig {
    /// Load the TOML config from the platform config directory.
    ///
    /// A missing file is not an error; it yields the defaults.
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the TOML config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Platform config file path (`<config dir>/booklib/config.toml`)
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("booklib").join("config.toml"))
}

/// Resolve the root folder following the priority order above
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return PathBuf::from(path);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("booklib"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/booklib"))
}

/// Root folder initialization: directory creation and database path
#[derive(Debug, Clone)]
pub struct RootFolder {
    path: PathBuf,
}

impl RootFolder {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create the root folder directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.path.exists() {
            std::fs::create_dir_all(&self.path).map_err(|e| {
                Error::Config(format!(
                    "Failed to create root folder {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            tracing::info!("Created root folder: {}", self.path.display());
        }
        Ok(())
    }

    /// Path of the SQLite database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.path.join(DATABASE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_takes_priority() {
        let toml = TomlConfig {
            root_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some("/from/cli"), &toml);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn toml_used_when_no_cli_arg() {
        let toml = TomlConfig {
            root_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };
        // Note: assumes BOOKLIB_ROOT is not set in the test environment
        if std::env::var(ROOT_ENV_VAR).is_err() {
            let resolved = resolve_root_folder(None, &toml);
            assert_eq!(resolved, PathBuf::from("/from/toml"));
        }
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = TomlConfig::default();
        assert!(config.root_folder.is_none());
        assert!(config.port.is_none());
        assert!(config.default_provider.is_none());
    }

    #[test]
    fn load_from_parses_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "root_folder = \"/srv/booklib\"\nport = 8080\ndefault_provider = \"openlibrary\"\n",
        )
        .expect("write config");

        let config = TomlConfig::load_from(&path).expect("load config");
        assert_eq!(config.root_folder.as_deref(), Some("/srv/booklib"));
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.default_provider.as_deref(), Some("openlibrary"));
    }

    #[test]
    fn database_path_is_inside_root() {
        let root = RootFolder::new(PathBuf::from("/tmp/booklib-test"));
        assert_eq!(
            root.database_path(),
            PathBuf::from("/tmp/booklib-test/booklib.db")
        );
    }
}
