//! Configuration loading and root folder resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument or environment variable (highest priority)
//! 2. TOML config file
//! 3. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts on defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default listen host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port
pub const DEFAULT_PORT: u16 = 4000;

/// Default gender inference endpoint
pub const DEFAULT_GENDERIZE_URL: &str = "https://api.genderize.io";

const APP_DIR_NAME: &str = "leads";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "leads.db";
const UPLOAD_DIR_NAME: &str = "uploads";

/// Settings read from the TOML config file
///
/// All keys are optional; absent keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub genderize_url: Option<String>,
}

impl TomlConfig {
    /// Load the config file at `path`
    ///
    /// Returns defaults when the file does not exist. A file that exists but
    /// cannot be parsed is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!("Loaded config file: {}", path.display());
        Ok(config)
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub genderize_url: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Data directory holding the database and temporary uploads
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    /// Base URL of the name → gender inference service
    pub genderize_url: String,
}

impl ServiceConfig {
    /// Merge overrides, TOML values and compiled defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Self {
        Self {
            root_folder: overrides
                .root_folder
                .or(file.root_folder)
                .unwrap_or_else(default_root_folder),
            host: overrides
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            genderize_url: overrides
                .genderize_url
                .or(file.genderize_url)
                .unwrap_or_else(|| DEFAULT_GENDERIZE_URL.to_string()),
        }
    }

    /// SQLite database file inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    /// Temporary storage for uploaded CSV files
    pub fn upload_dir(&self) -> PathBuf {
        self.root_folder.join(UPLOAD_DIR_NAME)
    }

    /// `host:port` listen address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create the root folder and upload directory if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.upload_dir())?;
        Ok(())
    }
}

/// Platform config file location (`~/.config/leads/config.toml` on Linux)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/leads (or /var/lib/leads for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib/leads"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/leads
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/leads"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\leads
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\leads"))
    } else {
        PathBuf::from("./leads_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = ServiceConfig::resolve(ConfigOverrides::default(), TomlConfig::default());

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.genderize_url, DEFAULT_GENDERIZE_URL);
        assert!(config.root_folder.ends_with(APP_DIR_NAME) || config.root_folder.ends_with("leads_data"));
    }

    #[test]
    fn test_override_beats_toml() {
        let overrides = ConfigOverrides {
            port: Some(5001),
            host: Some("0.0.0.0".to_string()),
            ..Default::default()
        };
        let file = TomlConfig {
            port: Some(6001),
            genderize_url: Some("http://localhost:9999".to_string()),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(overrides, file);

        assert_eq!(config.port, 5001);
        assert_eq!(config.host, "0.0.0.0");
        // Not overridden, so the TOML value wins over the compiled default
        assert_eq!(config.genderize_url, "http://localhost:9999");
        assert_eq!(config.bind_addr(), "0.0.0.0:5001");
    }

    #[test]
    fn test_derived_paths() {
        let overrides = ConfigOverrides {
            root_folder: Some(PathBuf::from("/srv/leads")),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(overrides, TomlConfig::default());

        assert_eq!(config.database_path(), PathBuf::from("/srv/leads/leads.db"));
        assert_eq!(config.upload_dir(), PathBuf::from("/srv/leads/uploads"));
    }

    #[test]
    fn test_missing_toml_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = TomlConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_toml_file_parsed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "root_folder = \"/data/leads\"").unwrap();
        writeln!(file, "port = 8080").unwrap();

        let config = TomlConfig::load(file.path()).unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/data/leads")));
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.host, None);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();

        let result = TomlConfig::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_ensure_directories_creates_upload_dir() {
        let dir = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            root_folder: Some(dir.path().join("nested")),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(overrides, TomlConfig::default());

        config.ensure_directories().unwrap();

        assert!(config.upload_dir().is_dir());
    }
}
