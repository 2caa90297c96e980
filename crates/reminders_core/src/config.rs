//! Application configuration.
//!
//! # Responsibility
//! - Resolve database path, log directory, log level and notifier from an
//!   optional TOML file plus the `REMINDERS_DB` environment variable.
//!
//! # Invariants
//! - A missing config file yields defaults; a malformed one is an error.
//! - Every unset field falls back to a per-user data directory.

use crate::logging::default_log_level;
use crate::notify::NotifierKind;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Directory name used under the platform config/data directories.
pub const APP_DIR_NAME: &str = "reminders";
/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "REMINDERS_DB";

const DB_FILE_NAME: &str = "reminders.db";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// No platform data directory and no explicit path.
    NoDataDir,
    InvalidPollInterval,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::NoDataDir => write!(
                f,
                "could not determine a data directory; set database_path and log_dir"
            ),
            Self::InvalidPollInterval => write!(f, "poll_interval_secs must be at least 1"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub notifier: NotifierKind,
    pub poll_interval_secs: u64,
}

/// On-disk shape; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    database_path: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
    notifier: Option<NotifierKind>,
    poll_interval_secs: Option<u64>,
}

impl AppConfig {
    /// Loads `path`, or the default config file when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) if path.exists() => read_file_config(&path)?,
            _ => FileConfig::default(),
        };
        let env_db = std::env::var_os(DB_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        resolve(file, env_db, default_data_dir())
    }

    /// Parses TOML text against explicit defaults.
    pub fn from_toml_str(content: &str, data_dir: &Path) -> Result<Self, ConfigError> {
        let file = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        resolve(file, None, Some(data_dir.to_path_buf()))
    }
}

/// `<config_dir>/reminders/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
}

/// `<data_dir>/reminders`.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve(
    file: FileConfig,
    env_db: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<AppConfig, ConfigError> {
    let poll_interval_secs = file
        .poll_interval_secs
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    if poll_interval_secs == 0 {
        return Err(ConfigError::InvalidPollInterval);
    }

    let database_path = match env_db.or(file.database_path) {
        Some(path) => path,
        None => data_dir
            .as_ref()
            .ok_or(ConfigError::NoDataDir)?
            .join(DB_FILE_NAME),
    };
    let log_dir = match file.log_dir {
        Some(path) => path,
        None => data_dir.ok_or(ConfigError::NoDataDir)?.join("logs"),
    };

    Ok(AppConfig {
        database_path,
        log_dir,
        log_level: file
            .log_level
            .unwrap_or_else(|| default_log_level().to_string()),
        notifier: file.notifier.unwrap_or_default(),
        poll_interval_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_data_dir_defaults() {
        let config = AppConfig::from_toml_str("", Path::new("/data/reminders")).unwrap();
        assert_eq!(
            config.database_path,
            PathBuf::from("/data/reminders/reminders.db")
        );
        assert_eq!(config.log_dir, PathBuf::from("/data/reminders/logs"));
        assert_eq!(config.notifier, NotifierKind::Desktop);
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            database_path = "/tmp/r.db"
            log_level = "warn"
            notifier = "log"
            poll_interval_secs = 5
            "#,
            Path::new("/data/reminders"),
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/r.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.notifier, NotifierKind::Log);
        assert_eq!(config.poll_interval_secs, 5);
    }

    #[test]
    fn environment_database_wins_over_file() {
        let file = FileConfig {
            database_path: Some(PathBuf::from("/from/file.db")),
            ..FileConfig::default()
        };
        let config = resolve(
            file,
            Some(PathBuf::from("/from/env.db")),
            Some(PathBuf::from("/data")),
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/from/env.db"));
    }

    #[test]
    fn rejects_unknown_keys_and_zero_interval() {
        assert!(matches!(
            AppConfig::from_toml_str("colour = \"red\"", Path::new("/d")),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("poll_interval_secs = 0", Path::new("/d")),
            Err(ConfigError::InvalidPollInterval)
        ));
    }

    #[test]
    fn missing_data_dir_needs_explicit_paths() {
        assert!(matches!(
            resolve(FileConfig::default(), None, None),
            Err(ConfigError::NoDataDir)
        ));
        let explicit = FileConfig {
            database_path: Some(PathBuf::from("/a.db")),
            log_dir: Some(PathBuf::from("/logs")),
            ..FileConfig::default()
        };
        assert!(resolve(explicit, None, None).is_ok());
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"/srv/r.db\"\nlog_dir = \"/var/log/reminders\"\nnotifier = \"log\"\n",
        )
        .unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/var/log/reminders"));
        assert_eq!(config.notifier, NotifierKind::Log);
    }
}
