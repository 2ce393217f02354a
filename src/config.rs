use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::status::StatusFilter;
use crate::error::{AppError, AppResult};

const APP_DIR_NAME: &str = "ticketflow";
const CONFIG_FILE_NAME: &str = "config.json";

pub const CONFIG_DIR_ENV: &str = "TICKETFLOW_CONFIG_DIR";
pub const BACKEND_URL_ENV: &str = "TICKETFLOW_BACKEND_URL";
pub const ANON_KEY_ENV: &str = "TICKETFLOW_ANON_KEY";
pub const ACCESS_TOKEN_ENV: &str = "TICKETFLOW_ACCESS_TOKEN";

/// Effective settings for one run: stored file merged with environment overrides.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub access_token: Option<String>,
    pub default_filter: StatusFilter,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::from_sources(stored, |key| env::var(key).ok())
    }

    pub fn from_sources(
        stored: StoredConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let env_value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let default_filter = match stored.default_status_filter.as_deref() {
            Some(raw) => StatusFilter::from_str(raw).ok_or_else(|| {
                AppError::Configuration(format!("unknown default status filter '{raw}'"))
            })?,
            None => StatusFilter::All,
        };

        Ok(Self {
            backend_url: env_value(BACKEND_URL_ENV).or(stored.backend_url),
            anon_key: env_value(ANON_KEY_ENV).or(stored.anon_key),
            access_token: env_value(ACCESS_TOKEN_ENV),
            default_filter,
        })
    }
}

/// Values persisted by `config init`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub default_status_filter: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        write_private(path, self)
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    let non_empty = |key: &str| env::var_os(key).filter(|value| !value.is_empty());

    if let Some(dir) = non_empty(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join(APP_DIR_NAME));
    }
    non_empty("HOME")
        .map(|home| PathBuf::from(home).join(".config").join(APP_DIR_NAME))
        .ok_or_else(|| {
            AppError::Configuration("cannot locate config directory: HOME is not set".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// Writes pretty JSON, owner-readable only on unix.
pub fn write_private<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Configuration(format!("failed to serialize {}: {err}", path.display())))?;
    fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
