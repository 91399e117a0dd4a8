//! TOML-file backed settings.
//!
//! `config.toml` holds the ordinary settings and is edited in place with
//! `toml_edit`, so comments and layout the user added survive our writes.
//! `credentials.toml` holds the API key and is only ever readable by the
//! owner. Both are replaced atomically through a temp file in the same
//! directory.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use toml_edit::DocumentMut;
use tracing::debug;

use crate::error::ConfigError;

use super::{ConfigStore, GEMINI_API_KEY, SecretStore, SettingValue};

/// Environment variable that relocates the settings directory.
pub const CONFIG_DIR_ENV_VAR: &str = "AAC_CONFIG_DIR";

/// Environment variable whose value takes precedence over the stored key.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

const CONFIG_FILE: &str = "config.toml";
const CREDENTIALS_FILE: &str = "credentials.toml";

/// Settings and credentials stored under one directory.
#[derive(Debug, Clone)]
pub struct FileSettings {
    dir: PathBuf,
}

impl FileSettings {
    /// Use `$AAC_CONFIG_DIR`, or `aac` under the platform config directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_DIR_ENV_VAR) {
            Ok(dir) if !dir.is_empty() => Ok(Self::at(dir)),
            _ => dirs::config_dir()
                .map(|dir| Self::at(dir.join("aac")))
                .ok_or(ConfigError::NoConfigDir),
        }
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    fn write_doc(&self, path: &Path, doc: &DocumentMut, private: bool) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;

        let mut file = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        if private {
            restrict_permissions(file.path()).map_err(write_err)?;
        }
        file.write_all(doc.to_string().as_bytes()).map_err(write_err)?;
        file.persist(path).map_err(|e| write_err(e.error))?;

        debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl ConfigStore for FileSettings {
    fn get_bool(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        let doc = read_doc(&self.config_path())?;
        Ok(doc
            .get(name)
            .and_then(|item| item.as_bool())
            .unwrap_or(default))
    }

    fn get_string(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        let doc = read_doc(&self.config_path())?;
        Ok(doc
            .get(name)
            .and_then(|item| item.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string()))
    }

    fn set(&self, name: &str, value: SettingValue) -> Result<(), ConfigError> {
        let path = self.config_path();
        let mut doc = read_doc(&path)?;
        doc[name] = match value {
            SettingValue::Bool(b) => toml_edit::value(b),
            SettingValue::String(s) => toml_edit::value(s),
        };
        self.write_doc(&path, &doc, false)
    }
}

impl SecretStore for FileSettings {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        if key == GEMINI_API_KEY
            && let Ok(value) = env::var(API_KEY_ENV_VAR)
            && !value.trim().is_empty()
        {
            return Ok(Some(value));
        }

        let doc = read_doc(&self.credentials_path())?;
        Ok(doc
            .get(key)
            .and_then(|item| item.as_str())
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let path = self.credentials_path();
        let mut doc = read_doc(&path)?;
        doc[key] = toml_edit::value(value);
        self.write_doc(&path, &doc, true)
    }
}

/// Parse `path`, treating a missing file as empty.
fn read_doc(path: &Path) -> Result<DocumentMut, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DocumentMut::new()),
        Err(source) => {
            return Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    content
        .parse::<DocumentMut>()
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
