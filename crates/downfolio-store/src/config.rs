//! Configuration store.
//!
//! A flat TOML table of string keys at `<profile>/config.toml`. The file holds
//! API keys, so it is written with mode 0600 and a warning is emitted when it
//! is readable by group or others. Lookups for API keys and endpoint
//! overrides consult the environment first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use crate::env::{EnvProvider, ProcessEnv};
use crate::models::Provider;
use crate::outcome::ParseOutcome;
use crate::paths::Profile;

/// The stored key-value map.
pub type Config = BTreeMap<String, String>;

/// Errors that can occur while writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to create config directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads and writes the config file.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    env: Arc<dyn EnvProvider>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .finish()
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, env: Arc<dyn EnvProvider>) -> Self {
        Self {
            path: path.into(),
            env,
        }
    }

    /// Store for `profile`'s config file, reading the process environment.
    pub fn for_profile(profile: &Profile) -> Self {
        Self::new(profile.config_file(), Arc::new(ProcessEnv))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -------------------------------------------------------------------
    // Read / write
    // -------------------------------------------------------------------

    /// Read the config file, reporting whether the result is a fallback.
    ///
    /// A missing file is not a failure: it parses as an empty config.
    pub fn load_checked(&self) -> ParseOutcome<Config> {
        if !self.path.exists() {
            return ParseOutcome::Parsed(Config::new());
        }

        if !has_secure_permissions(&self.path) {
            warn!(
                path = %self.path.display(),
                "config file has insecure permissions; API keys should be protected. Run: chmod 600 \"{}\"",
                self.path.display()
            );
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                return ParseOutcome::Degraded {
                    value: Config::new(),
                    reason: format!("failed to read {}: {e}", self.path.display()),
                };
            }
        };

        match toml::from_str::<Config>(&contents) {
            Ok(config) => ParseOutcome::Parsed(config),
            Err(e) => ParseOutcome::Degraded {
                value: Config::new(),
                reason: format!("failed to parse {}: {e}", self.path.display()),
            },
        }
    }

    /// Read the config file. Unreadable or malformed files yield an empty
    /// config after logging the problem.
    pub fn load(&self) -> Config {
        match self.load_checked() {
            ParseOutcome::Parsed(config) => config,
            ParseOutcome::Degraded { value, reason } => {
                error!(%reason, "error loading config; continuing with an empty config");
                value
            }
        }
    }

    /// Overwrite the config file with `config` and restrict it to the owner.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        self.write(&contents)
    }

    /// Set a single key.
    ///
    /// When the existing file parses as a TOML document it is edited in
    /// place so hand-written comments survive; otherwise the whole map is
    /// rewritten.
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let document = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.parse::<toml_edit::DocumentMut>().ok());

        match document {
            Some(mut doc) => {
                doc.insert(key, toml_edit::value(value));
                self.write(&doc.to_string())
            }
            None => {
                let mut config = self.load();
                config.insert(key.to_owned(), value.to_owned());
                self.save(&config)
            }
        }
    }

    /// Stored value for `key`, ignoring the environment.
    pub fn get_value(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    /// Every stored key, sorted.
    pub fn all(&self) -> Config {
        self.load()
    }

    fn write(&self, contents: &str) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        // The file was written; a chmod failure only weakens protection.
        if let Err(e) = restrict_permissions(&self.path) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "could not set secure permissions on config file"
            );
        }

        Ok(())
    }

    // -------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------

    /// API key for `provider`: environment variable first, then the stored
    /// value. Empty values count as absent.
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        self.setting(provider.api_key_var())
    }

    /// The user's default model for `provider`, if one is stored.
    pub fn default_model(&self, provider: Provider) -> Option<String> {
        self.get_value(provider.model_key()).filter(|v| !v.is_empty())
    }

    /// A setting that may also be supplied through the environment
    /// (API keys, base URLs, converter path). Environment wins.
    pub fn setting(&self, key: &str) -> Option<String> {
        self.env
            .var(key)
            .filter(|v| !v.is_empty())
            .or_else(|| self.get_value(key).filter(|v| !v.is_empty()))
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// True when neither group nor others have any access to `path`.
#[cfg(unix)]
fn has_secure_permissions(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o077 == 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn has_secure_permissions(_path: &Path) -> bool {
    true
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
