//! API key resolution and the local key store.
//!
//! Sources are consulted in order: a key baked in at build time, the
//! `AILABTOOLS_API_KEY` environment variable (a `.env` file is honoured), and
//! finally the key the user saved with `smilegen key set`.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use smilegen_logging::{smile_info, smile_warn};
use thiserror::Error;

use crate::{AtomicFileWriter, PersistError};

pub const API_KEY_ENV: &str = "AILABTOOLS_API_KEY";
const BUILD_TIME_KEY: Option<&str> = option_env!("SMILEGEN_API_KEY");
const STORE_FILENAME: &str = "credentials.ron";

/// Secret API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trims the input; blank keys are rejected.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four characters followed by a mask, for display.
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(4).collect();
        format!("{visible}****")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    BuildTime,
    Environment,
    Stored,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot parse stored credentials: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("cannot serialize credentials: {0}")]
    Serialize(#[from] ron::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCredentials {
    api_key: Option<String>,
}

/// User-supplied key persisted in the platform config directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn default_location() -> Result<Self, CredentialError> {
        let dirs = ProjectDirs::from("com", "smilegen", "smilegen")
            .ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::new(dirs.config_dir().to_path_buf()))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILENAME)
    }

    pub fn load(&self) -> Result<Option<ApiKey>, CredentialError> {
        let content = match fs::read_to_string(self.path()) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredCredentials = ron::from_str(&content)?;
        Ok(stored.api_key.as_deref().and_then(ApiKey::new))
    }

    /// Saves `raw` as the key; a blank value removes the stored key.
    pub fn set(&self, raw: &str) -> Result<Option<ApiKey>, CredentialError> {
        match ApiKey::new(raw) {
            Some(key) => {
                self.write(&StoredCredentials {
                    api_key: Some(key.expose().to_string()),
                })?;
                smile_info!("Stored API key in {:?}", self.path());
                Ok(Some(key))
            }
            None => {
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(self.path()) {
            Ok(()) => {
                smile_info!("Removed stored API key");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, stored: &StoredCredentials) -> Result<(), CredentialError> {
        let content = ron::ser::to_string_pretty(stored, ron::ser::PrettyConfig::new())?;
        AtomicFileWriter::new(self.dir.clone()).write(STORE_FILENAME, content.as_bytes())?;
        Ok(())
    }
}

/// Resolves the session key from build-time, environment and stored sources.
pub fn resolve_credential(store: Option<&CredentialStore>) -> Option<(ApiKey, CredentialSource)> {
    let _ = dotenvy::dotenv();
    let env_value = std::env::var(API_KEY_ENV).ok();
    resolve_from(BUILD_TIME_KEY, env_value.as_deref(), store)
}

/// First non-blank key in priority order.
pub fn resolve_from(
    build_time: Option<&str>,
    env_value: Option<&str>,
    store: Option<&CredentialStore>,
) -> Option<(ApiKey, CredentialSource)> {
    if let Some(key) = build_time.and_then(ApiKey::new) {
        return Some((key, CredentialSource::BuildTime));
    }
    if let Some(key) = env_value.and_then(ApiKey::new) {
        return Some((key, CredentialSource::Environment));
    }
    let store = store?;
    match store.load() {
        Ok(key) => key.map(|key| (key, CredentialSource::Stored)),
        Err(err) => {
            smile_warn!("Ignoring unreadable credential store {:?}: {}", store.path(), err);
            None
        }
    }
}

