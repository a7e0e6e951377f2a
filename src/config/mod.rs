//! Settings persistence.
//!
//! The orchestration core treats configuration as an opaque key/value store
//! ([`ConfigStore`]). [`SettingsFile`] backs it with `settings.conf` under the
//! user's config directory, and [`Settings`] is the typed view read at
//! startup.

mod paths;
mod settings;
mod skeleton;
mod store;

pub use paths::{config_dir, logs_dir, settings_path};
pub use settings::{Settings, keys};
pub use skeleton::SETTINGS_SKELETON_CONTENT;
pub use store::SettingsFile;

use std::collections::HashMap;
use std::path::PathBuf;

/// Errors raised while persisting settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read or written.
    #[error("settings file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// What: Key/value access to persisted settings.
///
/// Inputs:
/// - Keys are normalised lower snake case (see [`keys`]).
///
/// Output:
/// - `get` returns the raw string value; `set` stores and persists it.
///
/// Details:
/// - Implementations must make a successful `set` durable so refresh
///   intervals are honoured across process restarts.
pub trait ConfigStore {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` and persist it.
    ///
    /// # Errors
    /// - Returns [`ConfigError`] when the backing storage cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// Volatile store used by tests and as the fallback when the settings file cannot be opened.
impl ConfigStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
