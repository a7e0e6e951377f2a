use std::fs;
use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigStore, SETTINGS_SKELETON_CONTENT};
use crate::util::config::{normalize_key, parse_key_value, skip_comment_or_empty};

/// What: `settings.conf` backed [`ConfigStore`].
///
/// Inputs:
/// - `path`: Location of the settings file (need not exist yet).
///
/// Output:
/// - Keeps the file's lines in memory; every `set` rewrites the file.
///
/// Details:
/// - Comments and unknown keys are preserved on write.
/// - A missing or empty file is seeded from [`SETTINGS_SKELETON_CONTENT`] on
///   first write.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    /// Backing file.
    path: PathBuf,
    /// Current file content, one entry per line.
    lines: Vec<String>,
}

impl SettingsFile {
    /// What: Load the settings file at `path`.
    ///
    /// Inputs:
    /// - `path`: File location.
    ///
    /// Output:
    /// - Store holding the file lines, or the skeleton when the file is missing or empty.
    ///
    /// # Errors
    /// - Returns [`ConfigError::Io`] when the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(c) if !c.trim().is_empty() => c,
            Ok(_) => SETTINGS_SKELETON_CONTENT.to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                SETTINGS_SKELETON_CONTENT.to_string()
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), "[Config] settings loaded");
        Ok(Self {
            path,
            lines: content.lines().map(ToString::to_string).collect(),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the in-memory lines back to disk.
    ///
    /// # Errors
    /// - Returns [`ConfigError::Io`] when the directory or file cannot be written.
    pub fn flush(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let mut content = self.lines.join("\n");
        content.push('\n');
        fs::write(&self.path, content).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigStore for SettingsFile {
    fn get(&self, key: &str) -> Option<String> {
        let wanted = normalize_key(key);
        // Last assignment wins, like the parser that reads the file at startup.
        self.lines
            .iter()
            .filter_map(|line| parse_key_value(line))
            .filter(|(k, _)| *k == wanted)
            .map(|(_, v)| v)
            .last()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let wanted = normalize_key(key);
        let mut replaced = false;
        for line in &mut self.lines {
            if skip_comment_or_empty(line) {
                continue;
            }
            if let Some((k, _)) = parse_key_value(line)
                && k == wanted
            {
                *line = format!("{wanted} = {value}");
                replaced = true;
            }
        }
        if !replaced {
            self.lines.push(format!("{wanted} = {value}"));
        }
        tracing::debug!(key = %wanted, value = %value, "[Config] persisting setting");
        self.flush()
    }
}
