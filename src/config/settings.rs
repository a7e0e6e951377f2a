use std::collections::BTreeSet;

use super::ConfigStore;
use crate::util::config::parse_bool;

/// Normalised setting names understood by yumex.
pub mod keys {
    /// Hours between automatic metadata refreshes.
    pub const REFRESH_INTERVAL: &str = "refresh_interval";
    /// Last refresh of the session-scope cache.
    pub const SESSION_REFRESH: &str = "session_refresh";
    /// Last refresh of the system-scope cache.
    pub const SYSTEM_REFRESH: &str = "system_refresh";
    /// Comma-separated names that may never be removed.
    pub const PROTECTED: &str = "protected";
    /// Days of history shown in the history view.
    pub const HISTORY_DAYS: &str = "history_days";
    /// Keep the status service alive after exit when set.
    pub const AUTOSTART: &str = "autostart";
    /// Periodic update checks keep the status service alive when set.
    pub const AUTOCHECK_UPDATES: &str = "autocheck_updates";
    /// Hide instead of quitting when the window is closed.
    pub const HIDE_ON_CLOSE: &str = "hide_on_close";
    /// Only show the newest version of each package.
    pub const NEWEST_ONLY: &str = "newest_only";
    /// Ask the daemon to clean old install-only packages.
    pub const CLEAN_INSTONLY: &str = "clean_instonly";
    /// Ask the daemon to remove unused dependencies.
    pub const CLEAN_UNUSED: &str = "clean_unused";
    /// Upper bound on key confirmations in one transaction attempt.
    pub const GPG_RETRY_LIMIT: &str = "gpg_retry_limit";
}

/// Typed snapshot of the settings relevant to the orchestration core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Metadata refresh interval in hours.
    pub refresh_interval_hours: u32,
    /// Names that veto a transaction when present as a removal.
    pub protected: BTreeSet<String>,
    /// History window in days.
    pub history_days: u32,
    /// Keep the status service running after exit.
    pub autostart: bool,
    /// Periodic update checks enabled.
    pub autocheck_updates: bool,
    /// Hide on close instead of quitting.
    pub hide_on_close: bool,
    /// Show newest versions only in the updates view.
    pub newest_only: bool,
    /// Clean old install-only packages after transactions.
    pub clean_instonly: bool,
    /// Remove unused dependencies after transactions.
    pub clean_unused: bool,
    /// Bound on key confirmations per attempt.
    pub gpg_retry_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_hours: 12,
            protected: ["yum", "dnf", "python3", "dnf-yum"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            history_days: 180,
            autostart: false,
            autocheck_updates: false,
            hide_on_close: false,
            newest_only: true,
            clean_instonly: false,
            clean_unused: false,
            gpg_retry_limit: 8,
        }
    }
}

impl Settings {
    /// What: Build typed settings from a key/value store.
    ///
    /// Inputs:
    /// - `store`: Any [`ConfigStore`].
    ///
    /// Output:
    /// - Settings with defaults for missing or unparsable values.
    ///
    /// Details:
    /// - An empty `protected` value disables the veto entirely.
    pub fn load(store: &dyn ConfigStore) -> Self {
        let mut settings = Self::default();
        if let Some(v) = parse_num(store, keys::REFRESH_INTERVAL) {
            settings.refresh_interval_hours = v;
        }
        if let Some(raw) = store.get(keys::PROTECTED) {
            settings.protected = parse_name_list(&raw);
        }
        if let Some(v) = parse_num(store, keys::HISTORY_DAYS) {
            settings.history_days = v;
        }
        if let Some(v) = parse_num::<usize>(store, keys::GPG_RETRY_LIMIT) {
            settings.gpg_retry_limit = v.max(1);
        }
        let flags: [(&str, &mut bool); 6] = [
            (keys::AUTOSTART, &mut settings.autostart),
            (keys::AUTOCHECK_UPDATES, &mut settings.autocheck_updates),
            (keys::HIDE_ON_CLOSE, &mut settings.hide_on_close),
            (keys::NEWEST_ONLY, &mut settings.newest_only),
            (keys::CLEAN_INSTONLY, &mut settings.clean_instonly),
            (keys::CLEAN_UNUSED, &mut settings.clean_unused),
        ];
        for (key, slot) in flags {
            if let Some(raw) = store.get(key) {
                *slot = parse_bool(&raw);
            }
        }
        settings
    }
}

/// Read and parse a numeric setting, logging values that do not parse.
fn parse_num<T: std::str::FromStr>(store: &dyn ConfigStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key = %key, value = %raw, "[Config] ignoring invalid number");
            None
        }
    }
}

/// Split a comma-separated list into trimmed, non-empty names.
fn parse_name_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
