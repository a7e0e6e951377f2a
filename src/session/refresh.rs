//! Metadata refresh bookkeeping.

use chrono::{Duration, NaiveDateTime};

use crate::config::{ConfigError, ConfigStore, keys};
use crate::util::{format_refresh_time, parse_refresh_time};

/// Independent cache scopes with their own refresh markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    /// Per-user session cache.
    Session,
    /// System-wide daemon cache.
    System,
}

impl CacheScope {
    /// Settings key holding this scope's last refresh time.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Session => keys::SESSION_REFRESH,
            Self::System => keys::SYSTEM_REFRESH,
        }
    }
}

/// What: Decide when metadata must be refreshed and record refreshes.
///
/// Inputs:
/// - `interval_hours`: Configured refresh interval.
///
/// Output:
/// - `is_expired` / `mark_refreshed` against any [`ConfigStore`].
///
/// Details:
/// - A missing or unreadable marker counts as expired.
/// - Markers never move backwards: a marker newer than `now` is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Refresh interval.
    interval: Duration,
}

impl RefreshPolicy {
    /// Policy refreshing every `interval_hours` hours.
    #[must_use]
    pub fn new(interval_hours: u32) -> Self {
        Self {
            interval: Duration::hours(i64::from(interval_hours)),
        }
    }

    /// Last refresh recorded for `scope`.
    #[must_use]
    pub fn last_refresh(store: &dyn ConfigStore, scope: CacheScope) -> Option<NaiveDateTime> {
        store
            .get(scope.key())
            .as_deref()
            .and_then(parse_refresh_time)
    }

    /// `true` when more than the interval has passed since the last refresh of `scope`.
    #[must_use]
    pub fn is_expired(&self, store: &dyn ConfigStore, scope: CacheScope, now: NaiveDateTime) -> bool {
        Self::last_refresh(store, scope).is_none_or(|last| now - last > self.interval)
    }

    /// What: Persist `now` as the last refresh of `scope`.
    ///
    /// Inputs:
    /// - `store`: Settings store.
    /// - `scope`: Cache scope refreshed.
    /// - `now`: Refresh time.
    ///
    /// Output:
    /// - The marker actually stored (the newer of `now` and the existing marker).
    ///
    /// # Errors
    /// - [`ConfigError`] when the store cannot persist the marker.
    pub fn mark_refreshed(
        store: &mut dyn ConfigStore,
        scope: CacheScope,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, ConfigError> {
        let stamp = match Self::last_refresh(store, scope) {
            Some(last) if last > now => {
                tracing::warn!(scope = ?scope, "[Session] refresh marker is in the future; keeping it");
                last
            }
            _ => now,
        };
        store.set(scope.key(), &format_refresh_time(stamp))?;
        Ok(stamp)
    }
}
