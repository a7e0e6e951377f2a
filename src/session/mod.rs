//! Privileged session with the DNF system daemon.
//!
//! [`BackendSession`] creates the daemon client lazily, acquires the daemon
//! lock on first use, refreshes system metadata when the configured interval
//! has elapsed, and releases (optionally terminating the daemon) on request.

mod refresh;

pub use refresh::{CacheScope, RefreshPolicy};

use crate::backend::{
    Backend, BackendFault, ClassifiedFault, FaultKind, LOCK_REASON_LOCKED_BY_OTHER,
    LOCK_REASON_NOT_AUTHORIZED, LockReply, classify,
};
use crate::config::ConfigStore;
use crate::util::now_minutes;

/// Shown when the metadata refresh triggered by taking the lock failed.
pub const REFRESH_FAILED_MESSAGE: &str = "Could not refresh the DNF cache (root)";

/// Factory creating a fresh daemon client.
pub type Connector<B> = Box<dyn FnMut() -> Result<B, BackendFault>>;

/// Clock used for refresh decisions (injectable for tests).
pub type Clock = Box<dyn Fn() -> chrono::NaiveDateTime>;

/// Session-level failures. All of them end the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The user declined the elevation prompt.
    #[error("DNF root backend was not authorized")]
    AuthorizationDenied,
    /// Another process holds the daemon lock.
    #[error("DNF is locked by another process")]
    LockedByOther,
    /// The daemon refused the lock for another reason.
    #[error("DNF root backend refused the lock: {0}")]
    Refused(String),
    /// A daemon call failed.
    #[error(transparent)]
    Fault(#[from] BackendFault),
}

impl SessionError {
    /// What: Map the error onto the process-level disposition shown to the user.
    ///
    /// Output:
    /// - [`ClassifiedFault`]; backend faults go through [`classify`].
    #[must_use]
    pub fn classify(&self) -> ClassifiedFault {
        match self {
            Self::AuthorizationDenied => ClassifiedFault {
                kind: FaultKind::AccessDenied,
                message: "DNF root backend was not authorized.\nYum Extender will exit"
                    .to_string(),
            },
            Self::LockedByOther => ClassifiedFault {
                kind: FaultKind::Locked,
                message: "DNF is locked by another process.\n\nYum Extender will exit"
                    .to_string(),
            },
            Self::Refused(reason) => ClassifiedFault {
                kind: FaultKind::Other,
                message: reason.clone(),
            },
            Self::Fault(fault) => classify(fault),
        }
    }
}

/// What happened while acquiring the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcquireReport {
    /// `true` when this call took the lock (as opposed to reusing it).
    pub newly_locked: bool,
    /// `Some(ok)` when a system metadata refresh was attempted.
    pub refreshed: Option<bool>,
}

/// What: Lifecycle of the privileged daemon connection.
///
/// Inputs:
/// - `connector`: Creates the daemon client on first use.
/// - `store`: Settings store holding the refresh markers.
/// - `policy`: Refresh interval.
///
/// Output:
/// - `acquire`, `backend`, `release` and `release_quietly`.
///
/// Details:
/// - `is_locked()` is only `true` while a client exists and the daemon
///   granted the lock.
/// - A failed metadata refresh is reported in [`AcquireReport`] and does not
///   fail acquisition.
pub struct BackendSession<B: Backend> {
    /// Client factory.
    connector: Connector<B>,
    /// Client, created lazily.
    handle: Option<B>,
    /// Whether the daemon granted the lock to this session.
    locked: bool,
    /// Refresh interval.
    policy: RefreshPolicy,
    /// Settings store for refresh markers.
    store: Box<dyn ConfigStore>,
    /// Wall clock.
    clock: Clock,
}

impl<B: Backend> BackendSession<B> {
    /// New, unconnected session.
    #[must_use]
    pub fn new(connector: Connector<B>, store: Box<dyn ConfigStore>, policy: RefreshPolicy) -> Self {
        Self {
            connector,
            handle: None,
            locked: false,
            policy,
            store,
            clock: Box::new(now_minutes),
        }
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Whether the daemon lock is currently held.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked && self.handle.is_some()
    }

    /// Whether a client has been created.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Settings store shared with the rest of the application.
    #[must_use]
    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    /// Mutable settings store.
    pub fn store_mut(&mut self) -> &mut dyn ConfigStore {
        self.store.as_mut()
    }

    /// What: Make sure a client exists and holds the daemon lock.
    ///
    /// Output:
    /// - [`AcquireReport`] describing what happened.
    ///
    /// # Errors
    /// - [`SessionError::AuthorizationDenied`] / [`SessionError::LockedByOther`] when the
    ///   daemon refuses the lock, [`SessionError::Fault`] on any daemon fault.
    ///
    /// Details:
    /// - On a fresh lock, refreshes system metadata when the system marker is
    ///   older than the interval, then persists the new marker.
    pub fn acquire(&mut self) -> Result<AcquireReport, SessionError> {
        if self.handle.is_none() {
            tracing::debug!("[Session] creating DNF root backend client");
            self.handle = Some((self.connector)()?);
        }
        if self.locked {
            return Ok(AcquireReport::default());
        }
        let Some(backend) = self.handle.as_ref() else {
            return Err(SessionError::Refused("no backend client".to_string()));
        };
        tracing::debug!("[Session] lock the DNF root daemon");
        match backend.lock()? {
            LockReply::Granted => {}
            LockReply::Denied { reason } => {
                tracing::error!(reason = %reason, "[Session] can't get root backend lock");
                return Err(match reason.as_str() {
                    LOCK_REASON_NOT_AUTHORIZED => SessionError::AuthorizationDenied,
                    LOCK_REASON_LOCKED_BY_OTHER => SessionError::LockedByOther,
                    _ => SessionError::Refused(reason),
                });
            }
        }
        self.locked = true;

        let now = (self.clock)();
        let mut report = AcquireReport {
            newly_locked: true,
            refreshed: None,
        };
        if self
            .policy
            .is_expired(self.store.as_ref(), CacheScope::System, now)
        {
            tracing::info!("[Session] refreshing system metadata");
            let ok = backend.expire_cache()?;
            if ok {
                if let Err(e) =
                    RefreshPolicy::mark_refreshed(self.store.as_mut(), CacheScope::System, now)
                {
                    tracing::warn!(error = %e, "[Session] failed to persist refresh marker");
                }
            } else {
                tracing::warn!("[Session] could not refresh the DNF cache (root)");
            }
            report.refreshed = Some(ok);
        }
        Ok(report)
    }

    /// What: Refresh metadata now, whatever the markers say.
    ///
    /// Output:
    /// - `true` when the daemon refreshed its cache.
    ///
    /// # Errors
    /// - Same as [`BackendSession::acquire`].
    ///
    /// Details:
    /// - A successful refresh advances both the session and the system marker.
    pub fn force_refresh(&mut self) -> Result<bool, SessionError> {
        self.acquire()?;
        let Some(backend) = self.handle.as_ref() else {
            return Err(SessionError::Refused("no backend client".to_string()));
        };
        tracing::info!("[Session] refreshing metadata on request");
        let ok = backend.expire_cache()?;
        if ok {
            let now = (self.clock)();
            for scope in [CacheScope::Session, CacheScope::System] {
                if let Err(e) = RefreshPolicy::mark_refreshed(self.store.as_mut(), scope, now) {
                    tracing::warn!(error = %e, "[Session] failed to persist refresh marker");
                }
            }
        }
        Ok(ok)
    }

    /// What: Acquire if needed and return the client.
    ///
    /// # Errors
    /// - Same as [`BackendSession::acquire`].
    pub fn backend(&mut self) -> Result<&B, SessionError> {
        self.acquire()?;
        self.handle
            .as_ref()
            .ok_or_else(|| SessionError::Refused("no backend client".to_string()))
    }

    /// What: Unlock the daemon and optionally ask it to exit.
    ///
    /// Inputs:
    /// - `terminate`: Also send `Exit` to the daemon.
    ///
    /// # Errors
    /// - [`BackendFault`] from `Unlock`/`Exit`.
    ///
    /// Details:
    /// - Idempotent, and a no-op on a session that never connected.
    /// - The lock flag is cleared before `Unlock` is sent so a failing call
    ///   never leaves the session claiming a lock it may not hold.
    /// - With `terminate`, `Exit` is sent even when `Unlock` failed; the
    ///   first error is returned.
    pub fn release(&mut self, terminate: bool) -> Result<(), BackendFault> {
        let Some(backend) = self.handle.as_ref() else {
            return Ok(());
        };
        let unlocked = if self.locked {
            tracing::debug!("[Session] unlock the DNF root daemon");
            self.locked = false;
            backend.unlock()
        } else {
            Ok(())
        };
        if terminate && let Some(backend) = self.handle.take() {
            tracing::debug!("[Session] exit the DNF root daemon");
            let exited = backend.exit();
            return unlocked.and(exited);
        }
        unlocked
    }

    /// Best-effort [`BackendSession::release`]; failures are logged and swallowed.
    pub fn release_quietly(&mut self, terminate: bool) {
        if let Err(e) = self.release(terminate) {
            tracing::warn!(error = %e, "[Session] ignoring release failure during cleanup");
        }
    }
}
