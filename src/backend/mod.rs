//! Access to the privileged DNF system daemon.
//!
//! [`Backend`] lists the daemon operations the core consumes. Every call is
//! synchronous and may block the calling thread; every failure is a
//! [`BackendFault`]. [`DnfSystemClient`] implements the trait over the system
//! bus; tests use scripted implementations.

mod dbus;
pub mod fault;
mod types;
pub mod wire;

pub use dbus::DnfSystemClient;
pub use fault::{BackendFault, ClassifiedFault, FaultKind, classify};
pub use types::{
    GpgConfirmation, GroupCategory, GroupInfo, HistoryEntry, PackageFilter, PackageId,
    PackageIdParts, PackageInfo, PlanEntry, PlanOperation, RUN_DOWNLOAD_ERROR,
    RUN_NEEDS_KEY_CONFIRMATION, RUN_SUCCESS, TransactionPlan,
};

use crate::queue::TransactionItem;

/// Reason string the daemon adapter reports when polkit authorization was refused.
pub const LOCK_REASON_NOT_AUTHORIZED: &str = "not-authorized";
/// Reason string the daemon adapter reports when another process holds the lock.
pub const LOCK_REASON_LOCKED_BY_OTHER: &str = "locked-by-other";

/// Answer to a lock request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockReply {
    /// The daemon granted the lock.
    Granted,
    /// The daemon refused; `reason` is one of the `LOCK_REASON_*` strings or free text.
    Denied {
        /// Refusal reason.
        reason: String,
    },
}

/// Outcome of a dependency resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Dependencies resolved; the plan is executable.
    Resolved(TransactionPlan),
    /// Resolution failed with the daemon's messages.
    Unresolved(Vec<String>),
}

/// Reply to `RunTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReply {
    /// `0` success, `1` key confirmation needed, `4` download errors, other values failures.
    pub status: i32,
    /// Daemon messages.
    pub messages: Vec<String>,
}

/// Reply to `HistoryUndo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoReply {
    /// Whether an undo transaction was prepared.
    pub ok: bool,
    /// Daemon messages.
    pub messages: Vec<String>,
}

/// What: Operations consumed from the DNF system daemon.
///
/// Inputs:
/// - Called from the single control thread; each call blocks until the daemon answers.
///
/// Output:
/// - Typed replies, or a [`BackendFault`] already translated from the transport.
///
/// Details:
/// - Implementations may stub replies to enable deterministic unit testing.
/// - Production code relies on [`DnfSystemClient`].
pub trait Backend {
    /// Ask for the daemon lock (triggers the polkit prompt on first use).
    ///
    /// # Errors
    /// - Transport or daemon faults other than a plain refusal.
    fn lock(&self) -> Result<LockReply, BackendFault>;

    /// Release the daemon lock.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn unlock(&self) -> Result<(), BackendFault>;

    /// Ask the daemon process to exit.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn exit(&self) -> Result<(), BackendFault>;

    /// Expire and reload repository metadata; `false` when the refresh failed.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn expire_cache(&self) -> Result<bool, BackendFault>;

    /// Drop whatever the daemon has accumulated in its current transaction.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn clear_transaction(&self) -> Result<(), BackendFault>;

    /// Add one package or group action; `false` when the daemon rejected it.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn add_to_transaction(&self, item: &TransactionItem) -> Result<bool, BackendFault>;

    /// Resolve dependencies for the accumulated transaction.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn resolve_transaction(&self) -> Result<Resolution, BackendFault>;

    /// Fetch the transaction the daemon currently holds (e.g. after a history undo).
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn get_transaction(&self) -> Result<Resolution, BackendFault>;

    /// Execute the resolved transaction.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn run_transaction(&self) -> Result<RunReply, BackendFault>;

    /// Tell the daemon whether `key_id` is trusted.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn confirm_signing_key(&self, key_id: &str, trusted: bool) -> Result<(), BackendFault>;

    /// Take the key confirmation request published during the last run, if any.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn pending_key_confirmation(&self) -> Result<Option<GpgConfirmation>, BackendFault>;

    /// List packages matching `filter`.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn list_packages(&self, filter: PackageFilter) -> Result<Vec<PackageInfo>, BackendFault>;

    /// Search package names with a shell-style pattern.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn search_by_name(
        &self,
        pattern: &str,
        newest_only: bool,
    ) -> Result<Vec<PackageInfo>, BackendFault>;

    /// Category/group tree.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn list_groups(&self) -> Result<Vec<GroupCategory>, BackendFault>;

    /// History entries between `start_days` and `end_days` ago.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn history(&self, start_days: u32, end_days: u32) -> Result<Vec<HistoryEntry>, BackendFault>;

    /// Prepare a transaction that undoes history entry `id`.
    ///
    /// # Errors
    /// - Transport or daemon faults.
    fn undo_history(&self, id: i64) -> Result<UndoReply, BackendFault>;
}
