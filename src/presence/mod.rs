//! Process-wide presence: single-instance registry and desktop notifications.
//!
//! Both capabilities are served by the same status-icon service on the
//! session bus, but the core only ever talks to them through the two traits
//! below so they can be composed (or faked) independently.

mod dbus;

pub use dbus::StatusServiceClient;

use crate::backend::BackendFault;

/// Pid value reported when no instance is registered.
pub const NO_INSTANCE: i32 = -1;

/// What: Single-instance registry.
///
/// Output:
/// - Pid of the registered instance and whether it is currently working.
///
/// Details:
/// - `set_running(pid, true)` claims the registry; `set_running(pid, false)`
///   releases it. Both are answered with the service's acceptance flag.
pub trait ProcessRegistry {
    /// Pid of the registered instance, or a value `<= 0` when none.
    ///
    /// # Errors
    /// - Bus faults.
    fn running_pid(&self) -> Result<i32, BackendFault>;

    /// Claim or release the registry for `pid`.
    ///
    /// # Errors
    /// - Bus faults.
    fn set_running(&self, pid: i32, running: bool) -> Result<bool, BackendFault>;

    /// Whether the registered instance is in the middle of a transaction.
    ///
    /// # Errors
    /// - Bus faults.
    fn is_working(&self) -> Result<bool, BackendFault>;
}

/// What: Presence and notification publisher.
///
/// Details:
/// - Every method is fire-and-forget from the core's point of view; callers on
///   cleanup paths log and swallow the returned faults.
pub trait Notifier {
    /// Start the presence service (tray icon).
    ///
    /// # Errors
    /// - Bus faults.
    fn start(&self) -> Result<(), BackendFault>;

    /// Ask the presence service to exit.
    ///
    /// # Errors
    /// - Bus faults.
    fn exit(&self) -> Result<(), BackendFault>;

    /// Publish the working indicator.
    ///
    /// # Errors
    /// - Bus faults.
    fn set_working(&self, working: bool) -> Result<(), BackendFault>;

    /// Ask the running instance to show its window.
    ///
    /// # Errors
    /// - Bus faults.
    fn request_show(&self) -> Result<(), BackendFault>;

    /// Ask the running instance to quit.
    ///
    /// # Errors
    /// - Bus faults.
    fn request_quit(&self) -> Result<(), BackendFault>;

    /// Publish the number of available updates.
    ///
    /// # Errors
    /// - Bus faults.
    fn set_update_count(&self, count: usize) -> Result<(), BackendFault>;
}

/// Registry and notifier as one handle, as most callers need both.
pub trait Presence: ProcessRegistry + Notifier {}

impl<T: ProcessRegistry + Notifier> Presence for T {}

/// Log and drop a presence failure on a path that must not fail.
pub fn best_effort(what: &str, result: Result<(), BackendFault>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "[Presence] {what} failed");
    }
}
