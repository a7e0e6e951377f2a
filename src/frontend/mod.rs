//! User-facing collaborator of the orchestration core.
//!
//! The core never draws anything itself. It talks to a [`Frontend`] for the
//! working indicator, messages and the two confirmation checkpoints, and it
//! computes what the package list should show through the pure functions in
//! [`view`].

mod console;
pub mod view;

pub use console::ConsoleFrontend;
pub use view::{Listings, ViewMode, ViewState, required_filters, visible_packages};

use crate::backend::{GpgConfirmation, PackageInfo, TransactionPlan};

/// What: Everything the orchestration core needs from the user interface.
///
/// Details:
/// - Calls happen on the single control thread; blocking inside a method is
///   fine (a dialog waiting for the user).
/// - `pump_events` is called right after `set_working(true)` so the indicator
///   is visible before the next blocking daemon call.
pub trait Frontend {
    /// Show or hide the working indicator.
    fn set_working(&mut self, working: bool);

    /// Flush pending redraw work.
    fn pump_events(&mut self) {}

    /// Informational or error message.
    fn show_message(&mut self, text: &str);

    /// Message with a list of detail lines (build errors, solver output).
    fn show_details(&mut self, title: &str, details: &[String]);

    /// Ask the user to approve a resolved plan.
    fn confirm_transaction(&mut self, plan: &TransactionPlan) -> bool;

    /// Ask the user to trust a package signing key.
    fn confirm_key_import(&mut self, request: &GpgConfirmation) -> bool;

    /// Yes/no question.
    fn ask(&mut self, question: &str) -> bool;

    /// Replace the package list with `rows`.
    fn show_packages(&mut self, rows: &[PackageInfo]);
}
