//! Non-interactive single action driven from the command line.

use super::error::OrchestratorError;
use super::orchestrator::{ApplyOptions, ApplyOutcome, TransactionOrchestrator};
use crate::backend::{Backend, PackageId};
use crate::frontend::Frontend;
use crate::queue::ActionKind;

/// Message shown after a successful single action when the user was asked.
pub const SINGLE_SHOT_SUCCESS: &str = "Changes was successfully applied to the system";

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleShot {
    /// Install a package by name.
    Install(String),
    /// Remove a package by name.
    Remove(String),
    /// Apply every available update.
    UpdateAll,
}

impl SingleShot {
    /// Queue entry carrying this action.
    #[must_use]
    pub fn queue_entry(&self) -> (PackageId, ActionKind) {
        match self {
            Self::Install(name) => (PackageId::new(name.as_str()), ActionKind::Install),
            Self::Remove(name) => (PackageId::new(name.as_str()), ActionKind::Remove),
            Self::UpdateAll => (PackageId::new("*"), ActionKind::Update),
        }
    }
}

/// What: Run one scripted action through the orchestrator and terminate the daemon.
///
/// Inputs:
/// - `orchestrator`: Orchestrator whose queue is replaced by the single entry.
/// - `ui`: Frontend.
/// - `action`: Action to perform.
/// - `always_yes`: Skip the plan confirmation and the success message.
///
/// Output:
/// - Outcome of the attempt.
///
/// # Errors
/// - [`OrchestratorError`] on session or daemon faults.
///
/// Details:
/// - No resync happens; the session is released with daemon termination on
///   every path.
pub fn run_single_shot<B: Backend>(
    orchestrator: &mut TransactionOrchestrator<B>,
    ui: &mut dyn Frontend,
    action: &SingleShot,
    always_yes: bool,
) -> Result<ApplyOutcome, OrchestratorError> {
    let (pkg, kind) = action.queue_entry();
    tracing::info!(pkg = %pkg, action = %kind, always_yes, "[SingleShot] running");
    let queue = orchestrator.queue_mut();
    queue.clear();
    queue.add(pkg, kind);

    let result = orchestrator.apply(
        ui,
        ApplyOptions {
            always_yes,
            resync: false,
        },
    );
    if matches!(result, Ok(ApplyOutcome::Completed)) && !always_yes {
        ui.show_message(SINGLE_SHOT_SUCCESS);
    }
    orchestrator.session_mut().release_quietly(true);
    result
}
