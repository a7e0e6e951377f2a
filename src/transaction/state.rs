//! Transaction state machine: states and the validated transition table.

use std::fmt;

/// Where an orchestration attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TxState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Queue items are being submitted to the daemon.
    Building,
    /// The daemon is resolving dependencies.
    Resolving,
    /// A resolved plan waits for the user.
    AwaitingConfirmation,
    /// The daemon is executing the plan.
    Executing,
    /// Execution paused on an unverified signing key.
    AwaitingGpgConfirmation,
    /// Execution succeeded.
    Done,
    /// The attempt failed.
    Failed,
    /// The attempt was cancelled (declined or vetoed).
    Cancelled,
}

impl TxState {
    /// Terminal states only leave through a reset to [`TxState::Idle`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "IDLE",
            Self::Building => "BUILDING",
            Self::Resolving => "RESOLVING",
            Self::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            Self::Executing => "EXECUTING",
            Self::AwaitingGpgConfirmation => "AWAITING_GPG_CONFIRMATION",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// Rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Terminal states only accept a reset to idle.
    #[error("transaction state '{state}' is terminal and cannot transition to '{to}'")]
    TerminalState {
        /// Current state.
        state: TxState,
        /// Requested state.
        to: TxState,
    },
    /// The pair is not in the transition table.
    #[error("invalid transaction transition '{from}' -> '{to}'")]
    InvalidTransition {
        /// Current state.
        from: TxState,
        /// Requested state.
        to: TxState,
    },
}

/// What: Validate and perform one state change.
///
/// Inputs:
/// - `from`: Current state.
/// - `to`: Requested state.
///
/// Output:
/// - `to` when the change is allowed.
///
/// # Errors
/// - [`TransitionError::TerminalState`] when leaving a terminal state for anything but idle.
/// - [`TransitionError::InvalidTransition`] for pairs outside the table.
pub const fn apply_transition(from: TxState, to: TxState) -> Result<TxState, TransitionError> {
    if from.is_terminal() {
        return if matches!(to, TxState::Idle) {
            Ok(to)
        } else {
            Err(TransitionError::TerminalState { state: from, to })
        };
    }
    if is_allowed(from, to) {
        Ok(to)
    } else {
        Err(TransitionError::InvalidTransition { from, to })
    }
}

/// Transition table for non-terminal states.
const fn is_allowed(from: TxState, to: TxState) -> bool {
    use TxState::{
        AwaitingConfirmation, AwaitingGpgConfirmation, Building, Cancelled, Done, Executing,
        Failed, Idle, Resolving,
    };
    match (from, to) {
        // any non-terminal state may fail
        (_, Failed)
        | (Idle, Building | Resolving)
        | (Building, Resolving)
        | (Resolving, AwaitingConfirmation)
        | (AwaitingConfirmation, Executing | Cancelled)
        | (Executing, AwaitingGpgConfirmation | Done)
        | (AwaitingGpgConfirmation, Building | Resolving | Cancelled) => true,
        _ => false,
    }
}
