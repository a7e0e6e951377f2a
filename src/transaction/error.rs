//! Error taxonomy of one orchestration attempt.

use crate::backend::{BackendFault, ClassifiedFault, classify};
use crate::session::SessionError;

use super::state::TransitionError;

/// Recoverable outcome of a failed or vetoed attempt.
///
/// The queue is preserved for every variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    /// Nothing queued.
    #[error("No pending actions in queue")]
    EmptyQueue,
    /// The daemon rejected queue items; holds exactly the rejected items.
    #[error("Error(s) in building transaction")]
    Build(Vec<String>),
    /// Dependency resolution failed.
    #[error("Error(s) in search for dependencies")]
    Solve(Vec<String>),
    /// The plan removes protected packages; holds their names.
    #[error("Can't remove protected package(s)")]
    ProtectedPackage(Vec<String>),
    /// A signing key could not be confirmed.
    #[error("Error checking package signatures")]
    SignatureVerification(Vec<String>),
    /// Run status 4.
    #[error("Downloading error(s)")]
    Download(Vec<String>),
    /// Any other nonzero run status.
    #[error("Error in transaction (status {status})")]
    Generic {
        /// Run status.
        status: i32,
        /// Daemon messages.
        messages: Vec<String>,
    },
    /// The daemon could not prepare a history undo.
    #[error("Error in history undo")]
    Undo(Vec<String>),
}

impl TransactionError {
    /// Detail lines shown under the title.
    #[must_use]
    pub fn details(&self) -> &[String] {
        match self {
            Self::EmptyQueue => &[],
            Self::Build(m)
            | Self::Solve(m)
            | Self::ProtectedPackage(m)
            | Self::SignatureVerification(m)
            | Self::Download(m)
            | Self::Undo(m)
            | Self::Generic { messages: m, .. } => m,
        }
    }

    /// What: Whether the backend session is released after this error.
    ///
    /// Details:
    /// - Errors raised before the daemon holds a meaningful transaction
    ///   (empty queue, rejected items, veto, undo refusal) keep the lock.
    #[must_use]
    pub const fn releases_session(&self) -> bool {
        matches!(
            self,
            Self::Solve(_)
                | Self::SignatureVerification(_)
                | Self::Download(_)
                | Self::Generic { .. }
        )
    }
}

/// Process-fatal failure escaping an orchestration attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// Session acquisition or a daemon call failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Internal state machine violation.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<BackendFault> for OrchestratorError {
    fn from(fault: BackendFault) -> Self {
        Self::Session(SessionError::Fault(fault))
    }
}

impl OrchestratorError {
    /// Disposition and message shown before the process exits.
    #[must_use]
    pub fn classify(&self) -> ClassifiedFault {
        match self {
            Self::Session(e) => e.classify(),
            Self::Transition(e) => classify(&BackendFault::Remote {
                name: "org.baseurl.DnfSystem.FatalError".to_string(),
                message: e.to_string(),
            }),
        }
    }
}
