//! Transaction orchestration: queue to resolved plan to executed transaction.

mod error;
mod orchestrator;
mod single;
mod state;

pub use error::{OrchestratorError, TransactionError};
pub use orchestrator::{
    ApplyOptions, ApplyOutcome, OrchestratorConfig, TransactionOrchestrator, protected_removals,
};
pub use single::{SINGLE_SHOT_SUCCESS, SingleShot, run_single_shot};
pub use state::{TransitionError, TxState, apply_transition};
