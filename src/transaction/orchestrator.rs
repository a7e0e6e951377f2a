//! Build, resolve, confirm and run transactions against the daemon.

use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use super::error::{OrchestratorError, TransactionError};
use super::state::{TransitionError, TxState, apply_transition};
use crate::backend::{
    Backend, GroupCategory, HistoryEntry, PackageFilter, RUN_DOWNLOAD_ERROR,
    RUN_NEEDS_KEY_CONFIRMATION, RUN_SUCCESS, Resolution, TransactionPlan,
};
use crate::config::Settings;
use crate::frontend::{Frontend, Listings, ViewMode, ViewState, required_filters, visible_packages};
use crate::presence::{Notifier, best_effort};
use crate::queue::{Queue, TransactionRequest};
use crate::session::{BackendSession, REFRESH_FAILED_MESSAGE};

/// Orchestrator knobs taken from the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Package names that may never be removed.
    pub protected: BTreeSet<String>,
    /// Maximum number of signing keys confirmed in one attempt.
    pub gpg_retry_limit: usize,
    /// Show only the newest version of each package.
    pub newest_only: bool,
    /// History window in days.
    pub history_days: u32,
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            protected: settings.protected.clone(),
            gpg_retry_limit: settings.gpg_retry_limit,
            newest_only: settings.newest_only,
            history_days: settings.history_days,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// How an attempt interacts with the user and what happens after success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Skip the plan confirmation checkpoint.
    pub always_yes: bool,
    /// Reload groups and packages and reset the view after success.
    pub resync: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            always_yes: false,
            resync: true,
        }
    }
}

/// Result of one orchestration attempt that did not end the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The daemon executed the plan.
    Completed,
    /// The user declined the plan or a signing key.
    Cancelled,
    /// The attempt stopped on a recoverable error.
    Rejected(TransactionError),
}

/// Where the plan of an attempt comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanSource {
    /// Submit the queue and resolve it.
    Queue,
    /// Read the transaction the daemon already holds (history undo).
    Held,
}

/// Record a state change.
fn advance(state: &mut TxState, to: TxState) -> Result<(), TransitionError> {
    let next = apply_transition(*state, to)?;
    tracing::debug!(from = %state, to = %next, "[Transaction] state change");
    *state = next;
    Ok(())
}

/// What: Names of protected packages removed by `plan`.
///
/// Inputs:
/// - `plan`: Resolved plan.
/// - `protected`: Protected package names.
///
/// Output:
/// - Offending names in plan order, without duplicates.
#[must_use]
pub fn protected_removals(plan: &TransactionPlan, protected: &BTreeSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    plan.removals()
        .map(|e| e.package.name())
        .filter(|name| protected.contains(*name) && seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// What: Drives queue contents through build, resolution, confirmation and execution.
///
/// Inputs:
/// - `session`: Privileged daemon session (acquired lazily).
/// - `config`: Protected names, key round limit, listing and history options.
///
/// Output:
/// - [`ApplyOutcome`] for recoverable endings, [`OrchestratorError`] for
///   process-fatal ones.
///
/// Details:
/// - Every attempt that reaches the daemon shows the working indicator once
///   and hides it exactly once, whichever way it ends.
/// - The queue is only cleared after the daemon reports success.
/// - After a confirmed signing key the current queue is submitted and
///   resolved again before the next run; the protected-package check is
///   repeated on the new plan.
pub struct TransactionOrchestrator<B: Backend> {
    /// Privileged session.
    session: BackendSession<B>,
    /// Pending actions.
    queue: Queue,
    /// Settings-derived knobs.
    config: OrchestratorConfig,
    /// Current state of the attempt in flight.
    state: TxState,
    /// Current list and search.
    view: ViewState,
    /// Rows fetched for the current view.
    listings: Listings,
    /// Category/group tree.
    groups: Vec<GroupCategory>,
    /// Update-count publisher.
    notifier: Option<Rc<dyn Notifier>>,
}

impl<B: Backend> TransactionOrchestrator<B> {
    /// New orchestrator with an empty queue.
    #[must_use]
    pub fn new(session: BackendSession<B>, config: OrchestratorConfig) -> Self {
        Self {
            session,
            queue: Queue::new(),
            config,
            state: TxState::Idle,
            view: ViewState::default(),
            listings: Listings::default(),
            groups: Vec::new(),
            notifier: None,
        }
    }

    /// Publish update counts through `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Pending actions.
    #[must_use]
    pub const fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Mutable pending actions.
    pub const fn queue_mut(&mut self) -> &mut Queue {
        &mut self.queue
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TxState {
        self.state
    }

    /// Current view.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// Cached category/group tree.
    #[must_use]
    pub fn groups(&self) -> &[GroupCategory] {
        &self.groups
    }

    /// Underlying session.
    pub const fn session_mut(&mut self) -> &mut BackendSession<B> {
        &mut self.session
    }

    /// What: Apply the queue.
    ///
    /// Inputs:
    /// - `ui`: Frontend for the indicator, messages and confirmations.
    /// - `opts`: Confirmation and resync behaviour.
    ///
    /// Output:
    /// - [`ApplyOutcome`]; an empty queue is rejected without contacting the daemon.
    ///
    /// # Errors
    /// - [`OrchestratorError`] when the session cannot be acquired or a daemon
    ///   call faults.
    pub fn apply(
        &mut self,
        ui: &mut dyn Frontend,
        opts: ApplyOptions,
    ) -> Result<ApplyOutcome, OrchestratorError> {
        if self.queue.total() == 0 {
            tracing::info!("[Transaction] nothing queued");
            let err = TransactionError::EmptyQueue;
            ui.show_message(&err.to_string());
            return Ok(ApplyOutcome::Rejected(err));
        }
        tracing::info!(items = self.queue.total(), "[Transaction] applying queue");
        self.attempt(ui, PlanSource::Queue, opts)
    }

    /// What: Undo history transaction `id`.
    ///
    /// Inputs:
    /// - `ui`: Frontend.
    /// - `id`: History transaction id.
    /// - `opts`: Confirmation and resync behaviour.
    ///
    /// Output:
    /// - [`ApplyOutcome`]; a refused undo is `Rejected(Undo)` and nothing else happens.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    ///
    /// Details:
    /// - The daemon prepares the undo transaction; the attempt starts at
    ///   resolution using the held transaction and never touches the queue
    ///   submission step.
    pub fn undo_history(
        &mut self,
        ui: &mut dyn Frontend,
        id: i64,
        opts: ApplyOptions,
    ) -> Result<ApplyOutcome, OrchestratorError> {
        tracing::info!(id, "[Transaction] undo history entry");
        self.ensure_session(ui)?;
        let reply = self.session.backend()?.undo_history(id)?;
        if !reply.ok {
            let err = TransactionError::Undo(reply.messages);
            ui.show_details(&err.to_string(), err.details());
            return Ok(ApplyOutcome::Rejected(err));
        }
        self.attempt(ui, PlanSource::Held, opts)
    }

    /// What: Take the daemon lock behind the working indicator.
    ///
    /// # Errors
    /// - [`OrchestratorError`] when the session cannot be acquired.
    ///
    /// Details:
    /// - A no-op while the lock is held; otherwise the indicator covers the
    ///   lock request and any metadata refresh it triggers.
    pub fn connect(&mut self, ui: &mut dyn Frontend) -> Result<(), OrchestratorError> {
        if self.session.is_locked() {
            return Ok(());
        }
        ui.set_working(true);
        ui.pump_events();
        let result = self.ensure_session(ui);
        ui.set_working(false);
        result
    }

    /// Acquire the session and tell the user when its metadata refresh failed.
    fn ensure_session(&mut self, ui: &mut dyn Frontend) -> Result<(), OrchestratorError> {
        let report = self.session.acquire()?;
        if report.refreshed == Some(false) {
            ui.show_message(REFRESH_FAILED_MESSAGE);
        }
        Ok(())
    }

    /// What: History entries of the configured window.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    pub fn history(&mut self) -> Result<Vec<HistoryEntry>, OrchestratorError> {
        let days = self.config.history_days;
        Ok(self.session.backend()?.history(0, days)?)
    }

    /// One attempt wrapped in the working indicator.
    fn attempt(
        &mut self,
        ui: &mut dyn Frontend,
        source: PlanSource,
        opts: ApplyOptions,
    ) -> Result<ApplyOutcome, OrchestratorError> {
        ui.set_working(true);
        ui.pump_events();
        let result = match self.drive(ui, source, opts) {
            Ok(outcome) => self.settle(ui, outcome, opts),
            Err(e) => Err(e),
        };
        ui.set_working(false);
        if let Err(e) = &result {
            tracing::error!(state = %self.state, error = %e, "[Transaction] attempt aborted");
            if !self.state.is_terminal() {
                self.state = TxState::Failed;
            }
        }
        self.state = TxState::Idle;
        result
    }

    /// Run the state machine up to a terminal state.
    fn drive(
        &mut self,
        ui: &mut dyn Frontend,
        source: PlanSource,
        opts: ApplyOptions,
    ) -> Result<ApplyOutcome, OrchestratorError> {
        self.ensure_session(ui)?;
        let plan = match self.prepare(source)? {
            Ok(plan) => plan,
            Err(e) => return self.fail(e),
        };
        if let Some(outcome) = self.review(&plan)? {
            return Ok(outcome);
        }
        if !opts.always_yes && !ui.confirm_transaction(&plan) {
            tracing::info!("[Transaction] plan declined");
            advance(&mut self.state, TxState::Cancelled)?;
            return Ok(ApplyOutcome::Cancelled);
        }
        self.execute(ui, source)
    }

    /// What: Produce a resolved plan.
    ///
    /// Output:
    /// - `Ok(Ok(plan))` when resolved; `Ok(Err(_))` for build or solve errors.
    ///
    /// Details:
    /// - Queue source: `ClearTransaction`, one add per item (rejections are
    ///   collected, not fatal), then resolution only if nothing was rejected.
    fn prepare(
        &mut self,
        source: PlanSource,
    ) -> Result<Result<TransactionPlan, TransactionError>, OrchestratorError> {
        let resolution = match source {
            PlanSource::Queue => {
                advance(&mut self.state, TxState::Building)?;
                let rejected = self.submit_queue()?;
                if !rejected.is_empty() {
                    tracing::warn!(count = rejected.len(), "[Transaction] items rejected");
                    return Ok(Err(TransactionError::Build(rejected)));
                }
                advance(&mut self.state, TxState::Resolving)?;
                self.session.backend()?.resolve_transaction()?
            }
            PlanSource::Held => {
                advance(&mut self.state, TxState::Resolving)?;
                self.session.backend()?.get_transaction()?
            }
        };
        Ok(match resolution {
            Resolution::Resolved(plan) => {
                tracing::info!(entries = plan.entries.len(), "[Transaction] dependencies resolved");
                Ok(plan)
            }
            Resolution::Unresolved(messages) => Err(TransactionError::Solve(messages)),
        })
    }

    /// Submit the current queue; returns the rejected items.
    fn submit_queue(&mut self) -> Result<Vec<String>, OrchestratorError> {
        let request = TransactionRequest::from_queue(&self.queue);
        let backend = self.session.backend()?;
        backend.clear_transaction()?;
        let mut rejected = Vec::new();
        for item in &request.items {
            tracing::debug!(item = %item, "[Transaction] adding");
            if !backend.add_to_transaction(item)? {
                tracing::debug!(item = %item, "[Transaction] rejected by daemon");
                rejected.push(item.to_string());
            }
        }
        Ok(rejected)
    }

    /// Enter confirmation and apply the protected-package veto.
    fn review(
        &mut self,
        plan: &TransactionPlan,
    ) -> Result<Option<ApplyOutcome>, OrchestratorError> {
        advance(&mut self.state, TxState::AwaitingConfirmation)?;
        let vetoed = protected_removals(plan, &self.config.protected);
        if vetoed.is_empty() {
            return Ok(None);
        }
        tracing::warn!(packages = ?vetoed, "[Transaction] protected packages in plan");
        advance(&mut self.state, TxState::Cancelled)?;
        Ok(Some(ApplyOutcome::Rejected(
            TransactionError::ProtectedPackage(vetoed),
        )))
    }

    /// Run the plan, looping over signing-key confirmations.
    fn execute(
        &mut self,
        ui: &mut dyn Frontend,
        source: PlanSource,
    ) -> Result<ApplyOutcome, OrchestratorError> {
        let mut confirmed: HashSet<String> = HashSet::new();
        loop {
            advance(&mut self.state, TxState::Executing)?;
            let reply = self.session.backend()?.run_transaction()?;
            tracing::info!(status = reply.status, "[Transaction] run finished");
            match reply.status {
                RUN_SUCCESS => {
                    advance(&mut self.state, TxState::Done)?;
                    return Ok(ApplyOutcome::Completed);
                }
                RUN_NEEDS_KEY_CONFIRMATION => {}
                RUN_DOWNLOAD_ERROR => return self.fail(TransactionError::Download(reply.messages)),
                status => {
                    return self.fail(TransactionError::Generic {
                        status,
                        messages: reply.messages,
                    });
                }
            }

            advance(&mut self.state, TxState::AwaitingGpgConfirmation)?;
            let Some(request) = self.session.backend()?.pending_key_confirmation()? else {
                tracing::error!("[Transaction] key confirmation requested without a key");
                return self.fail(TransactionError::SignatureVerification(reply.messages));
            };
            tracing::debug!(key = %request.key_id, pkg = %request.package, "[Transaction] signing key");
            if confirmed.contains(&request.key_id) {
                return self.fail(TransactionError::SignatureVerification(vec![format!(
                    "Key {} was imported but is still not trusted",
                    request.key_id
                )]));
            }
            if confirmed.len() >= self.config.gpg_retry_limit {
                return self.fail(TransactionError::SignatureVerification(vec![format!(
                    "Too many signing keys requested (limit {})",
                    self.config.gpg_retry_limit
                )]));
            }
            if !ui.confirm_key_import(&request) {
                tracing::info!(key = %request.key_id, "[Transaction] signing key declined");
                advance(&mut self.state, TxState::Cancelled)?;
                return Ok(ApplyOutcome::Cancelled);
            }
            self.session
                .backend()?
                .confirm_signing_key(&request.key_id, true)?;
            confirmed.insert(request.key_id);

            let plan = match self.prepare(source)? {
                Ok(plan) => plan,
                Err(e) => return self.fail(e),
            };
            if let Some(outcome) = self.review(&plan)? {
                return Ok(outcome);
            }
        }
    }

    /// Enter `Failed` with `err`.
    fn fail(&mut self, err: TransactionError) -> Result<ApplyOutcome, OrchestratorError> {
        tracing::warn!(error = %err, details = ?err.details(), "[Transaction] attempt failed");
        advance(&mut self.state, TxState::Failed)?;
        Ok(ApplyOutcome::Rejected(err))
    }

    /// Apply the reset action matching `outcome`.
    fn settle(
        &mut self,
        ui: &mut dyn Frontend,
        outcome: ApplyOutcome,
        opts: ApplyOptions,
    ) -> Result<ApplyOutcome, OrchestratorError> {
        match &outcome {
            ApplyOutcome::Completed => {
                self.session.release(false)?;
                self.queue.clear();
                if opts.resync {
                    self.resync(ui)?;
                }
            }
            ApplyOutcome::Cancelled => {}
            ApplyOutcome::Rejected(err) => {
                ui.show_details(&err.to_string(), err.details());
                if err.releases_session() {
                    self.session.release_quietly(false);
                }
            }
        }
        Ok(outcome)
    }

    /// What: Full resynchronization after a successful run.
    ///
    /// # Errors
    /// - [`OrchestratorError`] when reloading from the daemon fails.
    ///
    /// Details:
    /// - Reloads groups, drops the search, returns to the updates view,
    ///   shows it and publishes the update count.
    pub fn resync(&mut self, ui: &mut dyn Frontend) -> Result<(), OrchestratorError> {
        tracing::info!("[Transaction] resynchronizing package data");
        self.ensure_session(ui)?;
        self.listings = Listings::default();
        self.reload_groups()?;
        self.view.reset();
        self.refresh_view(ui)?;
        self.publish_update_count();
        Ok(())
    }

    /// Reload the category/group tree.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    pub fn reload_groups(&mut self) -> Result<(), OrchestratorError> {
        self.groups = self.session.backend()?.list_groups()?;
        Ok(())
    }

    /// What: Fetch missing listings for the current view and show the visible rows.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    pub fn refresh_view(&mut self, ui: &mut dyn Frontend) -> Result<(), OrchestratorError> {
        self.ensure_session(ui)?;
        for filter in required_filters(&self.view, self.config.newest_only) {
            if !self.listings.by_filter.contains_key(&filter) {
                let rows = self.session.backend()?.list_packages(filter)?;
                tracing::debug!(filter = filter.as_wire(), rows = rows.len(), "[View] loaded");
                self.listings.by_filter.insert(filter, rows);
            }
        }
        let rows = visible_packages(&self.view, &self.listings, self.config.newest_only);
        ui.show_packages(&rows);
        Ok(())
    }

    /// Switch the list shown.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    pub fn set_view_mode(
        &mut self,
        ui: &mut dyn Frontend,
        mode: ViewMode,
    ) -> Result<(), OrchestratorError> {
        self.view.mode = mode;
        self.refresh_view(ui)
    }

    /// Search package names and show the matches for the current mode.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    pub fn search(&mut self, ui: &mut dyn Frontend, pattern: &str) -> Result<(), OrchestratorError> {
        self.ensure_session(ui)?;
        let rows = self
            .session
            .backend()?
            .search_by_name(pattern, self.config.newest_only)?;
        self.listings.search = rows;
        self.view.search = Some(pattern.to_string());
        self.refresh_view(ui)
    }

    /// Drop the active search.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    pub fn clear_search(&mut self, ui: &mut dyn Frontend) -> Result<(), OrchestratorError> {
        self.view.search = None;
        self.listings.search.clear();
        self.refresh_view(ui)
    }

    /// What: Reload available updates and publish their count.
    ///
    /// Output:
    /// - Number of available updates.
    ///
    /// # Errors
    /// - [`OrchestratorError`] on session or daemon faults.
    pub fn check_for_updates(&mut self) -> Result<usize, OrchestratorError> {
        let filter = self.updates_filter();
        let rows = self.session.backend()?.list_packages(filter)?;
        self.listings.by_filter.insert(filter, rows);
        Ok(self.publish_update_count())
    }

    /// Listing used to count updates.
    const fn updates_filter(&self) -> PackageFilter {
        if self.config.newest_only {
            PackageFilter::Updates
        } else {
            PackageFilter::UpdatesAll
        }
    }

    /// Publish the number of loaded updates; returns it.
    fn publish_update_count(&self) -> usize {
        let count = self.listings.rows(self.updates_filter()).len();
        tracing::info!(count, "[Transaction] available updates");
        if let Some(n) = &self.notifier {
            best_effort("SetUpdateCount", n.set_update_count(count));
        }
        count
    }
}
