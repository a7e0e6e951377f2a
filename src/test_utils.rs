//! Test utilities for common test setup.
//!
//! This module provides a scripted [`Backend`] shared by the session,
//! transaction and lifecycle test modules.

#![cfg(test)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::backend::{
    Backend, BackendFault, GpgConfirmation, GroupCategory, HistoryEntry, LockReply,
    PackageFilter, PackageId, PackageInfo, PlanEntry, PlanOperation, Resolution, RunReply,
    TransactionPlan, UndoReply,
};
use crate::frontend::Frontend;
use crate::queue::TransactionItem;

/// Scripted replies and the recorded call log.
#[derive(Debug, Default)]
struct Script {
    /// Every call in order, rendered as `Method` or `Method(args)`.
    calls: Vec<String>,
    /// Reply to `Lock`; `None` means granted.
    lock: Option<Result<LockReply, BackendFault>>,
    /// Reply to `ExpireCache`.
    expire_ok: Option<bool>,
    /// Items (rendered with `Display`) the daemon rejects in `AddTransaction`.
    rejected: HashSet<String>,
    /// Successive `BuildTransaction` replies; the last one repeats.
    resolutions: VecDeque<Resolution>,
    /// Successive `GetTransaction` replies; the last one repeats.
    held: VecDeque<Resolution>,
    /// Successive `RunTransaction` replies; the last one repeats.
    runs: VecDeque<RunReply>,
    /// Key requests handed out after each run that returned status 1.
    keys: VecDeque<GpgConfirmation>,
    /// Key request published by the last run, if any.
    pending_key: Option<GpgConfirmation>,
    /// Listing replies by filter.
    packages: HashMap<PackageFilter, Vec<PackageInfo>>,
    /// Reply to `HistoryUndo`.
    undo: Option<UndoReply>,
    /// Reply to `GetHistoryByDays`.
    history: Vec<HistoryEntry>,
    /// Methods that fail with the given fault.
    faults: HashMap<&'static str, BackendFault>,
}

/// What: Scripted [`Backend`] recording every call.
///
/// Inputs:
/// - Builder methods scripting replies.
///
/// Output:
/// - `calls()` returns the recorded call log.
///
/// Details:
/// - Clones share the same script, so a test can keep a handle while the
///   session owns another.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Shared script.
    script: Arc<Mutex<Script>>,
}

/// Plan with one `install` entry per name.
pub fn plan_of(names: &[&str]) -> TransactionPlan {
    TransactionPlan {
        entries: names
            .iter()
            .map(|n| PlanEntry {
                operation: PlanOperation::Install,
                package: PackageId::new(format!("{n},0,1.0,1.fc40,noarch,fedora")),
                size: 1024,
                replaces: Vec::new(),
            })
            .collect(),
    }
}

/// Plan with one `remove` entry per name.
pub fn removal_plan_of(names: &[&str]) -> TransactionPlan {
    let mut plan = plan_of(names);
    for e in &mut plan.entries {
        e.operation = PlanOperation::Remove;
    }
    plan
}

/// Key confirmation request for `key_id`.
pub fn key_request(key_id: &str) -> GpgConfirmation {
    GpgConfirmation {
        package: PackageId::new("foo,0,1.0,1.fc40,noarch,thirdparty"),
        user_id: "Third Party <keys@example.org>".to_string(),
        key_id: key_id.to_string(),
        key_url: "file:///etc/pki/rpm-gpg/RPM-GPG-KEY-thirdparty".to_string(),
        timestamp: 1_700_000_000,
    }
}

/// Run reply with `status` and no messages.
pub fn run_status(status: i32) -> RunReply {
    RunReply {
        status,
        messages: Vec::new(),
    }
}

impl MockBackend {
    /// Fresh mock: lock granted, resolution yields an empty plan, runs succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to the script.
    fn edit(self, f: impl FnOnce(&mut Script)) -> Self {
        {
            let mut guard = self.script.lock().expect("poisoned script mutex");
            f(&mut *guard);
        }
        self
    }

    /// Script the `Lock` reply.
    pub fn with_lock(self, reply: Result<LockReply, BackendFault>) -> Self {
        self.edit(|s| s.lock = Some(reply))
    }

    /// Script the `ExpireCache` reply.
    pub fn with_expire(self, ok: bool) -> Self {
        self.edit(|s| s.expire_ok = Some(ok))
    }

    /// Reject `item` in `AddTransaction`.
    pub fn rejecting(self, item: &str) -> Self {
        let item = item.to_string();
        self.edit(|s| {
            s.rejected.insert(item);
        })
    }

    /// Queue a `BuildTransaction` reply.
    pub fn resolving(self, resolution: Resolution) -> Self {
        self.edit(|s| s.resolutions.push_back(resolution))
    }

    /// Queue a `GetTransaction` reply.
    pub fn holding(self, resolution: Resolution) -> Self {
        self.edit(|s| s.held.push_back(resolution))
    }

    /// Queue a `RunTransaction` reply.
    pub fn running(self, reply: RunReply) -> Self {
        self.edit(|s| s.runs.push_back(reply))
    }

    /// Queue a key request published by the next run with status 1.
    pub fn publishing_key(self, request: GpgConfirmation) -> Self {
        self.edit(|s| s.keys.push_back(request))
    }

    /// Script the listing for `filter`.
    pub fn listing(self, filter: PackageFilter, rows: Vec<PackageInfo>) -> Self {
        self.edit(|s| {
            s.packages.insert(filter, rows);
        })
    }

    /// Script the `HistoryUndo` reply.
    pub fn with_undo(self, reply: UndoReply) -> Self {
        self.edit(|s| s.undo = Some(reply))
    }

    /// Script the history listing.
    pub fn with_history(self, entries: Vec<HistoryEntry>) -> Self {
        self.edit(|s| s.history = entries)
    }

    /// Make `method` fail with `fault`.
    pub fn failing(self, method: &'static str, fault: BackendFault) -> Self {
        self.edit(|s| {
            s.faults.insert(method, fault);
        })
    }

    /// Recorded call log.
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().expect("poisoned script mutex").calls.clone()
    }

    /// Number of recorded calls named `method` (with or without arguments).
    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| *c == method || c.starts_with(&format!("{method}(")))
            .count()
    }

    /// Record `call` and return the scripted fault for `method`, if any.
    fn record(&self, method: &'static str, call: String) -> Result<(), BackendFault> {
        let mut s = self.script.lock().expect("poisoned script mutex");
        s.calls.push(call);
        s.faults.get(method).cloned().map_or(Ok(()), Err)
    }

    /// Pop the next reply, keeping the last one for later calls.
    fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Backend for MockBackend {
    fn lock(&self) -> Result<LockReply, BackendFault> {
        self.record("Lock", "Lock".to_string())?;
        let s = self.script.lock().expect("poisoned script mutex");
        s.lock.clone().unwrap_or(Ok(LockReply::Granted))
    }

    fn unlock(&self) -> Result<(), BackendFault> {
        self.record("Unlock", "Unlock".to_string())
    }

    fn exit(&self) -> Result<(), BackendFault> {
        self.record("Exit", "Exit".to_string())
    }

    fn expire_cache(&self) -> Result<bool, BackendFault> {
        self.record("ExpireCache", "ExpireCache".to_string())?;
        let s = self.script.lock().expect("poisoned script mutex");
        Ok(s.expire_ok.unwrap_or(true))
    }

    fn clear_transaction(&self) -> Result<(), BackendFault> {
        self.record("ClearTransaction", "ClearTransaction".to_string())
    }

    fn add_to_transaction(&self, item: &TransactionItem) -> Result<bool, BackendFault> {
        self.record("AddTransaction", format!("AddTransaction({item})"))?;
        let s = self.script.lock().expect("poisoned script mutex");
        Ok(!s.rejected.contains(&item.to_string()))
    }

    fn resolve_transaction(&self) -> Result<Resolution, BackendFault> {
        self.record("BuildTransaction", "BuildTransaction".to_string())?;
        let mut s = self.script.lock().expect("poisoned script mutex");
        Ok(Self::next(&mut s.resolutions)
            .unwrap_or_else(|| Resolution::Resolved(TransactionPlan::default())))
    }

    fn get_transaction(&self) -> Result<Resolution, BackendFault> {
        self.record("GetTransaction", "GetTransaction".to_string())?;
        let mut s = self.script.lock().expect("poisoned script mutex");
        Ok(Self::next(&mut s.held)
            .unwrap_or_else(|| Resolution::Resolved(TransactionPlan::default())))
    }

    fn run_transaction(&self) -> Result<RunReply, BackendFault> {
        self.record("RunTransaction", "RunTransaction".to_string())?;
        let mut s = self.script.lock().expect("poisoned script mutex");
        let reply = Self::next(&mut s.runs).unwrap_or_else(|| run_status(0));
        if reply.status == 1 {
            s.pending_key = s.keys.pop_front();
        }
        Ok(reply)
    }

    fn confirm_signing_key(&self, key_id: &str, trusted: bool) -> Result<(), BackendFault> {
        self.record(
            "ConfirmGPGImport",
            format!("ConfirmGPGImport({key_id},{trusted})"),
        )
    }

    fn pending_key_confirmation(&self) -> Result<Option<GpgConfirmation>, BackendFault> {
        let mut s = self.script.lock().expect("poisoned script mutex");
        Ok(s.pending_key.take())
    }

    fn list_packages(&self, filter: PackageFilter) -> Result<Vec<PackageInfo>, BackendFault> {
        self.record("GetPackages", format!("GetPackages({})", filter.as_wire()))?;
        let s = self.script.lock().expect("poisoned script mutex");
        Ok(s.packages.get(&filter).cloned().unwrap_or_default())
    }

    fn search_by_name(
        &self,
        pattern: &str,
        newest_only: bool,
    ) -> Result<Vec<PackageInfo>, BackendFault> {
        self.record(
            "GetPackagesByName",
            format!("GetPackagesByName({pattern},{newest_only})"),
        )?;
        let s = self.script.lock().expect("poisoned script mutex");
        Ok(s.packages
            .get(&PackageFilter::All)
            .map(|rows| {
                rows.iter()
                    .filter(|p| p.id.name().contains(pattern.trim_matches('*')))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_groups(&self) -> Result<Vec<GroupCategory>, BackendFault> {
        self.record("GetGroups", "GetGroups".to_string())?;
        Ok(Vec::new())
    }

    fn history(&self, start_days: u32, end_days: u32) -> Result<Vec<HistoryEntry>, BackendFault> {
        self.record(
            "GetHistoryByDays",
            format!("GetHistoryByDays({start_days},{end_days})"),
        )?;
        let s = self.script.lock().expect("poisoned script mutex");
        Ok(s.history.clone())
    }

    fn undo_history(&self, id: i64) -> Result<UndoReply, BackendFault> {
        self.record("HistoryUndo", format!("HistoryUndo({id})"))?;
        let s = self.script.lock().expect("poisoned script mutex");
        Ok(s.undo.clone().unwrap_or(UndoReply {
            ok: true,
            messages: Vec::new(),
        }))
    }
}

/// What: Scripted [`Frontend`] recording every interaction.
///
/// Details:
/// - Plan and key confirmations pop scripted answers and default to "yes".
#[derive(Debug, Default)]
pub struct ScriptedFrontend {
    /// Interactions in order.
    pub events: Vec<String>,
    /// Answers to plan confirmations.
    pub plan_answers: VecDeque<bool>,
    /// Answers to key confirmations.
    pub key_answers: VecDeque<bool>,
    /// Answers to yes/no questions (default "no").
    pub answers: VecDeque<bool>,
    /// Last rows shown.
    pub rows: Vec<PackageInfo>,
}

impl ScriptedFrontend {
    /// Frontend approving everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decline the next plan.
    pub fn declining_plan(mut self) -> Self {
        self.plan_answers.push_back(false);
        self
    }

    /// Decline the next key.
    pub fn declining_key(mut self) -> Self {
        self.key_answers.push_back(false);
        self
    }

    /// Answer the next question with `answer`.
    pub fn answering(mut self, answer: bool) -> Self {
        self.answers.push_back(answer);
        self
    }

    /// Number of events equal to `event`.
    pub fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    /// Events starting with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> Vec<&String> {
        self.events.iter().filter(|e| e.starts_with(prefix)).collect()
    }

    /// Assert the working indicator was shown once and hidden once, in that order.
    pub fn assert_single_working_cycle(&self) {
        let toggles = self.with_prefix("working:");
        assert_eq!(toggles, vec!["working:true", "working:false"], "{:?}", self.events);
    }
}

impl Frontend for ScriptedFrontend {
    fn set_working(&mut self, working: bool) {
        self.events.push(format!("working:{working}"));
    }

    fn pump_events(&mut self) {
        self.events.push("pump".to_string());
    }

    fn show_message(&mut self, text: &str) {
        self.events.push(format!("message:{text}"));
    }

    fn show_details(&mut self, title: &str, details: &[String]) {
        self.events
            .push(format!("details:{title}|{}", details.join(";")));
    }

    fn confirm_transaction(&mut self, plan: &TransactionPlan) -> bool {
        self.events
            .push(format!("confirm_plan:{}", plan.entries.len()));
        self.plan_answers.pop_front().unwrap_or(true)
    }

    fn confirm_key_import(&mut self, request: &GpgConfirmation) -> bool {
        self.events.push(format!("confirm_key:{}", request.key_id));
        self.key_answers.pop_front().unwrap_or(true)
    }

    fn ask(&mut self, question: &str) -> bool {
        self.events.push(format!("ask:{question}"));
        self.answers.pop_front().unwrap_or(false)
    }

    fn show_packages(&mut self, rows: &[PackageInfo]) {
        self.events.push(format!("packages:{}", rows.len()));
        self.rows = rows.to_vec();
    }
}

/// Settings store whose system refresh marker lies in the future (no refresh).
pub fn fresh_store() -> Box<dyn crate::config::ConfigStore> {
    let mut map = HashMap::new();
    map.insert(
        crate::config::keys::SYSTEM_REFRESH.to_string(),
        "2999-01-01 00:00".to_string(),
    );
    Box::new(map)
}

/// Session whose connector hands out clones of `mock`.
pub fn session_for(mock: &MockBackend) -> crate::session::BackendSession<MockBackend> {
    let mock = mock.clone();
    crate::session::BackendSession::new(
        Box::new(move || Ok(mock.clone())),
        fresh_store(),
        crate::session::RefreshPolicy::new(12),
    )
}

/// Orchestrator over `mock` protecting `glibc` and `dnf`, allowing three key rounds.
pub fn orchestrator_for(
    mock: &MockBackend,
) -> crate::transaction::TransactionOrchestrator<MockBackend> {
    let config = crate::transaction::OrchestratorConfig {
        protected: ["glibc", "dnf"].into_iter().map(String::from).collect(),
        gpg_retry_limit: 3,
        newest_only: true,
        history_days: 180,
    };
    crate::transaction::TransactionOrchestrator::new(session_for(mock), config)
}
