//! Scripted daemon and frontend shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use yumex::backend::{
    Backend, BackendFault, GpgConfirmation, GroupCategory, HistoryEntry, LockReply,
    PackageFilter, PackageId, PackageInfo, PlanEntry, PlanOperation, Resolution, RunReply,
    TransactionPlan, UndoReply,
};
use yumex::config::{ConfigStore, keys};
use yumex::frontend::Frontend;
use yumex::queue::TransactionItem;
use yumex::session::{BackendSession, RefreshPolicy};
use yumex::transaction::{OrchestratorConfig, TransactionOrchestrator};

/// Mutable daemon script; queued replies repeat their last entry.
#[derive(Default)]
struct Script {
    /// Method calls in order.
    calls: Vec<String>,
    /// Lock answer; granted when unset.
    lock: Option<LockReply>,
    /// Rendered items the daemon refuses to add.
    rejected: Vec<String>,
    /// Resolution replies.
    resolutions: VecDeque<Resolution>,
    /// Run replies.
    runs: VecDeque<RunReply>,
    /// Keys published by runs answering with status 1.
    keys: VecDeque<GpgConfirmation>,
    /// Key published by the last run.
    pending: Option<GpgConfirmation>,
    /// Listing rows per wire filter.
    packages: HashMap<&'static str, Vec<PackageInfo>>,
    /// Fault injected for one method name.
    failing: Option<(&'static str, BackendFault)>,
}

/// Pop the next reply, keeping the last one for later calls.
fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// In-process stand-in for the DNF system daemon.
#[derive(Clone, Default)]
pub struct FakeDaemon(Arc<Mutex<Script>>);

impl FakeDaemon {
    /// Daemon granting the lock, resolving to an empty plan and running successfully.
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.0.lock().expect("script lock")
    }

    fn record(&self, method: &'static str, call: String) -> Result<(), BackendFault> {
        let mut script = self.script();
        script.calls.push(call);
        match &script.failing {
            Some((name, fault)) if *name == method => Err(fault.clone()),
            _ => Ok(()),
        }
    }

    /// Answer `Lock` with `reply`.
    pub fn with_lock(self, reply: LockReply) -> Self {
        self.script().lock = Some(reply);
        self
    }

    /// Refuse to add the item rendered as `item`.
    pub fn rejecting(self, item: &str) -> Self {
        self.script().rejected.push(item.to_string());
        self
    }

    /// Queue a resolution reply.
    pub fn resolving(self, resolution: Resolution) -> Self {
        self.script().resolutions.push_back(resolution);
        self
    }

    /// Queue a run reply with `status`.
    pub fn running(self, status: i32, messages: &[&str]) -> Self {
        self.script().runs.push_back(RunReply {
            status,
            messages: messages.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Queue a signing key for the next run answering with status 1.
    pub fn publishing_key(self, key_id: &str) -> Self {
        self.script().keys.push_back(GpgConfirmation {
            package: PackageId::new("tool,0,2.0,1.fc40,x86_64,thirdparty"),
            user_id: "Third Party <keys@example.org>".to_string(),
            key_id: key_id.to_string(),
            key_url: "https://example.org/RPM-GPG-KEY".to_string(),
            timestamp: 1_700_000_000,
        });
        self
    }

    /// Serve `rows` for `filter`.
    pub fn listing(self, filter: PackageFilter, rows: Vec<PackageInfo>) -> Self {
        self.script().packages.insert(filter.as_wire(), rows);
        self
    }

    /// Fail every call of `method` with `fault`.
    pub fn failing(self, method: &'static str, fault: BackendFault) -> Self {
        self.script().failing = Some((method, fault));
        self
    }

    fn next_resolution(&self) -> Resolution {
        let mut script = self.script();
        next(&mut script.resolutions)
            .unwrap_or_else(|| Resolution::Resolved(TransactionPlan::default()))
    }

    /// Recorded calls.
    pub fn calls(&self) -> Vec<String> {
        self.script().calls.clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl Backend for FakeDaemon {
    fn lock(&self) -> Result<LockReply, BackendFault> {
        self.record("Lock", "Lock".into())?;
        Ok(self.script().lock.clone().unwrap_or(LockReply::Granted))
    }

    fn unlock(&self) -> Result<(), BackendFault> {
        self.record("Unlock", "Unlock".into())
    }

    fn exit(&self) -> Result<(), BackendFault> {
        self.record("Exit", "Exit".into())
    }

    fn expire_cache(&self) -> Result<bool, BackendFault> {
        self.record("ExpireCache", "ExpireCache".into())?;
        Ok(true)
    }

    fn clear_transaction(&self) -> Result<(), BackendFault> {
        self.record("ClearTransaction", "ClearTransaction".into())
    }

    fn add_to_transaction(&self, item: &TransactionItem) -> Result<bool, BackendFault> {
        let rendered = item.to_string();
        self.record("AddTransaction", format!("AddTransaction({rendered})"))?;
        Ok(!self.script().rejected.contains(&rendered))
    }

    fn resolve_transaction(&self) -> Result<Resolution, BackendFault> {
        self.record("BuildTransaction", "BuildTransaction".into())?;
        Ok(self.next_resolution())
    }

    fn get_transaction(&self) -> Result<Resolution, BackendFault> {
        self.record("GetTransaction", "GetTransaction".into())?;
        Ok(self.next_resolution())
    }

    fn run_transaction(&self) -> Result<RunReply, BackendFault> {
        self.record("RunTransaction", "RunTransaction".into())?;
        let mut script = self.script();
        let reply = next(&mut script.runs).unwrap_or(RunReply {
            status: 0,
            messages: Vec::new(),
        });
        if reply.status == 1 {
            script.pending = script.keys.pop_front();
        }
        Ok(reply)
    }

    fn confirm_signing_key(&self, key_id: &str, trusted: bool) -> Result<(), BackendFault> {
        self.record("ConfirmGPGImport", format!("ConfirmGPGImport({key_id},{trusted})"))
    }

    fn pending_key_confirmation(&self) -> Result<Option<GpgConfirmation>, BackendFault> {
        Ok(self.script().pending.take())
    }

    fn list_packages(&self, filter: PackageFilter) -> Result<Vec<PackageInfo>, BackendFault> {
        self.record("GetPackages", format!("GetPackages({})", filter.as_wire()))?;
        Ok(self
            .script()
            .packages
            .get(filter.as_wire())
            .cloned()
            .unwrap_or_default())
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
        Ok(Vec::new())
    }

    fn list_groups(&self) -> Result<Vec<GroupCategory>, BackendFault> {
        self.record("GetGroups", "GetGroups".into())?;
        Ok(Vec::new())
    }

    fn history(&self, start_days: u32, end_days: u32) -> Result<Vec<HistoryEntry>, BackendFault> {
        self.record(
            "GetHistoryByDays",
            format!("GetHistoryByDays({start_days},{end_days})"),
        )?;
        Ok(Vec::new())
    }

    fn undo_history(&self, id: i64) -> Result<UndoReply, BackendFault> {
        self.record("HistoryUndo", format!("HistoryUndo({id})"))?;
        Ok(UndoReply {
            ok: true,
            messages: Vec::new(),
        })
    }
}

/// Frontend recording every interaction as a short event string.
pub struct RecordingUi {
    /// Events in order.
    pub events: Vec<String>,
    /// Answer to plan confirmations.
    pub accept_plan: bool,
    /// Answer to key imports.
    pub accept_key: bool,
    /// Answer to questions.
    pub answer: bool,
}

impl Default for RecordingUi {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            accept_plan: true,
            accept_key: true,
            answer: false,
        }
    }
}

impl RecordingUi {
    /// Events starting with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    /// The working indicator went on and off exactly once.
    pub fn assert_single_working_cycle(&self) {
        assert_eq!(
            self.with_prefix("working:"),
            vec!["working:true", "working:false"],
            "events: {:?}",
            self.events
        );
    }
}

impl Frontend for RecordingUi {
    fn set_working(&mut self, working: bool) {
        self.events.push(format!("working:{working}"));
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
        self.accept_plan
    }

    fn confirm_key_import(&mut self, request: &GpgConfirmation) -> bool {
        self.events.push(format!("confirm_key:{}", request.key_id));
        self.accept_key
    }

    fn ask(&mut self, question: &str) -> bool {
        self.events.push(format!("ask:{question}"));
        self.answer
    }

    fn show_packages(&mut self, rows: &[PackageInfo]) {
        self.events.push(format!("packages:{}", rows.len()));
    }
}

/// Plan installing one package per name.
pub fn install_plan(names: &[&str]) -> TransactionPlan {
    plan(names, PlanOperation::Install)
}

/// Plan removing one package per name.
pub fn removal_plan(names: &[&str]) -> TransactionPlan {
    plan(names, PlanOperation::Remove)
}

fn plan(names: &[&str], operation: PlanOperation) -> TransactionPlan {
    TransactionPlan {
        entries: names
            .iter()
            .map(|n| PlanEntry {
                operation: operation.clone(),
                package: PackageId::new(format!("{n},0,1.0,1.fc40,x86_64,fedora")),
                size: 2048,
                replaces: Vec::new(),
            })
            .collect(),
    }
}

/// Store whose system refresh marker lies in the future.
pub fn fresh_store() -> Box<dyn ConfigStore> {
    let mut map = HashMap::new();
    map.insert(
        keys::SYSTEM_REFRESH.to_string(),
        "2999-01-01 00:00".to_string(),
    );
    Box::new(map)
}

/// Session connecting to clones of `daemon`.
pub fn session(daemon: &FakeDaemon) -> BackendSession<FakeDaemon> {
    let daemon = daemon.clone();
    BackendSession::new(
        Box::new(move || Ok(daemon.clone())),
        fresh_store(),
        RefreshPolicy::new(6),
    )
}

/// Orchestrator protecting `dnf` and `glibc` with a two-key limit.
pub fn orchestrator(daemon: &FakeDaemon) -> TransactionOrchestrator<FakeDaemon> {
    let config = OrchestratorConfig {
        protected: ["dnf", "glibc"].iter().map(ToString::to_string).collect(),
        gpg_retry_limit: 2,
        newest_only: true,
        history_days: 90,
    };
    TransactionOrchestrator::new(session(daemon), config)
}
