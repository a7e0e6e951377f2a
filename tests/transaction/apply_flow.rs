//! Integration tests for applying the queue.
//!
//! Tests cover:
//! - Successful run with resynchronization
//! - Build errors, protected-package veto and declined plans keeping the queue
//! - Download errors releasing the daemon lock
//! - Lock refusal escaping as a process-fatal error

use yumex::backend::{FaultKind, LockReply, LOCK_REASON_LOCKED_BY_OTHER, PackageId, Resolution};
use yumex::queue::{ActionKind, GroupAction};
use yumex::session::SessionError;
use yumex::transaction::{ApplyOptions, ApplyOutcome, OrchestratorError, TransactionError, TxState};

use crate::support::{FakeDaemon, RecordingUi, install_plan, orchestrator, removal_plan};

#[test]
/// What: A resolved, confirmed and executed queue completes.
///
/// Inputs:
/// - Queue with `install foo`, daemon resolving to a one-entry plan.
///
/// Output:
/// - `Completed`, empty queue, lock released then re-taken for the resync.
///
/// Details:
/// - The working indicator toggles exactly once around the attempt.
fn successful_install_clears_queue_and_resyncs() {
    let daemon = FakeDaemon::new().resolving(Resolution::Resolved(install_plan(&["foo"])));
    let mut orch = orchestrator(&daemon);
    orch.queue_mut().add(PackageId::new("foo"), ActionKind::Install);
    let mut ui = RecordingUi::default();

    let outcome = orch
        .apply(&mut ui, ApplyOptions::default())
        .expect("no fatal error");

    assert_eq!(outcome, ApplyOutcome::Completed);
    assert!(orch.queue().is_empty());
    assert_eq!(orch.state(), TxState::Idle);
    assert_eq!(
        daemon.calls()[..5],
        [
            "Lock",
            "ClearTransaction",
            "AddTransaction(install : foo)",
            "BuildTransaction",
            "RunTransaction",
        ]
    );
    assert_eq!(daemon.count("Unlock"), 1);
    assert_eq!(daemon.count("Lock"), 2);
    assert_eq!(daemon.count("GetGroups"), 1);
    assert_eq!(ui.with_prefix("confirm_plan:"), vec!["confirm_plan:1"]);
    assert_eq!(ui.with_prefix("packages:").len(), 1);
    ui.assert_single_working_cycle();
}

#[test]
/// What: Items rejected by the daemon abort before resolution.
///
/// Inputs:
/// - Queue with two packages and one group; the daemon rejects `install : bad`.
///
/// Output:
/// - `Rejected(Build)` naming only the rejected item; queue and lock kept.
fn rejected_items_keep_queue_and_lock() {
    let daemon = FakeDaemon::new().rejecting("install : bad");
    let mut orch = orchestrator(&daemon);
    orch.queue_mut().add(PackageId::new("good"), ActionKind::Install);
    orch.queue_mut().add(PackageId::new("bad"), ActionKind::Install);
    orch.queue_mut().add_group("core", GroupAction::Install);
    let mut ui = RecordingUi::default();

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert_eq!(
        outcome,
        ApplyOutcome::Rejected(TransactionError::Build(vec!["install : bad".to_string()]))
    );
    assert_eq!(orch.queue().total(), 3);
    assert_eq!(daemon.count("AddTransaction"), 3);
    assert_eq!(daemon.count("BuildTransaction"), 0);
    assert_eq!(daemon.count("Unlock"), 0);
    assert_eq!(
        ui.with_prefix("details:"),
        vec!["details:Error(s) in building transaction|install : bad"]
    );
    ui.assert_single_working_cycle();
}

#[test]
/// What: A plan removing a protected package never runs.
///
/// Inputs:
/// - Queue removing `foo`; the plan also removes `glibc`.
///
/// Output:
/// - `Rejected(ProtectedPackage(["glibc"]))` without asking for confirmation.
fn protected_removal_is_vetoed() {
    let daemon =
        FakeDaemon::new().resolving(Resolution::Resolved(removal_plan(&["foo", "glibc"])));
    let mut orch = orchestrator(&daemon);
    orch.queue_mut().add(PackageId::new("foo"), ActionKind::Remove);
    let mut ui = RecordingUi::default();

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert_eq!(
        outcome,
        ApplyOutcome::Rejected(TransactionError::ProtectedPackage(vec!["glibc".to_string()]))
    );
    assert!(ui.with_prefix("confirm_plan:").is_empty());
    assert_eq!(daemon.count("RunTransaction"), 0);
    assert_eq!(orch.queue().total(), 1);
}

#[test]
/// What: Declining the plan cancels quietly.
///
/// Inputs:
/// - Frontend answering "no" to the plan.
///
/// Output:
/// - `Cancelled`, queue kept, nothing executed, no error dialog.
fn declined_plan_cancels() {
    let daemon = FakeDaemon::new().resolving(Resolution::Resolved(install_plan(&["foo"])));
    let mut orch = orchestrator(&daemon);
    orch.queue_mut().add(PackageId::new("foo"), ActionKind::Install);
    let mut ui = RecordingUi {
        accept_plan: false,
        ..RecordingUi::default()
    };

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert_eq!(outcome, ApplyOutcome::Cancelled);
    assert_eq!(orch.queue().total(), 1);
    assert_eq!(daemon.count("RunTransaction"), 0);
    assert!(ui.with_prefix("details:").is_empty());
    ui.assert_single_working_cycle();
}

#[test]
/// What: Run status 4 reports a download error and releases the lock.
///
/// Inputs:
/// - Daemon answering the run with status 4 and one message.
///
/// Output:
/// - `Rejected(Download)`; one `Unlock`; queue kept.
fn download_error_releases_session() {
    let daemon = FakeDaemon::new()
        .resolving(Resolution::Resolved(install_plan(&["foo"])))
        .running(4, &["mirror timed out"]);
    let mut orch = orchestrator(&daemon);
    orch.queue_mut().add(PackageId::new("foo"), ActionKind::Install);
    let mut ui = RecordingUi::default();

    let outcome = orch
        .apply(
            &mut ui,
            ApplyOptions {
                always_yes: true,
                resync: true,
            },
        )
        .expect("no fatal error");

    assert_eq!(
        outcome,
        ApplyOutcome::Rejected(TransactionError::Download(vec!["mirror timed out".to_string()]))
    );
    assert_eq!(daemon.count("Unlock"), 1);
    assert!(!orch.session_mut().is_locked());
    assert_eq!(orch.queue().total(), 1);
    assert!(ui.with_prefix("confirm_plan:").is_empty());
    assert_eq!(
        ui.with_prefix("details:"),
        vec!["details:Downloading error(s)|mirror timed out"]
    );
}

#[test]
/// What: An empty queue is refused without contacting the daemon.
///
/// Inputs:
/// - Fresh orchestrator.
///
/// Output:
/// - `Rejected(EmptyQueue)`, one message, no working toggle, no daemon calls.
fn empty_queue_is_refused() {
    let daemon = FakeDaemon::new();
    let mut orch = orchestrator(&daemon);
    let mut ui = RecordingUi::default();

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert_eq!(outcome, ApplyOutcome::Rejected(TransactionError::EmptyQueue));
    assert!(daemon.calls().is_empty());
    assert_eq!(ui.events, vec!["message:No pending actions in queue"]);
}

#[test]
/// What: A lock held by another process escapes as a fatal error.
///
/// Inputs:
/// - Daemon denying the lock with the locked-by-other reason.
///
/// Output:
/// - `OrchestratorError::Session(LockedByOther)` classified as `Locked`.
fn lock_held_elsewhere_is_fatal() {
    let daemon = FakeDaemon::new().with_lock(LockReply::Denied {
        reason: LOCK_REASON_LOCKED_BY_OTHER.to_string(),
    });
    let mut orch = orchestrator(&daemon);
    orch.queue_mut().add(PackageId::new("foo"), ActionKind::Update);
    let mut ui = RecordingUi::default();

    let err = orch
        .apply(&mut ui, ApplyOptions::default())
        .expect_err("lock refusal is fatal");

    assert_eq!(err, OrchestratorError::Session(SessionError::LockedByOther));
    assert_eq!(err.classify().kind, FaultKind::Locked);
    assert_eq!(orch.state(), TxState::Idle);
    assert_eq!(orch.queue().total(), 1);
    ui.assert_single_working_cycle();
}
