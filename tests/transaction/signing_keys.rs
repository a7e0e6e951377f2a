//! Integration tests for signing-key confirmation during a run.

use yumex::backend::{PackageId, Resolution};
use yumex::queue::ActionKind;
use yumex::transaction::{ApplyOptions, ApplyOutcome, TransactionError};

use crate::support::{FakeDaemon, RecordingUi, install_plan, orchestrator};

/// Orchestrator over `daemon` with `tool` queued for install.
fn queued(daemon: &FakeDaemon) -> yumex::transaction::TransactionOrchestrator<FakeDaemon> {
    let mut orch = orchestrator(daemon);
    orch.queue_mut().add(PackageId::new("tool"), ActionKind::Install);
    orch
}

#[test]
/// What: An approved key is confirmed and the transaction rebuilt and rerun.
///
/// Inputs:
/// - First run asks for key `5323552A`, second run succeeds.
///
/// Output:
/// - `Completed`; one confirmation; two builds and two runs.
fn approved_key_reruns_transaction() {
    let daemon = FakeDaemon::new()
        .resolving(Resolution::Resolved(install_plan(&["tool"])))
        .running(1, &[])
        .running(0, &[])
        .publishing_key("5323552A");
    let mut orch = queued(&daemon);
    let mut ui = RecordingUi::default();

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert_eq!(outcome, ApplyOutcome::Completed);
    assert_eq!(ui.with_prefix("confirm_key:"), vec!["confirm_key:5323552A"]);
    assert_eq!(daemon.count("ConfirmGPGImport(5323552A,true)"), 1);
    assert_eq!(daemon.count("BuildTransaction"), 2);
    assert_eq!(daemon.count("RunTransaction"), 2);
    assert!(orch.queue().is_empty());
    ui.assert_single_working_cycle();
}

#[test]
/// What: Declining a key cancels and keeps the queue.
///
/// Inputs:
/// - Run asking for a key; frontend declines.
///
/// Output:
/// - `Cancelled`; no confirmation sent to the daemon.
fn declined_key_cancels() {
    let daemon = FakeDaemon::new()
        .resolving(Resolution::Resolved(install_plan(&["tool"])))
        .running(1, &[])
        .publishing_key("5323552A");
    let mut orch = queued(&daemon);
    let mut ui = RecordingUi {
        accept_key: false,
        ..RecordingUi::default()
    };

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert_eq!(outcome, ApplyOutcome::Cancelled);
    assert_eq!(daemon.count("ConfirmGPGImport"), 0);
    assert_eq!(orch.queue().total(), 1);
}

#[test]
/// What: The same key requested again after confirmation is a signature error.
///
/// Inputs:
/// - Every run asks for key `AAAA`.
///
/// Output:
/// - `Rejected(SignatureVerification)` after one confirmation; lock released.
fn repeated_key_fails_verification() {
    let daemon = FakeDaemon::new()
        .resolving(Resolution::Resolved(install_plan(&["tool"])))
        .running(1, &[])
        .publishing_key("AAAA")
        .publishing_key("AAAA");
    let mut orch = queued(&daemon);
    let mut ui = RecordingUi::default();

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert!(matches!(
        outcome,
        ApplyOutcome::Rejected(TransactionError::SignatureVerification(_))
    ));
    assert_eq!(daemon.count("ConfirmGPGImport"), 1);
    assert_eq!(daemon.count("Unlock"), 1);
    assert_eq!(orch.queue().total(), 1);
}

#[test]
/// What: Key rounds stop at the configured limit.
///
/// Inputs:
/// - Limit of two; every run asks for a new key.
///
/// Output:
/// - Two confirmations, then `Rejected(SignatureVerification)`.
fn key_rounds_are_bounded() {
    let daemon = FakeDaemon::new()
        .resolving(Resolution::Resolved(install_plan(&["tool"])))
        .running(1, &[])
        .publishing_key("K1")
        .publishing_key("K2")
        .publishing_key("K3");
    let mut orch = queued(&daemon);
    let mut ui = RecordingUi::default();

    let outcome = orch.apply(&mut ui, ApplyOptions::default()).expect("no fatal error");

    assert!(matches!(
        outcome,
        ApplyOutcome::Rejected(TransactionError::SignatureVerification(_))
    ));
    assert_eq!(daemon.count("ConfirmGPGImport"), 2);
    assert_eq!(daemon.count("RunTransaction"), 3);
    ui.assert_single_working_cycle();
}
