//! Application runtime: startup dispatch, the console session and shutdown.

mod commands;

use std::collections::HashMap;
use std::process::ExitCode;
use std::rc::Rc;

use yumex::args::{Args, StartupRequest, process_args};
use yumex::backend::{Backend, DnfSystemClient};
use yumex::config::{ConfigStore, Settings, SettingsFile, settings_path};
use yumex::frontend::{ConsoleFrontend, Frontend};
use yumex::lifecycle::{self, Claim, EXIT_FATAL};
use yumex::presence::{Notifier, Presence, StatusServiceClient};
use yumex::session::{BackendSession, RefreshPolicy};
use yumex::transaction::{
    ApplyOptions, ApplyOutcome, OrchestratorConfig, OrchestratorError, TransactionOrchestrator,
    run_single_shot,
};

use commands::{Command, HELP, parse_command};

/// Console frontend over the process streams.
type Console = ConsoleFrontend<std::io::StdinLock<'static>, std::io::Stdout>;

/// What: Run the application for the parsed command line.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Process exit code: `0` normally, `1` on fatal errors or a refused instance claim.
pub fn run(args: &Args) -> ExitCode {
    let request = process_args(args);
    tracing::debug!(request = ?request, "[App] startup request");

    if request == StartupRequest::ExitServices {
        let status = StatusServiceClient::connect().ok();
        let daemon = DnfSystemClient::connect().ok();
        lifecycle::exit_services(
            status.as_ref().map(|s| s as &dyn Notifier),
            daemon.as_ref(),
        );
        return ExitCode::SUCCESS;
    }

    let mut ui = ConsoleFrontend::new(std::io::stdin().lock(), std::io::stdout());
    let presence = match StatusServiceClient::connect().and_then(|p| p.start().map(|()| p)) {
        Ok(p) => Rc::new(p),
        Err(e) => {
            tracing::error!(error = %e, "[App] status service unavailable");
            ui.show_details(
                "Error in starting notification icon",
                &[format!("{e}\n\nYum Extender will close")],
            );
            return ExitCode::SUCCESS;
        }
    };
    if request == StartupRequest::IconOnly {
        return ExitCode::SUCCESS;
    }
    let mut ui = ui.with_notifier(presence.clone());

    let pid = i32::try_from(std::process::id()).unwrap_or(i32::MAX);
    match lifecycle::claim_instance(presence.as_ref(), &mut ui, pid) {
        Ok(Claim::Claimed) => {}
        Ok(Claim::AlreadyRunning { .. }) => return ExitCode::SUCCESS,
        Ok(Claim::Refused) => return ExitCode::from(EXIT_FATAL),
        Err(e) => {
            tracing::error!(error = %e, "[App] instance check failed");
            ui.show_message(&e.to_string());
            return ExitCode::from(EXIT_FATAL);
        }
    }

    let store = open_store();
    let settings = Settings::load(store.as_ref());
    let session = BackendSession::new(
        Box::new(DnfSystemClient::connect),
        store,
        RefreshPolicy::new(settings.refresh_interval_hours),
    );
    let mut orch = TransactionOrchestrator::new(session, OrchestratorConfig::from(&settings))
        .with_notifier(presence.clone());

    let result = match request {
        StartupRequest::SingleShot { action, always_yes } => {
            run_single_shot(&mut orch, &mut ui, &action, always_yes).map(|_| ())
        }
        StartupRequest::Interactive { minimized } => interactive(&mut orch, &mut ui, minimized),
        StartupRequest::ExitServices | StartupRequest::IconOnly => Ok(()),
    };

    if let Err(e) = result {
        let code = lifecycle::fatal_shutdown(
            &e.classify(),
            orch.session_mut(),
            Some(presence.as_ref() as &dyn Presence),
            &mut ui,
            pid,
        );
        return ExitCode::from(code);
    }
    lifecycle::shutdown(
        orch.session_mut(),
        Some(presence.as_ref() as &dyn Presence),
        &settings,
        pid,
    );
    ExitCode::SUCCESS
}

/// Settings file store, or in-memory defaults when the file cannot be opened.
fn open_store() -> Box<dyn ConfigStore> {
    let path = settings_path();
    match SettingsFile::open(&path) {
        Ok(file) => Box::new(file),
        Err(e) => {
            tracing::warn!(error = %e, "[App] using built-in settings");
            Box::new(HashMap::<String, String>::new())
        }
    }
}

/// What: Console loop of the interactive session.
///
/// # Errors
/// - Process-fatal [`OrchestratorError`]s; recoverable outcomes are reported
///   through the frontend and the loop continues.
fn interactive<B: Backend>(
    orch: &mut TransactionOrchestrator<B>,
    ui: &mut Console,
    minimized: bool,
) -> Result<(), OrchestratorError> {
    if !minimized {
        orch.connect(ui)?;
        orch.reload_groups()?;
        orch.refresh_view(ui)?;
    }
    ui.say(HELP);
    loop {
        ui.prompt("yumex> ");
        let Some(line) = ui.read_line() else {
            return Ok(());
        };
        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                ui.say(&msg);
                continue;
            }
        };
        if cmd == Command::Quit {
            return Ok(());
        }
        execute(orch, ui, cmd)?;
    }
}

/// Run one console command.
fn execute<B: Backend>(
    orch: &mut TransactionOrchestrator<B>,
    ui: &mut Console,
    cmd: Command,
) -> Result<(), OrchestratorError> {
    match cmd {
        Command::Queue(kind, pkg) => {
            if let Some(prev) = orch.queue_mut().add(pkg.clone(), kind)
                && prev != kind
            {
                ui.say(&format!("{}: {prev} -> {kind}", pkg.display_name()));
            }
        }
        Command::QueueGroup(action, id) => {
            orch.queue_mut().add_group(&id, action);
        }
        Command::Unqueue(pkg) => {
            if orch.queue_mut().remove(&pkg).is_none() {
                ui.say(&format!("{pkg} is not queued"));
            }
        }
        Command::UnqueueGroup(id) => {
            if orch.queue_mut().remove_group(&id).is_none() {
                ui.say(&format!("group {id} is not queued"));
            }
        }
        Command::ShowQueue => {
            for (pkg, kind) in orch.queue().packages() {
                ui.say(&format!("  {:<10} {}", kind.as_backend_str(), pkg.display_name()));
            }
            for (id, action) in orch.queue().groups() {
                ui.say(&format!("  group {:<7} {id}", action.as_str()));
            }
            ui.say(&format!("{} pending actions", orch.queue().total()));
        }
        Command::Apply => match orch.apply(ui, ApplyOptions::default())? {
            ApplyOutcome::Completed => ui.say("Transaction completed"),
            ApplyOutcome::Cancelled => ui.say("Transaction cancelled"),
            ApplyOutcome::Rejected(_) => {}
        },
        Command::View(mode) => orch.set_view_mode(ui, mode)?,
        Command::Search(pattern) => orch.search(ui, &pattern)?,
        Command::ClearSearch => orch.clear_search(ui)?,
        Command::Groups => {
            if orch.groups().is_empty() {
                orch.connect(ui)?;
                orch.reload_groups()?;
            }
            let lines: Vec<String> = orch
                .groups()
                .iter()
                .flat_map(|cat| {
                    std::iter::once(cat.name.clone()).chain(cat.groups.iter().map(|g| {
                        let mark = if g.installed { "*" } else { " " };
                        format!("  {mark} {:<30} {}", g.id, g.name)
                    }))
                })
                .collect();
            ui.show_details("Groups", &lines);
        }
        Command::History => {
            orch.connect(ui)?;
            let lines: Vec<String> = orch
                .history()?
                .into_iter()
                .map(|h| format!("{:>6}  {}", h.id, h.date))
                .collect();
            ui.show_details("History", &lines);
        }
        Command::Undo(id) => {
            let outcome = orch.undo_history(ui, id, ApplyOptions::default())?;
            if outcome == ApplyOutcome::Completed {
                ui.say("History undo completed");
            }
        }
        Command::CheckUpdates => {
            orch.connect(ui)?;
            let count = orch.check_for_updates()?;
            ui.say(&format!("{count} updates available"));
        }
        Command::Refresh => {
            if !orch.session_mut().force_refresh()? {
                ui.say("Could not refresh the DNF cache");
            }
            orch.resync(ui)?;
        }
        Command::Help => ui.say(HELP),
        Command::Quit => {}
    }
    Ok(())
}
