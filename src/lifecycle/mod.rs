//! Process startup and shutdown around the orchestration core.
//!
//! Startup claims the single-instance registry; shutdown (normal or fatal)
//! clears the presence flags and releases the daemon session. Fatal shutdown
//! is the one place a classified fault turns into exit status 1.


use crate::backend::{Backend, ClassifiedFault};
use crate::config::Settings;
use crate::frontend::Frontend;
use crate::presence::{Notifier, Presence, best_effort};
use crate::session::BackendSession;

/// Exit status of every classified fatal error.
pub const EXIT_FATAL: u8 = 1;

/// Result of the single-instance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// This process is now the registered instance.
    Claimed,
    /// Another instance is running and was asked to show itself or quit.
    AlreadyRunning {
        /// Pid of the running instance.
        pid: i32,
    },
    /// The registry refused this process.
    Refused,
}

/// What: Register this process as the running instance.
///
/// Inputs:
/// - `presence`: Registry and notifier.
/// - `ui`: Used for the "already running" question and the refusal message.
/// - `pid`: This process id.
///
/// Output:
/// - [`Claim`]; callers exit 0 for `AlreadyRunning` and 1 for `Refused`.
///
/// # Errors
/// - [`crate::backend::BackendFault`] when the presence service does not answer.
///
/// Details:
/// - With another instance running the user may ask it to quit; a working
///   instance is shown instead.
pub fn claim_instance(
    presence: &dyn Presence,
    ui: &mut dyn Frontend,
    pid: i32,
) -> Result<Claim, crate::backend::BackendFault> {
    let running = presence.running_pid()?;
    if running > 0 && running != pid {
        tracing::info!(pid = running, "[Lifecycle] yumex is already running");
        let quit = ui.ask(&format!(
            "Yum Extender is already running\nprocess-id : {running}\nDo you want to quit it"
        ));
        if quit && !presence.is_working()? {
            presence.request_quit()?;
        } else {
            presence.request_show()?;
        }
        return Ok(Claim::AlreadyRunning { pid: running });
    }
    if presence.set_running(pid, true)? {
        tracing::debug!(pid, "[Lifecycle] instance registered");
        Ok(Claim::Claimed)
    } else {
        tracing::error!(pid, "[Lifecycle] registry refused this instance");
        ui.show_details(
            "Error in locking notification icon",
            &["Yum Extender will close".to_string()],
        );
        Ok(Claim::Refused)
    }
}

/// What: Tear down after a process-fatal fault.
///
/// Inputs:
/// - `fault`: Classified fault to report.
/// - `session`: Daemon session, released and terminated best-effort.
/// - `presence`: Presence service, if reachable.
/// - `ui`: Shows the message.
/// - `pid`: This process id.
///
/// Output:
/// - [`EXIT_FATAL`].
///
/// Details:
/// - Secondary failures during cleanup are logged and swallowed.
pub fn fatal_shutdown<B: Backend>(
    fault: &ClassifiedFault,
    session: &mut BackendSession<B>,
    presence: Option<&dyn Presence>,
    ui: &mut dyn Frontend,
    pid: i32,
) -> u8 {
    tracing::error!(kind = %fault.kind, message = %fault.message, "[Lifecycle] fatal error");
    ui.show_message(&fault.message);
    session.release_quietly(true);
    if let Some(p) = presence {
        best_effort("SetWorking", p.set_working(false));
        best_effort("SetYumexIsRunning", p.set_running(pid, false).map(|_| ()));
    }
    EXIT_FATAL
}

/// What: Normal shutdown.
///
/// Inputs:
/// - `session`: Daemon session, released with termination.
/// - `presence`: Presence service, if reachable.
/// - `settings`: Decides whether the presence service may exit too.
/// - `pid`: This process id.
///
/// Details:
/// - The registry is only cleared when it still names this process.
pub fn shutdown<B: Backend>(
    session: &mut BackendSession<B>,
    presence: Option<&dyn Presence>,
    settings: &Settings,
    pid: i32,
) {
    if let Some(p) = presence {
        match p.running_pid() {
            Ok(running) if running == pid => {
                best_effort("SetYumexIsRunning", p.set_running(pid, false).map(|_| ()));
                if !settings.autostart && !settings.autocheck_updates {
                    best_effort("Exit", p.exit());
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "[Lifecycle] presence service not answering"),
        }
    }
    session.release_quietly(true);
    tracing::info!("[Lifecycle] shutdown complete");
}

/// What: Ask the presence service and the daemon to exit (`--exit`).
///
/// Inputs:
/// - `notifier`: Presence service, if reachable.
/// - `backend`: Daemon client, if reachable.
pub fn exit_services<B: Backend>(notifier: Option<&dyn Notifier>, backend: Option<&B>) {
    if let Some(n) = notifier {
        best_effort("Exit", n.exit());
    }
    if let Some(b) = backend
        && let Err(e) = b.exit()
    {
        tracing::warn!(error = %e, "[Lifecycle] daemon exit failed");
    }
}
