//! Command-line argument definition and processing.

use clap::Parser;

use crate::transaction::SingleShot;

/// Yum Extender - queue package actions and apply them through the DNF system daemon
#[derive(Parser, Debug)]
#[command(name = "yumex")]
#[command(version)]
#[command(about = "Queue package actions and apply them through the DNF system daemon", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Enable debug logging (equivalent to --log-level debug)
    #[arg(short, long)]
    pub debug: bool,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Answer yes/ok to all questions
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Start only the status icon
    #[arg(long)]
    pub icononly: bool,

    /// Tell the session services used by yumex to exit
    #[arg(long)]
    pub exit: bool,

    /// Install package
    #[arg(short = 'I', long, value_name = "PACKAGE", conflicts_with_all = ["remove", "updateall"])]
    pub install: Option<String>,

    /// Remove package
    #[arg(short = 'R', long, value_name = "PACKAGE", conflicts_with = "updateall")]
    pub remove: Option<String>,

    /// Apply all available updates
    #[arg(long)]
    pub updateall: bool,

    /// Start Yum Extender minimized
    #[arg(long)]
    pub minimized: bool,
}

/// What the command line asks the process to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupRequest {
    /// Ask the presence service and the daemon to exit, then exit.
    ExitServices,
    /// Start the presence service only.
    IconOnly,
    /// Run one scripted action.
    SingleShot {
        /// Action to run.
        action: SingleShot,
        /// Skip confirmations.
        always_yes: bool,
    },
    /// Interactive session.
    Interactive {
        /// Start without showing the package list.
        minimized: bool,
    },
}

/// What: Turn parsed arguments into a startup request.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - The request; `--exit` wins over `--icononly`, which wins over the
///   single-shot actions.
#[must_use]
pub fn process_args(args: &Args) -> StartupRequest {
    if args.exit {
        return StartupRequest::ExitServices;
    }
    if args.icononly {
        return StartupRequest::IconOnly;
    }
    let action = if let Some(name) = &args.install {
        Some(SingleShot::Install(name.trim().to_string()))
    } else if let Some(name) = &args.remove {
        Some(SingleShot::Remove(name.trim().to_string()))
    } else if args.updateall {
        Some(SingleShot::UpdateAll)
    } else {
        None
    };
    action.map_or(
        StartupRequest::Interactive {
            minimized: args.minimized,
        },
        |action| StartupRequest::SingleShot {
            action,
            always_yes: args.yes,
        },
    )
}
