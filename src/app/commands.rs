//! Console command parsing.

use yumex::backend::PackageId;
use yumex::frontend::ViewMode;
use yumex::queue::{ActionKind, GroupAction};

/// One line typed at the console prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Queue a package action.
    Queue(ActionKind, PackageId),
    /// Queue a group action.
    QueueGroup(GroupAction, String),
    /// Drop a package from the queue.
    Unqueue(PackageId),
    /// Drop a group from the queue.
    UnqueueGroup(String),
    /// Print the queue.
    ShowQueue,
    /// Apply the queue.
    Apply,
    /// Switch the package list.
    View(ViewMode),
    /// Search package names.
    Search(String),
    /// Drop the search.
    ClearSearch,
    /// Print the category/group tree.
    Groups,
    /// Print the history.
    History,
    /// Undo a history transaction.
    Undo(i64),
    /// Reload updates and publish their count.
    CheckUpdates,
    /// Refresh metadata now.
    Refresh,
    /// Print the command list.
    Help,
    /// Leave.
    Quit,
}

/// Help text printed by `help`.
pub const HELP: &str = "\
commands:
  install|update|remove|reinstall|downgrade|obsolete <pkg>   queue a package action
  group-install|group-remove <group>                         queue a group action
  unqueue <pkg> | unqueue-group <group>                      drop a queued action
  queue                                                      show pending actions
  apply                                                      apply pending actions
  view updates|installed|available|all                       switch the package list
  search <pattern> | clear                                   search package names
  groups | history | undo <id>                               groups and history
  check | refresh                                            check updates, refresh metadata
  help | quit";

/// What: Parse one console line.
///
/// Inputs:
/// - `line`: Trimmed input line.
///
/// Output:
/// - `Ok(None)` for an empty line, `Ok(Some(cmd))` for a command, `Err(msg)`
///   with a usage hint otherwise.
///
/// # Errors
/// - Unknown command or missing/invalid argument.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.collect::<Vec<_>>().join(" ");
    let need = |what: &str| {
        if arg.is_empty() {
            Err(format!("{verb}: missing {what}"))
        } else {
            Ok(arg.clone())
        }
    };
    let cmd = match verb {
        "group-install" => Command::QueueGroup(GroupAction::Install, need("group id")?),
        "group-remove" => Command::QueueGroup(GroupAction::Remove, need("group id")?),
        "unqueue" => Command::Unqueue(PackageId::new(need("package")?)),
        "unqueue-group" => Command::UnqueueGroup(need("group id")?),
        "queue" => Command::ShowQueue,
        "apply" => Command::Apply,
        "view" => {
            let name = need("view name")?;
            Command::View(
                ViewMode::from_name(&name).ok_or_else(|| format!("view: unknown list '{name}'"))?,
            )
        }
        "search" => Command::Search(need("pattern")?),
        "clear" => Command::ClearSearch,
        "groups" => Command::Groups,
        "history" => Command::History,
        "undo" => {
            let raw = need("history id")?;
            Command::Undo(
                raw.parse()
                    .map_err(|_| format!("undo: '{raw}' is not a history id"))?,
            )
        }
        "check" => Command::CheckUpdates,
        "refresh" => Command::Refresh,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => match ActionKind::from_backend_str(other) {
            Some(kind) => Command::Queue(kind, PackageId::new(need("package")?)),
            None => return Err(format!("unknown command '{other}', try 'help'")),
        },
    };
    Ok(Some(cmd))
}
