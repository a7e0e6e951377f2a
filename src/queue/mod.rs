//! Client-side pending action queue.
//!
//! The queue holds what the user asked for but has not been sent to the
//! daemon yet. Each package appears under at most one [`ActionKind`]; group
//! actions are tracked separately. Iteration follows insertion order so the
//! transaction request built from it is deterministic.

mod request;

pub use request::{TransactionItem, TransactionRequest};

use std::collections::HashMap;
use std::fmt;

use crate::backend::PackageId;

/// Per-package action kinds accepted by the daemon's `AddTransaction` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    /// Install an available package.
    Install,
    /// Update an installed package.
    Update,
    /// Remove an installed package.
    Remove,
    /// Replace an obsoleted package.
    Obsolete,
    /// Reinstall the installed version.
    Reinstall,
    /// Downgrade to an older version.
    Downgrade,
}

impl ActionKind {
    /// Submission order used when flattening the queue into a request.
    pub const ALL: [Self; 6] = [
        Self::Install,
        Self::Update,
        Self::Remove,
        Self::Obsolete,
        Self::Reinstall,
        Self::Downgrade,
    ];

    /// Action string understood by the daemon.
    #[must_use]
    pub const fn as_backend_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Obsolete => "obsolete",
            Self::Reinstall => "reinstall",
            Self::Downgrade => "downgrade",
        }
    }

    /// Parse a daemon action string (also accepts the short queue codes).
    #[must_use]
    pub fn from_backend_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "install" | "i" => Some(Self::Install),
            "update" | "u" => Some(Self::Update),
            "remove" | "r" => Some(Self::Remove),
            "obsolete" | "o" => Some(Self::Obsolete),
            "reinstall" | "ri" => Some(Self::Reinstall),
            "downgrade" | "do" => Some(Self::Downgrade),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_backend_str())
    }
}

/// Group-level actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupAction {
    /// Install every mandatory/default member of the group.
    Install,
    /// Remove the group.
    Remove,
}

impl GroupAction {
    /// Display/log form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for GroupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot in the queue: the action plus an insertion sequence number.
#[derive(Debug, Clone, Copy)]
struct Slot<A> {
    /// Pending action.
    action: A,
    /// Insertion order; refreshed when the action kind changes.
    seq: u64,
}

/// What: Ordered, deduplicated set of pending package and group actions.
///
/// Inputs:
/// - Mutated by `add`/`remove`/`add_group`/`remove_group` from UI handlers.
///
/// Output:
/// - `get`/`packages`/`groups` in insertion order; `total` as the
///   "nothing to do" guard.
///
/// Details:
/// - Re-adding a package under a new kind moves it; under the same kind it
///   keeps its original position.
/// - Cleared wholesale only after a successful transaction.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Package id to pending action.
    packages: HashMap<PackageId, Slot<ActionKind>>,
    /// Group id to pending group action.
    groups: HashMap<String, Slot<GroupAction>>,
    /// Next insertion sequence number.
    next_seq: u64,
}

impl Queue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next insertion sequence number.
    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// What: Queue `action` for `pkg`, replacing any other pending action for it.
    ///
    /// Inputs:
    /// - `pkg`: Package reference.
    /// - `action`: Kind to queue it under.
    ///
    /// Output:
    /// - Previously queued kind for `pkg`, if any.
    pub fn add(&mut self, pkg: PackageId, action: ActionKind) -> Option<ActionKind> {
        if let Some(slot) = self.packages.get(&pkg)
            && slot.action == action
        {
            return Some(action);
        }
        let seq = self.bump();
        tracing::debug!(pkg = %pkg, action = %action, "[Queue] add");
        self.packages
            .insert(pkg, Slot { action, seq })
            .map(|old| old.action)
    }

    /// Drop any pending action for `pkg`; returns what was removed.
    pub fn remove(&mut self, pkg: &PackageId) -> Option<ActionKind> {
        let removed = self.packages.remove(pkg).map(|slot| slot.action);
        if removed.is_some() {
            tracing::debug!(pkg = %pkg, "[Queue] remove");
        }
        removed
    }

    /// Queue a group action, replacing any pending action for the same group.
    pub fn add_group(&mut self, group_id: &str, action: GroupAction) -> Option<GroupAction> {
        if let Some(slot) = self.groups.get_mut(group_id) {
            let old = slot.action;
            slot.action = action;
            return Some(old);
        }
        let seq = self.bump();
        tracing::debug!(group = %group_id, action = %action, "[Queue] add group");
        self.groups
            .insert(group_id.to_string(), Slot { action, seq });
        None
    }

    /// Drop any pending action for `group_id`.
    pub fn remove_group(&mut self, group_id: &str) -> Option<GroupAction> {
        self.groups.remove(group_id).map(|slot| slot.action)
    }

    /// Pending kind for `pkg`.
    #[must_use]
    pub fn action_for(&self, pkg: &PackageId) -> Option<ActionKind> {
        self.packages.get(pkg).map(|slot| slot.action)
    }

    /// Packages queued under `action`, in insertion order.
    #[must_use]
    pub fn get(&self, action: ActionKind) -> Vec<&PackageId> {
        let mut items: Vec<(&PackageId, u64)> = self
            .packages
            .iter()
            .filter(|(_, slot)| slot.action == action)
            .map(|(pkg, slot)| (pkg, slot.seq))
            .collect();
        items.sort_by_key(|(_, seq)| *seq);
        items.into_iter().map(|(pkg, _)| pkg).collect()
    }

    /// All `(package, kind)` pairs in submission order (kind order, then insertion order).
    #[must_use]
    pub fn packages(&self) -> Vec<(&PackageId, ActionKind)> {
        ActionKind::ALL
            .iter()
            .flat_map(|kind| self.get(*kind).into_iter().map(move |pkg| (pkg, *kind)))
            .collect()
    }

    /// `(group id, action)` pairs in insertion order.
    #[must_use]
    pub fn groups(&self) -> Vec<(&str, GroupAction)> {
        let mut items: Vec<(&str, GroupAction, u64)> = self
            .groups
            .iter()
            .map(|(id, slot)| (id.as_str(), slot.action, slot.seq))
            .collect();
        items.sort_by_key(|(_, _, seq)| *seq);
        items
            .into_iter()
            .map(|(id, action, _)| (id, action))
            .collect()
    }

    /// Count of all pending package and group actions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.packages.len() + self.groups.len()
    }

    /// `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Forget everything. Only called after a confirmed, successful transaction.
    pub fn clear(&mut self) {
        tracing::debug!(total = self.total(), "[Queue] clear");
        self.packages.clear();
        self.groups.clear();
    }
}
