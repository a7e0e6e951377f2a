use std::fmt;

use super::{ActionKind, GroupAction, Queue};
use crate::backend::PackageId;

/// One entry submitted to the daemon's "add to transaction" call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionItem {
    /// Package-level action.
    Package {
        /// Package reference.
        pkg: PackageId,
        /// Requested kind.
        action: ActionKind,
    },
    /// Group-level action.
    Group {
        /// Group id.
        id: String,
        /// Requested action.
        action: GroupAction,
    },
}

impl fmt::Display for TransactionItem {
    /// Renders the form used in build-error reports: `install : foo`,
    /// `group : remove : core`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package { pkg, action } => write!(f, "{action} : {pkg}"),
            Self::Group { id, action } => write!(f, "group : {action} : {id}"),
        }
    }
}

/// The flattened queue, in the order it is submitted to the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Items in submission order: packages by kind, then groups.
    pub items: Vec<TransactionItem>,
}

impl TransactionRequest {
    /// Snapshot the current queue contents.
    #[must_use]
    pub fn from_queue(queue: &Queue) -> Self {
        let mut items: Vec<TransactionItem> = queue
            .packages()
            .into_iter()
            .map(|(pkg, action)| TransactionItem::Package {
                pkg: pkg.clone(),
                action,
            })
            .collect();
        items.extend(
            queue
                .groups()
                .into_iter()
                .map(|(id, action)| TransactionItem::Group {
                    id: id.to_string(),
                    action,
                }),
        );
        Self { items }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when there is nothing to submit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
