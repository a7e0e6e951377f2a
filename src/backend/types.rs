//! Value types exchanged with the DNF system daemon.

use std::fmt;

/// Run status: transaction applied.
pub const RUN_SUCCESS: i32 = 0;
/// Run status: an unverified signing key needs confirmation.
pub const RUN_NEEDS_KEY_CONFIRMATION: i32 = 1;
/// Run status: one or more packages failed to download.
pub const RUN_DOWNLOAD_ERROR: i32 = 4;

/// What: Daemon package reference.
///
/// Inputs:
/// - Full ids have the form `name,epoch,version,release,arch,repo_id`; bare
///   names and patterns (`foo`, `*`) are accepted for single-shot requests.
///
/// Output:
/// - [`PackageId::name`] always yields the leading name field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

/// Fields of a full package id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageIdParts<'a> {
    /// Package name.
    pub name: &'a str,
    /// Epoch (often `0`).
    pub epoch: &'a str,
    /// Upstream version.
    pub version: &'a str,
    /// Release.
    pub release: &'a str,
    /// Architecture.
    pub arch: &'a str,
    /// Repository id; installed packages use an `@`-prefixed id.
    pub repo_id: &'a str,
}

impl PackageId {
    /// Wrap a raw id.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw id as sent over the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Package name (first comma-separated field).
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split(',').next().unwrap_or_default().trim()
    }

    /// Split a full six-field id; `None` for bare names.
    #[must_use]
    pub fn parts(&self) -> Option<PackageIdParts<'_>> {
        let mut it = self.0.split(',');
        let parts = PackageIdParts {
            name: it.next()?,
            epoch: it.next()?,
            version: it.next()?,
            release: it.next()?,
            arch: it.next()?,
            repo_id: it.next()?,
        };
        if it.next().is_some() {
            return None;
        }
        Some(parts)
    }

    /// `name-version-release.arch` for display; the raw id for bare names.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.parts().map_or_else(
            || self.0.clone(),
            |p| format!("{}-{}-{}.{}", p.name, p.version, p.release, p.arch),
        )
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Concrete operation kinds found in a resolved plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanOperation {
    /// New package.
    Install,
    /// Newer version of an installed package.
    Update,
    /// Package removal.
    Remove,
    /// Older version.
    Downgrade,
    /// Same version again.
    Reinstall,
    /// Replacement of obsoleted packages.
    Obsolete,
    /// Dependency pulled in by another operation.
    Dependency(String),
}

impl PlanOperation {
    /// Map the daemon's plan section name.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "install" => Self::Install,
            "update" => Self::Update,
            "remove" | "erase" => Self::Remove,
            "downgrade" => Self::Downgrade,
            "reinstall" => Self::Reinstall,
            "obsolete" => Self::Obsolete,
            other => Self::Dependency(other.to_string()),
        }
    }

    /// Section name for display.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Downgrade => "downgrade",
            Self::Reinstall => "reinstall",
            Self::Obsolete => "obsolete",
            Self::Dependency(other) => other,
        }
    }
}

/// One concrete operation in a resolved plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Operation kind.
    pub operation: PlanOperation,
    /// Package the operation applies to.
    pub package: PackageId,
    /// Download or installed size in bytes as reported by the daemon.
    pub size: u64,
    /// Packages replaced by this one.
    pub replaces: Vec<PackageId>,
}

/// Dependency-resolved plan returned by the daemon, in daemon order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPlan {
    /// Ordered operations.
    pub entries: Vec<PlanEntry>,
}

impl TransactionPlan {
    /// `true` when the plan contains no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose operation is a removal.
    pub fn removals(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.operation == PlanOperation::Remove)
    }

    /// Sum of all entry sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Pending signing-key confirmation published by the daemon mid-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpgConfirmation {
    /// Package whose signature triggered the request.
    pub package: PackageId,
    /// Key owner user id.
    pub user_id: String,
    /// Hex key id.
    pub key_id: String,
    /// Where the key was fetched from.
    pub key_url: String,
    /// Key creation timestamp (seconds since the epoch).
    pub timestamp: i64,
}

/// Package listing filters understood by `GetPackages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFilter {
    /// Newest available update per package.
    Updates,
    /// Every available update.
    UpdatesAll,
    /// Obsoleting packages.
    Obsoletes,
    /// Installed packages.
    Installed,
    /// Available, not installed.
    Available,
    /// Everything.
    All,
}

impl PackageFilter {
    /// Filter name on the wire.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Updates => "updates",
            Self::UpdatesAll => "updates_all",
            Self::Obsoletes => "obsoletes",
            Self::Installed => "installed",
            Self::Available => "available",
            Self::All => "all",
        }
    }
}

/// Package row returned by listing and search calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Package reference.
    pub id: PackageId,
    /// One-line summary.
    pub summary: String,
    /// Size in bytes.
    pub size: u64,
    /// Default action code (`i`, `u`, `o`, `r`, ...).
    pub action: String,
}

impl PackageInfo {
    /// Installed packages default to removal or live in an `@` repository.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.action == "r"
            || self
                .id
                .parts()
                .is_some_and(|p| p.repo_id.starts_with('@'))
    }
}

/// A package group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group id used in queue/transaction calls.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Whether the group is installed.
    pub installed: bool,
}

/// A category with its groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCategory {
    /// Category id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Groups in this category.
    pub groups: Vec<GroupInfo>,
}

/// One transaction in the daemon's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Transaction id.
    pub id: i64,
    /// Date as reported by the daemon.
    pub date: String,
}
