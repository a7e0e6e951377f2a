//! View state and the pure visible-set computation.

use std::collections::HashMap;

use crate::backend::{PackageFilter, PackageInfo};

/// Which package list is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Available updates and obsoleting packages.
    #[default]
    Updates,
    /// Installed packages.
    Installed,
    /// Available, not installed.
    Available,
    /// Everything.
    All,
}

impl ViewMode {
    /// Parse a mode name as typed on the console.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "updates" => Some(Self::Updates),
            "installed" => Some(Self::Installed),
            "available" => Some(Self::Available),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Orchestrator-owned view state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Current list.
    pub mode: ViewMode,
    /// Active name search, if any.
    pub search: Option<String>,
}

impl ViewState {
    /// Back to the default updates list without a search.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Rows fetched from the daemon, by listing filter, plus the last search result.
#[derive(Debug, Clone, Default)]
pub struct Listings {
    /// Listing replies.
    pub by_filter: HashMap<PackageFilter, Vec<PackageInfo>>,
    /// Rows returned by the active search.
    pub search: Vec<PackageInfo>,
}

impl Listings {
    /// Rows for `filter`, empty when not loaded.
    #[must_use]
    pub fn rows(&self, filter: PackageFilter) -> &[PackageInfo] {
        self.by_filter
            .get(&filter)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// What: Listing filters needed to render `view`.
///
/// Inputs:
/// - `view`: Current view state.
/// - `newest_only`: Show only the newest update per package.
///
/// Output:
/// - Filters to load; empty when a search is active (search rows are used instead).
#[must_use]
pub fn required_filters(view: &ViewState, newest_only: bool) -> Vec<PackageFilter> {
    if view.search.is_some() {
        return Vec::new();
    }
    match view.mode {
        ViewMode::Updates => vec![
            if newest_only {
                PackageFilter::Updates
            } else {
                PackageFilter::UpdatesAll
            },
            PackageFilter::Obsoletes,
        ],
        ViewMode::Installed => vec![PackageFilter::Installed],
        ViewMode::Available => vec![PackageFilter::Available],
        ViewMode::All => vec![PackageFilter::All],
    }
}

/// What: Compute the rows visible for `view`.
///
/// Inputs:
/// - `view`: Current view state.
/// - `listings`: Rows already fetched.
/// - `newest_only`: Same flag given to [`required_filters`].
///
/// Output:
/// - Visible rows in listing order.
///
/// Details:
/// - Without a search each mode maps to its listing; updates merges the update
///   and obsolete listings.
/// - With a search the search rows are narrowed by mode: updates keeps rows
///   whose default action is `u` or `o`, installed keeps installed rows,
///   available keeps rows whose default action is `i`.
#[must_use]
pub fn visible_packages(
    view: &ViewState,
    listings: &Listings,
    newest_only: bool,
) -> Vec<PackageInfo> {
    if view.search.is_some() {
        return listings
            .search
            .iter()
            .filter(|p| match view.mode {
                ViewMode::Updates => matches!(p.action.as_str(), "u" | "o"),
                ViewMode::Installed => p.is_installed(),
                ViewMode::Available => p.action == "i",
                ViewMode::All => true,
            })
            .cloned()
            .collect();
    }
    required_filters(view, newest_only)
        .into_iter()
        .flat_map(|f| listings.rows(f).iter().cloned())
        .collect()
}
