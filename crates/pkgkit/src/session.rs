//! Per-run package-manager session.

/// State shared by every package-manager call within one installation run.
///
/// Holds the refresh memoization flag. Create one per run and pass it to
/// every [`crate::PackageManager`] operation that may touch the cache.
#[derive(Debug, Default)]
pub struct Session {
    refreshed: bool,
    refresh_count: usize,
}

impl Session {
    /// Create a session with no refresh performed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether package metadata is considered fresh.
    pub fn is_refreshed(&self) -> bool {
        self.refreshed
    }

    /// Number of refreshes actually executed in this session.
    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    pub(crate) fn mark_refreshed(&mut self) {
        self.refreshed = true;
        self.refresh_count += 1;
    }

    /// Force the next install to refresh package metadata again.
    pub fn invalidate(&mut self) {
        if self.refreshed {
            log::debug!("Package metadata invalidated; next install will refresh");
        }
        self.refreshed = false;
    }
}
