use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tailor_common::TabId;

/// Tabs whose panel this controller has enabled.
///
/// Held in memory only and empty after every restart. Advisory: the host's
/// per-tab panel options are authoritative.
///
/// Tabs disabled while still open are kept aside as retired: they are no
/// longer members, but their stored artifacts still need cleanup on close.
#[derive(Debug, Clone, Default)]
pub struct ActivePanelTabs {
    inner: Arc<Mutex<TabSets>>,
}

#[derive(Debug, Default)]
struct TabSets {
    enabled: BTreeSet<TabId>,
    retired: BTreeSet<TabId>,
}

impl ActivePanelTabs {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the sets half-updated.
    fn lock(&self) -> MutexGuard<'_, TabSets> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns `true` if the tab was not already enabled.
    pub fn insert(&self, tab: TabId) -> bool {
        let mut sets = self.lock();
        sets.retired.remove(&tab);
        sets.enabled.insert(tab)
    }

    /// Disable a tab that stays open. Returns `true` if it was enabled.
    pub fn retire(&self, tab: TabId) -> bool {
        let mut sets = self.lock();
        if sets.enabled.remove(&tab) {
            sets.retired.insert(tab);
            true
        } else {
            false
        }
    }

    /// Drop a closed tab. Returns `true` if it was enabled or retired.
    pub fn remove(&self, tab: TabId) -> bool {
        let mut sets = self.lock();
        let enabled = sets.enabled.remove(&tab);
        let retired = sets.retired.remove(&tab);
        enabled || retired
    }

    pub fn contains(&self, tab: TabId) -> bool {
        self.lock().enabled.contains(&tab)
    }

    /// Whether the tab may own stored artifacts that must go when it closes.
    pub fn needs_cleanup(&self, tab: TabId) -> bool {
        let sets = self.lock();
        sets.enabled.contains(&tab) || sets.retired.contains(&tab)
    }

    pub fn snapshot(&self) -> Vec<TabId> {
        self.lock().enabled.iter().copied().collect()
    }
}
