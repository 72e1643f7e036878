//! Routing collaborator and navigation supersession.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Performs redirects on behalf of the client core.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Hands out one ticket per navigation attempt; only the newest ticket is current.
///
/// A guard decision computed for a superseded ticket must be discarded.
#[derive(Debug, Clone, Default)]
pub struct NavigationTracker {
    latest: Arc<AtomicU64>,
}

impl NavigationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a navigation attempt, superseding every earlier one.
    pub fn begin(&self, path: impl Into<String>) -> NavigationTicket {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        NavigationTicket {
            id,
            path: path.into(),
            latest: Arc::clone(&self.latest),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationTicket {
    id: u64,
    path: String,
    latest: Arc<AtomicU64>,
}

impl NavigationTicket {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_ticket_supersedes_older_ones() {
        let tracker = NavigationTracker::new();
        let first = tracker.begin("/premarital");
        assert!(first.is_current());

        let second = tracker.begin("/applications");
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.path(), "/applications");
    }

    #[test]
    fn clones_share_the_counter() {
        let tracker = NavigationTracker::new();
        let ticket = tracker.begin("/a");
        tracker.clone().begin("/b");
        assert!(!ticket.is_current());
    }
}
