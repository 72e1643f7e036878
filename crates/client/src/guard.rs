//! Async route guards: resolve, then authenticate and authorize.

use std::sync::Arc;

use tollgate_auth::{AccessPolicy, Decision, GuardPaths, RouteData, SessionStatus, SessionStore};

use crate::navigation::NavigationTicket;
use crate::resolver::SessionResolver;
use crate::routes::{RouteAccess, RouteTable};

#[derive(Debug, Clone)]
pub struct RouteGuard {
    store: Arc<SessionStore>,
    resolver: SessionResolver,
    policy: AccessPolicy,
}

impl RouteGuard {
    pub fn new(resolver: SessionResolver, paths: GuardPaths) -> Self {
        let store = Arc::clone(resolver.store());
        Self {
            policy: AccessPolicy::new(store.clone(), paths),
            store,
            resolver,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Guard for a protected route.
    pub async fn can_activate(&self, route: &RouteData) -> Decision {
        self.resolve().await;
        self.policy.decide(route)
    }

    /// Reverse guard for the login route.
    pub async fn can_activate_guest_only(&self) -> Decision {
        self.resolve().await;
        self.policy.decide_guest_only()
    }

    /// Decide for a path using the route table. Unknown paths fall back to the
    /// landing page.
    pub async fn check_path(&self, path: &str, table: &RouteTable) -> Decision {
        let Some(entry) = table.lookup(path) else {
            tracing::debug!(path, "no route; falling back to landing page");
            return Decision::RedirectTo(self.policy.paths().landing.clone());
        };

        match entry.access {
            RouteAccess::Public => Decision::Allow,
            RouteAccess::GuestOnly => self.can_activate_guest_only().await,
            RouteAccess::Protected => self.can_activate(&entry.data).await,
        }
    }

    /// Like [`RouteGuard::check_path`], but yields nothing if a newer navigation
    /// started while this one was resolving.
    pub async fn check_navigation(
        &self,
        ticket: &NavigationTicket,
        table: &RouteTable,
    ) -> Option<Decision> {
        let decision = self.check_path(ticket.path(), table).await;
        if ticket.is_current() {
            Some(decision)
        } else {
            tracing::debug!(path = ticket.path(), "navigation superseded; discarding decision");
            None
        }
    }

    async fn resolve(&self) {
        if self.store.status() == SessionStatus::Unknown {
            tracing::debug!("session status unknown; resolving before guarding");
            self.resolver.check_status().await;
        }
    }
}
