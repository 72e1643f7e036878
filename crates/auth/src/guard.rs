//! Navigation access policy (authenticate + authorize checkpoints).
//!
//! Resolving an unknown session is asynchronous and lives with the caller; this
//! module only turns (session state, route requirement) into a decision.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::evaluator::PermissionEvaluator;
use crate::requirement::{Requirement, RouteData};
use crate::session::{SessionSnapshot, SessionStatus, SessionStore};

/// Outcome of evaluating a single navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectTo(String),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectTo(path) => Some(path),
        }
    }
}

/// Well-known redirect targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardPaths {
    pub login: String,
    pub unauthorized: String,
    /// Where an authenticated session lands when it tries to reach the login route.
    pub landing: String,
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            unauthorized: "/unauthorized".to_string(),
            landing: "/applications".to_string(),
        }
    }
}

/// Stateless decision strategy over the session store.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    store: Arc<SessionStore>,
    evaluator: PermissionEvaluator,
    paths: GuardPaths,
}

impl AccessPolicy {
    pub fn new(store: Arc<SessionStore>, paths: GuardPaths) -> Self {
        Self {
            evaluator: PermissionEvaluator::new(store.clone()),
            store,
            paths,
        }
    }

    pub fn paths(&self) -> &GuardPaths {
        &self.paths
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Authenticate, then authorize against the route's declaration.
    ///
    /// An `Unknown` status counts as not authenticated; callers resolve first.
    pub fn decide(&self, route: &RouteData) -> Decision {
        self.decide_for(&self.store.snapshot(), route)
    }

    /// Same as [`decide`](Self::decide), against a fixed session state.
    pub fn decide_for(&self, session: &SessionSnapshot, route: &RouteData) -> Decision {
        let Some(identity) = session.identity() else {
            tracing::warn!("user not logged in, redirecting to login");
            return Decision::RedirectTo(self.paths.login.clone());
        };

        let requirement = match route.requirement() {
            Ok(requirement) => requirement,
            Err(err) => {
                tracing::error!(error = %err, "invalid route configuration; denying");
                return Decision::RedirectTo(self.paths.unauthorized.clone());
            }
        };

        if matches!(requirement, Requirement::Open) {
            return Decision::Allow;
        }

        let explanation = PermissionEvaluator::explain_for(Some(identity.as_ref()), &requirement);
        if explanation.granted {
            tracing::debug!(required = ?explanation.required, "permission granted");
            Decision::Allow
        } else {
            tracing::warn!(
                mode = ?explanation.mode,
                required = ?explanation.required,
                missing = ?explanation.missing,
                held = ?explanation.held,
                "permission denied"
            );
            Decision::RedirectTo(self.paths.unauthorized.clone())
        }
    }

    /// Reverse guard for guest-only routes (the login form).
    pub fn decide_guest_only(&self) -> Decision {
        if self.store.status() == SessionStatus::Authenticated {
            Decision::RedirectTo(self.paths.landing.clone())
        } else {
            Decision::Allow
        }
    }
}
