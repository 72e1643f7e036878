//! Session store: the single source of truth for "who is logged in".
//!
//! Reads are synchronous and never block on IO. Writes are reserved for the
//! session resolver and the login/logout flows; guards and UI only read.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::{Identity, PermissionSet, RoleSet};

/// Tri-state authentication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Not yet resolved. Only legal at start-up and after an explicit reset.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Session state. The identity lives inside the `Authenticated` variant, so it
/// cannot exist for any other status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unknown,
    Authenticated(Arc<Identity>),
    Unauthenticated,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Unknown => SessionStatus::Unknown,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }

    pub fn identity(&self) -> Option<&Arc<Identity>> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Point-in-time copy of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Number of writes applied to the store when the snapshot was taken.
    pub revision: u64,
}

impl SessionSnapshot {
    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn identity(&self) -> Option<&Arc<Identity>> {
        self.state.identity()
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    revision: u64,
}

/// In-memory session store. Create one per process and share it by `Arc`.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.read().state.status()
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.read().state.identity().cloned()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.read();
        SessionSnapshot {
            state: inner.state.clone(),
            revision: inner.revision,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Roles of the current identity; empty when not authenticated.
    pub fn roles(&self) -> RoleSet {
        self.identity()
            .map(|identity| identity.roles.clone())
            .unwrap_or_default()
    }

    /// Permissions of the current identity; empty when not authenticated.
    pub fn permissions(&self) -> PermissionSet {
        self.identity()
            .map(|identity| identity.permissions.clone())
            .unwrap_or_default()
    }

    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    pub fn set_authenticated(&self, identity: Identity) {
        tracing::info!(user_id = %identity.id, "session authenticated");
        self.replace(SessionState::Authenticated(Arc::new(identity)));
    }

    pub fn set_unauthenticated(&self) {
        tracing::info!("session unauthenticated");
        self.replace(SessionState::Unauthenticated);
    }

    /// Back to `Unknown`, forcing the next guard evaluation to re-resolve.
    pub fn reset(&self) {
        tracing::debug!("session reset");
        self.replace(SessionState::Unknown);
    }

    fn replace(&self, state: SessionState) {
        let mut inner = self.write();
        inner.state = state;
        inner.revision += 1;
    }

    // Writers never leave `Inner` half-updated, so a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
