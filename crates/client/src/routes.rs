//! Route table: which paths are protected, guest-only or public, and what they require.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tollgate_auth::RouteData;
use tollgate_core::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    /// Authentication plus the route's permission declaration.
    #[default]
    Protected,
    /// Only reachable without a session (the login form).
    GuestOnly,
    Public,
}

/// One entry, e.g. `{"path": "/premarital", "permission": "view_premarital"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    #[serde(default)]
    pub access: RouteAccess,
    #[serde(flatten)]
    pub data: RouteData,
}

impl RouteEntry {
    pub fn protected(path: impl Into<String>, data: RouteData) -> Self {
        Self {
            path: path.into(),
            access: RouteAccess::Protected,
            data,
        }
    }

    pub fn guest_only(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            access: RouteAccess::GuestOnly,
            data: RouteData::open(),
        }
    }

    pub fn public(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            access: RouteAccess::Public,
            data: RouteData::open(),
        }
    }
}

/// Path lookup is case-insensitive and ignores query strings, fragments and
/// trailing slashes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, entry: RouteEntry) -> Self {
        self.insert(entry);
        self
    }

    pub fn insert(&mut self, entry: RouteEntry) {
        self.routes.insert(normalize(&entry.path), entry);
    }

    pub fn lookup(&self, path: &str) -> Option<&RouteEntry> {
        self.routes.get(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Load a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let entries: Vec<RouteEntry> = serde_json::from_str(json)
            .map_err(|e| ClientError::configuration(format!("invalid route table: {e}")))?;
        Ok(entries.into_iter().fold(Self::new(), Self::with_route))
    }
}

fn normalize(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('/')
        .to_ascii_lowercase();

    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}
