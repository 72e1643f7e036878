//! Route-level access requirements.
//!
//! `RouteData` is the configuration surface handed to the routing collaborator:
//! a route declares zero or one of `{permission}` or `{permissions, requireAll}`.
//! Declaring both is a configuration error and is always treated as a denial.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tollgate_core::ClientError;

use crate::Permission;

/// Raw, as-declared route requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,

    /// Defaults to "any" when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_all: Option<bool>,
}

impl RouteData {
    /// Open route: authentication only.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn permission(permission: impl Into<Permission>) -> Self {
        Self {
            permission: Some(permission.into()),
            ..Self::default()
        }
    }

    pub fn any_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            permissions: Some(permissions.into_iter().map(Into::into).collect()),
            require_all: Some(false),
            ..Self::default()
        }
    }

    pub fn all_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            permissions: Some(permissions.into_iter().map(Into::into).collect()),
            require_all: Some(true),
            ..Self::default()
        }
    }

    /// Normalize the declaration. Never picks one side of a conflict.
    pub fn requirement(&self) -> Result<Requirement, RequirementError> {
        match (&self.permission, &self.permissions) {
            (Some(_), Some(_)) => Err(RequirementError::Conflicting),
            (Some(single), None) => Ok(Requirement::Single(single.clone())),
            (None, Some(list)) => Ok(Requirement::List {
                permissions: list.clone(),
                mode: if self.require_all == Some(true) {
                    MatchMode::All
                } else {
                    MatchMode::Any
                },
            }),
            (None, None) => Ok(Requirement::Open),
        }
    }
}

/// Evaluation mode for a multi-permission requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Any,
    All,
}

impl core::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MatchMode::Any => f.write_str("ANY"),
            MatchMode::All => f.write_str("ALL"),
        }
    }
}

/// Normalized requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Open,
    Single(Permission),
    List {
        permissions: Vec<Permission>,
        mode: MatchMode,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("route declares both `permission` and `permissions`")]
    Conflicting,
}

impl From<RequirementError> for ClientError {
    fn from(value: RequirementError) -> Self {
        ClientError::configuration(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_declared_is_open() {
        assert_eq!(RouteData::open().requirement(), Ok(Requirement::Open));
    }

    #[test]
    fn require_all_flag_absent_defaults_to_any() {
        let data: RouteData =
            serde_json::from_str(r#"{"permissions": ["a", "b"]}"#).unwrap();
        let Ok(Requirement::List { mode, permissions }) = data.requirement() else {
            panic!("expected list requirement");
        };
        assert_eq!(mode, MatchMode::Any);
        assert_eq!(permissions.len(), 2);
    }

    #[test]
    fn require_all_true_is_all() {
        let data: RouteData =
            serde_json::from_str(r#"{"permissions": ["a"], "requireAll": true}"#).unwrap();
        assert!(matches!(
            data.requirement(),
            Ok(Requirement::List { mode: MatchMode::All, .. })
        ));
    }

    #[test]
    fn both_declared_is_a_conflict() {
        let data: RouteData = serde_json::from_str(
            r#"{"permission": "a", "permissions": ["a"], "requireAll": false}"#,
        )
        .unwrap();
        assert_eq!(data.requirement(), Err(RequirementError::Conflicting));

        let err: ClientError = RequirementError::Conflicting.into();
        assert!(matches!(err, ClientError::Configuration(_)));
    }
}
