use std::sync::Arc;

use serde::Serialize;

use crate::requirement::{MatchMode, Requirement};
use crate::session::SessionStore;
use crate::Identity;

/// Role/permission queries against the session store.
///
/// - No IO
/// - No caching: every call reads the store, so a login or logout is visible to
///   the very next query
/// - With no identity every query is false, except the vacuous "all of nothing"
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    store: Arc<SessionStore>,
}

impl PermissionEvaluator {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.with_identity(|identity| identity.roles.contains(role))
            .unwrap_or(false)
    }

    /// False for an empty `roles` list.
    pub fn has_any_role<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_identity(|identity| identity.roles.contains_any(roles))
            .unwrap_or(false)
    }

    /// True for an empty `roles` list, even without an identity.
    pub fn has_all_roles<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roles = roles.into_iter().peekable();
        if roles.peek().is_none() {
            return true;
        }
        self.with_identity(|identity| identity.roles.contains_all(roles))
            .unwrap_or(false)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.with_identity(|identity| identity.permissions.contains(permission))
            .unwrap_or(false)
    }

    /// False for an empty `permissions` list.
    pub fn has_any_permission<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_identity(|identity| identity.permissions.contains_any(permissions))
            .unwrap_or(false)
    }

    /// True for an empty `permissions` list, even without an identity.
    pub fn has_all_permissions<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut permissions = permissions.into_iter().peekable();
        if permissions.peek().is_none() {
            return true;
        }
        self.with_identity(|identity| identity.permissions.contains_all(permissions))
            .unwrap_or(false)
    }

    /// Whether the current session satisfies a normalized route requirement.
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        let identity = self.store.identity();
        Self::satisfied_by(identity.as_deref(), requirement)
    }

    /// Explain a requirement check (for logs and diagnostics).
    pub fn explain(&self, requirement: &Requirement) -> Explanation {
        let identity = self.store.identity();
        Self::explain_for(identity.as_deref(), requirement)
    }

    /// Requirement check against a fixed identity (e.g. one taken from a
    /// [`SessionSnapshot`](crate::SessionSnapshot)).
    pub fn satisfied_by(identity: Option<&Identity>, requirement: &Requirement) -> bool {
        match (requirement, identity) {
            (Requirement::Open, _) => true,
            (
                Requirement::List {
                    permissions,
                    mode: MatchMode::All,
                },
                _,
            ) if permissions.is_empty() => true,
            (_, None) => false,
            (Requirement::Single(permission), Some(identity)) => {
                identity.permissions.contains(permission.as_str())
            }
            (
                Requirement::List {
                    permissions,
                    mode: MatchMode::All,
                },
                Some(identity),
            ) => identity.permissions.contains_all(permissions),
            (
                Requirement::List {
                    permissions,
                    mode: MatchMode::Any,
                },
                Some(identity),
            ) => identity.permissions.contains_any(permissions),
        }
    }

    pub fn explain_for(identity: Option<&Identity>, requirement: &Requirement) -> Explanation {
        let granted = Self::satisfied_by(identity, requirement);
        let held = identity
            .map(|identity| identity.permissions.clone())
            .unwrap_or_default();

        let (required, mode) = match requirement {
            Requirement::Open => (Vec::new(), None),
            Requirement::Single(permission) => (vec![permission.to_string()], None),
            Requirement::List { permissions, mode } => (
                permissions.iter().map(ToString::to_string).collect(),
                Some(*mode),
            ),
        };

        Explanation {
            granted,
            mode,
            missing: if granted { Vec::new() } else { held.missing(&required) },
            required,
            held: held.sorted().into_iter().map(str::to_string).collect(),
        }
    }

    fn with_identity<T>(&self, f: impl FnOnce(&Identity) -> T) -> Option<T> {
        self.store.identity().map(|identity| f(&identity))
    }
}

/// Detailed outcome of a requirement check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub granted: bool,
    pub mode: Option<MatchMode>,
    pub required: Vec<String>,
    /// Required permissions the session does not hold (empty when granted).
    pub missing: Vec<String>,
    /// Permissions the session holds, sorted.
    pub held: Vec<String>,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Permission;

    fn evaluator_with(permissions: &[&'static str], roles: &[&'static str]) -> PermissionEvaluator {
        let store = Arc::new(SessionStore::new());
        store.set_authenticated(
            Identity::new("u1", "user")
                .with_permissions(permissions.iter().copied())
                .with_roles(roles.iter().copied()),
        );
        PermissionEvaluator::new(store)
    }

    const NONE: [&str; 0] = [];

    #[test]
    fn empty_any_is_false_and_empty_all_is_true() {
        let evaluator = evaluator_with(&["view_premarital"], &["Admin"]);
        assert!(!evaluator.has_any_permission(NONE));
        assert!(evaluator.has_all_permissions(NONE));
        assert!(!evaluator.has_any_role(NONE));
        assert!(evaluator.has_all_roles(NONE));
    }

    #[test]
    fn anonymous_session_only_satisfies_vacuous_all() {
        let evaluator = PermissionEvaluator::new(Arc::new(SessionStore::new()));
        assert!(!evaluator.has_permission("view_premarital"));
        assert!(!evaluator.has_role("Admin"));
        assert!(!evaluator.has_any_permission(["view_premarital"]));
        assert!(!evaluator.has_all_permissions(["view_premarital"]));
        assert!(evaluator.has_all_permissions(NONE));
        assert!(evaluator.has_all_roles(NONE));
    }

    #[test]
    fn any_and_all_over_roles() {
        let evaluator = evaluator_with(&[], &["Admin", "Manager"]);
        assert!(evaluator.has_role("Admin"));
        assert!(evaluator.has_any_role(["Guest", "Manager"]));
        assert!(!evaluator.has_any_role(["Guest"]));
        assert!(evaluator.has_all_roles(["Admin", "Manager"]));
        assert!(!evaluator.has_all_roles(["Admin", "Guest"]));
    }

    #[test]
    fn reads_the_store_on_every_call() {
        let store = Arc::new(SessionStore::new());
        let evaluator = PermissionEvaluator::new(store.clone());
        assert!(!evaluator.has_permission("p"));

        store.set_authenticated(Identity::new("u", "u").with_permissions(["p"]));
        assert!(evaluator.has_permission("p"));

        store.set_unauthenticated();
        assert!(!evaluator.has_permission("p"));
    }

    #[test]
    fn satisfies_each_requirement_shape() {
        let evaluator = evaluator_with(&["a", "b"], &[]);
        let list = |names: &[&'static str], mode| Requirement::List {
            permissions: names.iter().copied().map(Permission::new).collect(),
            mode,
        };

        assert!(evaluator.satisfies(&Requirement::Open));
        assert!(evaluator.satisfies(&Requirement::Single(Permission::new("a"))));
        assert!(!evaluator.satisfies(&Requirement::Single(Permission::new("c"))));
        assert!(evaluator.satisfies(&list(&["c", "b"], MatchMode::Any)));
        assert!(!evaluator.satisfies(&list(&["c", "b"], MatchMode::All)));
        assert!(!evaluator.satisfies(&list(&[], MatchMode::Any)));
        assert!(evaluator.satisfies(&list(&[], MatchMode::All)));
    }

    #[test]
    fn explain_for_uses_only_the_given_identity() {
        let identity = Identity::new("u1", "user").with_permissions(["view_premarital"]);
        let requirement = Requirement::Single(Permission::new("view_premarital"));

        assert!(PermissionEvaluator::explain_for(Some(&identity), &requirement).granted);

        let anonymous = PermissionEvaluator::explain_for(None, &requirement);
        assert!(!anonymous.granted);
        assert!(anonymous.held.is_empty());
        assert!(PermissionEvaluator::satisfied_by(
            None,
            &Requirement::List {
                permissions: Vec::new(),
                mode: MatchMode::All,
            }
        ));
    }

    #[test]
    fn explain_lists_missing_permissions() {
        let evaluator = evaluator_with(&["view_clinical_attachment"], &[]);
        let explanation = evaluator.explain(&Requirement::Single(Permission::new(
            "view_premarital",
        )));

        assert!(!explanation.granted);
        assert_eq!(explanation.missing, vec!["view_premarital"]);
        assert_eq!(explanation.held, vec!["view_clinical_attachment"]);
    }

    fn names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]{1,2}", 0..6)
    }

    proptest! {
        #[test]
        fn empty_requirements_hold_for_any_grant_set(granted in names()) {
            let store = Arc::new(SessionStore::new());
            store.set_authenticated(Identity::new("u", "u").with_permissions(granted));
            let evaluator = PermissionEvaluator::new(store);

            prop_assert!(!evaluator.has_any_permission(NONE));
            prop_assert!(evaluator.has_all_permissions(NONE));
        }

        #[test]
        fn any_and_all_agree_with_membership(granted in names(), required in names()) {
            let store = Arc::new(SessionStore::new());
            store.set_authenticated(Identity::new("u", "u").with_permissions(granted.clone()));
            let evaluator = PermissionEvaluator::new(store);

            let any = required.iter().any(|r| granted.contains(r));
            let all = required.iter().all(|r| granted.contains(r));
            prop_assert_eq!(evaluator.has_any_permission(&required), any);
            prop_assert_eq!(evaluator.has_all_permissions(&required), all);
        }

        #[test]
        fn all_implies_any_for_non_empty_requirements(granted in names(), required in names()) {
            prop_assume!(!required.is_empty());
            let store = Arc::new(SessionStore::new());
            store.set_authenticated(Identity::new("u", "u").with_permissions(granted));
            let evaluator = PermissionEvaluator::new(store);

            if evaluator.has_all_permissions(&required) {
                prop_assert!(evaluator.has_any_permission(&required));
            }
        }
    }
}
