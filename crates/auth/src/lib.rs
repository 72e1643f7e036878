//! `tollgate-auth` — session state and access-control policy.
//!
//! This crate is intentionally decoupled from HTTP and async runtimes: it holds
//! the session store and answers "may this session do X?" synchronously.

pub mod evaluator;
pub mod grants;
pub mod guard;
pub mod identity;
pub mod permissions;
pub mod requirement;
pub mod roles;
pub mod session;

pub use evaluator::{Explanation, PermissionEvaluator};
pub use grants::GrantSet;
pub use guard::{AccessPolicy, Decision, GuardPaths};
pub use identity::{Identity, UserId};
pub use permissions::{Permission, PermissionSet};
pub use requirement::{MatchMode, Requirement, RequirementError, RouteData};
pub use roles::{Role, RoleSet};
pub use session::{SessionSnapshot, SessionState, SessionStatus, SessionStore};
