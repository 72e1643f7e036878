use serde::{Deserialize, Deserializer, Serialize};

use crate::{PermissionSet, RoleSet};

/// Server-issued identifier of the logged-in user.
///
/// Kept opaque: the client only compares and displays it. Numeric ids are
/// accepted and stored in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Unsigned(id) => Self(id.to_string()),
            RawId::Signed(id) => Self(id.to_string()),
        })
    }
}

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The authenticated identity as known to the client.
///
/// Deserializes from the session payload `{id, roles[], permissions[]}`. A name
/// is optional and may arrive as `username` or `displayName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,

    #[serde(default, alias = "username", skip_serializing_if = "String::is_empty")]
    pub display_name: String,

    #[serde(default)]
    pub roles: RoleSet,

    #[serde(default)]
    pub permissions: PermissionSet,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            display_name: display_name.into(),
            roles: RoleSet::new(),
            permissions: PermissionSet::new(),
        }
    }

    /// Name to show for this user; the id when the server sent no name.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            self.id.as_str()
        } else {
            &self.display_name
        }
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<crate::Role>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<crate::Permission>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_payload_user() {
        let json = r#"{
            "id": "42",
            "username": "amira",
            "roles": ["Manager"],
            "permissions": ["view_premarital", "edit_premarital", "view_premarital"]
        }"#;

        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.id.as_str(), "42");
        assert_eq!(identity.display_name, "amira");
        assert!(identity.roles.contains("Manager"));
        assert_eq!(identity.permissions.len(), 2);
    }

    #[test]
    fn name_is_optional() {
        let identity: Identity = serde_json::from_str(
            r#"{"id": "u1", "roles": ["Admin"], "permissions": ["view_premarital"]}"#,
        )
        .unwrap();
        assert_eq!(identity.display_name, "");
        assert_eq!(identity.label(), "u1");
        assert!(identity.permissions.contains("view_premarital"));
    }

    #[test]
    fn numeric_id_is_accepted() {
        let identity: Identity =
            serde_json::from_str(r#"{"id": 42, "username": "a"}"#).unwrap();
        assert_eq!(identity.id, UserId::new("42"));
        assert_eq!(identity.label(), "a");

        let negative: UserId = serde_json::from_str("-3").unwrap();
        assert_eq!(negative.as_str(), "-3");
        assert!(serde_json::from_str::<UserId>("true").is_err());
    }

    #[test]
    fn missing_sets_default_to_empty() {
        let identity: Identity =
            serde_json::from_str(r#"{"id": "7", "displayName": "Omar"}"#).unwrap();
        assert!(identity.roles.is_empty());
        assert!(identity.permissions.is_empty());
    }
}
