//! Login form input.

use serde::Serialize;

use tollgate_core::ClientError;

const SPECIAL: &[char] = &['@', '$', '!', '%', '*', '?', '&'];

/// Username/password pair posted to the login endpoint.
///
/// The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Client-side format checks, run before anything is sent.
    ///
    /// - username: 4-30 characters, no whitespace
    /// - password: 8-30 characters, no whitespace, with an uppercase letter, a
    ///   lowercase letter, a digit and one of `@$!%*?&`
    pub fn validate(&self) -> Result<(), ClientError> {
        let username_len = self.username.chars().count();
        if !(4..=30).contains(&username_len) || self.username.chars().any(char::is_whitespace) {
            return Err(ClientError::validation(
                "username must be 4-30 characters without spaces",
            ));
        }

        let password = &self.password;
        let password_len = password.chars().count();
        let well_formed = (8..=30).contains(&password_len)
            && !password.chars().any(char::is_whitespace)
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| SPECIAL.contains(&c));
        if !well_formed {
            return Err(ClientError::validation(
                "password must be 8-30 characters with upper and lower case letters, a digit and a special character",
            ));
        }

        Ok(())
    }
}
