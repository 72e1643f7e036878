use std::sync::Arc;

use async_trait::async_trait;

use tollgate_auth::GuardPaths;
use tollgate_core::{ClientError, messages};

use super::{Interceptor, Next};
use crate::config::DEFAULT_MESSAGE_CAP;
use crate::navigation::Navigator;
use crate::resolver::SessionResolver;
use crate::sanitize::sanitize_text;
use crate::toast::Notifier;
use crate::transport::{ApiRequest, ApiResponse, Method};

/// Classifies failed responses, performs the central side effects, and
/// re-raises the classified error to the caller.
///
/// | failure            | side effect                                  |
/// |--------------------|----------------------------------------------|
/// | 401                | expire session, redirect to login, toast     |
/// | 403                | redirect to the unauthorized page, toast     |
/// | anything else      | toast with the user-facing message           |
pub struct ErrorTranslation {
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    paths: GuardPaths,
    session: Option<SessionResolver>,
    message_cap: usize,
}

impl ErrorTranslation {
    pub fn new(navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>, paths: GuardPaths) -> Self {
        Self {
            navigator,
            notifier,
            paths,
            session: None,
            message_cap: DEFAULT_MESSAGE_CAP,
        }
    }

    /// Expire the resolved session when the server answers 401.
    pub fn with_session(mut self, session: SessionResolver) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_message_cap(mut self, cap: usize) -> Self {
        self.message_cap = cap;
        self
    }

    fn handle(&self, err: &ClientError, method: Method, path: &str) {
        tracing::error!(
            status = ?err.status(),
            %method,
            path,
            error = %err,
            "HTTP error"
        );

        match err {
            ClientError::SessionExpired => {
                if let Some(session) = &self.session {
                    session.expire();
                }
                self.navigator.navigate(&self.paths.login);
                self.notifier.error(messages::error::SESSION_EXPIRED);
            }
            ClientError::Forbidden => {
                self.navigator.navigate(&self.paths.unauthorized);
                self.notifier.error(messages::error::UNAUTHORIZED);
            }
            other => self.notifier.error(&other.user_message()),
        }
    }
}

#[async_trait]
impl Interceptor for ErrorTranslation {
    async fn intercept(
        &self,
        request: ApiRequest,
        next: Next<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let method = request.method;
        let path = request.path.clone();

        let err = match next.run(request).await {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => {
                let message = response
                    .message()
                    .map(|message| sanitize_text(&message, self.message_cap));
                ClientError::from_status(response.status, message)
            }
            Err(err) => err,
        };

        self.handle(&err, method, &path);
        Err(err)
    }
}
