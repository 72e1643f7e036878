//! Session resolution: the only writer of the session store.
//!
//! - `check_status` coalesces concurrent callers onto one status request and
//!   may reuse a resolved outcome for a configured window
//! - `login`, `logout`, `refresh` and `expire` bump an epoch; a status check
//!   started under an older epoch never writes the store

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use tollgate_auth::{Identity, SessionStatus, SessionStore};
use tollgate_core::{ClientError, messages};

use crate::config::{ClientConfig, Endpoints};
use crate::csrf::CredentialCache;
use crate::interceptor::InterceptorChain;
use crate::login::Credentials;
use crate::sanitize::sanitize_text;
use crate::transport::ApiRequest;

type StatusCheck = Shared<BoxFuture<'static, ResolvedStatus>>;

/// Outcome of a status check. Never `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedStatus {
    Authenticated,
    Unauthenticated,
}

impl From<ResolvedStatus> for SessionStatus {
    fn from(value: ResolvedStatus) -> Self {
        match value {
            ResolvedStatus::Authenticated => SessionStatus::Authenticated,
            ResolvedStatus::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }
}

/// `{ "user": { ... } }`, as returned by the status and login endpoints.
#[derive(Deserialize)]
struct SessionPayload {
    user: Option<Identity>,
}

#[derive(Default)]
struct ResolverState {
    epoch: u64,
    in_flight: Option<StatusCheck>,
    resolved: Option<(ResolvedStatus, Instant)>,
}

struct Inner {
    chain: InterceptorChain,
    store: Arc<SessionStore>,
    csrf: Arc<CredentialCache>,
    endpoints: Endpoints,
    status_ttl: Option<Duration>,
    message_cap: usize,
    state: Mutex<ResolverState>,
}

#[derive(Clone)]
pub struct SessionResolver {
    inner: Arc<Inner>,
}

impl core::fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("SessionResolver")
            .field("epoch", &state.epoch)
            .field("in_flight", &state.in_flight.is_some())
            .field("resolved", &state.resolved.map(|(status, _)| status))
            .finish()
    }
}

impl SessionResolver {
    /// `chain` should attach credentials and anti-forgery tokens but must not
    /// translate errors: an anonymous first visit is not a session expiry.
    pub fn new(
        chain: InterceptorChain,
        store: Arc<SessionStore>,
        csrf: Arc<CredentialCache>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                chain,
                store,
                csrf,
                endpoints: config.endpoints.clone(),
                status_ttl: config.status_cache_ttl,
                message_cap: config.login_message_cap,
                state: Mutex::new(ResolverState::default()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.inner.store
    }

    /// Ask the server whether the session is authenticated and record the answer.
    ///
    /// Any failure (network, non-success status, malformed payload) resolves to
    /// `Unauthenticated`.
    pub async fn check_status(&self) -> ResolvedStatus {
        let check = {
            let mut state = self.inner.lock();

            if let Some((status, resolved_at)) = state.resolved {
                let fresh = self
                    .inner
                    .status_ttl
                    .is_some_and(|ttl| resolved_at.elapsed() < ttl);
                if fresh && self.inner.store.status() != SessionStatus::Unknown {
                    tracing::debug!(?status, "reusing resolved session status");
                    return status;
                }
                state.resolved = None;
            }

            match &state.in_flight {
                Some(check) => {
                    tracing::debug!("joining in-flight session status check");
                    check.clone()
                }
                None => {
                    let check = Inner::start_check(Arc::clone(&self.inner), state.epoch);
                    state.in_flight = Some(check.clone());
                    check
                }
            }
        };

        check.await
    }

    /// Submit credentials. On success the store holds the returned identity.
    ///
    /// On rejection the store is `Unauthenticated` and the error carries a
    /// sanitized, user-displayable reason that never says which field was wrong.
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, ClientError> {
        self.inner.invalidate();

        if let Err(err) = credentials.validate() {
            tracing::warn!(error = %err, "login rejected before sending");
            self.inner.store.set_unauthenticated();
            return Err(err);
        }

        self.inner.csrf.clear();

        let request = ApiRequest::post(self.inner.endpoints.login.as_str()).with_json(credentials)?;
        let outcome = match self.inner.chain.send(request).await {
            Ok(response) if response.is_success() => response
                .json::<SessionPayload>()
                .and_then(|payload| {
                    payload
                        .user
                        .ok_or_else(|| ClientError::malformed("login response without user"))
                }),
            Ok(response) if (400..500).contains(&response.status) => {
                let reason = response
                    .message()
                    .map(|message| sanitize_text(&message, self.inner.message_cap))
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| messages::error::INVALID_CREDENTIALS.to_string());
                Err(ClientError::LoginRejected(reason))
            }
            Ok(response) => Err(ClientError::from_status(response.status, None)),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, "login succeeded");
                self.inner.store.set_authenticated(identity.clone());
                Ok(identity)
            }
            Err(err) => {
                tracing::warn!(error = %err, "login failed");
                self.inner.store.set_unauthenticated();
                Err(err)
            }
        }
    }

    /// End the session. Local state is cleared even when the server call fails.
    pub async fn logout(&self) {
        self.inner.invalidate();

        let request = ApiRequest::post(self.inner.endpoints.logout.as_str());
        let result = self
            .inner
            .chain
            .send(request)
            .await
            .and_then(|response| response.into_result());
        if let Err(err) = result {
            tracing::warn!(error = %err, "remote logout failed; clearing local session anyway");
        }

        self.inner.csrf.clear();
        self.inner.store.set_unauthenticated();
        tracing::info!("logged out");
    }

    /// Extend the server session. A failed refresh expires the local session.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let request = ApiRequest::post(self.inner.endpoints.refresh.as_str());
        let result = self
            .inner
            .chain
            .send(request)
            .await
            .and_then(|response| response.into_result());

        match result {
            Ok(_) => {
                tracing::debug!("session refreshed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "session refresh failed");
                self.expire();
                Err(err)
            }
        }
    }

    /// Drop the local session without contacting the server (e.g. after a 401).
    pub fn expire(&self) {
        self.inner.invalidate();
        self.inner.csrf.clear();
        self.inner.store.set_unauthenticated();
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget the memo and any in-flight check, and fence off stale results.
    fn invalidate(&self) {
        let mut state = self.lock();
        state.epoch += 1;
        state.in_flight = None;
        state.resolved = None;
    }

    fn start_check(inner: Arc<Inner>, epoch: u64) -> StatusCheck {
        async move {
            let outcome = inner.fetch_identity().await;

            let mut state = inner.lock();
            let current = state.epoch == epoch;
            if current {
                state.in_flight = None;
            }

            let status = match outcome {
                Ok(identity) => {
                    if current {
                        inner.store.set_authenticated(identity);
                    }
                    ResolvedStatus::Authenticated
                }
                Err(err) => {
                    tracing::debug!(error = %err, "session status check did not authenticate");
                    if current {
                        inner.store.set_unauthenticated();
                    }
                    ResolvedStatus::Unauthenticated
                }
            };

            if current {
                state.resolved = Some((status, Instant::now()));
            } else {
                tracing::debug!(?status, "discarding stale session status");
            }
            status
        }
        .boxed()
        .shared()
    }

    async fn fetch_identity(&self) -> Result<Identity, ClientError> {
        let request = ApiRequest::get(self.endpoints.status.as_str());
        let response = self.chain.send(request).await?.into_result()?;
        response
            .json::<SessionPayload>()?
            .user
            .ok_or_else(|| ClientError::malformed("status response without user"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::interceptor::{AntiForgery, AttachCredentials};
    use crate::memory::{MemoryTransport, Reply};
    use crate::transport::{Method, TransportError};

    fn user() -> serde_json::Value {
        json!({
            "user": {
                "id": "u1",
                "username": "clerk",
                "roles": ["Clerk"],
                "permissions": ["view_premarital"]
            }
        })
    }

    fn resolver_with(transport: &Arc<MemoryTransport>, config: ClientConfig) -> SessionResolver {
        let csrf = Arc::new(CredentialCache::new(transport.clone(), &config));
        let chain = InterceptorChain::builder(transport.clone())
            .stage(AntiForgery::new(csrf.clone(), &config))
            .stage(AttachCredentials)
            .build();
        SessionResolver::new(chain, Arc::new(SessionStore::new()), csrf, &config)
    }

    fn resolver(transport: &Arc<MemoryTransport>) -> SessionResolver {
        resolver_with(transport, ClientConfig::default())
    }

    #[tokio::test]
    async fn authenticated_status_populates_the_store() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        let resolver = resolver(&transport);

        assert_eq!(resolver.check_status().await, ResolvedStatus::Authenticated);
        let identity = resolver.store().identity().unwrap();
        assert_eq!(identity.display_name, "clerk");
        assert!(identity.permissions.contains("view_premarital"));
        assert!(transport.requests_to("/auth/status")[0].with_credentials);
    }

    #[tokio::test]
    async fn any_failure_resolves_unauthenticated() {
        for reply in [
            Reply::status(401, json!(null)),
            Reply::status(500, json!(null)),
            Reply::ok(json!({"user": null})),
            Reply::ok(json!("not an object")),
            Reply::Fail(TransportError::Connect("refused".into())),
        ] {
            let transport = Arc::new(MemoryTransport::new());
            transport.on(Method::Get, "/auth/status", reply);
            let resolver = resolver(&transport);

            assert_eq!(resolver.check_status().await, ResolvedStatus::Unauthenticated);
            assert_eq!(resolver.store().status(), SessionStatus::Unauthenticated);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_share_one_request() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(
            Method::Get,
            "/auth/status",
            Reply::Delayed(Duration::from_millis(250), Box::new(Reply::ok(user()))),
        );
        let resolver = resolver_with(&transport, ClientConfig::default().with_status_cache_ttl(None));

        let (a, b, c) = tokio::join!(
            resolver.check_status(),
            resolver.check_status(),
            resolver.check_status()
        );

        assert_eq!([a, b, c], [ResolvedStatus::Authenticated; 3]);
        assert_eq!(transport.call_count(Method::Get, "/auth/status"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_status_is_reused_within_the_window() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        let resolver = resolver(&transport);

        resolver.check_status().await;
        resolver.check_status().await;
        assert_eq!(transport.call_count(Method::Get, "/auth/status"), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        resolver.check_status().await;
        assert_eq!(transport.call_count(Method::Get, "/auth/status"), 2);
    }

    #[tokio::test]
    async fn memo_is_ignored_after_store_reset() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        let resolver = resolver(&transport);

        resolver.check_status().await;
        resolver.store().reset();
        resolver.check_status().await;

        assert_eq!(transport.call_count(Method::Get, "/auth/status"), 2);
        assert!(resolver.store().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_check_does_not_overwrite_logout() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(
            Method::Get,
            "/auth/status",
            Reply::Delayed(Duration::from_millis(100), Box::new(Reply::ok(user()))),
        );
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(Method::Post, "/auth/logout", Reply::ok(json!({})));
        let resolver = resolver(&transport);

        let pending = {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.check_status().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        resolver.logout().await;

        assert_eq!(pending.await.unwrap(), ResolvedStatus::Authenticated);
        assert_eq!(resolver.store().status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn login_success_sets_identity() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(Method::Post, "/auth/login", Reply::ok(user()));
        let resolver = resolver(&transport);

        let identity = resolver
            .login(&Credentials::new("clerk", "Secr3t!pw"))
            .await
            .unwrap();

        assert_eq!(identity.id.as_str(), "u1");
        assert!(resolver.store().is_authenticated());
        let sent = transport.requests_to("/auth/login").remove(0);
        assert_eq!(sent.header("X-CSRF-TOKEN"), Some("t"));
        assert_eq!(sent.body.unwrap()["username"], "clerk");
    }

    #[tokio::test]
    async fn login_rejection_uses_sanitized_server_message() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(
            Method::Post,
            "/auth/login",
            Reply::status(401, json!({"message": "  Account <locked>  "})),
        );
        let resolver = resolver(&transport);

        let err = resolver
            .login(&Credentials::new("clerk", "Secr3t!pw"))
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::LoginRejected("Account &lt;locked&gt;".into()));
        assert_eq!(resolver.store().status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn login_rejection_without_message_is_generic() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(Method::Post, "/auth/login", Reply::status(400, json!(null)));
        let resolver = resolver(&transport);

        let err = resolver
            .login(&Credentials::new("clerk", "Secr3t!pw"))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn invalid_credentials_are_rejected_before_sending() {
        let transport = Arc::new(MemoryTransport::new());
        let resolver = resolver(&transport);

        let err = resolver
            .login(&Credentials::new("ab", "weak"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(transport.requests().is_empty());
        assert_eq!(resolver.store().status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn status_payload_without_name_authenticates() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(
            Method::Get,
            "/auth/status",
            Reply::ok(json!({
                "user": {"id": "u1", "roles": ["Admin"], "permissions": ["view_premarital"]}
            })),
        );
        let resolver = resolver(&transport);

        assert_eq!(resolver.check_status().await, ResolvedStatus::Authenticated);
        let identity = resolver.store().identity().unwrap();
        assert_eq!(identity.label(), "u1");
        assert!(identity.roles.contains("Admin"));
    }

    #[tokio::test]
    async fn numeric_user_id_authenticates() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(
            Method::Get,
            "/auth/status",
            Reply::ok(json!({"user": {"id": 42, "username": "a"}})),
        );
        let resolver = resolver(&transport);

        assert_eq!(resolver.check_status().await, ResolvedStatus::Authenticated);
        assert_eq!(resolver.store().identity().unwrap().id.as_str(), "42");
    }

    #[tokio::test(start_paused = true)]
    async fn login_drops_a_memoized_status() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(Method::Post, "/auth/login", Reply::ok(user()));
        let resolver = resolver(&transport);

        resolver.check_status().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        resolver
            .login(&Credentials::new("clerk", "Secr3t!pw"))
            .await
            .unwrap();
        resolver.check_status().await;

        assert_eq!(transport.call_count(Method::Get, "/auth/status"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn logout_drops_a_memoized_status() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(Method::Post, "/auth/logout", Reply::ok(json!({})));
        let resolver = resolver(&transport);

        assert_eq!(resolver.check_status().await, ResolvedStatus::Authenticated);
        tokio::time::advance(Duration::from_secs(5)).await;
        resolver.logout().await;

        assert_eq!(resolver.check_status().await, ResolvedStatus::Authenticated);
        assert_eq!(transport.call_count(Method::Get, "/auth/status"), 2);
    }

    #[tokio::test]
    async fn logout_clears_local_state_when_server_fails() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(
            Method::Post,
            "/auth/logout",
            Reply::Fail(TransportError::Connect("refused".into())),
        );
        let config = ClientConfig::default();
        let csrf = Arc::new(CredentialCache::new(transport.clone(), &config));
        let chain = InterceptorChain::builder(transport.clone())
            .stage(AntiForgery::new(csrf.clone(), &config))
            .stage(AttachCredentials)
            .build();
        let resolver = SessionResolver::new(chain, Arc::new(SessionStore::new()), csrf.clone(), &config);
        resolver.check_status().await;

        resolver.logout().await;

        assert_eq!(resolver.store().status(), SessionStatus::Unauthenticated);
        assert!(resolver.store().identity().is_none());
        assert!(!csrf.is_cached());
    }

    #[tokio::test]
    async fn failed_refresh_expires_the_session() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(Method::Post, "/auth/refresh", Reply::status(401, json!(null)));
        let resolver = resolver(&transport);
        resolver.check_status().await;

        let err = resolver.refresh().await.unwrap_err();

        assert_eq!(err, ClientError::SessionExpired);
        assert_eq!(resolver.store().status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn successful_refresh_keeps_the_session() {
        let transport = Arc::new(MemoryTransport::new());
        transport.on(Method::Get, "/auth/status", Reply::ok(user()));
        transport.on(Method::Get, "/csrf-token", Reply::ok(json!({"token": "t"})));
        transport.on(Method::Post, "/auth/refresh", Reply::ok(json!({})));
        let resolver = resolver(&transport);
        resolver.check_status().await;

        resolver.refresh().await.unwrap();
        assert!(resolver.store().is_authenticated());
    }
}
