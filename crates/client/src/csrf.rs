//! Anti-forgery token cache.
//!
//! At most one token fetch is outstanding at a time; concurrent callers join it.
//! `clear()` forgets both the cached token and the in-flight fetch, and a fetch
//! that completes after a clear never repopulates the cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use tokio::time::Instant;

use tollgate_core::ClientError;

use crate::config::ClientConfig;
use crate::transport::{ApiRequest, HttpTransport};

type TokenFetch = Shared<BoxFuture<'static, Result<CsrfToken, ClientError>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub value: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenPayload {
    token: String,
}

#[derive(Default)]
struct CacheState {
    token: Option<(CsrfToken, Instant)>,
    in_flight: Option<TokenFetch>,
    /// Bumped on every clear and every new fetch; a fetch only writes back
    /// while its generation is still current.
    generation: u64,
}

pub struct CredentialCache {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    ttl: Option<Duration>,
    state: Arc<Mutex<CacheState>>,
}

impl core::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("CredentialCache")
            .field("endpoint", &self.endpoint)
            .field("ttl", &self.ttl)
            .field("cached", &state.token.is_some())
            .field("in_flight", &state.in_flight.is_some())
            .finish()
    }
}

impl CredentialCache {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            endpoint: config.endpoints.csrf_token.clone(),
            ttl: config.csrf_token_ttl,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Return the cached token, join an in-flight fetch, or start one.
    pub async fn get_token(&self) -> Result<CsrfToken, ClientError> {
        let fetch = {
            let mut state = self.lock();

            let fresh = state
                .token
                .as_ref()
                .filter(|(_, stored_at)| self.ttl.is_none_or(|ttl| stored_at.elapsed() < ttl))
                .map(|(token, _)| token.clone());
            if let Some(token) = fresh {
                return Ok(token);
            }
            state.token = None;

            match &state.in_flight {
                Some(fetch) => {
                    tracing::debug!("joining in-flight anti-forgery token fetch");
                    fetch.clone()
                }
                None => {
                    state.generation += 1;
                    let fetch = self.start_fetch(state.generation);
                    state.in_flight = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Forget the cached token and any in-flight fetch.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.token = None;
        state.in_flight = None;
        state.generation += 1;
        tracing::debug!("anti-forgery token cleared");
    }

    pub fn is_cached(&self) -> bool {
        self.lock().token.is_some()
    }

    fn start_fetch(&self, generation: u64) -> TokenFetch {
        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        let state = Arc::clone(&self.state);

        async move {
            let result = fetch_token(transport.as_ref(), endpoint).await;

            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation == generation {
                state.in_flight = None;
                match &result {
                    Ok(token) => {
                        state.token = Some((token.clone(), Instant::now()));
                        tracing::debug!("anti-forgery token cached");
                    }
                    Err(err) => tracing::warn!(error = %err, "anti-forgery token fetch failed"),
                }
            } else {
                tracing::debug!("discarding anti-forgery token fetched before a clear");
            }

            result
        }
        .boxed()
        .shared()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn fetch_token(
    transport: &dyn HttpTransport,
    endpoint: String,
) -> Result<CsrfToken, ClientError> {
    let response = transport
        .send(ApiRequest::get(endpoint).with_credentials())
        .await?
        .into_result()?;
    let payload: TokenPayload = response.json()?;

    if payload.token.trim().is_empty() {
        return Err(ClientError::malformed("empty anti-forgery token"));
    }

    Ok(CsrfToken {
        value: payload.token,
        fetched_at: Utc::now(),
    })
}
