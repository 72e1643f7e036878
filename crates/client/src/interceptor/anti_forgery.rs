use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tollgate_core::ClientError;

use super::{Interceptor, Next};
use crate::config::ClientConfig;
use crate::csrf::CredentialCache;
use crate::transport::{ApiRequest, ApiResponse};

/// Attaches the anti-forgery token to state-changing requests.
///
/// Fails closed: a mutating request that cannot get a token within the
/// configured timeout is never sent.
pub struct AntiForgery {
    cache: Arc<CredentialCache>,
    header: String,
    timeout: Duration,
}

impl AntiForgery {
    pub fn new(cache: Arc<CredentialCache>, config: &ClientConfig) -> Self {
        Self {
            cache,
            header: config.csrf_header.clone(),
            timeout: config.token_fetch_timeout,
        }
    }
}

#[async_trait]
impl Interceptor for AntiForgery {
    async fn intercept(
        &self,
        mut request: ApiRequest,
        next: Next<'_>,
    ) -> Result<ApiResponse, ClientError> {
        if !request.method.is_state_changing() {
            return next.run(request).await;
        }

        let token = match tokio::time::timeout(self.timeout, self.cache.get_token()).await {
            Ok(Ok(token)) => token,
            Ok(Err(err)) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %err,
                    "no anti-forgery token; request not sent"
                );
                return Err(ClientError::token_unavailable(err.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "anti-forgery token fetch timed out; request not sent"
                );
                self.cache.clear();
                return Err(ClientError::token_unavailable(format!(
                    "token fetch exceeded {}ms",
                    self.timeout.as_millis()
                )));
            }
        };

        request.headers.insert(self.header.clone(), token.value);
        let result = next.run(request).await;

        let rejected = match &result {
            Ok(response) => response.status == 403,
            Err(err) => matches!(err, ClientError::Forbidden),
        };
        if rejected {
            tracing::debug!("mutating request rejected with 403; dropping anti-forgery token");
            self.cache.clear();
        }

        result
    }
}
