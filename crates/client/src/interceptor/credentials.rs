use async_trait::async_trait;

use tollgate_core::ClientError;

use super::{Interceptor, Next};
use crate::transport::{ApiRequest, ApiResponse};

/// Marks every request as carrying session credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachCredentials;

#[async_trait]
impl Interceptor for AttachCredentials {
    async fn intercept(
        &self,
        mut request: ApiRequest,
        next: Next<'_>,
    ) -> Result<ApiResponse, ClientError> {
        request.with_credentials = true;
        next.run(request).await
    }
}
