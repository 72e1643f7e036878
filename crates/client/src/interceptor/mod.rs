//! Request interceptor chain.
//!
//! Stages run in registration order on the way out and in reverse on the way
//! back: each stage receives the request plus a [`Next`] handle for the rest
//! of the chain, and the transport sits at the end.

mod anti_forgery;
mod credentials;
mod error_translation;

use std::sync::Arc;

use async_trait::async_trait;

use tollgate_core::ClientError;

use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

pub use anti_forgery::AntiForgery;
pub use credentials::AttachCredentials;
pub use error_translation::ErrorTranslation;

#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, request: ApiRequest, next: Next<'_>)
    -> Result<ApiResponse, ClientError>;
}

/// The remainder of the chain after the current stage.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn HttpTransport,
}

impl Next<'_> {
    pub async fn run(self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                stage
                    .intercept(
                        request,
                        Next {
                            stages: rest,
                            transport: self.transport,
                        },
                    )
                    .await
            }
            None => {
                tracing::debug!(method = %request.method, path = %request.path, "sending request");
                Ok(self.transport.send(request).await?)
            }
        }
    }
}

/// Ordered interceptor stages in front of a transport.
#[derive(Clone)]
pub struct InterceptorChain {
    stages: Arc<[Arc<dyn Interceptor>]>,
    transport: Arc<dyn HttpTransport>,
}

impl InterceptorChain {
    pub fn builder(transport: Arc<dyn HttpTransport>) -> ChainBuilder {
        ChainBuilder {
            stages: Vec::new(),
            transport,
        }
    }

    /// Run `request` through every stage and the transport.
    ///
    /// Non-success statuses come back as `Ok` unless a stage translates them.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        Next {
            stages: &self.stages[..],
            transport: self.transport.as_ref(),
        }
        .run(request)
        .await
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

pub struct ChainBuilder {
    stages: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn HttpTransport>,
}

impl ChainBuilder {
    /// Append a stage; earlier stages wrap later ones.
    pub fn stage(mut self, stage: impl Interceptor + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> InterceptorChain {
        InterceptorChain {
            stages: self.stages.into(),
            transport: self.transport,
        }
    }
}
