//! Typed JSON calls through the full interceptor chain.

use serde::Serialize;
use serde::de::DeserializeOwned;

use tollgate_core::ClientError;

use crate::interceptor::InterceptorChain;
use crate::transport::{ApiRequest, ApiResponse, Method};

/// Client for feature screens. Failures arrive already classified, with the
/// central redirects and toasts done.
#[derive(Clone)]
pub struct ApiClient {
    chain: InterceptorChain,
}

impl ApiClient {
    pub fn new(chain: InterceptorChain) -> Self {
        Self { chain }
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.chain.send(request).await?.into_result()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::Post, path, body).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::Put, path, body).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::Patch, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(ApiRequest::delete(path)).await.map(|_| ())
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::new(method, path).with_json(body)?;
        self.send(request).await?.json()
    }
}
