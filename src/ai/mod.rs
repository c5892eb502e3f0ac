//! Gemini integration: transport seam, wire payloads, and the request pipeline.
//!
//! The network call itself sits behind [`Transport`] so the clarification and
//! final round trips can be driven by [`MockTransport`] in tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{
    ClarificationStage, Endpoint, PayloadBuilder, RequestPipeline, ReqwestTransport,
    ResponseShape,
};
pub use mock::MockTransport;

use crate::Result;
use async_trait::async_trait;

/// Status code and undecoded body of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a serialized JSON body to `endpoint`.
    async fn post(&self, endpoint: &Endpoint, body: String) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, endpoint: &Endpoint, body: String) -> Result<RawResponse> {
        (**self).post(endpoint, body).await
    }
}
