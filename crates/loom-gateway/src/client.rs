//! HTTP client for the OpenAI-compatible gateway

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt, future};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::GatewayError;
use crate::protocol::{ChatRequest, ChatResponse, ChatStreamChunk};

/// Stream of decoded chunks from a streaming completion
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatStreamChunk, GatewayError>> + Send>>;

/// Gateway client
///
/// Holds only the connection pool and base URL, both safe to share across
/// requests. Credentials are supplied per call.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: Url,
}

impl GatewayClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    async fn send(&self, request: &ChatRequest, credential: &SecretString) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(credential.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(model = %request.model, error = %e, "gateway request failed");
                GatewayError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %request.model, status = %status, "gateway returned error");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Send a non-streaming completion request
    pub async fn complete(&self, request: &ChatRequest, credential: &SecretString) -> Result<ChatResponse, GatewayError> {
        let mut request = request.clone();
        request.stream = None;

        self.send(&request, credential)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Send a streaming completion request
    ///
    /// The returned stream ends at the gateway's `[DONE]` sentinel or when the
    /// connection closes. Chunks that fail to decode are skipped.
    pub async fn complete_stream(
        &self,
        request: &ChatRequest,
        credential: &SecretString,
    ) -> Result<ChunkStream, GatewayError> {
        let mut request = request.clone();
        request.stream = Some(true);

        let response = self.send(&request, credential).await?;

        let chunks = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| future::ready(!matches!(event, Ok(event) if event.data.trim() == "[DONE]")))
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => match serde_json::from_str::<ChatStreamChunk>(event.data.trim()) {
                        Ok(chunk) => Some(Ok(chunk)),
                        Err(e) => {
                            tracing::debug!(error = %e, data = %event.data, "skipping unparseable SSE chunk");
                            None
                        }
                    },
                    Err(e) => Some(Err(GatewayError::Stream(e.to_string()))),
                })
            });

        Ok(Box::pin(chunks))
    }
}
