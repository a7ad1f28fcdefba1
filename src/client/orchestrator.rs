//! Request orchestration: live call, synthesized reply, or fallback.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::config::ClientConfig;
use super::deadline;
use super::error::{ClientError, ClientResult};
use super::synth::Synthesizer;
use super::transport::{ApiRequest, Endpoint, HttpTransport, Transport};

/// A failed call as presented to the user.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallFailure {
    /// Fixed, localized message for the failed operation.
    pub message: &'static str,
    /// Underlying error.
    #[source]
    pub cause: ClientError,
}

/// Uniform result of every orchestrated call.
///
/// Degraded (synthesized) replies are `Ok` too; only `meta.source` tells them apart.
pub type CallResult = Result<Value, CallFailure>;

/// Decides, per request, between the live service and a synthesized reply.
pub struct ChatOrchestrator {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    synth: Synthesizer,
}

impl ChatOrchestrator {
    /// Create an orchestrator over an arbitrary transport.
    #[must_use]
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            synth: Synthesizer::new(),
        }
    }

    /// Create an orchestrator talking HTTP to the configured service.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn http(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.clone())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Replace the synthesizer, e.g. with a seeded one.
    #[must_use]
    pub fn with_synthesizer(mut self, synth: Synthesizer) -> Self {
        self.synth = synth;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a chat message.
    pub async fn send_chat(&self, text: &str, mode: &str) -> CallResult {
        self.call(ApiRequest::Chat {
            text: text.to_string(),
            mode: mode.to_string(),
        })
        .await
    }

    /// Fetch server-side history. Never synthesized.
    pub async fn fetch_history(&self) -> CallResult {
        self.call(ApiRequest::History).await
    }

    /// Fetch aggregated stats.
    pub async fn fetch_stats(&self) -> CallResult {
        self.call(ApiRequest::Stats).await
    }

    async fn call(&self, request: ApiRequest) -> CallResult {
        let endpoint = request.endpoint();

        if self.config.mock_responses && endpoint.supports_synthesis() {
            tracing::debug!(endpoint = endpoint.as_str(), "serving synthesized reply");
            return Ok(self.synthesize(&request, None).await);
        }

        let transport = Arc::clone(&self.transport);
        let outbound = request.clone();
        let result = deadline::execute(
            move |token| async move { transport.send(outbound, token).await },
            self.config.request_timeout,
        )
        .await;

        let cause = match result {
            Ok(payload) => return Ok(payload),
            Err(cause) => cause,
        };

        if self.config.fallback_to_mock_on_error && endpoint.supports_synthesis() {
            tracing::warn!(
                endpoint = endpoint.as_str(),
                status = ?cause.status(),
                "call failed, falling back to synthesized reply: {cause}"
            );
            return Ok(self.synthesize(&request, Some(&cause)).await);
        }

        tracing::warn!(
            endpoint = endpoint.as_str(),
            status = ?cause.status(),
            "call failed: {cause}"
        );
        Err(CallFailure {
            message: endpoint.failure_message(),
            cause,
        })
    }

    async fn synthesize(&self, request: &ApiRequest, cause: Option<&ClientError>) -> Value {
        tokio::time::sleep(self.config.mock_delay).await;
        match request.endpoint() {
            Endpoint::Chat => {
                let mode = request.mode().unwrap_or(&self.config.default_mode);
                self.synth.chat(mode, cause)
            }
            Endpoint::Stats | Endpoint::History => self.synth.stats(cause),
        }
    }
}
