//! Transport seam between the orchestrator and the analysis service.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::config::ClientConfig;
use super::error::{ClientError, ClientResult};
use super::types::ChatRequestBody;

/// Boxed future type for transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The three service endpoints.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Endpoint {
    /// `POST /chat`.
    Chat,
    /// `GET /history`.
    History,
    /// `GET /stats`.
    Stats,
}

impl Endpoint {
    /// Stable string form for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::History => "history",
            Self::Stats => "stats",
        }
    }

    /// Whether a synthesized payload may stand in for this endpoint.
    ///
    /// History reflects real past state and has no synthesized substitute,
    /// so it never honours the mock switch nor the fallback switch.
    #[must_use]
    pub const fn supports_synthesis(self) -> bool {
        matches!(self, Self::Chat | Self::Stats)
    }

    /// Fixed user-facing message shown when the call fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Chat => "服务暂时不可用，请稍后重试。",
            Self::History => "无法获取历史记录。",
            Self::Stats => "无法获取情绪统计。",
        }
    }

    /// Configured path for this endpoint.
    #[must_use]
    pub fn path(self, config: &ClientConfig) -> &str {
        match self {
            Self::Chat => &config.endpoints.chat,
            Self::History => &config.endpoints.history,
            Self::Stats => &config.endpoints.stats,
        }
    }
}

/// A request to one of the service endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiRequest {
    /// Send a chat message.
    Chat {
        /// Message text.
        text: String,
        /// Conversation mode.
        mode: String,
    },
    /// Fetch server-side history.
    History,
    /// Fetch aggregated stats.
    Stats,
}

impl ApiRequest {
    /// Endpoint targeted by this request.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::Chat { .. } => Endpoint::Chat,
            Self::History => Endpoint::History,
            Self::Stats => Endpoint::Stats,
        }
    }

    /// Mode carried by the request, if any.
    #[must_use]
    pub fn mode(&self) -> Option<&str> {
        match self {
            Self::Chat { mode, .. } => Some(mode),
            Self::History | Self::Stats => None,
        }
    }
}

/// Something that can deliver an [`ApiRequest`] and return its JSON reply.
pub trait Transport: Send + Sync {
    /// Send a request; implementations should stop work once `cancel` fires.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable body.
    fn send(
        &self,
        request: ApiRequest,
        cancel: CancellationToken,
    ) -> TransportFuture<'_, ClientResult<Value>>;
}

/// `reqwest`-backed transport talking JSON over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport for the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Self::build_client()?;
        Ok(Self { client, config })
    }

    /// Build an HTTP client sending JSON headers on every request.
    fn build_client() -> ClientResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // The deadline is enforced by `deadline::execute`, not by the client.
        reqwest::Client::builder()
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))
    }

    async fn perform(&self, request: ApiRequest) -> ClientResult<Value> {
        let endpoint = request.endpoint();
        let url = self.config.url_for(endpoint.path(&self.config));
        tracing::debug!(endpoint = endpoint.as_str(), %url, "dispatching request");

        let builder = match request {
            ApiRequest::Chat { text, mode } => {
                self.client.post(&url).json(&ChatRequestBody { text, mode })
            }
            ApiRequest::History | ApiRequest::Stats => self.client.get(&url),
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: ApiRequest,
        cancel: CancellationToken,
    ) -> TransportFuture<'_, ClientResult<Value>> {
        Box::pin(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => Err(ClientError::HttpClient("request cancelled".to_string())),
                result = self.perform(request) => result,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    fn transport_for(base: &str) -> HttpTransport {
        HttpTransport::new(ClientConfig::new().with_base_url(base)).unwrap()
    }

    #[test]
    fn test_endpoint_policy() {
        assert!(Endpoint::Chat.supports_synthesis());
        assert!(Endpoint::Stats.supports_synthesis());
        assert!(!Endpoint::History.supports_synthesis());
        assert_eq!(Endpoint::History.failure_message(), "无法获取历史记录。");
    }

    #[test]
    fn test_endpoint_paths_follow_config() {
        let config = ClientConfig::default();
        assert_eq!(Endpoint::Chat.path(&config), "/chat");
        assert_eq!(Endpoint::Stats.path(&config), "/stats");
    }

    #[tokio::test]
    async fn test_chat_posts_json_body() {
        // `Json` rejects requests without a JSON content type, so a 200 here
        // also proves the header is sent.
        let router = Router::new().route(
            "/chat",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "reply": "heard you", "echo": body }))
            }),
        );
        let base = spawn_server(router).await;

        let request = ApiRequest::Chat {
            text: "hello".to_string(),
            mode: "chat".to_string(),
        };
        let payload = transport_for(&base)
            .send(request, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(payload["reply"], "heard you");
        assert_eq!(payload["echo"]["text"], "hello");
        assert_eq!(payload["echo"]["mode"], "chat");
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let router = Router::new().route(
            "/history",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let base = spawn_server(router).await;

        let err = transport_for(&base)
            .send(ApiRequest::History, CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ClientError::HttpStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport_for(&format!("http://{addr}"))
            .send(ApiRequest::Stats, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_request() {
        let token = CancellationToken::new();
        token.cancel();
        let err = transport_for("http://127.0.0.1:9")
            .send(ApiRequest::Stats, token)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::HttpClient(_)));
    }
}
