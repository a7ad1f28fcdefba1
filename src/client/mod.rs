//! Client side of the emotion analysis service.
//!
//! This module covers everything between the session and the network:
//! - Configuration with `MINDFUL_*` environment overrides
//! - A deadline combinator with cooperative cancellation
//! - A `Transport` seam with a `reqwest` implementation
//! - Synthesized stand-in replies
//! - The orchestrator choosing between live, synthesized and fallback replies

pub mod config;
pub mod deadline;
pub mod error;
pub mod orchestrator;
pub mod synth;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, EndpointPaths};
pub use error::{ClientError, ClientResult};
pub use orchestrator::{CallFailure, CallResult, ChatOrchestrator};
pub use synth::{MOCK_SOURCE, Synthesizer};
pub use transport::{ApiRequest, Endpoint, HttpTransport, Transport, TransportFuture};
pub use types::{ChatRequestBody, HistoryItem, HistoryPayload, StatsPayload, StatsSeries};
