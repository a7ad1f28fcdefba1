//! Conversation analytics.
//!
//! - `turn`: turn and emotion record model
//! - `normalize`: heterogeneous payloads to canonical records
//! - `store`: append-only conversation log
//! - `aggregate`: bounded, ranked chart series and heatmap

pub mod aggregate;
pub mod normalize;
pub mod store;
pub mod turn;

pub use aggregate::{EmotionChart, EmotionSeries, Heatmap, MAX_SERIES, WINDOW_SIZE, aggregate};
pub use normalize::{
    EmotionPayload, MIN_EMOTION_SCORE, clean_label, normalize_emotions, normalize_suggestions,
    payload_emotions, payload_suggestions,
};
pub use store::ConversationStore;
pub use turn::{ASSISTANT_FALLBACK_TEXT, EmotionScore, Role, Turn};
