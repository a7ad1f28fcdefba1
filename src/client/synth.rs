//! Locally synthesized stand-in replies.
//!
//! Payloads have the same shape as real service replies, so callers cannot
//! tell them apart except through `meta.source == "mock"`.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use super::error::ClientError;

/// Marker written to `meta.source` of every synthesized payload.
pub const MOCK_SOURCE: &str = "mock";

const REPLIES: &[&str] = &[
    "I hear the pressure you're under. Let's break it down into small, doable steps so you can feel less stuck.\n\nI can stay with you while you move through this.",
    "That sounds like a lot to carry. Let's slow down for a moment and look at one piece at a time.\n\nYou don't have to solve everything right now.",
    "Thank you for sharing this. It makes sense that you feel this way given what's going on.\n\nLet's find one small thing that could make the next hour easier.",
];

const SUGGESTIONS: &[&str] = &[
    "Take three slow inhales, exhale a touch longer than you inhale.",
    "List the top 3 things you can control this hour.",
    "Try a short body scan to release tension in shoulders.",
    "Step outside for two minutes and notice five things you can see.",
    "Write down the one task that would make today feel lighter.",
];

/// Emotion labels with the score range each one is drawn from.
const EMOTIONS: &[(&str, f64, f64)] = &[
    ("Calm", 0.45, 0.80),
    ("Anxious", 0.10, 0.40),
    ("Tired", 0.05, 0.30),
    ("Hopeful", 0.05, 0.30),
];

const WEEKDAYS: &[&str] = &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Generator of synthesized payloads with an injectable random source.
pub struct Synthesizer {
    rng: Mutex<StdRng>,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Synthesizer {
    /// Create a synthesizer seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a synthesizer drawing from the given generator.
    #[must_use]
    pub const fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Create a deterministic synthesizer for tests and demos.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Synthesize a chat reply.
    #[must_use]
    pub fn chat(&self, mode: &str, cause: Option<&ClientError>) -> Value {
        let (reply, emotions, suggestions) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let reply = REPLIES.choose(&mut *rng).copied().unwrap_or_default();
            let emotions: Vec<Value> = EMOTIONS
                .iter()
                .map(|(label, low, high)| {
                    json!({ "label": label, "score": round2(rng.gen_range(*low..*high)) })
                })
                .collect();
            let suggestions: Vec<&str> = SUGGESTIONS
                .choose_multiple(&mut *rng, 3)
                .copied()
                .collect();
            (reply, emotions, suggestions)
        };

        json!({
            "reply": reply,
            "emotions": emotions,
            "suggestions": suggestions,
            "meta": meta(Some(mode), cause),
            "trace_id": format!("mock-{}", Utc::now().timestamp_millis()),
        })
    }

    /// Synthesize a weekly stats payload.
    #[must_use]
    pub fn stats(&self, cause: Option<&ClientError>) -> Value {
        let (calm, anxious) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let calm: Vec<f64> = WEEKDAYS
                .iter()
                .map(|_| round2(0.2 + rng.gen_range(0.0..0.65)))
                .collect();
            let anxious: Vec<f64> = WEEKDAYS
                .iter()
                .map(|_| round2(0.1 + rng.gen_range(0.0..0.4)))
                .collect();
            (calm, anxious)
        };

        json!({
            "labels": WEEKDAYS,
            "series": [
                { "label": "Calm", "data": calm },
                { "label": "Anxious", "data": anxious },
            ],
            "meta": meta(None, cause),
        })
    }
}

fn meta(mode: Option<&str>, cause: Option<&ClientError>) -> Value {
    let mut meta = serde_json::Map::new();
    if let Some(mode) = mode {
        meta.insert("mode".to_string(), json!(mode));
    }
    meta.insert("source".to_string(), json!(MOCK_SOURCE));
    if let Some(cause) = cause {
        meta.insert("cause".to_string(), json!(cause.to_string()));
    }
    Value::Object(meta)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
