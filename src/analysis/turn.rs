//! Conversation turn model.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::normalize::{payload_emotions, payload_suggestions};

/// Text shown when an assistant reply carries no usable text.
pub const ASSISTANT_FALLBACK_TEXT: &str = "I am here with you.";

/// Role of a turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User input.
    User,
    /// Assistant reply.
    Assistant,
}

impl Role {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A canonical emotion record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    /// Capitalized, non-empty label.
    pub label: String,
    /// Finite score, conventionally in `[0, 1]`.
    pub score: f64,
}

impl EmotionScore {
    /// Build a record from already-clean parts.
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// One user or assistant exchange unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the turn.
    pub role: Role,
    /// Display text.
    pub text: String,
    /// Normalized emotions; always empty for user turns.
    pub emotions: Vec<EmotionScore>,
    /// Action suggestions in server order.
    pub suggestions: Vec<String>,
    /// When the turn was produced.
    pub timestamp: DateTime<Utc>,
    /// Conversation mode tag.
    pub mode: String,
    /// Server trace identifier, if any.
    pub trace_id: Option<String>,
    /// `meta.source` of the reply (`"mock"` for synthesized replies).
    pub source: Option<String>,
}

impl Turn {
    /// Build a user turn stamped with the capture time.
    #[must_use]
    pub fn user(text: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            emotions: Vec::new(),
            suggestions: Vec::new(),
            timestamp: Utc::now(),
            mode: mode.into(),
            trace_id: None,
            source: None,
        }
    }

    /// Build an assistant turn from a raw chat reply.
    ///
    /// Never fails: missing or malformed fields fall back to defaults.
    #[must_use]
    pub fn assistant_from_payload(payload: &Value, mode: &str) -> Self {
        let text = ["reply", "message", "text"]
            .iter()
            .find_map(|key| non_empty_str(payload.get(*key)))
            .unwrap_or(ASSISTANT_FALLBACK_TEXT)
            .to_string();

        let meta = payload.get("meta");
        let mode = non_empty_str(meta.and_then(|m| m.get("mode")))
            .unwrap_or(mode)
            .to_string();

        Self {
            role: Role::Assistant,
            text,
            emotions: payload_emotions(payload),
            suggestions: payload_suggestions(payload),
            timestamp: parse_timestamp(payload.get("timestamp")).unwrap_or_else(Utc::now),
            mode,
            trace_id: non_empty_str(payload.get("trace_id")).map(str::to_string),
            source: non_empty_str(meta.and_then(|m| m.get("source"))).map(str::to_string),
        }
    }

    /// Whether this is an assistant turn carrying at least one emotion.
    #[must_use]
    pub fn has_emotions(&self) -> bool {
        self.role == Role::Assistant && !self.emotions.is_empty()
    }

    /// Score of the first emotion matching `label`, if present.
    #[must_use]
    pub fn score_of(&self, label: &str) -> Option<f64> {
        self.emotions
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.score)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Offset-less layouts, read as UTC.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Accept RFC 3339 strings, naive ISO 8601 strings (as UTC) and epoch milliseconds.
fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(raw) => {
            let raw = raw.trim();
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NAIVE_LAYOUTS.iter().find_map(|layout| {
                        NaiveDateTime::parse_from_str(raw, layout)
                            .ok()
                            .map(|naive| naive.and_utc())
                    })
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}
