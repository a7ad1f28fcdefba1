//! Normalization of loosely typed emotion and suggestion payloads.
//!
//! The service reports emotions in one of three shapes:
//!
//! ```json
//! [{"label": "calm", "score": 0.6}, {"label": "tired", "score": "0.2"}]
//! {"label": "calm", "score": 0.6, "scores": {"calm": 0.6, "tired": 0.2}}
//! {"calm": 0.6, "tired": 0.2}
//! ```
//!
//! All three collapse to the same ordered list of [`EmotionScore`]. Anything
//! else normalizes to an empty list; nothing here returns an error.

use serde_json::{Map, Value};

use super::turn::EmotionScore;

/// Scores at or below this threshold are dropped.
pub const MIN_EMOTION_SCORE: f64 = 0.01;

/// The emotion payload shapes understood by the normalizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmotionPayload<'a> {
    /// Array of `{label, score}`-like objects.
    List(&'a [Value]),
    /// Object with a `label` and a nested `scores` dictionary; the
    /// dictionary is the emotion list, the outer label/score are ignored.
    LabeledScores(&'a Map<String, Value>),
    /// Plain dictionary of label to score.
    ScoreMap(&'a Map<String, Value>),
    /// Null, primitives and anything else.
    Unrecognized,
}

impl<'a> EmotionPayload<'a> {
    /// Classify a raw value.
    #[must_use]
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items),
            Value::Object(map) => match (map.get("label"), map.get("scores")) {
                (Some(label), Some(Value::Object(scores))) if is_truthy(label) => {
                    Self::LabeledScores(scores)
                }
                _ => Self::ScoreMap(map),
            },
            _ => Self::Unrecognized,
        }
    }

    /// Canonical emotion list for this payload.
    #[must_use]
    pub fn normalize(self) -> Vec<EmotionScore> {
        let raw: Vec<(String, f64)> = match self {
            Self::List(items) => items
                .iter()
                .filter_map(|item| {
                    let label = label_text(item.get("label")?)?;
                    let score = item.get("score").map_or(0.0, coerce_score);
                    Some((label, score))
                })
                .collect(),
            Self::LabeledScores(map) | Self::ScoreMap(map) => map
                .iter()
                .filter(|(label, _)| !label.is_empty())
                .map(|(label, score)| (label.clone(), coerce_score(score)))
                .collect(),
            Self::Unrecognized => Vec::new(),
        };

        raw.into_iter()
            .map(|(label, score)| EmotionScore::new(clean_label(&label), score))
            .filter(|e| !e.label.is_empty() && e.score > MIN_EMOTION_SCORE)
            .collect()
    }
}

/// Normalize any emotion payload into canonical records.
#[must_use]
pub fn normalize_emotions(value: &Value) -> Vec<EmotionScore> {
    EmotionPayload::classify(value).normalize()
}

/// Emotions of a chat reply: `emotions`, or `emotion` when the former is absent or falsy.
#[must_use]
pub fn payload_emotions(payload: &Value) -> Vec<EmotionScore> {
    let source = payload
        .get("emotions")
        .filter(|v| is_truthy(v))
        .or_else(|| payload.get("emotion"));
    source.map(normalize_emotions).unwrap_or_default()
}

/// Trim, then uppercase the first character and lowercase the rest.
#[must_use]
pub fn clean_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Coerce a JSON value to a finite score, defaulting to 0.
#[must_use]
pub fn coerce_score(value: &Value) -> f64 {
    let score = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { 0.0 } else { s.parse().unwrap_or(0.0) }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if score.is_finite() { score } else { 0.0 }
}

/// Normalize a suggestions field.
///
/// Arrays pass through (string items as-is, numbers as text, other items
/// skipped), strings are split on commas, anything else is empty.
#[must_use]
pub fn normalize_suggestions(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Suggestions of a chat reply.
///
/// Consults `suggestions`, `meta.suggestedExercise` and
/// `meta.suggestedExercises` in that order; the first non-empty result wins.
#[must_use]
pub fn payload_suggestions(payload: &Value) -> Vec<String> {
    let meta = payload.get("meta");
    [
        payload.get("suggestions"),
        meta.and_then(|m| m.get("suggestedExercise")),
        meta.and_then(|m| m.get("suggestedExercises")),
    ]
    .into_iter()
    .flatten()
    .map(normalize_suggestions)
    .find(|list| !list.is_empty())
    .unwrap_or_default()
}

/// Label text for truthy string, number or boolean labels.
fn label_text(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Loose truthiness: null, false, 0 and "" are falsy; arrays and objects are truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
