//! Wire types for the analysis service.
//!
//! Chat replies stay as raw `serde_json::Value` because their emotion shape
//! varies; normalization happens in `analysis::normalize`. History and stats
//! have stable shapes and get typed views with lenient defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequestBody {
    /// Message text.
    pub text: String,
    /// Conversation mode.
    pub mode: String,
}

/// Reply of `GET /history`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HistoryPayload {
    /// Past entries, newest first as sent by the service.
    pub items: Vec<HistoryItem>,
}

impl HistoryPayload {
    /// Parse a history reply item by item.
    ///
    /// A malformed item keeps its slot with empty fields; a reply without an
    /// `items` array is empty.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(items) = value.get("items").and_then(Value::as_array) else {
            tracing::debug!("history payload has no items array");
            return Self::default();
        };
        Self {
            items: items.iter().map(HistoryItem::from_value).collect(),
        }
    }
}

/// One entry of the server-side history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    /// Dominant emotion recorded for the entry.
    pub emotion: Option<String>,
    /// Mode the entry was recorded in.
    pub mode: Option<String>,
    /// Timestamp as sent by the service.
    pub timestamp: Option<String>,
}

impl HistoryItem {
    /// Read one entry; `emotion` may be a label string or an object with a `label`.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let emotion = value.get("emotion").and_then(|emotion| match emotion {
            Value::Object(fields) => fields.get("label").and_then(text),
            other => text(other),
        });
        Self {
            emotion,
            mode: value.get("mode").and_then(text),
            timestamp: value.get("timestamp").and_then(text),
        }
    }
}

/// Reply of `GET /stats`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatsPayload {
    /// X-axis labels.
    pub labels: Vec<String>,
    /// One series per emotion.
    pub series: Vec<StatsSeries>,
    /// Free-form metadata (`source`, `cause`, ...).
    pub meta: Value,
}

impl StatsPayload {
    /// Parse a stats reply field by field.
    ///
    /// Non-text labels are skipped, non-object series are skipped and
    /// non-numeric values read as 0.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let labels = value
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| labels.iter().filter_map(text).collect())
            .unwrap_or_default();
        let series = value
            .get("series")
            .and_then(Value::as_array)
            .map(|series| series.iter().filter_map(StatsSeries::from_value).collect())
            .unwrap_or_default();
        Self {
            labels,
            series,
            meta: value.get("meta").cloned().unwrap_or(Value::Null),
        }
    }

    /// Origin of the payload (`"mock"` for synthesized stats).
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.meta.get("source").and_then(Value::as_str)
    }
}

/// A named stats series.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatsSeries {
    /// Emotion label.
    pub label: String,
    /// One value per stats label.
    pub data: Vec<f64>,
}

impl StatsSeries {
    /// Read one series; `None` when the value is not an object.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        Some(Self {
            label: fields.get("label").and_then(text).unwrap_or_default(),
            data: fields
                .get("data")
                .and_then(Value::as_array)
                .map(|data| data.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect())
                .unwrap_or_default(),
        })
    }
}

/// Text of a string or number value.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_parses_partial_items() {
        let payload = HistoryPayload::from_value(&json!({
            "items": [
                { "emotion": "Calm", "mode": "chat", "timestamp": "2024-05-01T10:00:00Z" },
                { "mode": "chat" }
            ]
        }));
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].emotion.as_deref(), Some("Calm"));
        assert_eq!(payload.items[1].emotion, None);
    }

    #[test]
    fn test_history_unexpected_shape_is_empty() {
        assert!(HistoryPayload::from_value(&json!("nope")).items.is_empty());
        assert!(HistoryPayload::from_value(&json!({})).items.is_empty());
    }

    #[test]
    fn test_one_malformed_history_item_keeps_the_rest() {
        let payload = HistoryPayload::from_value(&json!({
            "items": [
                { "emotion": "Calm", "mode": "chat" },
                { "emotion": { "label": "sad", "score": 0.8 }, "mode": "chat" },
                { "emotion": [1, 2], "mode": 7 },
                "garbage"
            ]
        }));
        assert_eq!(payload.items.len(), 4);
        assert_eq!(payload.items[0].emotion.as_deref(), Some("Calm"));
        assert_eq!(payload.items[1].emotion.as_deref(), Some("sad"));
        assert_eq!(payload.items[2].emotion, None);
        assert_eq!(payload.items[2].mode.as_deref(), Some("7"));
        assert_eq!(payload.items[3], HistoryItem::default());
    }

    #[test]
    fn test_stats_non_numeric_values_read_as_zero() {
        let stats = StatsPayload::from_value(&json!({
            "labels": ["Mon", "Tue", null],
            "series": [
                { "label": "Calm", "data": [0.4, null, "x"] },
                "broken",
                { "label": "Anxious" }
            ]
        }));
        assert_eq!(stats.labels, vec!["Mon", "Tue"]);
        assert_eq!(stats.series.len(), 2);
        assert_eq!(stats.series[0].data, vec![0.4, 0.0, 0.0]);
        assert!(stats.series[1].data.is_empty());
        assert_eq!(stats.source(), None);
    }

    #[test]
    fn test_stats_source() {
        let stats = StatsPayload::from_value(&json!({
            "labels": ["Mon", "Tue"],
            "series": [{ "label": "Calm", "data": [0.4, 0.5] }],
            "meta": { "source": "mock" }
        }));
        assert_eq!(stats.labels, vec!["Mon", "Tue"]);
        assert_eq!(stats.series[0].data, vec![0.4, 0.5]);
        assert_eq!(stats.source(), Some("mock"));
    }
}
