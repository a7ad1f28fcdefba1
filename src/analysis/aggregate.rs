//! Chart-ready aggregation of recent emotions.
//!
//! The aggregation is a pure function of the turn log: it keeps the last
//! [`WINDOW_SIZE`] assistant turns that carry emotions, orders them
//! newest-first (`#1` is the latest reply) and builds one aligned series per
//! observed label. The line chart keeps the [`MAX_SERIES`] strongest labels;
//! the heatmap keeps every label.

use std::sync::Arc;

use serde::Serialize;

use super::turn::Turn;

/// Number of assistant turns kept in the aggregation window.
pub const WINDOW_SIZE: usize = 12;
/// Number of series kept for the line chart.
pub const MAX_SERIES: usize = 4;

/// One label's values across the window, newest-first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EmotionSeries {
    /// Emotion label.
    pub label: String,
    /// One value per window turn, 0 where the label is absent.
    pub data: Vec<f64>,
}

impl EmotionSeries {
    /// Largest value of the series.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Full label × turn intensity matrix.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Heatmap {
    /// Column labels (`#1..#k`).
    pub labels: Vec<String>,
    /// Row labels, in order of first appearance scanning newest-first.
    pub emotions: Vec<String>,
    /// `rows[e][t]` is the score of `emotions[e]` in window turn `t`.
    pub rows: Vec<Vec<f64>>,
}

impl Heatmap {
    /// Score at a cell, 0 when out of range.
    #[must_use]
    pub fn cell(&self, emotion: usize, turn: usize) -> f64 {
        self.rows
            .get(emotion)
            .and_then(|row| row.get(turn))
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether there is nothing to draw.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.emotions.is_empty()
    }
}

/// Everything the renderer needs for the trend chart and the heatmap.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EmotionChart {
    /// X-axis labels, `#1` = most recent.
    pub labels: Vec<String>,
    /// Top series for the line chart, strongest first.
    pub series: Vec<EmotionSeries>,
    /// Unranked matrix with every observed label.
    pub heatmap: Heatmap,
}

impl EmotionChart {
    /// Whether the renderer should show its "no data" state.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.series.is_empty()
    }
}

/// Aggregate a turn log into chart data.
#[must_use]
pub fn aggregate(turns: &[Arc<Turn>]) -> EmotionChart {
    let qualifying: Vec<&Turn> = turns
        .iter()
        .map(AsRef::as_ref)
        .filter(|t| t.has_emotions())
        .collect();
    let skip = qualifying.len().saturating_sub(WINDOW_SIZE);
    let window: Vec<&Turn> = qualifying.into_iter().skip(skip).rev().collect();

    if window.is_empty() {
        return EmotionChart::default();
    }

    let labels: Vec<String> = (1..=window.len()).map(|i| format!("#{i}")).collect();

    let mut emotions: Vec<String> = Vec::new();
    for turn in &window {
        for emotion in &turn.emotions {
            if !emotions.contains(&emotion.label) {
                emotions.push(emotion.label.clone());
            }
        }
    }

    let full: Vec<EmotionSeries> = emotions
        .iter()
        .map(|label| EmotionSeries {
            label: label.clone(),
            data: window
                .iter()
                .map(|turn| turn.score_of(label).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    // `sort_by` is stable, so equal maxima keep first-appearance order.
    let mut ranked: Vec<(f64, &EmotionSeries)> = full.iter().map(|s| (s.max(), s)).collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    let series: Vec<EmotionSeries> = ranked
        .into_iter()
        .take(MAX_SERIES)
        .map(|(_, s)| s.clone())
        .collect();

    tracing::debug!(
        window = window.len(),
        labels = emotions.len(),
        series = series.len(),
        "emotion chart aggregated"
    );

    EmotionChart {
        heatmap: Heatmap {
            labels: labels.clone(),
            emotions,
            rows: full.into_iter().map(|s| s.data).collect(),
        },
        labels,
        series,
    }
}
