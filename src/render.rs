//! Plain-text rendering of turns, charts and side panels.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};

use crate::analysis::{EmotionChart, Heatmap, Role, Turn};
use crate::client::{HistoryPayload, StatsPayload};
use crate::session::Notice;

/// Suggestions and emotion tags shown per turn.
const MAX_TAGS: usize = 4;
/// History entries shown in the side panel.
const MAX_HISTORY: usize = 6;
/// Shown in place of a chart when there is nothing to plot.
pub const NO_DATA: &str = "No emotion data yet.";
/// Shown when the service returned no history.
pub const NO_HISTORY: &str = "No history yet.";

/// Grounding tips shown on demand.
pub const TIPS: [&str; 3] = [
    "Try a 3–minute grounding: name 3 things you see, hear, and feel.",
    "Short notes beat long rants. Share specifics to get actionable steps.",
    "Slow your inhale, and make the exhale a touch longer.",
];

/// Known modes as `(mode, title, note)`. The first entry is the fallback.
const MODES: [(&str, &str, &str); 1] = [(
    "chat",
    "Mindful Chat",
    "Share how you feel. You'll get a grounded, empathic reply.",
)];

/// Title and note for a conversation mode, falling back to the chat copy.
#[must_use]
pub fn mode_copy(mode: &str) -> (&'static str, &'static str) {
    let &(_, title, note) = MODES
        .iter()
        .find(|(name, _, _)| *name == mode)
        .unwrap_or(&MODES[0]);
    (title, note)
}

/// Short weekday and local time, e.g. `Tue 14:05`.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%a %H:%M").to_string()
}

/// Render one turn with its badge, body, suggestions and emotion tags.
#[must_use]
pub fn render_turn(turn: &Turn) -> String {
    let badge = match turn.role {
        Role::User => "You".to_string(),
        Role::Assistant => format!("[{}]", turn.mode.replacen('-', " ", 1)),
    };
    let mut out = format!("{badge} · {}\n{}\n", format_timestamp(&turn.timestamp), turn.text);

    if !turn.suggestions.is_empty() {
        out.push_str("Action suggestions:\n");
        for suggestion in turn.suggestions.iter().take(MAX_TAGS) {
            let _ = writeln!(out, "  • {suggestion}");
        }
    }

    if !turn.emotions.is_empty() {
        let tags: Vec<String> = turn
            .emotions
            .iter()
            .take(MAX_TAGS)
            .map(|e| format!("{}: {}", e.label, percent(e.score)))
            .collect();
        let _ = writeln!(out, "{}", tags.join("  "));
    }

    out
}

/// Render the line-chart series as a table, newest column first.
#[must_use]
pub fn render_chart(chart: &EmotionChart) -> String {
    if chart.is_empty() {
        return format!("{NO_DATA}\n");
    }

    let width = label_width(chart.series.iter().map(|s| s.label.as_str()));
    let mut out = format!("{:width$}", "");
    for label in &chart.labels {
        let _ = write!(out, " {label:>5}");
    }
    out.push('\n');

    for series in &chart.series {
        let _ = write!(out, "{:width$}", series.label);
        for value in &series.data {
            let _ = write!(out, " {:>5}", percent(*value));
        }
        out.push('\n');
    }
    out
}

/// Render the full label × turn matrix with shade glyphs.
#[must_use]
pub fn render_heatmap(heatmap: &Heatmap) -> String {
    if heatmap.is_empty() {
        return format!("{NO_DATA}\n");
    }

    let width = label_width(heatmap.emotions.iter().map(String::as_str));
    let mut out = format!("{:width$}", "");
    for label in &heatmap.labels {
        let _ = write!(out, " {label:>3}");
    }
    out.push('\n');

    for (row, emotion) in heatmap.emotions.iter().enumerate() {
        let _ = write!(out, "{emotion:width$}");
        for col in 0..heatmap.labels.len() {
            let _ = write!(out, " {:>3}", shade(heatmap.cell(row, col)));
        }
        out.push('\n');
    }
    out
}

/// Render the first history entries.
#[must_use]
pub fn render_history(history: &HistoryPayload) -> String {
    if history.items.is_empty() {
        return format!("{NO_HISTORY}\n");
    }

    let mut out = String::new();
    for item in history.items.iter().take(MAX_HISTORY) {
        let emotion = item.emotion.as_deref().filter(|e| !e.is_empty()).unwrap_or("—");
        let time = item
            .timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| format_timestamp(&ts.with_timezone(&Utc)))
            .unwrap_or_default();
        let mode = item.mode.as_deref().unwrap_or_default().replacen('-', " ", 1);
        let _ = writeln!(out, "{emotion:<12} {time:<10} {mode}");
    }
    out
}

/// Render a stats payload as a table.
#[must_use]
pub fn render_stats(stats: &StatsPayload) -> String {
    if stats.labels.is_empty() || stats.series.is_empty() {
        return format!("{NO_DATA}\n");
    }

    let width = label_width(stats.series.iter().map(|s| s.label.as_str()));
    let mut out = format!("{:width$}", "");
    for label in &stats.labels {
        let _ = write!(out, " {label:>5}");
    }
    out.push('\n');
    for series in &stats.series {
        let _ = write!(out, "{:width$}", series.label);
        for value in &series.data {
            let _ = write!(out, " {:>5}", percent(*value));
        }
        out.push('\n');
    }
    if let Some(source) = stats.source() {
        let _ = writeln!(out, "source: {source}");
    }
    out
}

/// Render the grounding tips.
#[must_use]
pub fn render_tips() -> String {
    TIPS.iter().fold(String::new(), |mut out, tip| {
        let _ = writeln!(out, "  • {tip}");
        out
    })
}

/// Render a notice for the error stream.
#[must_use]
pub fn render_notice(notice: &Notice) -> String {
    format!("! {}", notice.message)
}

/// Opacity of a heatmap cell, `None` for an empty cell.
#[must_use]
pub fn cell_alpha(score: f64) -> Option<f64> {
    if score <= 0.0 {
        return None;
    }
    Some(score.clamp(0.0, 1.0).mul_add(0.7, 0.15))
}

fn shade(score: f64) -> &'static str {
    match cell_alpha(score) {
        None => "·",
        Some(alpha) if alpha < 0.35 => "░",
        Some(alpha) if alpha < 0.6 => "▒",
        Some(_) => "▓",
    }
}

fn percent(score: f64) -> String {
    format!("{:.0}%", (score * 100.0).round())
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0).max(4) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{EmotionScore, aggregate};
    use crate::client::HistoryItem;
    use serde_json::json;
    use std::sync::Arc;

    fn reply() -> Turn {
        Turn::assistant_from_payload(
            &json!({
                "reply": "Let's slow down.",
                "emotions": [
                    { "label": "calm", "score": 0.624 },
                    { "label": "tired", "score": 0.186 }
                ],
                "suggestions": ["One", "Two", "Three", "Four", "Five"],
                "meta": { "mode": "deep-dive" }
            }),
            "chat",
        )
    }

    #[test]
    fn test_render_turn() {
        let text = render_turn(&reply());
        assert!(text.starts_with("[deep dive]"));
        assert!(text.contains("Let's slow down."));
        assert!(text.contains("Calm: 62%"));
        assert!(text.contains("Tired: 19%"));
        assert!(text.contains("• Four"));
        assert!(!text.contains("Five"));
    }

    #[test]
    fn test_render_user_turn() {
        let text = render_turn(&Turn::user("hello", "chat"));
        assert!(text.starts_with("You"));
        assert!(!text.contains("Action suggestions"));
    }

    #[test]
    fn test_empty_chart_shows_no_data() {
        let chart = aggregate(&[]);
        assert_eq!(render_chart(&chart), "No emotion data yet.\n");
        assert_eq!(render_heatmap(&chart.heatmap), "No emotion data yet.\n");
    }

    #[test]
    fn test_chart_and_heatmap_rows() {
        let mut second = reply();
        second.emotions = vec![EmotionScore::new("Anxious", 0.9)];
        let chart = aggregate(&[Arc::new(reply()), Arc::new(second)]);

        let table = render_chart(&chart);
        assert!(table.contains("#1"));
        assert!(table.contains("#2"));
        assert!(table.lines().any(|l| l.starts_with("Anxious") && l.contains("90%")));

        let grid = render_heatmap(&chart.heatmap);
        assert_eq!(grid.lines().count(), 1 + chart.heatmap.emotions.len());
        assert!(grid.contains('▓'));
        assert!(grid.contains('·'));
    }

    #[test]
    fn test_cell_alpha() {
        assert_eq!(cell_alpha(0.0), None);
        assert!((cell_alpha(1.0).unwrap_or_default() - 0.85).abs() < 1e-9);
        assert!((cell_alpha(4.0).unwrap_or_default() - 0.85).abs() < 1e-9);
        assert!((cell_alpha(0.5).unwrap_or_default() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_render_history() {
        assert_eq!(render_history(&HistoryPayload::default()), "No history yet.\n");

        let history = HistoryPayload {
            items: (0..8)
                .map(|_| HistoryItem {
                    emotion: None,
                    mode: Some("check-in".to_string()),
                    timestamp: None,
                })
                .collect(),
        };
        let text = render_history(&history);
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains('—'));
        assert!(text.contains("check in"));
    }

    #[test]
    fn test_mode_copy_fallback() {
        assert_eq!(mode_copy("chat").0, "Mindful Chat");
        assert_eq!(mode_copy("unknown").0, "Mindful Chat");
    }

    #[test]
    fn test_tips() {
        assert_eq!(render_tips().lines().count(), TIPS.len());
    }
}
