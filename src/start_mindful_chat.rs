//! Startup helpers for the Mindful Chat terminal client.
//!
//! Configuration comes from `MINDFUL_*` environment variables; logs go to
//! stderr and are filtered with `RUST_LOG`.

use std::process::ExitCode;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::client::{ChatOrchestrator, ClientConfig};
use crate::render;
use crate::session::{Notice, Session, SubmitOutcome};

/// A parsed input line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Show the trend chart and heatmap.
    Chart,
    /// Show server-side history.
    History,
    /// Show aggregated stats.
    Stats,
    /// Show grounding tips.
    Tips,
    /// List commands.
    Help,
    /// Leave the session.
    Quit,
    /// Send a chat message.
    Say(&'a str),
}

impl<'a> Command<'a> {
    /// Parse one input line.
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/chart" => Self::Chart,
            "/history" => Self::History,
            "/stats" => Self::Stats,
            "/tips" => Self::Tips,
            "/quit" | "/exit" => Self::Quit,
            other if other.starts_with('/') => Self::Help,
            other => Self::Say(other),
        }
    }
}

const HELP: &str = "Commands: /chart /history /stats /tips /quit\n";

/// Run the client (used by the `mindful-chat` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` when the session ends, `1` on setup failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Mindful Chat v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    tracing::info!(
        "API endpoint: {} (mock: {}, fallback: {})",
        config.api_base_url,
        config.mock_responses,
        config.fallback_to_mock_on_error
    );

    let orchestrator = match ChatOrchestrator::http(config) {
        Ok(o) => o,
        Err(e) => {
            tracing::error!("Failed to create client: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let session = Session::new(orchestrator);
    let result = rt.block_on(async {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        let mut notices = tokio::io::stderr();
        repl(&session, input, &mut output, &mut notices).await
    });

    if let Err(e) = result {
        tracing::error!("Terminal I/O error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Read commands from `input` until EOF or `/quit`.
///
/// Rendered views go to `output`; failure notices go to `notices`. History
/// is fetched at start-up and after every reply, and `/history` shows the
/// latest copy.
///
/// # Errors
/// Returns an error if reading or writing the terminal fails.
pub async fn repl<R, W, E>(
    session: &Session,
    input: R,
    output: &mut W,
    notices: &mut E,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    let (title, note) = render::mode_copy(session.mode());
    let mut history = session.refresh_history().await;
    let mut banner = format!("{title}\n{note}\n{HELP}");
    if let Some(known) = &history {
        banner.push_str(&render::render_history(known));
    }
    write_view(output, &banner).await?;

    let mut board = NoticeBoard::default();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let view = match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => HELP.to_string(),
            Command::Tips => render::render_tips(),
            Command::Chart => {
                let chart = session.chart();
                format!(
                    "{}{}",
                    render::render_chart(&chart),
                    render::render_heatmap(&chart.heatmap)
                )
            }
            Command::History => {
                if history.is_none() {
                    history = session.refresh_history().await;
                }
                history.as_ref().map_or_else(
                    || format!("{}\n", render::NO_HISTORY),
                    render::render_history,
                )
            }
            Command::Stats => match session.stats().await {
                Ok(stats) => render::render_stats(&stats),
                Err(notice) => {
                    board.show(notice, notices).await?;
                    continue;
                }
            },
            Command::Say(text) => match session.submit(text).await {
                SubmitOutcome::Replied(turn) => {
                    if let Some(fresh) = session.refresh_history().await {
                        history = Some(fresh);
                    }
                    render::render_turn(&turn)
                }
                SubmitOutcome::Failed(notice) => {
                    board.show(notice, notices).await?;
                    continue;
                }
                SubmitOutcome::Ignored | SubmitOutcome::Busy => continue,
            },
        };
        write_view(output, &view).await?;
    }

    tracing::info!(session = %session.id(), turns = session.store().len(), "session ended");
    Ok(())
}

async fn write_view<W>(output: &mut W, view: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    output.write_all(view.as_bytes()).await?;
    output.flush().await
}

/// The notice currently on screen.
#[derive(Default)]
struct NoticeBoard {
    active: Option<Notice>,
}

impl NoticeBoard {
    /// Print `notice` unless the same message is still visible.
    async fn show<E>(&mut self, notice: Notice, notices: &mut E) -> std::io::Result<()>
    where
        E: AsyncWrite + Unpin + Send,
    {
        let visible = self
            .active
            .as_ref()
            .is_some_and(|shown| shown.message == notice.message && !shown.is_expired());
        if visible {
            tracing::debug!("notice still visible, not repeated");
            return Ok(());
        }

        let line = format!("{}\n", render::render_notice(&notice));
        self.active = Some(notice);
        notices.write_all(line.as_bytes()).await?;
        notices.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::orchestrator::tests::FakeTransport;
    use crate::client::{ApiRequest, ClientError, Synthesizer};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn session(config: ClientConfig, transport: FakeTransport) -> Session {
        let orch = ChatOrchestrator::new(config, Arc::new(transport))
            .with_synthesizer(Synthesizer::seeded(3));
        Session::new(orch)
    }

    async fn drive(session: &Session, script: &str) -> (String, String) {
        let mut output = Vec::new();
        let mut notices = Vec::new();
        repl(session, script.as_bytes(), &mut output, &mut notices)
            .await
            .unwrap();
        (
            String::from_utf8(output).unwrap(),
            String::from_utf8(notices).unwrap(),
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(" /chart "), Command::Chart);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/nope"), Command::Help);
        assert_eq!(Command::parse("  feeling low "), Command::Say("feeling low"));
        assert_eq!(Command::parse(""), Command::Say(""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_then_chart() {
        let session = session(
            ClientConfig::default(),
            FakeTransport::replying(|_| {
                Ok(json!({ "reply": "Breathe with me.", "emotions": { "calm": 0.7 } }))
            }),
        );

        let (out, notices) = drive(&session, "hello\n\n/chart\n/quit\nignored\n").await;
        assert!(out.starts_with("Mindful Chat"));
        assert!(out.contains("Breathe with me."));
        assert!(out.contains("Calm: 70%"));
        assert!(out.contains("#1"));
        assert!(notices.is_empty());
        assert_eq!(session.store().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_go_to_notices() {
        let config = ClientConfig::default().with_fallback(false);
        let session = session(
            config,
            FakeTransport::replying(|_| Err(ClientError::Timeout(60_000))),
        );

        let (out, notices) = drive(&session, "hello\n/stats\n/history\n/chart\n").await;
        assert!(notices.contains("服务暂时不可用，请稍后重试。"));
        assert!(notices.contains("无法获取情绪统计。"));
        assert!(out.contains("No history yet."));
        assert!(out.contains("No emotion data yet."));
        assert_eq!(session.store().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_and_tips_views() {
        let session = session(
            ClientConfig::default(),
            FakeTransport::replying(|request| match request {
                ApiRequest::History => Ok(json!({ "items": [{ "emotion": "Hopeful", "mode": "chat" }] })),
                _ => Ok(json!({})),
            }),
        );

        let (out, _) = drive(&session, "/history\n/tips\n/what\n").await;
        assert!(out.contains("Hopeful"));
        assert!(out.contains(render::TIPS[0]));
        assert!(out.matches("Commands:").count() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_shown_at_start() {
        let session = session(
            ClientConfig::default(),
            FakeTransport::replying(|request| match request {
                ApiRequest::History => Ok(json!({ "items": [{ "emotion": "Hopeful" }] })),
                _ => Ok(json!({})),
            }),
        );

        let (out, _) = drive(&session, "").await;
        let hopeful = out.find("Hopeful").unwrap();
        assert!(out.find("Commands:").unwrap() < hopeful);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_refreshed_after_reply() {
        let mut chats = 0;
        let transport = FakeTransport::replying(move |request| match request {
            ApiRequest::Chat { .. } => {
                chats += 1;
                Ok(json!({ "reply": "ok", "emotions": { "calm": 0.5 } }))
            }
            ApiRequest::History => Ok(json!({ "items": [{ "emotion": format!("Entry{chats}") }] })),
            ApiRequest::Stats => Ok(json!({})),
        });
        let session = session(ClientConfig::default(), transport);

        let (out, _) = drive(&session, "/history\nfirst\nsecond\n/history\n").await;
        assert_eq!(out.matches("Entry0").count(), 2);
        assert!(!out.contains("Entry1"));
        assert_eq!(out.matches("Entry2").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_notice_not_repeated() {
        let config = ClientConfig::default().with_fallback(false);
        let session = session(
            config,
            FakeTransport::replying(|_| Err(ClientError::Timeout(60_000))),
        );

        let (_, notices) = drive(&session, "one\ntwo\n").await;
        assert_eq!(notices.lines().count(), 1);

        let mut board = NoticeBoard::default();
        let mut sink = Vec::new();
        let lifetime = Duration::from_millis(4200);
        board.show(Notice::new("down", lifetime), &mut sink).await.unwrap();
        board.show(Notice::new("down", lifetime), &mut sink).await.unwrap();
        board.show(Notice::new("other", lifetime), &mut sink).await.unwrap();
        tokio::time::sleep(lifetime).await;
        board.show(Notice::new("other", lifetime), &mut sink).await.unwrap();
        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "! down\n! other\n! other\n"
        );
    }
}
