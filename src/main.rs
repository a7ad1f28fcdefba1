//! Binary entrypoint that launches the Mindful Chat terminal client.

use std::process::ExitCode;

use mindful_chat::start_mindful_chat;

/// Start an interactive session against the configured service.
fn main() -> ExitCode {
    start_mindful_chat::run()
}
