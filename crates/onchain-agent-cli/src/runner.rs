//! Interactive and autonomous agent runners

use std::time::Duration;

use futures_util::StreamExt;
use onchain_agent_core::agent::{AUTONOMOUS_PROMPT, Agent, AgentEvent};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info};

const SEPARATOR: &str = "-------------------";
const GOODBYE: &str = "Goodbye Agent!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chat,
    Auto,
}

/// Accepts `1`/`chat` and `2`/`auto`, ignoring case and surrounding whitespace
pub fn parse_mode(input: &str) -> Option<Mode> {
    match input.trim().to_lowercase().as_str() {
        "1" | "chat" => Some(Mode::Chat),
        "2" | "auto" => Some(Mode::Auto),
        _ => None,
    }
}

/// Event content followed by the separator line
pub fn render_event(event: &AgentEvent) -> String {
    format!("{}\n{}", event.content(), SEPARATOR)
}

/// Ask until a valid mode is entered; `None` on Ctrl-C or end of input
pub fn choose_mode(editor: &mut DefaultEditor) -> anyhow::Result<Option<Mode>> {
    loop {
        println!("\nAvailable modes:");
        println!("1. chat    - Interactive chat mode");
        println!("2. auto    - Autonomous action mode");

        match editor.readline("\nChoose a mode (enter number or name): ") {
            Ok(line) => {
                if let Some(mode) = parse_mode(&line) {
                    return Ok(Some(mode));
                }
                println!("Invalid choice. Please try again.");
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
}

pub enum TurnOutcome {
    Finished,
    Interrupted,
}

/// Stream one turn to stdout, stopping early on Ctrl-C
async fn run_turn(agent: &Agent, thread_id: &str, input: &str) -> TurnOutcome {
    let stream = agent.stream(thread_id, input);
    futures_util::pin_mut!(stream);

    let drain = async {
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => println!("{}", render_event(&event)),
                Err(e) => {
                    error!(code = e.code(), error = %e, "Agent turn failed");
                    println!("Error: {}", e);
                    if let Some(hint) = e.suggestion() {
                        println!("  Hint: {}", hint);
                    }
                    println!("{}", SEPARATOR);
                }
            }
        }
    };

    tokio::select! {
        _ = drain => TurnOutcome::Finished,
        _ = tokio::signal::ctrl_c() => TurnOutcome::Interrupted,
    }
}

pub async fn chat(agent: &Agent, thread_id: &str, editor: &mut DefaultEditor) -> anyhow::Result<()> {
    println!("Starting chat mode... Type 'exit' to end.");

    loop {
        let line = match editor.readline("\nUser: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("{}", GOODBYE);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            return Ok(());
        }
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);

        if let TurnOutcome::Interrupted = run_turn(agent, thread_id, input).await {
            println!("{}", GOODBYE);
            return Ok(());
        }
    }
}

pub async fn autonomous(agent: &Agent, thread_id: &str, interval: Duration) -> anyhow::Result<()> {
    println!("Starting autonomous mode...");
    info!(interval_secs = interval.as_secs(), "Autonomous mode started");

    loop {
        if let TurnOutcome::Interrupted = run_turn(agent, thread_id, AUTONOMOUS_PROMPT).await {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("{}", GOODBYE);
    Ok(())
}
