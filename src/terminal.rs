//! Line-based terminal front-end.
//!
//! Reads user lines from stdin and prints the orchestrator's events to
//! stdout. It only renders; all conversation state lives in the
//! orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use doppel_context::{ImportSource, Importer};
use doppel_core::{ChatEvent, NoticeLevel};
use doppel_engine::{Persona, TurnOrchestrator};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Say(String),
    Import(PathBuf),
    Quit,
    Usage(&'static str),
}

fn parse_line(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "/quit" || trimmed == "/exit" {
        return Some(Command::Quit);
    }
    if let Some(rest) = trimmed.strip_prefix("/import") {
        let path = rest.trim();
        if path.is_empty() {
            return Some(Command::Usage("usage: /import <path>"));
        }
        if rest.starts_with(char::is_whitespace) {
            return Some(Command::Import(PathBuf::from(path)));
        }
    }
    Some(Command::Say(line.to_string()))
}

fn render(event: &ChatEvent, persona: &Persona) -> Option<String> {
    match event {
        ChatEvent::ReplySegment { text, .. } => Some(format!("{}: {text}", persona.agent_nickname)),
        ChatEvent::SystemNotice { level: NoticeLevel::Info, text, .. } => Some(format!("[system] {text}")),
        ChatEvent::SystemNotice { level: NoticeLevel::Error, text, .. } => Some(format!("[error] {text}")),
        ChatEvent::UserMessage { .. } | ChatEvent::Dispatched { .. } | ChatEvent::ReplyComplete { .. } => None,
    }
}

fn print_event(event: &ChatEvent, persona: &Persona) {
    if let Some(line) = render(event, persona) {
        println!("{line}");
    }
}

/// Run the chat loop until `/quit`, end of input or Ctrl-C.
///
/// On end of input, anything still buffered is dispatched and its reply
/// printed before returning.
pub async fn run(orchestrator: TurnOrchestrator, importer: Option<Arc<Importer>>, persona: Persona) -> Result<()> {
    let mut events = orchestrator.subscribe();
    orchestrator.announce_context();
    println!(
        "Chatting with {} as {}. /import <path> to load history, /quit to leave.",
        persona.agent_nickname, persona.user_nickname
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let drained = CancellationToken::new();

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(_) => {
                        debug!("stdin closed, flushing pending input");
                        stdin_open = false;
                        let orchestrator = orchestrator.clone();
                        let drained = drained.clone();
                        let _ = tokio::spawn(async move {
                            let _ = orchestrator.flush_now().await;
                            drained.cancel();
                        });
                        continue;
                    }
                };
                match parse_line(&line) {
                    None => {}
                    Some(Command::Quit) => break,
                    Some(Command::Usage(usage)) => println!("[system] {usage}"),
                    Some(Command::Say(text)) => orchestrator.submit(text),
                    Some(Command::Import(path)) => match &importer {
                        Some(importer) => {
                            let orchestrator = orchestrator.clone();
                            let importer = Arc::clone(importer);
                            let _ = tokio::spawn(async move {
                                let source = ImportSource::from_path(path);
                                let _ = orchestrator.apply_import(&importer, &source).await;
                            });
                        }
                        None => println!("[error] import is unavailable without an API key"),
                    },
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, &persona),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "terminal fell behind on events"),
                Err(RecvError::Closed) => break,
            },
            () = drained.cancelled() => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    orchestrator.shutdown();
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event, &persona),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    Ok(())
}
