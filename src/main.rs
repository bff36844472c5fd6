//! # doppel
//!
//! Persona chat client binary: terminal chat against a compacted history,
//! plus the offline import that builds that history.

#![deny(unsafe_code)]

mod factory;
mod terminal;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use doppel_context::{
    import_artifact, load_context, ContextHandle, ImportKind, ImportOutcome, ImportSource,
    TranscriptStats,
};
use doppel_engine::{PromptBuilder, TurnOrchestrator};
use doppel_settings::{load_settings_from_path, settings_path, DoppelSettings};
use doppel_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "doppel", about = "Chat with a persona built from your chat history")]
struct Cli {
    /// Settings file (defaults to ~/.doppel/settings.json).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). RUST_LOG wins.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a chat session in the terminal.
    Chat {
        /// Context file to load instead of the configured one.
        #[arg(long)]
        context: Option<PathBuf>,
    },
    /// Build the context file from a transcript or install a prepared one.
    Import {
        path: PathBuf,
        /// Force how the input is treated (default: `.txt` is a prepared context).
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Where to write the context (default: the configured context file).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the speakers and turn count found in a transcript.
    Segment { path: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Transcript,
    Artifact,
}

impl From<KindArg> for ImportKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Transcript => ImportKind::Transcript,
            KindArg::Artifact => ImportKind::Artifact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.settings.clone().unwrap_or_else(settings_path);
    let (mut settings, settings_err) = match load_settings_from_path(&path) {
        Ok(settings) => (settings, None),
        Err(e) => (DoppelSettings::default(), Some(e)),
    };

    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    let telemetry = TelemetryConfig {
        log_level: tracing::Level::from_str(level)
            .with_context(|| format!("invalid log level `{level}`"))?,
        json: cli.json_logs || settings.logging.json,
        ..TelemetryConfig::default()
    };
    init_telemetry(&telemetry)?;

    if let Some(e) = settings_err {
        warn!(path = %path.display(), error = %e, "settings unusable, using defaults");
    }

    match cli.command {
        Command::Chat { context } => {
            if let Some(context) = context {
                settings.context_file = context;
            }
            chat(settings).await
        }
        Command::Import { path, kind, output } => {
            if let Some(output) = output {
                settings.context_file = output;
            }
            let source = match kind {
                Some(kind) => ImportSource::new(path, kind.into()),
                None => ImportSource::from_path(path),
            };
            import(&settings, &source).await
        }
        Command::Segment { path } => segment(&settings, &path).await,
    }
}

async fn chat(settings: DoppelSettings) -> Result<()> {
    let provider = factory::provider(&settings)?;
    let importer = match factory::importer(&settings, provider.clone()) {
        Ok(importer) => Some(std::sync::Arc::new(importer)),
        Err(e) => {
            warn!(error = %e, "chat-time import disabled");
            None
        }
    };

    let context = ContextHandle::new(load_context(&settings.context_file).await);
    let persona = factory::persona(&settings);
    let orchestrator = TurnOrchestrator::new(
        provider,
        context,
        PromptBuilder::new(persona.clone()),
        factory::orchestrator_config(&settings),
    );
    info!(session_id = %orchestrator.session_id(), "chat session started");

    terminal::run(orchestrator, importer, persona).await
}

async fn import(settings: &DoppelSettings, source: &ImportSource) -> Result<()> {
    let outcome = match source.kind {
        ImportKind::Artifact => import_artifact(&source.path, &settings.context_file).await?,
        ImportKind::Transcript => {
            let provider = factory::provider(settings)?;
            factory::importer(settings, provider)?.run(source).await?
        }
    };
    print_outcome(&outcome, &settings.context_file);
    Ok(())
}

fn print_outcome(outcome: &ImportOutcome, output: &Path) {
    if let Some(stats) = &outcome.stats {
        print_stats(stats);
    }
    println!(
        "Wrote {} ({} chars, ~{} tokens)",
        output.display(),
        outcome.context.char_count(),
        outcome.estimated_tokens
    );
}

async fn segment(settings: &DoppelSettings, path: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let turns = factory::segmenter(settings)?.segment_text(&raw);
    print_stats(&TranscriptStats::from_turns(&turns));
    if let Some(first) = turns.first() {
        println!("First turn: {first}");
    }
    Ok(())
}

fn print_stats(stats: &TranscriptStats) {
    println!("Turns: {}", stats.turns);
    println!("Speakers: {}", stats.speakers.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_import_with_kind() {
        let cli = Cli::try_parse_from([
            "doppel", "--log-level", "debug", "import", "chat.log", "--kind", "artifact",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Import { path, kind, output } => {
                assert_eq!(path, PathBuf::from("chat.log"));
                assert!(matches!(kind, Some(KindArg::Artifact)));
                assert!(output.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_chat_with_context_override() {
        let cli = Cli::try_parse_from(["doppel", "chat", "--context", "/tmp/ctx.txt"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Chat { context: Some(ref p) } if p == Path::new("/tmp/ctx.txt")
        ));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
