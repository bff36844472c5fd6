//! Builds runtime components from loaded settings.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use doppel_context::{CompactionConfig, Compactor, Importer, LlmSummarizer, Segmenter};
use doppel_core::{CompletionOptions, CompletionProvider};
use doppel_engine::{OrchestratorConfig, PacingPolicy, Persona, ThinkingDelay};
use doppel_llm::provider::{ChatCompletionsProvider, ProviderConfig};
use doppel_settings::DoppelSettings;

pub fn persona(settings: &DoppelSettings) -> Persona {
    Persona {
        agent_nickname: settings.persona.agent_nickname.clone(),
        user_nickname: settings.persona.user_nickname.clone(),
    }
}

pub fn orchestrator_config(settings: &DoppelSettings) -> OrchestratorConfig {
    let o = &settings.orchestrator;
    OrchestratorConfig {
        debounce: Duration::from_millis(o.debounce_ms),
        thinking: ThinkingDelay {
            min: Duration::from_millis(o.thinking_min_ms),
            max: Duration::from_millis(o.thinking_max_ms),
        },
        history_cap: o.history_cap,
        pacing: PacingPolicy {
            per_char: Duration::from_millis(o.pacing.per_char_ms),
            base: Duration::from_millis(o.pacing.base_ms),
            max: Duration::from_millis(o.pacing.max_ms),
        },
        chat_options: CompletionOptions {
            temperature: Some(settings.api.chat_temperature),
            max_tokens: Some(settings.api.chat_max_tokens),
        },
    }
}

pub fn compaction_config(settings: &DoppelSettings) -> CompactionConfig {
    let c = &settings.compaction;
    CompactionConfig {
        verbatim_count: c.verbatim_count,
        chunk_size: c.chunk_size,
        inter_call_delay: Duration::from_millis(c.inter_call_delay_ms),
    }
}

pub fn segmenter(settings: &DoppelSettings) -> Result<Segmenter> {
    match settings.compaction.speaker_pattern.as_deref() {
        Some(pattern) => Segmenter::with_pattern(pattern).context("compaction.speakerPattern"),
        None => Ok(Segmenter::default()),
    }
}

/// The completion client. Fails when no API key is configured.
pub fn provider(settings: &DoppelSettings) -> Result<Arc<dyn CompletionProvider>> {
    let api_key = settings
        .api
        .api_key()
        .context("no API key configured: set DOPPEL_API_KEY or api.apiKey in settings.json")?;

    let mut config = ProviderConfig::new(api_key);
    config.base_url = settings.api.base_url.clone();
    config.model = settings.api.model.clone();
    let provider = ChatCompletionsProvider::new(config).context("failed to create completion client")?;
    Ok(Arc::new(provider))
}

pub fn importer(settings: &DoppelSettings, provider: Arc<dyn CompletionProvider>) -> Result<Importer> {
    let summarizer = LlmSummarizer::new(provider)
        .with_nicknames(
            settings.persona.agent_nickname.clone(),
            settings.persona.user_nickname.clone(),
        )
        .with_options(CompletionOptions {
            temperature: Some(settings.api.summary_temperature),
            max_tokens: Some(settings.api.summary_max_tokens),
        });
    let compactor = Compactor::new(Arc::new(summarizer), compaction_config(settings));
    Ok(Importer::new(
        segmenter(settings)?,
        compactor,
        settings.context_file.clone(),
    ))
}
