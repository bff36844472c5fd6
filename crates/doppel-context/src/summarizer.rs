use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use doppel_core::{ChatMessage, CompletionOptions, CompletionProvider, CompletionRequest};

use crate::chunker::Chunk;

/// Compresses one chunk into a dense digest.
///
/// `None` means the chunk contributed nothing; failures never cross this
/// boundary as errors.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, chunk: &Chunk) -> Option<String>;
}

/// Summarizer backed by the completion service.
pub struct LlmSummarizer {
    provider: Arc<dyn CompletionProvider>,
    options: CompletionOptions,
    agent_nickname: String,
    user_nickname: String,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            options: CompletionOptions::summary(),
            agent_nickname: "Yy".to_string(),
            user_nickname: "Ptaclfere".to_string(),
        }
    }

    pub fn with_nicknames(mut self, agent: impl Into<String>, user: impl Into<String>) -> Self {
        self.agent_nickname = agent.into();
        self.user_nickname = user.into();
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    fn prompt(&self, chunk: &Chunk) -> String {
        let agent = &self.agent_nickname;
        let user = &self.user_nickname;
        format!(
            "You are summarizing a segment of chat history between '{user}' and '{agent}'.\n\
             Compress it while keeping everything a faithful imitation of {agent} would need.\n\
             \n\
             Discard greetings, logistics (\"good morning\", \"eating now\") and repetitive small talk.\n\
             Keep:\n\
             - key events, shared memories and relationship milestones\n\
             - {agent}'s preferences, hobbies and concrete facts about {agent}\n\
             - {agent}'s speech patterns, catchphrases and emotional habits\n\
             - nicknames and in-jokes\n\
             \n\
             Reply with a dense summary paragraph or bullet points.\n\
             \n\
             CHAT SEGMENT:\n{}\n\
             \n\
             SUMMARY:",
            chunk.render()
        )
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    #[instrument(skip_all, fields(turns = chunk.len()))]
    async fn summarize(&self, chunk: &Chunk) -> Option<String> {
        let request = CompletionRequest::new(
            vec![ChatMessage::user(self.prompt(chunk))],
            self.options.clone(),
        );

        match self.provider.complete(&request).await {
            Ok(summary) => {
                let summary = summary.trim();
                if summary.is_empty() {
                    debug!("summarizer returned empty text");
                    None
                } else {
                    Some(summary.to_string())
                }
            }
            Err(e) => {
                warn!(
                    category = ?e.category(),
                    error_kind = e.error_kind(),
                    error = %e,
                    "chunk summarization failed"
                );
                None
            }
        }
    }
}
