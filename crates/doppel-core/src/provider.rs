use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::messages::ChatMessage;

/// Sampling options for a single completion call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    /// Preset for persona replies: high temperature, short output.
    pub fn chat() -> Self {
        Self {
            temperature: Some(1.3),
            max_tokens: Some(500),
        }
    }

    /// Preset for transcript compaction: low temperature, long output.
    pub fn summary() -> Self {
        Self {
            temperature: Some(0.3),
            max_tokens: Some(4000),
        }
    }
}

/// Everything a provider needs for one call. The model is a property of the provider.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub options: CompletionOptions,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, options: CompletionOptions) -> Self {
        Self { messages, options }
    }

    /// Content of the last user message, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::messages::Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Remote language-model completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError>;
}
