//! Wire format of the OpenAI-compatible `/chat/completions` endpoint.

use serde::{Deserialize, Serialize};

use doppel_core::errors::ServiceError;
use doppel_core::messages::ChatMessage;
use doppel_core::provider::CompletionRequest;

#[derive(Debug, Serialize)]
pub struct ChatCompletionBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub fn build_request_body<'a>(model: &'a str, request: &'a CompletionRequest) -> ChatCompletionBody<'a> {
    ChatCompletionBody {
        model,
        messages: &request.messages,
        temperature: request.options.temperature,
        max_tokens: request.options.max_tokens,
        stream: false,
    }
}

/// Extract `choices[0].message.content` from a response body.
pub fn parse_reply(body: &str) -> Result<String, ServiceError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("invalid JSON: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::MalformedResponse("response has no choices".into()))?
        .message
        .content
        .ok_or_else(|| ServiceError::MalformedResponse("choice has no content".into()))
}
