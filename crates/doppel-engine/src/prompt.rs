use chrono::{DateTime, Local};

use doppel_core::ChatMessage;

use crate::reply::REPLY_DELIMITER;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Persona {
    /// Who the model imitates.
    pub agent_nickname: String,
    /// Who is typing.
    pub user_nickname: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            agent_nickname: "Yy".to_string(),
            user_nickname: "Ptaclfere".to_string(),
        }
    }
}

/// Assembles the full message list for one dispatch.
#[derive(Clone, Debug, Default)]
pub struct PromptBuilder {
    persona: Persona,
}

impl PromptBuilder {
    pub fn new(persona: Persona) -> Self {
        Self { persona }
    }

    /// System message, then prior exchanges, then the combined user input.
    pub fn build(
        &self,
        context: &str,
        history: &[ChatMessage],
        combined: &str,
        now: DateTime<Local>,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt(context, now)));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(combined));
        messages
    }

    fn system_prompt(&self, context: &str, now: DateTime<Local>) -> String {
        let agent = &self.persona.agent_nickname;
        let user = &self.persona.user_nickname;
        let now = now.format("%Y-%m-%d %H:%M:%S");
        format!(
            "You are a digital clone of '{agent}', chatting with '{user}'.\n\
             Current time: {now}\n\
             \n\
             Below is a large collection of {agent}'s past conversations.\n\
             Match {agent}'s tone, vocabulary, sentence length and emoji use exactly.\n\
             Never sound like an assistant. Talk like a real person.\n\
             \n\
             RULES:\n\
             1. You may send several short messages instead of one block by separating them with '{REPLY_DELIMITER}'.\n\
             \x20  Example: Haha true. {REPLY_DELIMITER} Wait, are you serious?\n\
             2. Answer multiple questions naturally.\n\
             3. Keep it casual.\n\
             \n\
             --- BEGIN CHAT HISTORY ---\n\
             {context}\n\
             --- END CHAT HISTORY ---\n\
             \n\
             Now reply to the latest message from {user}."
        )
    }
}
