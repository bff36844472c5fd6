//! Settings type definitions.
//!
//! Field names are camelCase in JSON. Every struct carries
//! `#[serde(default)]`, so a partial file only overrides what it names.

use std::fmt;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Root settings type.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoppelSettings {
    pub persona: PersonaSettings,
    pub api: ApiSettings,
    pub orchestrator: OrchestratorSettings,
    pub compaction: CompactionSettings,
    pub logging: LoggingSettings,
    /// Context artifact consumed as the prompt prefix.
    pub context_file: PathBuf,
}

impl Default for DoppelSettings {
    fn default() -> Self {
        Self {
            persona: PersonaSettings::default(),
            api: ApiSettings::default(),
            orchestrator: OrchestratorSettings::default(),
            compaction: CompactionSettings::default(),
            logging: LoggingSettings::default(),
            context_file: PathBuf::from("deepseek_context.txt"),
        }
    }
}

/// Who is being mimicked and who they are talking to.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaSettings {
    pub agent_nickname: String,
    pub user_nickname: String,
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            agent_nickname: "Yy".to_string(),
            user_nickname: "Ptaclfere".to_string(),
        }
    }
}

/// Completion service connection and sampling presets.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    pub base_url: String,
    pub model: String,
    /// Never written back out; `DOPPEL_API_KEY` takes precedence.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub chat_temperature: f64,
    pub chat_max_tokens: u32,
    pub summary_temperature: f64,
    pub summary_max_tokens: u32,
}

impl ApiSettings {
    pub fn api_key(&self) -> Option<SecretString> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(SecretString::from)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: None,
            chat_temperature: 1.3,
            chat_max_tokens: 500,
            summary_temperature: 0.3,
            summary_max_tokens: 4000,
        }
    }
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("chat_temperature", &self.chat_temperature)
            .field("chat_max_tokens", &self.chat_max_tokens)
            .field("summary_temperature", &self.summary_temperature)
            .field("summary_max_tokens", &self.summary_max_tokens)
            .finish()
    }
}

/// Live turn loop timing and history bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorSettings {
    /// Quiet period after the last user message before dispatch.
    pub debounce_ms: u64,
    /// Simulated thinking delay range; set both to 0 to disable.
    pub thinking_min_ms: u64,
    pub thinking_max_ms: u64,
    /// Maximum short-term history entries (user + assistant messages).
    pub history_cap: usize,
    pub pacing: PacingSettings,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 1500,
            thinking_min_ms: 1000,
            thinking_max_ms: 2500,
            history_cap: 20,
            pacing: PacingSettings::default(),
        }
    }
}

/// Typing cadence between reply bubbles: `min(per_char * len + base, max)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PacingSettings {
    pub per_char_ms: u64,
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            per_char_ms: 50,
            base_ms: 500,
            max_ms: 2000,
        }
    }
}

/// Offline compaction pipeline parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompactionSettings {
    /// Most recent turns kept verbatim.
    pub verbatim_count: usize,
    /// Turns per summarization chunk.
    pub chunk_size: usize,
    /// Pause between summarizer calls.
    pub inter_call_delay_ms: u64,
    /// Custom `speaker: content` regex; must have two capture groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_pattern: Option<String>,
}

impl Default for CompactionSettings {
    fn default() -> Self {
        Self {
            verbatim_count: 2000,
            chunk_size: 500,
            inter_call_delay_ms: 500,
            speaker_pattern: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
