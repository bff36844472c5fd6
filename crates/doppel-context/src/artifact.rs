use doppel_core::Turn;

pub const KNOWLEDGE_BASE_HEADER: &str = "--- KNOWLEDGE BASE ---";
pub const RECENT_HEADER: &str = "--- RECENT (VERBATIM) ---";

/// Bounded persona context: a digest of older history plus the recent tail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextArtifact {
    /// `None` when the transcript was kept whole. A compacted transcript
    /// always has a head, even when every chunk failed to summarize.
    pub summarized_head: Option<String>,
    pub verbatim_tail: Vec<Turn>,
}

impl ContextArtifact {
    /// Artifact for a transcript short enough to keep whole.
    pub fn verbatim(turns: Vec<Turn>) -> Self {
        Self {
            summarized_head: None,
            verbatim_tail: turns,
        }
    }

    /// Flatten to the text the chat prompt embeds.
    ///
    /// An uncompacted artifact is written as the verbatim lines alone.
    pub fn render(&self) -> String {
        let recent = self
            .verbatim_tail
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n");

        match &self.summarized_head {
            Some(head) => format!("{KNOWLEDGE_BASE_HEADER}\n{head}\n{RECENT_HEADER}\n{recent}"),
            None => recent,
        }
    }
}

/// Rough token count: chars / 4, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
