use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use doppel_core::Turn;

use crate::artifact::ContextArtifact;
use crate::chunker::chunk;
use crate::summarizer::Summarizer;

#[derive(Clone, Debug)]
pub struct CompactionConfig {
    /// Most recent turns kept word for word (K).
    pub verbatim_count: usize,
    /// Older turns per summarizer call.
    pub chunk_size: usize,
    /// Pause between consecutive summarizer calls.
    pub inter_call_delay: Duration,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            verbatim_count: 2000,
            chunk_size: 500,
            inter_call_delay: Duration::from_millis(500),
        }
    }
}

/// Reduces a transcript of any length to a bounded [`ContextArtifact`].
pub struct Compactor {
    summarizer: Arc<dyn Summarizer>,
    config: CompactionConfig,
}

impl Compactor {
    pub fn new(summarizer: Arc<dyn Summarizer>, config: CompactionConfig) -> Self {
        Self { summarizer, config }
    }

    pub fn config(&self) -> &CompactionConfig {
        &self.config
    }

    /// Keep the last `verbatim_count` turns and summarize everything older,
    /// one chunk at a time in transcript order.
    #[instrument(skip_all, fields(turns = turns.len(), verbatim = self.config.verbatim_count))]
    pub async fn compact(&self, mut turns: Vec<Turn>) -> ContextArtifact {
        let k = self.config.verbatim_count;
        if turns.len() <= k {
            info!("transcript fits verbatim, no summarization needed");
            return ContextArtifact::verbatim(turns);
        }

        let recent = turns.split_off(turns.len() - k);
        let chunks = chunk(&turns, self.config.chunk_size);
        let total = chunks.len();
        info!(older = turns.len(), chunks = total, "summarizing older history");

        let mut summaries = Vec::with_capacity(total);
        for (i, c) in chunks.iter().enumerate() {
            if i > 0 && !self.config.inter_call_delay.is_zero() {
                tokio::time::sleep(self.config.inter_call_delay).await;
            }
            match self.summarizer.summarize(c).await {
                Some(summary) => summaries.push(summary),
                None => warn!(chunk = i + 1, total, "chunk contributed no summary"),
            }
        }

        info!(summarized = summaries.len(), chunks = total, "compaction finished");
        ContextArtifact {
            summarized_head: Some(summaries.join("\n\n")),
            verbatim_tail: recent,
        }
    }
}
