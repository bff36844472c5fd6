//! Everything that turns a long raw transcript into the bounded persona
//! context, and the shared handle the live loop reads it through.
//!
//! Pipeline: [`Segmenter`] → [`chunk`] → [`Summarizer`] → [`Compactor`] →
//! [`ContextArtifact::render`]. [`Importer`] wires the pipeline to files.

pub mod artifact;
pub mod chunker;
pub mod compactor;
pub mod error;
pub mod handle;
pub mod import;
pub mod loader;
pub mod segmenter;
pub mod summarizer;

pub use artifact::{estimate_tokens, ContextArtifact};
pub use chunker::{chunk, Chunk};
pub use compactor::{CompactionConfig, Compactor};
pub use error::{ContextError, ImportError};
pub use handle::{ContextHandle, LoadedContext};
pub use import::{import_artifact, ImportKind, ImportOutcome, ImportSource, Importer};
pub use loader::{candidate_paths, load_context, load_first_existing};
pub use segmenter::{Segmenter, TranscriptStats, DEFAULT_SPEAKER_PATTERN};
pub use summarizer::{LlmSummarizer, Summarizer};
