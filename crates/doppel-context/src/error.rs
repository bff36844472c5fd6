use std::path::PathBuf;

/// Configuration problems in the compaction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("invalid speaker pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("speaker pattern `{pattern}` needs two capture groups (speaker, content)")]
    MissingCaptureGroups { pattern: String },
}

/// Why an import was abandoned. The active context is never touched on error.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{} is not UTF-8 text; export the transcript as plain text, one paragraph per line",
        path.display()
    )]
    NotText { path: PathBuf },

    #[error("no speaker turns found in {}", path.display())]
    NoTurns { path: PathBuf },

    #[error("cannot write context to {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
