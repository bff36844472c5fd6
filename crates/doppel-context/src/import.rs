//! Import: turn a file into the active context file.
//!
//! A raw transcript goes through segmentation and compaction; a `.txt` file
//! is taken as an already-built context and copied as is. Either way the
//! output is written to a sibling temp file and renamed into place, so an
//! interrupted import never leaves a truncated context behind.

use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::artifact::estimate_tokens;
use crate::compactor::Compactor;
use crate::error::ImportError;
use crate::handle::LoadedContext;
use crate::segmenter::{Segmenter, TranscriptStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportKind {
    /// Raw conversation export, one paragraph per line.
    Transcript,
    /// Pre-built context text.
    Artifact,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSource {
    pub path: PathBuf,
    pub kind: ImportKind,
}

impl ImportSource {
    pub fn new(path: impl Into<PathBuf>, kind: ImportKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Route by extension: `.txt` is an artifact, anything else a transcript.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_txt = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        let kind = if is_txt {
            ImportKind::Artifact
        } else {
            ImportKind::Transcript
        };
        Self { path, kind }
    }
}

#[derive(Clone, Debug)]
pub struct ImportOutcome {
    pub kind: ImportKind,
    /// The new context, ready to be swapped in.
    pub context: LoadedContext,
    /// Present for transcript imports.
    pub stats: Option<TranscriptStats>,
    pub estimated_tokens: usize,
}

/// Runs imports that may need the compaction pipeline.
pub struct Importer {
    segmenter: Segmenter,
    compactor: Compactor,
    output: PathBuf,
}

impl Importer {
    pub fn new(segmenter: Segmenter, compactor: Compactor, output: impl Into<PathBuf>) -> Self {
        Self {
            segmenter,
            compactor,
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub async fn run(&self, source: &ImportSource) -> Result<ImportOutcome, ImportError> {
        let result = match source.kind {
            ImportKind::Artifact => import_artifact(&source.path, &self.output).await,
            ImportKind::Transcript => self.import_transcript(&source.path).await,
        };
        if let Err(e) = &result {
            error!(path = %source.path.display(), error = %e, "import failed");
        }
        result
    }

    #[instrument(skip(self), fields(output = %self.output.display()))]
    async fn import_transcript(&self, path: &Path) -> Result<ImportOutcome, ImportError> {
        let raw = read_source(path).await?;
        let turns = self.segmenter.segment_text(&raw);
        if turns.is_empty() {
            return Err(ImportError::NoTurns {
                path: path.to_path_buf(),
            });
        }

        let stats = TranscriptStats::from_turns(&turns);
        info!(
            turns = stats.turns,
            speakers = ?stats.speakers,
            verbatim = self.compactor.config().verbatim_count,
            "transcript segmented"
        );

        let text = self.compactor.compact(turns).await.render();
        write_atomic(&self.output, &text).await?;

        let estimated_tokens = estimate_tokens(&text);
        info!(chars = text.chars().count(), estimated_tokens, "context written");
        Ok(ImportOutcome {
            kind: ImportKind::Transcript,
            context: LoadedContext::new(text, Some(self.output.clone())),
            stats: Some(stats),
            estimated_tokens,
        })
    }
}

/// Copy a pre-built context into place. Needs no completion service.
#[instrument(skip_all, fields(path = %path.display(), output = %output.display()))]
pub async fn import_artifact(path: &Path, output: &Path) -> Result<ImportOutcome, ImportError> {
    let text = read_source(path).await?;
    if path != output {
        write_atomic(output, &text).await?;
    }

    let estimated_tokens = estimate_tokens(&text);
    info!(chars = text.chars().count(), estimated_tokens, "context artifact imported");
    Ok(ImportOutcome {
        kind: ImportKind::Artifact,
        context: LoadedContext::new(text, Some(output.to_path_buf())),
        stats: None,
        estimated_tokens,
    })
}

async fn read_source(path: &Path) -> Result<String, ImportError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| match source.kind() {
            // binary documents such as .docx land here
            std::io::ErrorKind::InvalidData => ImportError::NotText {
                path: path.to_path_buf(),
            },
            _ => ImportError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), ImportError> {
    let write_failed = |source| ImportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, contents).await.map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_failed(e));
    }
    Ok(())
}
