//! Startup lookup of the context file.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::handle::LoadedContext;

/// Where to look for the context file: the configured path, then the same
/// file name next to the executable.
pub fn candidate_paths(configured: &Path) -> Vec<PathBuf> {
    let mut paths = vec![configured.to_path_buf()];
    if configured.is_relative() {
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(configured)));
        if let Some(p) = beside_exe {
            if p != configured {
                paths.push(p);
            }
        }
    }
    paths
}

/// Load the configured context, falling back to an empty one.
pub async fn load_context(configured: &Path) -> LoadedContext {
    load_first_existing(&candidate_paths(configured)).await
}

/// Read the first readable candidate. Nothing found yields an empty context.
pub async fn load_first_existing(candidates: &[PathBuf]) -> LoadedContext {
    for path in candidates {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                info!(path = %path.display(), chars = text.chars().count(), "context loaded");
                return LoadedContext::new(text, Some(path.clone()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no context file here");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "context file unreadable");
            }
        }
    }
    warn!("no context file found, running with empty context");
    LoadedContext::empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let second = dir.path().join("second.txt");
        let third = dir.path().join("third.txt");
        std::fs::write(&second, "Yy: from second").unwrap();
        std::fs::write(&third, "Yy: from third").unwrap();

        let ctx = load_first_existing(&[missing, second.clone(), third]).await;
        assert_eq!(ctx.text, "Yy: from second");
        assert_eq!(ctx.source.as_deref(), Some(second.as_path()));
    }

    #[tokio::test]
    async fn nothing_found_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = load_first_existing(&[dir.path().join("nope.txt")]).await;
        assert!(ctx.text.is_empty());
        assert!(ctx.source.is_none());
        assert_eq!(ctx.char_count(), 0);
    }

    #[test]
    fn absolute_path_has_no_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let abs = dir.path().join("ctx.txt");
        assert_eq!(candidate_paths(&abs), vec![abs]);
    }

    #[test]
    fn relative_path_falls_back_beside_executable() {
        let paths = candidate_paths(Path::new("deepseek_context.txt"));
        assert_eq!(paths[0], PathBuf::from("deepseek_context.txt"));
        assert_eq!(paths.len(), 2);
        assert!(paths[1].ends_with("deepseek_context.txt"));
        assert!(paths[1].is_absolute());
    }
}
