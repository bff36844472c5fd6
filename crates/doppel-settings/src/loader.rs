//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::DoppelSettings;

/// Resolve the path to the settings file (`~/.doppel/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".doppel").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<DoppelSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<DoppelSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<DoppelSettings> {
    let defaults = serde_json::to_value(DoppelSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `DOPPEL_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut DoppelSettings) {
    apply_overrides_with(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_overrides_with(
    settings: &mut DoppelSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── API ─────────────────────────────────────────────────────────
    if let Some(v) = string("DOPPEL_API_KEY") {
        settings.api.api_key = Some(v);
    }
    if let Some(v) = string("DOPPEL_BASE_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = string("DOPPEL_MODEL") {
        settings.api.model = v;
    }

    // ── Persona / context ───────────────────────────────────────────
    if let Some(v) = string("DOPPEL_AGENT_NICKNAME") {
        settings.persona.agent_nickname = v;
    }
    if let Some(v) = string("DOPPEL_USER_NICKNAME") {
        settings.persona.user_nickname = v;
    }
    if let Some(v) = string("DOPPEL_CONTEXT_FILE") {
        settings.context_file = PathBuf::from(v);
    }

    // ── Timing / compaction ─────────────────────────────────────────
    if let Some(v) = numeric(&lookup, "DOPPEL_DEBOUNCE_MS", |s| parse_u64_range(s, 0, 60_000)) {
        settings.orchestrator.debounce_ms = v;
    }
    if let Some(v) = numeric(&lookup, "DOPPEL_VERBATIM_COUNT", |s| {
        parse_usize_range(s, 1, 1_000_000)
    }) {
        settings.compaction.verbatim_count = v;
    }
    if let Some(v) = numeric(&lookup, "DOPPEL_CHUNK_SIZE", |s| parse_usize_range(s, 1, 100_000)) {
        settings.compaction.chunk_size = v;
    }
}

fn numeric<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let val = lookup(name)?;
    let result = parse(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid numeric env var, ignoring");
    }
    result
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
