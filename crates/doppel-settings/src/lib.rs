//! # doppel-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`DoppelSettings::default()`]
//! 2. **User file**: `~/.doppel/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `DOPPEL_*` overrides (highest priority)
//!
//! A missing settings file is not an error: defaults are used silently.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
