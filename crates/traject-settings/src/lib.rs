//! # traject-settings
//!
//! Configuration management with layered sources for the traject pipeline.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`TrajectSettings::default()`]
//! 2. **User file** — `~/.traject/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `TRAJECT_*` overrides (highest priority)
//!
//! There is no global settings instance: the loaded value is passed into the
//! pipeline explicitly so runs stay independently testable.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
