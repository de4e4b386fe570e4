//! Persistent configuration for the lectern client.
//!
//! Settings live as JSON under the user config directory
//! (`~/.config/lectern/settings.json` on Linux). Missing or unreadable
//! files fall back to defaults; the backend URL and API key can also come
//! from `LECTERN_BACKEND_URL` / `LECTERN_API_KEY`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the backend base URL
pub const BACKEND_URL_ENV_VAR: &str = "LECTERN_BACKEND_URL";
/// Environment variable overriding the backend API key
pub const API_KEY_ENV_VAR: &str = "LECTERN_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the lecture backend (e.g. https://api.neurativo.app)
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Bearer token for the backend, if it requires one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Input device name (None = system default)
    #[serde(default)]
    pub device: Option<String>,

    /// Pipeline tuning knobs
    #[serde(default)]
    pub tuning: SessionTuning,
}

/// Tuning knobs for the live session pipeline.
///
/// Defaults match the production behavior; tests shrink the timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTuning {
    /// Fragments below this confidence go through the pending buffer
    #[serde(default = "default_buffer_threshold")]
    pub buffer_threshold: f32,

    /// Fragments below this confidence always trigger reconstruction
    #[serde(default = "default_correction_threshold")]
    pub correction_threshold: f32,

    /// Quiet period before the pending buffer flushes, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Quiet period before an unterminated sentence flushes, in milliseconds
    #[serde(default = "default_sentence_flush_ms")]
    pub sentence_flush_ms: u64,

    /// Minimum lexical overlap for the topic-continuity fallback
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f32,

    /// Audio chunk duration in seconds
    #[serde(default = "default_chunk_secs")]
    pub chunk_secs: u32,

    /// Accepted-segment window size (chars) that triggers note generation
    #[serde(default = "default_notes_window_chars")]
    pub notes_window_chars: usize,

    /// Maximum retained topic-context segments (oldest evicted first)
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Consecutive reconstruction failures before the breaker opens
    #[serde(default = "default_breaker_limit")]
    pub breaker_limit: u32,
}

fn default_buffer_threshold() -> f32 {
    0.7
}
fn default_correction_threshold() -> f32 {
    0.65
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_sentence_flush_ms() -> u64 {
    4000
}
fn default_overlap_threshold() -> f32 {
    0.3
}
fn default_chunk_secs() -> u32 {
    3
}
fn default_notes_window_chars() -> usize {
    320
}
fn default_context_window() -> usize {
    64
}
fn default_breaker_limit() -> u32 {
    5
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            buffer_threshold: default_buffer_threshold(),
            correction_threshold: default_correction_threshold(),
            debounce_ms: default_debounce_ms(),
            sentence_flush_ms: default_sentence_flush_ms(),
            overlap_threshold: default_overlap_threshold(),
            chunk_secs: default_chunk_secs(),
            notes_window_chars: default_notes_window_chars(),
            context_window: default_context_window(),
            breaker_limit: default_breaker_limit(),
        }
    }
}

impl Settings {
    /// Load settings from disk, falling back to defaults if the file is
    /// missing or unparseable.
    pub fn load() -> Settings {
        let Some(path) = Self::path() else {
            return Settings::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                crate::verbose!("Ignoring malformed settings file {}: {e}", path.display());
                Settings::default()
            }),
            Err(_) => Settings::default(),
        }
    }

    /// Persist settings to the config directory, creating it if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path().context("Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Path to the settings file (`<config dir>/lectern/settings.json`)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lectern").join("settings.json"))
    }

    /// Resolve the backend base URL: settings first, then environment.
    pub fn resolve_backend_url(&self) -> Option<String> {
        self.backend_url
            .clone()
            .or_else(|| std::env::var(BACKEND_URL_ENV_VAR).ok())
    }

    /// Resolve the API key: settings first, then environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
    }
}
