//! Error types
//!
//! Gameplay itself has no recoverable errors; these cover loading level data
//! and settings, and audio playback reported by a host sink.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid level config: {field}: {reason}")]
    Invalid { field: String, reason: String },
    #[error("unknown level: {0}")]
    UnknownLevel(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("unknown audio asset: {0}")]
    UnknownAsset(String),
    #[error("playback refused for {name}: {reason}")]
    Refused { name: String, reason: String },
}
