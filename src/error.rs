//! Error types for session boot and configuration.
//!
//! The per-frame simulation never fails: recoverable conditions are logged and
//! the frame is skipped. Errors here surface at boot or when loading tuning.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// A required presentation hook was not supplied before boot.
    #[error("missing presentation dependency: {hook}")]
    MissingPresentation { hook: &'static str },

    /// The sound engine could not be initialised. Non-fatal; the game runs silent.
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),

    /// An entity the frame needed was absent.
    #[error("entity missing during {context}")]
    EntityMissing { context: &'static str },

    /// A tuning value is outside its usable range.
    #[error("invalid tuning `{field}`: {reason}")]
    InvalidTuning {
        field: &'static str,
        reason: String,
    },

    /// Tuning or settings JSON could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
