//! Error types for the fallible edges of the game: text representations and settings files.
//!
//! Gameplay itself never fails; illegal commands are ignored.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while parsing the text representation of a tube or puzzle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReprError {
    /// A token that is neither `.` nor a letter label.
    #[error("invalid fluid token {token:?} in tube {tube}")]
    InvalidToken { tube: usize, token: String },

    /// A fluid sits above an empty slot.
    #[error("tube {tube} has fluid above an empty slot at position {position}")]
    Gap { tube: usize, position: usize },

    /// A line with no slots at all.
    #[error("tube {tube} has no slots")]
    ZeroCapacity { tube: usize },

    #[error("puzzle has no tubes")]
    NoTubes,
}

/// Errors produced while loading [`GameSettings`](crate::settings::GameSettings).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed fine but the values cannot drive a game.
    #[error("invalid settings: {0}")]
    Invalid(String),
}
