//! Error types for the sous-voice assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Recipe catalog error
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Recipe not found
    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    /// Speech capture error
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Remote recipe search error
    #[error("search error: {0}")]
    Search(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
