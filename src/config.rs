//! Configuration management for the sous-voice assistant

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database, catalog, cache)
    pub data_dir: PathBuf,

    /// Path to the local recipe catalog JSON file
    pub catalog_path: PathBuf,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Remote recipe search configuration
    pub search: SearchConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Locally configured signed-in user
    pub user: UserConfig,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input
    pub enabled: bool,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Recognition language hint (BCP 47)
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            language: "en-IN".to_string(),
        }
    }
}

/// Remote recipe search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search API base URL
    pub base_url: String,

    /// Results per page
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spoonacular.com".to_string(),
            page_size: 10,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper STT and TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `Spoonacular` API key (remote recipe search)
    pub spoonacular: Option<String>,
}

/// Locally configured signed-in user
///
/// Stands in for the product's identity service in the CLI shell; when
/// no user is configured the assistant runs as a guest.
#[derive(Debug, Clone, Default)]
pub struct UserConfig {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
}

/// Optional overrides read from `assistant.toml` in the data directory
#[derive(Debug, Clone, Default, Deserialize)]
struct FileOverrides {
    #[serde(default)]
    voice: VoiceOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct VoiceOverrides {
    tts_voice: Option<String>,
    tts_speed: Option<f32>,
    language: Option<String>,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be determined
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be determined
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        // Determine data directory (~/.local/share/sous on Linux)
        let data_dir = directories::ProjectDirs::from("dev", "sousvoice", "sous")
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().to_path_buf());

        // Ensure data dir exists
        std::fs::create_dir_all(&data_dir).ok();

        // Catalog path: env override, else bundled next to the data dir
        let catalog_path = std::env::var("SOUS_CATALOG")
            .map_or_else(|_| data_dir.join("recipes.json"), PathBuf::from);

        // API keys from environment
        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok(),
            deepgram: std::env::var("DEEPGRAM_API_KEY").ok(),
            spoonacular: std::env::var("SPOONACULAR_API_KEY").ok(),
        };

        // Voice config, with file overrides applied on top of defaults
        let overrides = Self::load_file_overrides(&data_dir);
        let defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            enabled: !disable_voice,
            stt_model: std::env::var("SOUS_STT_MODEL").unwrap_or(defaults.stt_model),
            tts_model: std::env::var("SOUS_TTS_MODEL").unwrap_or(defaults.tts_model),
            tts_voice: overrides.voice.tts_voice.unwrap_or(defaults.tts_voice),
            tts_speed: overrides.voice.tts_speed.unwrap_or(defaults.tts_speed),
            language: overrides.voice.language.unwrap_or(defaults.language),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        let search = SearchConfig {
            base_url: std::env::var("SOUS_SEARCH_URL")
                .unwrap_or_else(|_| SearchConfig::default().base_url),
            page_size: std::env::var("SOUS_SEARCH_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| SearchConfig::default().page_size),
        };

        let user = UserConfig {
            user_id: std::env::var("SOUS_USER").ok(),
            display_name: std::env::var("SOUS_USER_NAME").ok(),
        };

        Ok(Self {
            data_dir,
            catalog_path,
            voice,
            search,
            api_keys,
            user,
        })
    }

    /// Load optional overrides from `assistant.toml`, tolerating
    /// missing or malformed files
    fn load_file_overrides(data_dir: &std::path::Path) -> FileOverrides {
        let path = data_dir.join("assistant.toml");
        if !path.exists() {
            return FileOverrides::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(overrides) => {
                    tracing::info!(path = %path.display(), "loaded assistant config");
                    overrides
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse assistant config, using defaults"
                    );
                    FileOverrides::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read assistant config"
                );
                FileOverrides::default()
            }
        }
    }

    /// Path to the assistant database file
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("sous.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_defaults() {
        let voice = VoiceConfig::default();
        assert!(voice.enabled);
        assert_eq!(voice.stt_model, "whisper-1");
        assert_eq!(voice.language, "en-IN");
    }

    #[test]
    fn test_file_overrides_parse() {
        let overrides: FileOverrides = toml::from_str(
            r#"
            [voice]
            tts_voice = "nova"
            tts_speed = 1.2
            "#,
        )
        .unwrap();

        assert_eq!(overrides.voice.tts_voice.as_deref(), Some("nova"));
        assert_eq!(overrides.voice.language, None);
    }

    #[test]
    fn test_missing_overrides_default() {
        let overrides = Config::load_file_overrides(std::path::Path::new("/nonexistent"));
        assert!(overrides.voice.tts_voice.is_none());
    }
}
