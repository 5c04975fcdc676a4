//! Utterance transcription
//!
//! One HTTP round trip per utterance window. The provider is fixed at
//! construction; both providers receive the configured language hint
//! so short cooking commands transcribe reliably.

use serde_json::Value;

use crate::{Error, Result};

/// Supported transcription providers
#[derive(Clone, Copy, Debug)]
enum Provider {
    /// `OpenAI` Whisper, multipart WAV upload
    Whisper,
    /// Deepgram prerecorded API, raw body upload
    Deepgram,
}

/// Transcribes one utterance of WAV audio to text
pub struct SpeechToText {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
    model: String,
    /// BCP 47 language hint
    language: String,
}

impl SpeechToText {
    /// Create an STT client backed by `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new_whisper(api_key: String, model: String, language: String) -> Result<Self> {
        Self::build(Provider::Whisper, api_key, model, language)
    }

    /// Create an STT client backed by Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new_deepgram(api_key: String, model: String, language: String) -> Result<Self> {
        Self::build(Provider::Deepgram, api_key, model, language)
    }

    fn build(
        provider: Provider,
        api_key: String,
        model: String,
        language: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!(
                "{provider:?} STT requires an API key"
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            provider,
            api_key,
            model,
            language,
        })
    }

    /// Transcribe one WAV utterance
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<String> {
        tracing::debug!(
            provider = ?self.provider,
            audio_bytes = audio.len(),
            "transcribing utterance"
        );

        let request = match self.provider {
            Provider::Whisper => self.whisper_request(audio)?,
            Provider::Deepgram => self.deepgram_request(audio),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "STT API error");
            return Err(Error::Stt(format!("STT API error {status}: {body}")));
        }

        let payload: Value = response.json().await?;
        let text = match self.provider {
            Provider::Whisper => payload["text"].as_str().unwrap_or_default().to_string(),
            Provider::Deepgram => payload
                .pointer("/results/channels/0/alternatives/0/transcript")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };

        tracing::debug!(transcript = %text, "transcription complete");
        Ok(text)
    }

    fn whisper_request(&self, audio: Vec<u8>) -> Result<reqwest::RequestBuilder> {
        // Whisper takes a two-letter code, not a full BCP 47 tag
        let language = self.language.split('-').next().unwrap_or("en");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name("utterance.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", language.to_string());

        Ok(self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(&self.api_key)
            .multipart(form))
    }

    fn deepgram_request(&self, audio: Vec<u8>) -> reqwest::RequestBuilder {
        self.client
            .post("https://api.deepgram.com/v1/listen")
            .query(&[
                ("model", self.model.as_str()),
                ("language", self.language.as_str()),
                ("punctuate", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio)
    }
}
