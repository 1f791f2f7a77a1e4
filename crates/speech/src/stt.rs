//! Speech-to-text client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::{SpeechError, Transcriber};

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for the speech provider's transcription endpoint
pub struct SttClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SttClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: "whisper-1".to_string(),
        }
    }

    /// Override the transcription model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Transcriber for SttClient {
    async fn transcribe(&self, wav: &[u8]) -> Result<String, SpeechError> {
        let file = Part::bytes(wav.to_vec())
            .file_name("utterance.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let response = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let transcription: TranscriptionResponse = response.json().await?;
        tracing::debug!(chars = transcription.text.chars().count(), "transcribed");
        Ok(transcription.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let client = SttClient::new("https://api.example.com", "key");
        assert_eq!(client.model, "whisper-1");
    }

    #[test]
    fn test_transcription_response_parse() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text":"hello there","language":"en"}"#).unwrap();
        assert_eq!(parsed.text, "hello there");
    }
}
