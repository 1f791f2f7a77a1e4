//! Text-to-speech client

use async_trait::async_trait;
use serde_json::json;

use crate::{SpeechError, Synthesizer};

/// HTTP client for the speech provider's synthesis endpoint
pub struct TtsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl TtsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: "gpt-4o-mini-tts".to_string(),
        }
    }

    /// Override the synthesis model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Synthesizer for TtsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .http
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
                "voice": voice,
                "speed": speed,
                "response_format": "pcm",
                "sample_rate": 8000,
            }))
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

        let pcm = response.bytes().await?.to_vec();
        tracing::debug!(chars = text.chars().count(), pcm_bytes = pcm.len(), "synthesized");
        Ok(pcm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let client = TtsClient::new("https://api.example.com", "key").with_model("tts-1");
        assert_eq!(client.base_url, "https://api.example.com");
        assert_eq!(client.model, "tts-1");
    }
}
