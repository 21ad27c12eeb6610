//! HTTP gateway to the cloud transcription/enhancement backend.
//!
//! Wire protocol: `POST {endpoint}/transcribe` with a base64 audio payload
//! returns `{transcription, confidence}`; `POST {endpoint}/process-text`
//! with `{text}` returns `{result}`. Both calls carry a bearer token.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use murmur_core::config::SpeechConfig;
use murmur_core::error::{MurmurError, Result};

use crate::{CloudSpeechClient, CloudTranscript, TextEnhancer};

#[derive(Debug, Serialize)]
struct TranscribeRequest<'a> {
    audio: String,
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    transcription: String,
    confidence: f32,
}

#[derive(Debug, Serialize)]
struct ProcessTextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProcessTextResponse {
    result: String,
}

/// Client for the cloud speech gateway, implementing both the ASR and the
/// enhancement stage of the pipeline.
pub struct HttpSpeechGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpSpeechGateway {
    /// Build a gateway client from the speech configuration.
    ///
    /// Fails when endpoint or API key are missing.
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        if !config.has_credentials() {
            return Err(MurmurError::Config(
                "Speech gateway endpoint and API key are required".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MurmurError::Transcription(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post_json<T: Serialize, U: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<U> {
        let url = format!("{}{}", self.endpoint, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| MurmurError::Transcription(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, path, "Speech gateway returned an error");
            return Err(MurmurError::Transcription(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<U>()
            .await
            .map_err(|e| MurmurError::Transcription(e.to_string()))
    }
}

impl CloudSpeechClient for HttpSpeechGateway {
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<CloudTranscript> {
        debug!(
            audio_bytes = audio.len(),
            filename, "Uploading recording for transcription"
        );
        let payload = TranscribeRequest {
            audio: BASE64.encode(audio),
            filename,
        };
        let parsed: TranscribeResponse = self.post_json("/transcribe", &payload).await?;
        Ok(CloudTranscript {
            text: parsed.transcription,
            confidence: parsed.confidence,
        })
    }
}

impl TextEnhancer for HttpSpeechGateway {
    async fn enhance(&self, raw: &str) -> Result<String> {
        debug!(text_len = raw.len(), "Requesting transcript enhancement");
        let payload = ProcessTextRequest { text: raw };
        let parsed: ProcessTextResponse = self.post_json("/process-text", &payload).await?;
        Ok(parsed.result)
    }
}

// =============================================================================
// Tests
// =============================================================================
