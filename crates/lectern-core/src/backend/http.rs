//! reqwest implementation of the lecture backend endpoints.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use super::{LectureBackend, TranscribeResponse, parse_items};
use crate::notes::{Flashcard, Keyword, Note};

/// Per-request timeout for backend calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP client for a lecture backend instance.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscribeWireResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    transcript: String,
    #[serde(rename = "isFinal", default)]
    is_final: bool,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    speaker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReconstructResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "reconstructedText", default)]
    reconstructed_text: String,
}

#[derive(Debug, Deserialize)]
struct TopicContinuityResponse {
    #[serde(rename = "fitsContext")]
    fits_context: bool,
}

impl HttpBackend {
    /// Create a backend client for `base_url`, optionally authenticated.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// POST a JSON body and return the raw response after a status check.
    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let mut request = self.client.post(self.url(endpoint)).json(&body);

        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {endpoint}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("{endpoint} failed ({status}): {error_text}");
        }

        Ok(response)
    }

    /// POST and parse a JSON array response item by item.
    async fn post_items<T>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
        what: &str,
    ) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let values: Vec<serde_json::Value> = self
            .post(endpoint, body)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse {endpoint} response"))?;

        Ok(parse_items(values, what))
    }
}

#[async_trait]
impl LectureBackend for HttpBackend {
    async fn transcribe(&self, audio_wav: &[u8]) -> Result<TranscribeResponse> {
        let audio_data = base64::engine::general_purpose::STANDARD.encode(audio_wav);

        let resp: TranscribeWireResponse = self
            .post(
                "transcribe",
                serde_json::json!({
                    "action": "transcribe",
                    "audioData": audio_data,
                }),
            )
            .await?
            .json()
            .await
            .context("Failed to parse transcription response")?;

        if !resp.success {
            return Err(anyhow!("Transcription service reported failure"));
        }

        Ok(TranscribeResponse {
            transcript: resp.transcript,
            is_final: resp.is_final,
            confidence: resp.confidence,
            speaker: resp.speaker,
        })
    }

    async fn reconstruct(&self, text: &str, context: &str) -> Result<String> {
        let resp: ReconstructResponse = self
            .post(
                "reconstruct-transcript",
                serde_json::json!({
                    "text": text,
                    "context": context,
                }),
            )
            .await?
            .json()
            .await
            .context("Failed to parse reconstruction response")?;

        if !resp.success || resp.reconstructed_text.trim().is_empty() {
            return Err(anyhow!("Reconstruction service returned no text"));
        }

        Ok(resp.reconstructed_text)
    }

    async fn check_topic(
        &self,
        new_segment: &str,
        context: &[String],
        last_topic: Option<&str>,
    ) -> Result<bool> {
        let resp: TopicContinuityResponse = self
            .post(
                "check-topic-continuity",
                serde_json::json!({
                    "newSegment": new_segment,
                    "context": context,
                    "lastTopic": last_topic,
                }),
            )
            .await?
            .json()
            .await
            .context("Failed to parse topic-continuity response")?;

        Ok(resp.fits_context)
    }

    async fn generate_notes(&self, text: &str, context: &str) -> Result<Vec<Note>> {
        self.post_items(
            "generate-notes",
            serde_json::json!({ "text": text, "context": context }),
            "notes",
        )
        .await
    }

    async fn generate_flashcards(&self, text: &str, context: &str) -> Result<Vec<Flashcard>> {
        self.post_items(
            "generate-flashcards",
            serde_json::json!({ "text": text, "context": context }),
            "flashcards",
        )
        .await
    }

    async fn extract_keywords(&self, text: &str) -> Result<Vec<Keyword>> {
        self.post_items(
            "extract-keywords",
            serde_json::json!({ "text": text }),
            "keywords",
        )
        .await
    }
}
