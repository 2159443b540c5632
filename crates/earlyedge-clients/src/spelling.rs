//! Spelling-by-dictation (dyslexia) client.
//!
//! Fetches a dictated word per trial and validates each typed answer
//! against the service, which also returns the audio-model probability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use earlyedge_core::error::{ServiceError, StimulusError};
use earlyedge_core::model::{Category, SpellingPrompt, Stimulus};
use earlyedge_core::traits::{RemoteScorer, ScoreOutcome, ScoreRequest, StimulusSource};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

const AUDIO_PREFIX: &str = "audio/correct/";

/// Client for the spelling router.
pub struct SpellingClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct AudioResponse {
    audio_file: String,
    correct_word: String,
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    user_answer: &'a str,
    audio_file: &'a str,
    attempt_number: u32,
}

#[derive(Deserialize)]
struct ValidateResponse {
    is_correct: bool,
    correct_word: String,
    dyslexia_score: f64,
    risk: String,
}

impl SpellingClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout_secs),
            timeout_secs,
        }
    }

    /// Fetch a random dictated word. The `audio/correct/` storage prefix is
    /// stripped; the validate endpoint normalizes it back.
    #[instrument(skip(self))]
    pub async fn fetch_audio(&self) -> Result<SpellingPrompt, ServiceError> {
        let response = self
            .client
            .get(format!("{}/spelling_test/get-audio", self.base_url))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: AudioResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(SpellingPrompt {
            audio_file: body
                .audio_file
                .trim_start_matches(AUDIO_PREFIX)
                .to_string(),
            correct_word: body.correct_word,
        })
    }

    /// URL the dictation audio is served from.
    pub fn audio_url(&self, prompt: &SpellingPrompt) -> String {
        format!("{}/{}{}", self.base_url, AUDIO_PREFIX, prompt.audio_file)
    }

    /// Validate one typed answer.
    #[instrument(skip(self), fields(attempt = attempt_number))]
    pub async fn validate(
        &self,
        user_answer: &str,
        audio_file: &str,
        attempt_number: u32,
    ) -> Result<ScoreOutcome, ServiceError> {
        let response = self
            .client
            .post(format!("{}/spelling_test/validate-answer", self.base_url))
            .json(&ValidateRequest {
                user_answer,
                audio_file,
                attempt_number,
            })
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: ValidateResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(ScoreOutcome {
            is_correct: Some(body.is_correct),
            correct_answer: Some(body.correct_word),
            ..ScoreOutcome::new(body.risk, body.dyslexia_score)
        })
    }
}

#[async_trait]
impl RemoteScorer for SpellingClient {
    fn name(&self) -> &str {
        "spelling"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        match request {
            ScoreRequest::Spelling {
                user_answer,
                audio_file,
                attempt_number,
            } => self.validate(user_answer, audio_file, *attempt_number).await,
            _ => Err(ServiceError::UnsupportedPayload("spelling")),
        }
    }
}

#[async_trait]
impl StimulusSource for SpellingClient {
    async fn next(
        &mut self,
        _category: Option<Category>,
    ) -> Result<Option<Stimulus>, StimulusError> {
        let prompt = self.fetch_audio().await?;
        Ok(Some(Stimulus::Spelling(prompt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_audio_strips_storage_prefix() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "audio_file": "audio/correct/yacht.wav",
            "correct_word": "yacht"
        });

        Mock::given(method("GET"))
            .and(path("/spelling_test/get-audio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = SpellingClient::new(&server.uri());
        let prompt = client.fetch_audio().await.unwrap();
        assert_eq!(prompt.audio_file, "yacht.wav");
        assert_eq!(prompt.correct_word, "yacht");
        assert!(client.audio_url(&prompt).ends_with("/audio/correct/yacht.wav"));
    }

    #[tokio::test]
    async fn validate_echoes_service_verdict() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "is_correct": true,
            "user_answer": "yacht",
            "correct_word": "yacht",
            "dyslexia_score": 0.22,
            "risk": "Low"
        });

        Mock::given(method("POST"))
            .and(path("/spelling_test/validate-answer"))
            .and(body_partial_json(serde_json::json!({
                "user_answer": "yacht",
                "attempt_number": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = SpellingClient::new(&server.uri());
        let outcome = client.validate("yacht", "yacht.wav", 1).await.unwrap();
        assert_eq!(outcome.is_correct, Some(true));
        assert_eq!(outcome.correct_answer.as_deref(), Some("yacht"));
        assert_eq!(outcome.classification.label, "Low");
        assert!((outcome.classification.confidence - 0.22).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_audio_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/spelling_test/validate-answer"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Audio file not found in dataset."
            })))
            .mount(&server)
            .await;

        let client = SpellingClient::new(&server.uri());
        let err = client.validate("yacht", "missing.wav", 1).await.unwrap_err();
        match err {
            ServiceError::Api { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
