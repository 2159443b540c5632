//! Letter-confusion (dyslexia) scoring client.
//!
//! The service takes the full answer sequence at session end and returns a
//! single prediction with its confidence.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use earlyedge_core::error::ServiceError;
use earlyedge_core::traits::{ConfusionObservation, RemoteScorer, ScoreOutcome, ScoreRequest};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

/// Client for the letter-confusion router.
pub struct LetterConfusionClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct SubmitResponse {
    prediction: String,
    confidence: f64,
}

impl LetterConfusionClient {
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

    /// Submit the whole answer sequence. The body is a bare JSON array.
    #[instrument(skip(self, answers), fields(count = answers.len()))]
    pub async fn submit_answers(
        &self,
        answers: &[ConfusionObservation],
    ) -> Result<ScoreOutcome, ServiceError> {
        let response = self
            .client
            .post(format!(
                "{}/letterconfusion_test/dyslexia/submit_answer/",
                self.base_url
            ))
            .json(&answers)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(ScoreOutcome::new(body.prediction, body.confidence))
    }
}

#[async_trait]
impl RemoteScorer for LetterConfusionClient {
    fn name(&self) -> &str {
        "letter-confusion"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        match request {
            ScoreRequest::LetterConfusion { answers } => self.submit_answers(answers).await,
            _ => Err(ServiceError::UnsupportedPayload("letter-confusion")),
        }
    }
}
