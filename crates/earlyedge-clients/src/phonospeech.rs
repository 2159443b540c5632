//! Phonological-speech (dyslexia) client.
//!
//! The question list is fetched once per session; each spoken transcript
//! is scored individually.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use earlyedge_core::error::ServiceError;
use earlyedge_core::model::Stimulus;
use earlyedge_core::stimulus::StaticBank;
use earlyedge_core::traits::{RemoteScorer, ScoreOutcome, ScoreRequest};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

/// Client for the phonospeech router.
pub struct PhonoSpeechClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// The questions endpoint has shipped both bare strings and
/// `{"Question": ...}` records; accept either.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionEntry {
    Text(String),
    Record {
        #[serde(alias = "Question", alias = "question")]
        question: String,
    },
}

impl QuestionEntry {
    fn into_text(self) -> String {
        match self {
            QuestionEntry::Text(text) => text,
            QuestionEntry::Record { question } => question,
        }
    }
}

#[derive(Deserialize)]
struct QuestionsResponse {
    questions: Vec<QuestionEntry>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    question: &'a str,
    child_response: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    risk_level: String,
    confidence_score: f64,
}

impl PhonoSpeechClient {
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

    /// Fetch the question list.
    #[instrument(skip(self))]
    pub async fn questions(&self) -> Result<Vec<String>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/phonospeech_test/questions", self.base_url))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: QuestionsResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(body
            .questions
            .into_iter()
            .map(QuestionEntry::into_text)
            .collect())
    }

    /// Fetch the question list once and wrap it as a static bank.
    pub async fn fetch_question_bank(&self) -> Result<StaticBank, ServiceError> {
        let questions = self.questions().await?;
        Ok(StaticBank::new(
            questions
                .into_iter()
                .map(|question| Stimulus::PhonoSpeech { question })
                .collect(),
        ))
    }

    /// Score one spoken transcript against its question.
    #[instrument(skip(self, transcript))]
    pub async fn predict(
        &self,
        question: &str,
        transcript: &str,
    ) -> Result<ScoreOutcome, ServiceError> {
        let response = self
            .client
            .post(format!("{}/phonospeech_test/predict", self.base_url))
            .json(&PredictRequest {
                question,
                child_response: transcript,
            })
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(ScoreOutcome::new(body.risk_level, body.confidence_score))
    }
}

#[async_trait]
impl RemoteScorer for PhonoSpeechClient {
    fn name(&self) -> &str {
        "phono-speech"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        match request {
            ScoreRequest::PhonoSpeech { question, response } => {
                self.predict(question, response).await
            }
            _ => Err(ServiceError::UnsupportedPayload("phono-speech")),
        }
    }
}
