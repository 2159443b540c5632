//! Number-comparison (dyscalculia) scoring client.
//!
//! Doubles as the stimulus source for its test: a fresh number pair is
//! fetched from the service before every trial.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use earlyedge_core::error::{ServiceError, StimulusError};
use earlyedge_core::model::{Category, ComparisonSide, NumberPair, Stimulus};
use earlyedge_core::traits::{RemoteScorer, ScoreOutcome, ScoreRequest, StimulusSource};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

/// Client for the number-understanding router.
pub struct NumberSenseClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct QuestionResponse {
    question_type: String,
    left_number: f64,
    right_number: f64,
    correct_answer: String,
}

#[derive(Serialize)]
struct PredictRequest {
    left_number: f64,
    right_number: f64,
    response_time_sec: f64,
    user_correct: u8,
}

#[derive(Deserialize)]
struct PredictResponse {
    result: String,
    confidence: f64,
    #[serde(default)]
    speed_category: Option<String>,
}

impl NumberSenseClient {
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

    /// Fetch a fresh comparison question.
    #[instrument(skip(self))]
    pub async fn fetch_question(&self) -> Result<NumberPair, ServiceError> {
        let response = self
            .client
            .get(format!(
                "{}/numberunderstanding_test/getQuestions",
                self.base_url
            ))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: QuestionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        let correct_side: ComparisonSide = body
            .correct_answer
            .parse()
            .map_err(|e: String| ServiceError::InvalidResponse(e))?;

        Ok(NumberPair {
            question_type: body.question_type,
            left: body.left_number,
            right: body.right_number,
            correct_side,
        })
    }

    /// Score one answered comparison.
    #[instrument(skip(self))]
    pub async fn predict(
        &self,
        left: f64,
        right: f64,
        response_time_secs: f64,
        correct: bool,
    ) -> Result<ScoreOutcome, ServiceError> {
        let response = self
            .client
            .post(format!(
                "{}/numberunderstanding_test/predict",
                self.base_url
            ))
            .json(&PredictRequest {
                left_number: left,
                right_number: right,
                response_time_sec: response_time_secs,
                user_correct: correct as u8,
            })
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(ScoreOutcome {
            speed_category: body.speed_category,
            ..ScoreOutcome::new(body.result, body.confidence)
        })
    }
}

#[async_trait]
impl RemoteScorer for NumberSenseClient {
    fn name(&self) -> &str {
        "number-comparison"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        match request {
            ScoreRequest::NumberComparison {
                left,
                right,
                response_time_secs,
                correct,
            } => {
                self.predict(*left, *right, *response_time_secs, *correct)
                    .await
            }
            _ => Err(ServiceError::UnsupportedPayload("number-comparison")),
        }
    }
}

#[async_trait]
impl StimulusSource for NumberSenseClient {
    async fn next(
        &mut self,
        _category: Option<Category>,
    ) -> Result<Option<Stimulus>, StimulusError> {
        let pair = self.fetch_question().await?;
        Ok(Some(Stimulus::NumberComparison(pair)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_question_parses_sides() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "question_type": "Which number is bigger?",
            "left_number": 7,
            "right_number": 3,
            "correct_answer": "left",
            "at_risk": 0
        });

        Mock::given(method("GET"))
            .and(path("/numberunderstanding_test/getQuestions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = NumberSenseClient::new(&server.uri());
        let pair = client.fetch_question().await.unwrap();
        assert_eq!(pair.left, 7.0);
        assert_eq!(pair.correct_side, ComparisonSide::Left);
    }

    #[tokio::test]
    async fn fetch_question_rejects_unknown_side() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "question_type": "Which number is bigger?",
            "left_number": 7,
            "right_number": 3,
            "correct_answer": "middle"
        });

        Mock::given(method("GET"))
            .and(path("/numberunderstanding_test/getQuestions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = NumberSenseClient::new(&server.uri());
        let err = client.fetch_question().await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn predict_returns_outcome() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "at_risk": 0,
            "result": "Not At Risk",
            "confidence": 0.12,
            "response_time_sec": 2.0,
            "speed_category": "Minimal Indicators",
            "speed_message": "The child responded quickly."
        });

        Mock::given(method("POST"))
            .and(path("/numberunderstanding_test/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = NumberSenseClient::new(&server.uri());
        let outcome = client.predict(7.0, 3.0, 2.0, true).await.unwrap();
        assert_eq!(outcome.classification.label, "Not At Risk");
        assert!((outcome.classification.confidence - 0.12).abs() < 1e-9);
        assert_eq!(
            outcome.speed_category.as_deref(),
            Some("Minimal Indicators")
        );
    }
}
