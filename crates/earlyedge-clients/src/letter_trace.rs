//! Letter-tracing (dysgraphia) scoring client.
//!
//! Each traced letter is scored individually from its drawing snapshot,
//! duration, and frontend-derived accuracy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use earlyedge_core::error::ServiceError;
use earlyedge_core::traits::{RemoteScorer, ScoreOutcome, ScoreRequest};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

/// Client for the letter-tracing router.
pub struct LetterTraceClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct TraceRequest<'a> {
    letter: char,
    drawing: &'a str,
    duration: f64,
    accuracy: f64,
}

#[derive(Deserialize)]
struct TraceResponse {
    label: String,
    confidence: f64,
}

impl LetterTraceClient {
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

    /// Score one traced letter.
    #[instrument(skip(self, drawing))]
    pub async fn trace(
        &self,
        letter: char,
        drawing: &str,
        duration_secs: f64,
        accuracy: f64,
    ) -> Result<ScoreOutcome, ServiceError> {
        let response = self
            .client
            .post(format!("{}/letter_tracing/trace", self.base_url))
            .json(&TraceRequest {
                letter,
                drawing,
                duration: duration_secs,
                accuracy,
            })
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: TraceResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(ScoreOutcome::new(body.label, body.confidence))
    }
}

#[async_trait]
impl RemoteScorer for LetterTraceClient {
    fn name(&self) -> &str {
        "letter-tracing"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        match request {
            ScoreRequest::LetterTracing {
                letter,
                drawing,
                duration_secs,
                accuracy,
            } => {
                self.trace(*letter, drawing, *duration_secs, *accuracy)
                    .await
            }
            _ => Err(ServiceError::UnsupportedPayload("letter-tracing")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn trace_returns_label_and_confidence() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "label": "non_dysgraphic",
            "confidence": 0.88,
            "duration_seconds": 4.2,
            "accuracy": 0.85
        });

        Mock::given(method("POST"))
            .and(path("/letter_tracing/trace"))
            .and(body_partial_json(serde_json::json!({
                "letter": "A",
                "accuracy": 0.85
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = LetterTraceClient::new(&server.uri());
        let outcome = client.trace('A', "[[1,2],[3,4]]", 4.2, 0.85).await.unwrap();
        assert_eq!(outcome.classification.label, "non_dysgraphic");
        assert!((outcome.classification.confidence - 0.88).abs() < 1e-9);
    }

    #[tokio::test]
    async fn invalid_metrics_map_detail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/letter_tracing/trace"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "Invalid duration or accuracy"
            })))
            .mount(&server)
            .await;

        let client = LetterTraceClient::new(&server.uri());
        let err = client.trace('A', "[]", -1.0, 2.0).await.unwrap_err();
        match err {
            ServiceError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid duration or accuracy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
