//! Arithmetic (dyscalculia) scoring client.
//!
//! The service scores the whole attempt sequence in one call and returns
//! the session-level risk summary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use earlyedge_core::error::ServiceError;
use earlyedge_core::traits::{ArithmeticObservation, RemoteScorer, ScoreOutcome, ScoreRequest};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

/// Client for the arithmetic summary endpoint.
pub struct ArithmeticClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    attempts: &'a [ArithmeticObservation],
}

#[derive(Deserialize)]
struct SummaryResponse {
    total_correct: u32,
    #[serde(default)]
    average_time: Option<f64>,
    overall_risk: String,
    speed_category: String,
    risk_count: u32,
    total_attempts: u32,
    #[serde(default)]
    assessment_quality: Option<String>,
}

impl ArithmeticClient {
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

    /// Score a full session of arithmetic attempts.
    #[instrument(skip(self, attempts), fields(count = attempts.len()))]
    pub async fn summary(
        &self,
        attempts: &[ArithmeticObservation],
    ) -> Result<ScoreOutcome, ServiceError> {
        let response = self
            .client
            .post(format!(
                "{}/arithmetic_test/api/arithmetic/summary",
                self.base_url
            ))
            .json(&SummaryRequest { attempts })
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        // The summary endpoint carries no probability; the risk ratio
        // stands in so the outcome shape stays uniform.
        let confidence = if body.total_attempts > 0 {
            body.risk_count as f64 / body.total_attempts as f64
        } else {
            0.0
        };

        Ok(ScoreOutcome {
            is_correct: None,
            correct_answer: None,
            speed_category: Some(body.speed_category),
            total_correct: Some(body.total_correct),
            average_time: body.average_time,
            risk_count: Some(body.risk_count),
            assessment_quality: body.assessment_quality,
            ..ScoreOutcome::new(body.overall_risk, confidence)
        })
    }
}

#[async_trait]
impl RemoteScorer for ArithmeticClient {
    fn name(&self) -> &str {
        "arithmetic"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        match request {
            ScoreRequest::Arithmetic { attempts } => self.summary(attempts).await,
            _ => Err(ServiceError::UnsupportedPayload("arithmetic")),
        }
    }
}
