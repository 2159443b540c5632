//! Handwriting-sample (dysgraphia) scoring client.
//!
//! Uploads 1–3 images as multipart form data; the per-image predictions
//! are combined into one outcome by confidence-weighted vote.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use earlyedge_core::error::ServiceError;
use earlyedge_core::model::{Classification, ImageUpload};
use earlyedge_core::statistics::weighted_vote;
use earlyedge_core::traits::{RemoteScorer, ScoreOutcome, ScoreRequest};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

pub const MAX_IMAGES: usize = 3;

/// Client for the handwritten-sample router.
pub struct HandwritingClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(rename = "Results")]
    results: Vec<ImageResult>,
}

#[derive(Deserialize)]
struct ImageResult {
    #[serde(rename = "Prediction")]
    prediction: String,
    #[serde(rename = "Confidence")]
    confidence: f64,
}

impl HandwritingClient {
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

    /// Upload and score 1–3 handwriting samples. The count is checked
    /// before any network traffic.
    #[instrument(skip(self, images), fields(count = images.len()))]
    pub async fn predict(&self, images: &[ImageUpload]) -> Result<ScoreOutcome, ServiceError> {
        if images.is_empty() || images.len() > MAX_IMAGES {
            return Err(ServiceError::UnsupportedPayload("1 to 3 images"));
        }

        let mut form = reqwest::multipart::Form::new();
        for image in images {
            let part = reqwest::multipart::Part::bytes(image.bytes.clone())
                .file_name(image.filename.clone())
                .mime_str("image/png")
                .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(format!(
                "{}/handwritten_test/dysgraphia/predict",
                self.base_url
            ))
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        let votes: Vec<Classification> = body
            .results
            .iter()
            .map(|r| Classification::new(r.prediction.clone(), r.confidence))
            .collect();

        let classification = weighted_vote(&votes)
            .ok_or_else(|| ServiceError::InvalidResponse("empty results".into()))?;
        Ok(ScoreOutcome::new(
            classification.label,
            classification.confidence,
        ))
    }
}

#[async_trait]
impl RemoteScorer for HandwritingClient {
    fn name(&self) -> &str {
        "handwriting"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        match request {
            ScoreRequest::Handwriting { images } => self.predict(images).await,
            _ => Err(ServiceError::UnsupportedPayload("handwriting")),
        }
    }
}
