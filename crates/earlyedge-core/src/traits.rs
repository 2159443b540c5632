//! Core trait definitions for the external collaborators and capability
//! surfaces.
//!
//! The scoring and profile services are implemented by the
//! `earlyedge-clients` crate; response capture by `earlyedge-capture`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, ServiceError, StimulusError};
use crate::model::{
    Category, ChildProfile, Classification, ImageUpload, Modality, Response, Stimulus,
};

// ---------------------------------------------------------------------------
// Remote scorer
// ---------------------------------------------------------------------------

/// Trait for the external prediction service.
///
/// The service is assumed to be slow (hundreds of ms to seconds) and
/// fallible; callers must not lose already-collected attempts when a call
/// fails.
#[async_trait]
pub trait RemoteScorer: Send + Sync {
    /// Human-readable scorer name (e.g. "arithmetic").
    fn name(&self) -> &str;

    /// Score a batch of attempts or a single attempt, depending on the test.
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError>;
}

/// One attempt of the arithmetic test, as the scoring service expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArithmeticObservation {
    pub op1: i32,
    pub op2: i32,
    /// Operator symbol ("+", "-", "*", "/").
    pub operation: String,
    /// 0 for a correct choice, 1 for an incorrect one.
    pub user_choice: u8,
    pub response_time: f64,
}

/// One answered letter-confusion item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionObservation {
    pub question_type: String,
    pub shown_letters: Vec<String>,
    /// 1 when the picked letter matched the answer, else 0.
    pub correct: u8,
    pub response_time_ms: u64,
}

/// Payload sent to the remote scorer. One variant per test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "kebab-case")]
pub enum ScoreRequest {
    Arithmetic {
        attempts: Vec<ArithmeticObservation>,
    },
    NumberComparison {
        left: f64,
        right: f64,
        response_time_secs: f64,
        correct: bool,
    },
    LetterConfusion {
        answers: Vec<ConfusionObservation>,
    },
    LetterTracing {
        letter: char,
        drawing: String,
        duration_secs: f64,
        accuracy: f64,
    },
    Spelling {
        user_answer: String,
        audio_file: String,
        attempt_number: u32,
    },
    PhonoSpeech {
        question: String,
        response: String,
    },
    Handwriting {
        images: Vec<ImageUpload>,
    },
}

/// What the scorer returned. Always carries a classification; the remaining
/// fields echo test-specific extras when the service provides them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub classification: Classification,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub speed_category: Option<String>,
    #[serde(default)]
    pub total_correct: Option<u32>,
    #[serde(default)]
    pub average_time: Option<f64>,
    #[serde(default)]
    pub risk_count: Option<u32>,
    #[serde(default)]
    pub assessment_quality: Option<String>,
}

impl ScoreOutcome {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            classification: Classification::new(label, confidence),
            is_correct: None,
            correct_answer: None,
            speed_category: None,
            total_correct: None,
            average_time: None,
            risk_count: None,
            assessment_quality: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile store
// ---------------------------------------------------------------------------

/// Request to persist a finished session against a child profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResultRequest {
    pub child_name: String,
    /// Free-text test label (e.g. "Arithmetic Test - Dyscalculia").
    pub test_name: String,
    /// Summary plus raw attempts, as JSON.
    pub result: serde_json::Value,
    pub date: DateTime<Utc>,
}

/// Trait for the external profile-persistence service.
///
/// Persistence is best-effort from the controller's perspective: failures
/// are logged and swallowed, and must never block reveal of the summary.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the children registered under the configured account.
    async fn fetch_children(&self) -> Result<Vec<ChildProfile>, ServiceError>;

    /// Persist a finished session's result.
    async fn save_result(&self, request: &SaveResultRequest) -> Result<(), ServiceError>;
}

// ---------------------------------------------------------------------------
// Stimulus source
// ---------------------------------------------------------------------------

/// Supplies the next stimulus for a trial.
///
/// Returning `Ok(None)` means the source is exhausted; the session ends
/// early with the attempts collected so far. A fetch error must surface a
/// retry-safe failure, never silently advance the trial.
#[async_trait]
pub trait StimulusSource: Send {
    async fn next(&mut self, category: Option<Category>)
        -> Result<Option<Stimulus>, StimulusError>;
}

#[async_trait]
impl StimulusSource for Box<dyn StimulusSource> {
    async fn next(
        &mut self,
        category: Option<Category>,
    ) -> Result<Option<Stimulus>, StimulusError> {
        (**self).next(category).await
    }
}

// ---------------------------------------------------------------------------
// Response capture
// ---------------------------------------------------------------------------

/// Capability surface through which a session obtains the child's
/// responses. Implementations must advertise which modalities they can
/// provide so unsupported tests fail before any trial begins.
#[async_trait]
pub trait ResponseCapture: Send {
    /// Whether this environment can capture the given modality.
    fn supports(&self, modality: Modality) -> bool;

    /// Present a disclaimer/instructions screen and block until it is
    /// explicitly acknowledged.
    async fn acknowledge(&mut self, message: &str) -> Result<(), CaptureError>;

    /// Ask for an arithmetic operation category.
    async fn select_category(&mut self) -> Result<Category, CaptureError>;

    /// Capture a response for the given stimulus.
    async fn capture(&mut self, stimulus: &Stimulus) -> Result<Response, CaptureError>;
}
