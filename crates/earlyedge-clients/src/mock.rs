//! Mock scorer and profile store for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use earlyedge_core::error::ServiceError;
use earlyedge_core::model::ChildProfile;
use earlyedge_core::traits::{
    ProfileStore, RemoteScorer, SaveResultRequest, ScoreOutcome, ScoreRequest,
};

/// A mock scorer for driving sessions without real service calls.
///
/// Returns queued outcomes in order, falling back to a fixed default.
pub struct MockScorer {
    queued: Mutex<VecDeque<ScoreOutcome>>,
    default_outcome: ScoreOutcome,
    call_count: AtomicU32,
    last_request: Mutex<Option<ScoreRequest>>,
}

impl MockScorer {
    /// Create a mock that always returns the same classification.
    pub fn with_fixed_outcome(label: &str, confidence: f64) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_outcome: ScoreOutcome::new(label, confidence),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that replays the given outcomes in order.
    pub fn with_sequence(outcomes: Vec<ScoreOutcome>) -> Self {
        Self {
            queued: Mutex::new(outcomes.into()),
            default_outcome: ScoreOutcome::new("Inconclusive", 0.0),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of scoring calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The most recent request received.
    pub fn last_request(&self) -> Option<ScoreRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteScorer for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let queued = self.queued.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| self.default_outcome.clone()))
    }
}

/// In-memory profile store recording every save.
pub struct MockProfileStore {
    children: Vec<ChildProfile>,
    saved: Mutex<Vec<SaveResultRequest>>,
    fail_saves: bool,
}

impl MockProfileStore {
    pub fn new(children: Vec<ChildProfile>) -> Self {
        Self {
            children,
            saved: Mutex::new(Vec::new()),
            fail_saves: false,
        }
    }

    /// A store whose saves always fail, for exercising the best-effort
    /// persistence path.
    pub fn failing() -> Self {
        Self {
            children: Vec::new(),
            saved: Mutex::new(Vec::new()),
            fail_saves: true,
        }
    }

    pub fn saved(&self) -> Vec<SaveResultRequest> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn fetch_children(&self) -> Result<Vec<ChildProfile>, ServiceError> {
        Ok(self.children.clone())
    }

    async fn save_result(&self, request: &SaveResultRequest) -> Result<(), ServiceError> {
        if self.fail_saves {
            return Err(ServiceError::Network("connection refused".into()));
        }
        self.saved.lock().unwrap().push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_outcome() {
        let scorer = MockScorer::with_fixed_outcome("Minimal", 0.2);
        let request = ScoreRequest::PhonoSpeech {
            question: "q".into(),
            response: "r".into(),
        };

        let outcome = scorer.score(&request).await.unwrap();
        assert_eq!(outcome.classification.label, "Minimal");
        assert_eq!(scorer.call_count(), 1);
        assert!(matches!(
            scorer.last_request(),
            Some(ScoreRequest::PhonoSpeech { .. })
        ));
    }

    #[tokio::test]
    async fn sequence_then_default() {
        let scorer = MockScorer::with_sequence(vec![
            ScoreOutcome::new("first", 0.9),
            ScoreOutcome::new("second", 0.8),
        ]);
        let request = ScoreRequest::PhonoSpeech {
            question: "q".into(),
            response: "r".into(),
        };

        assert_eq!(
            scorer.score(&request).await.unwrap().classification.label,
            "first"
        );
        assert_eq!(
            scorer.score(&request).await.unwrap().classification.label,
            "second"
        );
        assert_eq!(
            scorer.score(&request).await.unwrap().classification.label,
            "Inconclusive"
        );
    }

    #[tokio::test]
    async fn failing_store_reports_network_error() {
        let store = MockProfileStore::failing();
        let request = SaveResultRequest {
            child_name: "Alex".into(),
            test_name: "Spelling Test - Dyslexia".into(),
            result: serde_json::json!({}),
            date: chrono::Utc::now(),
        };
        assert!(store.save_result(&request).await.is_err());
        assert!(store.saved().is_empty());
    }
}
