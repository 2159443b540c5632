//! Driving whole sessions through the capture surfaces.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use earlyedge_capture::{ScriptedAction, ScriptedCapture, TerminalCapture};
use earlyedge_core::error::{CaptureError, ServiceError, SessionError};
use earlyedge_core::model::{Modality, SpellingPrompt, Stimulus, TestKind};
use earlyedge_core::session::{run_session, SessionConfig, SessionController};
use earlyedge_core::stimulus::{ProceduralArithmetic, StaticBank};
use earlyedge_core::traits::{RemoteScorer, ScoreOutcome, ScoreRequest};

struct FixedScorer(&'static str, f64);

#[async_trait]
impl RemoteScorer for FixedScorer {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn score(&self, _: &ScoreRequest) -> Result<ScoreOutcome, ServiceError> {
        Ok(ScoreOutcome {
            is_correct: Some(true),
            ..ScoreOutcome::new(self.0, self.1)
        })
    }
}

fn quick(test: TestKind) -> SessionConfig {
    SessionConfig {
        stage_interval: Duration::ZERO,
        tick_period: Duration::ZERO,
        ..SessionConfig::for_test(test)
    }
}

#[tokio::test]
async fn scripted_spelling_session_runs_to_summary() {
    let bank = StaticBank::new(
        (0..5)
            .map(|i| {
                Stimulus::Spelling(SpellingPrompt {
                    audio_file: format!("word-{i}.wav"),
                    correct_word: format!("word{i}"),
                })
            })
            .collect(),
    );
    let mut controller = SessionController::new(
        quick(TestKind::Spelling),
        bank,
        Arc::new(FixedScorer("Low", 0.1)),
    );
    let mut capture = ScriptedCapture::repeating(ScriptedAction::Correct, 5);

    let summary = run_session(&mut controller, &mut capture).await.unwrap();

    assert_eq!(summary.total_attempts, 5);
    assert_eq!(summary.total_correct, 5);
    assert_eq!(summary.classification.label, "Minimal indicators");
    assert!(controller
        .attempts()
        .iter()
        .all(|a| a.is_correct == Some(true)));
}

#[tokio::test]
async fn scripted_arithmetic_session_acknowledges_the_gate() {
    let mut controller = SessionController::new(
        quick(TestKind::Arithmetic),
        ProceduralArithmetic::seeded(5),
        Arc::new(FixedScorer("No risk", 0.0)),
    );
    let mut capture = ScriptedCapture::repeating(ScriptedAction::Correct, 15)
        .with_category(earlyedge_core::model::Category::Addition);

    let summary = run_session(&mut controller, &mut capture).await.unwrap();

    assert!(capture.acknowledged());
    assert_eq!(summary.total_attempts, 15);
    assert_eq!(summary.total_correct, 15);
}

#[tokio::test]
async fn terminal_cannot_run_speech_tests() {
    let bank = StaticBank::new(vec![Stimulus::PhonoSpeech {
        question: "Say 'ship'".into(),
    }]);
    let mut controller = SessionController::new(
        quick(TestKind::PhonoSpeech),
        bank,
        Arc::new(FixedScorer("Minimal", 0.2)),
    );
    let mut capture = TerminalCapture::new();

    let err = run_session(&mut controller, &mut capture).await.unwrap_err();
    match err {
        SessionError::Capture(CaptureError::Unsupported(modality)) => {
            assert_eq!(modality, Modality::Speech);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // The gate fires before any trial: nothing was attempted.
    assert!(controller.attempts().is_empty());
}
