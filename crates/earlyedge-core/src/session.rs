//! The screening-session controller.
//!
//! One state machine drives every test: intro gate, optional category
//! selection, a fixed-length trial loop, a cosmetic processing stage, and a
//! terminal summary. All remote work is cooperative and non-blocking; a
//! trial never accepts a second submission while one is in flight, and a
//! result that arrives after its trial was abandoned is discarded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{
    Attempt, Category, ChildProfile, Classification, Response, Stimulus, TestKind,
};
use crate::report::SessionReport;
use crate::statistics::{summarize, weighted_vote, RiskPolicy, Summary};
use crate::timer::TrialTicker;
use crate::traits::{
    ArithmeticObservation, ConfusionObservation, ProfileStore, RemoteScorer, ResponseCapture,
    SaveResultRequest, ScoreOutcome, ScoreRequest, StimulusSource,
};

/// Disclaimer text gating tests that require explicit acknowledgement.
pub const DISCLAIMER: &str = "This tool is not diagnostic. It serves as a first-aid or early \
warning system and should not be used as a substitute for professional evaluation.";

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Intro,
    CategorySelect,
    TrialActive,
    Processing,
    SummaryReady,
}

/// Whether the scorer is invoked once per submission or once with the full
/// attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    Batch,
    PerTrial,
}

/// Static configuration for one test variant.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub test: TestKind,
    /// Free-text label stored with the persisted result.
    pub test_label: String,
    pub total_trials: usize,
    /// Trials per round; the round number shown on attempts derives from it.
    pub trials_per_round: usize,
    /// Scored tries allowed per stimulus before forced advancement.
    pub retries_per_stimulus: usize,
    pub scoring: ScoringMode,
    pub risk_policy: RiskPolicy,
    pub requires_intro: bool,
    pub requires_category: bool,
    /// Cosmetic status lines shown while "analyzing".
    pub processing_stages: Vec<String>,
    pub stage_interval: Duration,
    /// Display ticker period. Zero disables the ticker.
    pub tick_period: Duration,
}

impl SessionConfig {
    /// The preset used by each test page.
    pub fn for_test(test: TestKind) -> Self {
        let base = Self {
            test,
            test_label: test.profile_label().to_string(),
            total_trials: 5,
            trials_per_round: 5,
            retries_per_stimulus: 1,
            scoring: ScoringMode::PerTrial,
            risk_policy: RiskPolicy::WeightedVote,
            requires_intro: false,
            requires_category: false,
            processing_stages: Vec::new(),
            stage_interval: Duration::from_millis(1500),
            tick_period: Duration::from_millis(100),
        };

        match test {
            TestKind::Arithmetic => Self {
                total_trials: 15,
                scoring: ScoringMode::Batch,
                risk_policy: RiskPolicy::Scorer,
                requires_intro: true,
                requires_category: true,
                processing_stages: vec![
                    "Computing...".into(),
                    "Finalizing...".into(),
                    "Generating Results...".into(),
                ],
                ..base
            },
            TestKind::NumberComparison => Self {
                requires_intro: true,
                ..base
            },
            TestKind::LetterConfusion => Self {
                scoring: ScoringMode::Batch,
                risk_policy: RiskPolicy::ConfidenceBands {
                    emerging: 0.4,
                    strong: 0.7,
                },
                ..base
            },
            TestKind::LetterTracing => Self {
                total_trials: 52,
                trials_per_round: 52,
                tick_period: Duration::from_secs(1),
                ..base
            },
            TestKind::Spelling => Self {
                risk_policy: RiskPolicy::AverageIncorrectProbability {
                    emerging: 0.4,
                    strong: 0.7,
                },
                ..base
            },
            TestKind::PhonoSpeech => Self {
                retries_per_stimulus: 3,
                requires_intro: true,
                ..base
            },
            TestKind::Handwriting => Self {
                total_trials: 1,
                trials_per_round: 1,
                requires_intro: true,
                ..base
            },
        }
    }
}

/// Progress callbacks for display surfaces.
pub trait SessionObserver: Send + Sync {
    fn on_trial_started(&self, ordinal: usize, total: usize, stimulus: &Stimulus);
    fn on_attempt_recorded(&self, attempt: &Attempt);
    fn on_processing_stage(&self, stage: &str);
    fn on_summary_ready(&self, summary: &Summary);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_trial_started(&self, _: usize, _: usize, _: &Stimulus) {}
    fn on_attempt_recorded(&self, _: &Attempt) {}
    fn on_processing_stage(&self, _: &str) {}
    fn on_summary_ready(&self, _: &Summary) {}
}

/// Identity of one trial. The epoch increments on every reset, so a result
/// prepared before a reset can never be applied afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialToken {
    epoch: u64,
    ordinal: usize,
}

/// A submission whose scoring round-trip is still outstanding.
///
/// Created by [`SessionController::prepare_submission`]; the authoritative
/// response time is fixed here, at the moment of submission, regardless of
/// how long scoring takes or what the display ticker shows.
#[derive(Debug)]
pub struct PendingSubmission {
    token: TrialToken,
    stimulus: Stimulus,
    response: Response,
    response_time_secs: f64,
    is_correct: Option<bool>,
}

impl PendingSubmission {
    pub fn response_time_secs(&self) -> f64 {
        self.response_time_secs
    }
}

/// What a completed submission led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The same stimulus may be tried again.
    RetrySame { remaining: usize },
    /// The next trial is active.
    NextTrial { ordinal: usize },
    /// All trials are recorded; call `finalize`.
    Processing,
}

#[derive(Debug)]
struct LastTry {
    response: Response,
    response_time_secs: f64,
    is_correct: Option<bool>,
}

/// The state owned exclusively by one page/session instance.
struct Session {
    id: Uuid,
    epoch: u64,
    phase: Phase,
    category: Option<Category>,
    trial_index: usize,
    attempts: Vec<Attempt>,
    stimulus: Option<Stimulus>,
    trial_started: Option<Instant>,
    summary: Option<Summary>,
    in_flight: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch: 0,
            phase: Phase::Intro,
            category: None,
            trial_index: 0,
            attempts: Vec::new(),
            stimulus: None,
            trial_started: None,
            summary: None,
            in_flight: false,
        }
    }
}

/// Drives one screening session against a stimulus source, the remote
/// scorer, and (optionally) the profile store.
pub struct SessionController<S: StimulusSource> {
    config: SessionConfig,
    source: S,
    scorer: Arc<dyn RemoteScorer>,
    profiles: Option<Arc<dyn ProfileStore>>,
    observer: Arc<dyn SessionObserver>,
    child: Option<ChildProfile>,
    session: Session,
    /// Per-trial classifications collected while the current stimulus is
    /// being retried.
    votes: Vec<Classification>,
    stimulus_tries: usize,
    last_try: Option<LastTry>,
    ticker: Option<TrialTicker>,
}

impl<S: StimulusSource> SessionController<S> {
    pub fn new(config: SessionConfig, source: S, scorer: Arc<dyn RemoteScorer>) -> Self {
        Self {
            config,
            source,
            scorer,
            profiles: None,
            observer: Arc::new(NoopObserver),
            child: None,
            session: Session::new(),
            votes: Vec::new(),
            stimulus_tries: 0,
            last_try: None,
            ticker: None,
        }
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn trial_index(&self) -> usize {
        self.session.trial_index
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.session.attempts
    }

    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        self.session.stimulus.as_ref()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.session.summary.as_ref()
    }

    pub fn child(&self) -> Option<&ChildProfile> {
        self.child.as_ref()
    }

    /// Last value published by the display ticker. Never transmitted.
    pub fn display_elapsed_secs(&self) -> f64 {
        self.ticker
            .as_ref()
            .map(|t| t.elapsed_secs())
            .unwrap_or(0.0)
    }

    /// Begin the session: fetch the child profile (best-effort) and settle
    /// into the first phase.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if let Some(profiles) = &self.profiles {
            match profiles.fetch_children().await {
                Ok(children) => self.child = children.into_iter().next(),
                Err(e) => tracing::warn!(error = %e, "failed to fetch child profile"),
            }
        }

        if self.config.requires_intro {
            self.session.phase = Phase::Intro;
            Ok(())
        } else if self.config.requires_category {
            self.session.phase = Phase::CategorySelect;
            Ok(())
        } else {
            self.session.phase = Phase::TrialActive;
            self.fetch_stimulus().await
        }
    }

    /// Explicit acknowledgement of the disclaimer screen. All test
    /// interaction is blocked until this runs.
    pub async fn acknowledge_intro(&mut self) -> Result<(), SessionError> {
        if self.session.phase != Phase::Intro {
            return Err(SessionError::InvalidPhase {
                action: "acknowledge_intro",
            });
        }
        if self.config.requires_category {
            self.session.phase = Phase::CategorySelect;
            Ok(())
        } else {
            self.session.phase = Phase::TrialActive;
            self.fetch_stimulus().await
        }
    }

    pub async fn select_category(&mut self, category: Category) -> Result<(), SessionError> {
        if self.session.phase != Phase::CategorySelect {
            return Err(SessionError::InvalidPhase {
                action: "select_category",
            });
        }
        self.session.category = Some(category);
        self.session.phase = Phase::TrialActive;
        self.fetch_stimulus().await
    }

    /// Fetch or generate the stimulus for the current trial and start its
    /// clock. Retry-safe: a failure leaves the trial unstarted, and the
    /// caller may simply call this again.
    pub async fn fetch_stimulus(&mut self) -> Result<(), SessionError> {
        if self.session.phase != Phase::TrialActive {
            return Err(SessionError::InvalidPhase {
                action: "fetch_stimulus",
            });
        }

        match self.source.next(self.session.category).await? {
            Some(stimulus) => {
                self.observer.on_trial_started(
                    self.session.trial_index,
                    self.config.total_trials,
                    &stimulus,
                );
                self.session.stimulus = Some(stimulus);
                self.session.trial_started = Some(Instant::now());
                self.restart_ticker();
                Ok(())
            }
            None => {
                // Source exhausted: end the session early with what we have.
                tracing::info!(
                    attempts = self.session.attempts.len(),
                    "stimulus source exhausted, ending session early"
                );
                self.session.stimulus = None;
                self.session.trial_started = None;
                self.ticker = None;
                self.session.phase = Phase::Processing;
                Ok(())
            }
        }
    }

    /// Freeze a response for scoring: fixes the authoritative wall-clock
    /// response time and latches the trial against further submissions.
    pub fn prepare_submission(
        &mut self,
        response: Response,
    ) -> Result<PendingSubmission, SessionError> {
        if self.session.phase != Phase::TrialActive {
            return Err(SessionError::InvalidPhase { action: "submit" });
        }
        if self.session.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }
        let stimulus = self
            .session
            .stimulus
            .clone()
            .ok_or(SessionError::NoStimulus)?;
        let started = self.session.trial_started.ok_or(SessionError::NoStimulus)?;

        let response_time_secs = started.elapsed().as_secs_f64();
        let is_correct = stimulus.check(&response);
        self.session.in_flight = true;

        Ok(PendingSubmission {
            token: TrialToken {
                epoch: self.session.epoch,
                ordinal: self.session.trial_index,
            },
            stimulus,
            response,
            response_time_secs,
            is_correct,
        })
    }

    /// Apply a scoring result to the trial it was prepared for.
    ///
    /// If the session was reset or the trial advanced while the result was
    /// in flight, the result is discarded and the session state is left
    /// untouched.
    pub fn complete_submission(
        &mut self,
        pending: PendingSubmission,
        outcome: Option<ScoreOutcome>,
    ) -> Result<SubmitOutcome, SessionError> {
        if pending.token.epoch != self.session.epoch
            || pending.token.ordinal != self.session.trial_index
            || self.session.phase != Phase::TrialActive
        {
            tracing::debug!(?pending.token, "discarding stale submission result");
            return Err(SessionError::StaleTrial);
        }
        self.session.in_flight = false;

        let is_correct = outcome
            .as_ref()
            .and_then(|o| o.is_correct)
            .or(pending.is_correct);
        if let Some(outcome) = &outcome {
            self.votes.push(outcome.classification.clone());
        }

        self.stimulus_tries += 1;
        if self.stimulus_tries < self.config.retries_per_stimulus {
            // Same stimulus, fresh clock for the next try.
            self.last_try = Some(LastTry {
                response: pending.response,
                response_time_secs: pending.response_time_secs,
                is_correct,
            });
            self.session.trial_started = Some(Instant::now());
            self.restart_ticker();
            return Ok(SubmitOutcome::RetrySame {
                remaining: self.config.retries_per_stimulus - self.stimulus_tries,
            });
        }

        Ok(self.record_attempt(
            pending.stimulus,
            pending.response,
            pending.response_time_secs,
            is_correct,
        ))
    }

    /// Submit a response: score it if this test scores per trial, record
    /// the attempt, and advance. On a scoring failure the attempts
    /// collected so far remain intact and the submission may be retried.
    pub async fn submit(&mut self, response: Response) -> Result<SubmitOutcome, SessionError> {
        let pending = self.prepare_submission(response)?;

        let outcome = if self.config.scoring == ScoringMode::PerTrial {
            let attempt_number = (self.session.trial_index + self.stimulus_tries) as u32 + 1;
            match per_trial_request(
                &pending.stimulus,
                &pending.response,
                pending.response_time_secs,
                pending.is_correct,
                attempt_number,
            ) {
                Some(request) => match self.scorer.score(&request).await {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        self.session.in_flight = false;
                        return Err(e.into());
                    }
                },
                None => None,
            }
        } else {
            None
        };

        let result = self.complete_submission(pending, outcome)?;
        if let SubmitOutcome::NextTrial { .. } = result {
            self.fetch_stimulus().await?;
        }
        Ok(result)
    }

    /// Move on from a stimulus before its retries are exhausted, recording
    /// the attempt from the last scored try.
    pub async fn advance_trial(&mut self) -> Result<SubmitOutcome, SessionError> {
        if self.session.phase != Phase::TrialActive {
            return Err(SessionError::InvalidPhase {
                action: "advance_trial",
            });
        }
        let last = self.last_try.take().ok_or(SessionError::NoStimulus)?;
        let stimulus = self
            .session
            .stimulus
            .clone()
            .ok_or(SessionError::NoStimulus)?;

        let result = self.record_attempt(
            stimulus,
            last.response,
            last.response_time_secs,
            last.is_correct,
        );
        if let SubmitOutcome::NextTrial { .. } = result {
            self.fetch_stimulus().await?;
        }
        Ok(result)
    }

    fn record_attempt(
        &mut self,
        stimulus: Stimulus,
        response: Response,
        response_time_secs: f64,
        is_correct: Option<bool>,
    ) -> SubmitOutcome {
        let classification = match self.votes.len() {
            0 => None,
            1 => Some(self.votes[0].clone()),
            _ => weighted_vote(&self.votes),
        };

        let attempt = Attempt {
            ordinal: self.session.trial_index,
            round: self.session.trial_index / self.config.trials_per_round + 1,
            stimulus,
            response,
            is_correct,
            response_time_secs,
            classification,
        };
        self.observer.on_attempt_recorded(&attempt);
        self.session.attempts.push(attempt);

        self.votes.clear();
        self.stimulus_tries = 0;
        self.last_try = None;
        self.session.stimulus = None;
        self.session.trial_started = None;
        self.ticker = None;

        if self.session.attempts.len() >= self.config.total_trials {
            self.session.phase = Phase::Processing;
            SubmitOutcome::Processing
        } else {
            self.session.trial_index += 1;
            SubmitOutcome::NextTrial {
                ordinal: self.session.trial_index,
            }
        }
    }

    /// Run the cosmetic processing stages, score the batch if this test
    /// scores at the end, build the summary, and dispatch best-effort
    /// persistence.
    ///
    /// A scoring failure leaves the session in `Processing` with all
    /// attempts intact, so `finalize` may be retried.
    pub async fn finalize(&mut self) -> Result<Summary, SessionError> {
        if self.session.phase != Phase::Processing {
            return Err(SessionError::InvalidPhase { action: "finalize" });
        }

        for stage in &self.config.processing_stages {
            self.observer.on_processing_stage(stage);
            if !self.config.stage_interval.is_zero() {
                tokio::time::sleep(self.config.stage_interval).await;
            }
        }

        let batch = match batch_request(self.config.test, &self.session.attempts) {
            Some(request) => Some(self.scorer.score(&request).await?),
            None => None,
        };

        let summary = summarize(
            &self.session.attempts,
            &self.config.risk_policy,
            batch.as_ref(),
        );

        self.dispatch_persist(&summary);
        self.observer.on_summary_ready(&summary);
        self.session.summary = Some(summary.clone());
        self.session.phase = Phase::SummaryReady;
        Ok(summary)
    }

    /// Fire-and-forget persistence. Failure is logged and swallowed; the
    /// summary is revealed regardless.
    fn dispatch_persist(&self, summary: &Summary) {
        let Some(profiles) = self.profiles.clone() else {
            return;
        };
        let request = SaveResultRequest {
            child_name: self
                .child
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            test_name: self.config.test_label.clone(),
            result: serde_json::json!({
                "summary": summary,
                "attempts": self.session.attempts,
            }),
            date: Utc::now(),
        };
        tokio::spawn(async move {
            if let Err(e) = profiles.save_result(&request).await {
                tracing::warn!(error = %e, "failed to persist session result");
            }
        });
    }

    /// Discard everything and start over with a fresh stimulus. Any result
    /// still in flight for the old session can no longer be applied.
    pub async fn reset(&mut self) -> Result<(), SessionError> {
        self.session.epoch += 1;
        self.session.phase = Phase::TrialActive;
        self.session.trial_index = 0;
        self.session.attempts.clear();
        self.session.summary = None;
        self.session.stimulus = None;
        self.session.trial_started = None;
        self.session.in_flight = false;
        self.votes.clear();
        self.stimulus_tries = 0;
        self.last_try = None;
        self.ticker = None;
        self.fetch_stimulus().await
    }

    /// Snapshot the finished session for rendering and persistence.
    pub fn report(&self) -> Option<SessionReport> {
        let summary = self.session.summary.clone()?;
        Some(SessionReport {
            id: self.session.id,
            created_at: Utc::now(),
            test: self.config.test,
            test_label: self.config.test_label.clone(),
            child: self.child.clone(),
            summary,
            attempts: self.session.attempts.clone(),
        })
    }

    fn restart_ticker(&mut self) {
        self.ticker = if self.config.tick_period.is_zero() {
            None
        } else {
            Some(TrialTicker::start(self.config.tick_period))
        };
    }
}

/// Drive a whole session against a response-capture surface.
///
/// Checks capability availability up front: a test whose modality the
/// environment cannot capture fails before any trial begins.
pub async fn run_session<S, C>(
    controller: &mut SessionController<S>,
    capture: &mut C,
) -> Result<Summary, SessionError>
where
    S: StimulusSource,
    C: ResponseCapture,
{
    let modality = controller.config.test.modality();
    if !capture.supports(modality) {
        return Err(crate::error::CaptureError::Unsupported(modality).into());
    }

    controller.start().await?;

    if controller.phase() == Phase::Intro {
        capture.acknowledge(DISCLAIMER).await?;
        controller.acknowledge_intro().await?;
    }
    if controller.phase() == Phase::CategorySelect {
        let category = capture.select_category().await?;
        controller.select_category(category).await?;
    }

    while controller.phase() == Phase::TrialActive {
        let Some(stimulus) = controller.current_stimulus().cloned() else {
            controller.fetch_stimulus().await?;
            continue;
        };
        let response = capture.capture(&stimulus).await?;
        match controller.submit(response).await? {
            SubmitOutcome::RetrySame { .. } | SubmitOutcome::NextTrial { .. } => continue,
            SubmitOutcome::Processing => break,
        }
    }

    controller.finalize().await
}

/// Build the per-submission scorer payload, when this stimulus/response
/// pair has one.
fn per_trial_request(
    stimulus: &Stimulus,
    response: &Response,
    response_time_secs: f64,
    is_correct: Option<bool>,
    attempt_number: u32,
) -> Option<ScoreRequest> {
    match (stimulus, response) {
        (Stimulus::NumberComparison(pair), Response::Side(_)) => {
            Some(ScoreRequest::NumberComparison {
                left: pair.left,
                right: pair.right,
                response_time_secs,
                correct: is_correct.unwrap_or(false),
            })
        }
        (Stimulus::Spelling(prompt), Response::TypedWord(word)) => Some(ScoreRequest::Spelling {
            user_answer: word.clone(),
            audio_file: prompt.audio_file.clone(),
            attempt_number,
        }),
        (Stimulus::PhonoSpeech { question }, Response::Transcript(transcript)) => {
            Some(ScoreRequest::PhonoSpeech {
                question: question.clone(),
                response: transcript.clone(),
            })
        }
        (
            Stimulus::LetterTracing { letter },
            Response::Trace {
                snapshot,
                duration_secs,
                accuracy,
            },
        ) => Some(ScoreRequest::LetterTracing {
            letter: *letter,
            drawing: snapshot.clone(),
            duration_secs: *duration_secs,
            accuracy: *accuracy,
        }),
        (Stimulus::Handwriting { .. }, Response::Images(images)) => {
            Some(ScoreRequest::Handwriting {
                images: images.clone(),
            })
        }
        _ => None,
    }
}

/// Build the end-of-session scorer payload for batch-scored tests.
fn batch_request(test: TestKind, attempts: &[Attempt]) -> Option<ScoreRequest> {
    match test {
        TestKind::Arithmetic => Some(ScoreRequest::Arithmetic {
            attempts: attempts
                .iter()
                .filter_map(|a| match &a.stimulus {
                    Stimulus::Arithmetic(q) => Some(ArithmeticObservation {
                        op1: q.op1,
                        op2: q.op2,
                        operation: q.category.operator().to_string(),
                        user_choice: if a.is_correct == Some(true) { 0 } else { 1 },
                        response_time: a.response_time_secs,
                    }),
                    _ => None,
                })
                .collect(),
        }),
        TestKind::LetterConfusion => Some(ScoreRequest::LetterConfusion {
            answers: attempts
                .iter()
                .filter_map(|a| match &a.stimulus {
                    Stimulus::LetterConfusion(item) => Some(ConfusionObservation {
                        question_type: item.question_type.clone(),
                        shown_letters: item.options.clone(),
                        correct: if a.is_correct == Some(true) { 1 } else { 0 },
                        response_time_ms: (a.response_time_secs * 1000.0) as u64,
                    }),
                    _ => None,
                })
                .collect(),
        }),
        _ => None,
    }
}
