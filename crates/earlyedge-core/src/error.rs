//! Error taxonomy for the screening harness.
//!
//! Defined in `earlyedge-core` so the session controller can classify
//! failures (transient vs. terminal, capability vs. network) without string
//! matching on client-crate errors.

use thiserror::Error;

use crate::model::Modality;

/// Errors from the external scoring and profile services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The service returned an error response.
    #[error("service error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered with a body the client could not interpret.
    #[error("malformed service response: {0}")]
    InvalidResponse(String),

    /// The payload variant does not belong to this scorer.
    #[error("payload not supported by this scorer, expected {0}")]
    UnsupportedPayload(&'static str),
}

impl ServiceError {
    /// Returns `true` if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Network(_) | ServiceError::Timeout(_) => true,
            ServiceError::Api { status, .. } => *status >= 500,
            ServiceError::InvalidResponse(_) | ServiceError::UnsupportedPayload(_) => false,
        }
    }
}

/// Errors while producing the next stimulus.
#[derive(Debug, Error)]
pub enum StimulusError {
    #[error("failed to fetch stimulus: {0}")]
    Service(#[from] ServiceError),

    #[error("malformed stimulus: {0}")]
    Malformed(String),
}

/// Errors while capturing a response from the environment.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The environment cannot provide this input modality at all. Surfaced
    /// before any trial begins.
    #[error("{0} capture is not supported in this environment")]
    Unsupported(Modality),

    #[error("capture aborted")]
    Aborted,

    #[error("invalid response: {0}")]
    Invalid(String),

    #[error("i/o error during capture: {0}")]
    Io(String),
}

/// Errors from the session controller itself.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("action '{action}' is not allowed in the current phase")]
    InvalidPhase { action: &'static str },

    #[error("a submission is already in flight for this trial")]
    SubmissionInFlight,

    #[error("stale trial: the session was reset or advanced before this result arrived")]
    StaleTrial,

    #[error("no active stimulus")]
    NoStimulus,

    #[error(transparent)]
    Stimulus(#[from] StimulusError),

    #[error("scoring failed: {0}")]
    Scorer(#[from] ServiceError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}
