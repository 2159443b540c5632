//! earlyedge-clients — HTTP clients for the external services.
//!
//! Implements the `RemoteScorer`, `ProfileStore`, and `StimulusSource`
//! traits against the scoring service's per-test routers and the
//! account/profile service.

pub mod arithmetic;
mod common;
pub mod config;
pub mod handwriting;
pub mod letter_confusion;
pub mod letter_trace;
pub mod mock;
pub mod numbersense;
pub mod phonospeech;
pub mod profile;
pub mod spelling;

pub use config::{create_scorer, load_config, EarlyEdgeConfig};
pub use profile::ProfileClient;
