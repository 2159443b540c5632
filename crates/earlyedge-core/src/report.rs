//! Finished-session report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Attempt, ChildProfile, TestKind};
use crate::statistics::Summary;

/// A complete record of one finished screening session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Which test was run.
    pub test: TestKind,
    /// Free-text test label, as persisted to the profile.
    pub test_label: String,
    /// The child the session was run for, when known.
    #[serde(default)]
    pub child: Option<ChildProfile>,
    /// The session-terminal aggregate.
    pub summary: Summary,
    /// Per-attempt breakdown, in trial completion order.
    pub attempts: Vec<Attempt>,
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, Response, Stimulus};

    fn make_report() -> SessionReport {
        SessionReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            test: TestKind::Spelling,
            test_label: TestKind::Spelling.profile_label().to_string(),
            child: Some(ChildProfile {
                id: None,
                name: "Alex".into(),
                birthday: Some("2018-03-04".into()),
            }),
            summary: Summary {
                total_attempts: 1,
                total_correct: 1,
                average_time_secs: 2.5,
                classification: Classification::new("Minimal indicators", 0.15),
                speed_category: Some("Moderate".into()),
                risk_count: None,
                assessment_quality: "Insufficient attempts".into(),
            },
            attempts: vec![Attempt {
                ordinal: 0,
                round: 1,
                stimulus: Stimulus::PhonoSpeech {
                    question: "Say 'cat'".into(),
                },
                response: Response::Transcript("cat".into()),
                is_correct: None,
                response_time_secs: 2.5,
                classification: Some(Classification::new("Minimal", 0.15)),
            }],
        }
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("session.json");

        report.save_json(&path).unwrap();
        let loaded = SessionReport::load_json(&path).unwrap();

        assert_eq!(loaded.test, TestKind::Spelling);
        assert_eq!(loaded.attempts.len(), 1);
        assert_eq!(loaded.summary.total_correct, 1);
        assert_eq!(loaded.child.unwrap().name, "Alex");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SessionReport::load_json(&dir.path().join("absent.json"));
        assert!(result.is_err());
    }
}
