//! Stroke samples for the letter-tracing test.
//!
//! The tracing surface owns the accuracy metric; the scoring service only
//! echoes it back. Accuracy is the fraction of guide points covered by the
//! drawn stroke within a pixel tolerance.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default coverage tolerance, in canvas pixels.
pub const DEFAULT_TOLERANCE: f64 = 12.0;

/// A recorded trace: the drawn points, the letter guide they were traced
/// over, and how long the drawing took.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSample {
    /// Drawn stroke points as `[x, y]` canvas coordinates.
    pub points: Vec<[f64; 2]>,
    /// Guide points outlining the target letter.
    pub guide: Vec<[f64; 2]>,
    pub duration_secs: f64,
}

impl TraceSample {
    /// Load a sample from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trace sample: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse trace sample: {}", path.display()))
    }

    /// Coverage accuracy of the drawn points against the guide, using the
    /// default tolerance.
    pub fn accuracy(&self) -> f64 {
        coverage_accuracy(&self.points, &self.guide, DEFAULT_TOLERANCE)
    }

    /// The drawn points serialized for the scoring payload.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.points).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Fraction of guide points that have a drawn point within `tolerance`.
///
/// An empty guide is vacuously covered; an empty drawing covers nothing.
pub fn coverage_accuracy(drawn: &[[f64; 2]], guide: &[[f64; 2]], tolerance: f64) -> f64 {
    if guide.is_empty() {
        return 1.0;
    }
    if drawn.is_empty() {
        return 0.0;
    }

    let tolerance_sq = tolerance * tolerance;
    let covered = guide
        .iter()
        .filter(|g| {
            drawn.iter().any(|d| {
                let dx = d[0] - g[0];
                let dy = d[1] - g[1];
                dx * dx + dy * dy <= tolerance_sq
            })
        })
        .count();

    covered as f64 / guide.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retraced_guide_is_fully_covered() {
        let guide: Vec<[f64; 2]> = (0..20).map(|i| [i as f64 * 10.0, 50.0]).collect();
        let accuracy = coverage_accuracy(&guide, &guide, DEFAULT_TOLERANCE);
        assert_eq!(accuracy, 1.0);
    }

    #[test]
    fn empty_drawing_covers_nothing() {
        let guide = vec![[0.0, 0.0], [10.0, 10.0]];
        assert_eq!(coverage_accuracy(&[], &guide, DEFAULT_TOLERANCE), 0.0);
    }

    #[test]
    fn empty_guide_is_vacuously_covered() {
        assert_eq!(coverage_accuracy(&[[1.0, 1.0]], &[], DEFAULT_TOLERANCE), 1.0);
    }

    #[test]
    fn half_traced_guide_scores_half() {
        let guide = vec![[0.0, 0.0], [10.0, 0.0], [100.0, 100.0], [110.0, 100.0]];
        let drawn = vec![[1.0, 1.0], [9.0, 1.0]];
        let accuracy = coverage_accuracy(&drawn, &guide, 5.0);
        assert_eq!(accuracy, 0.5);
    }

    #[test]
    fn tolerance_bounds_coverage() {
        let guide = vec![[0.0, 0.0]];
        let drawn = vec![[0.0, 8.0]];
        assert_eq!(coverage_accuracy(&drawn, &guide, 5.0), 0.0);
        assert_eq!(coverage_accuracy(&drawn, &guide, 10.0), 1.0);
    }

    #[test]
    fn sample_load_and_snapshot_roundtrip() {
        let sample = TraceSample {
            points: vec![[1.0, 2.0], [3.0, 4.0]],
            guide: vec![[1.0, 2.0]],
            duration_secs: 3.5,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(&path, serde_json::to_string(&sample).unwrap()).unwrap();

        let loaded = TraceSample::load(&path).unwrap();
        assert_eq!(loaded.points.len(), 2);
        assert_eq!(loaded.accuracy(), 1.0);
        assert_eq!(loaded.snapshot(), "[[1.0,2.0],[3.0,4.0]]");
    }
}
