//! Plain-text report generator.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use earlyedge_core::model::Response;
use earlyedge_core::report::SessionReport;

fn describe_response(response: &Response) -> String {
    match response {
        Response::Choice(v) => format!("chose {v}"),
        Response::Side(side) => format!("picked {side}"),
        Response::Letter(l) => format!("picked '{l}'"),
        Response::TypedWord(w) => format!("typed \"{w}\""),
        Response::Transcript(t) => format!("said \"{t}\""),
        Response::Trace {
            duration_secs,
            accuracy,
            ..
        } => format!("traced for {duration_secs:.1}s at {:.0}% accuracy", accuracy * 100.0),
        Response::Images(images) => format!("uploaded {} image(s)", images.len()),
    }
}

/// Render a finished session as a plain-text report.
pub fn generate_text(report: &SessionReport) -> String {
    let mut out = String::new();
    let title = format!("{} Report", report.test_label);

    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.len()));
    if let Some(child) = &report.child {
        let _ = writeln!(out, "Child Name: {}", child.name);
        if let Some(birthday) = &child.birthday {
            let _ = writeln!(out, "Child Birthday: {birthday}");
        }
    }
    let _ = writeln!(
        out,
        "Date: {}",
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out, "{}", "-".repeat(title.len()));

    for attempt in &report.attempts {
        let _ = writeln!(
            out,
            "{}. {} — {} ({:.2}s){}",
            attempt.ordinal + 1,
            attempt.stimulus.prompt(),
            describe_response(&attempt.response),
            attempt.response_time_secs,
            match attempt.is_correct {
                Some(true) => " [correct]",
                Some(false) => " [incorrect]",
                None => "",
            }
        );
        if let Some(classification) = &attempt.classification {
            let _ = writeln!(
                out,
                "   prediction: {} ({:.0}% confidence)",
                classification.label,
                classification.confidence * 100.0
            );
        }
    }

    let summary = &report.summary;
    let _ = writeln!(out, "{}", "-".repeat(title.len()));
    let _ = writeln!(
        out,
        "Total Correct: {} / {}",
        summary.total_correct, summary.total_attempts
    );
    let _ = writeln!(out, "Avg. Time: {:.2}s", summary.average_time_secs);
    if let Some(speed) = &summary.speed_category {
        let _ = writeln!(out, "Speed Category: {speed}");
    }
    let _ = writeln!(out, "Result: {}", summary.classification.label);
    let _ = writeln!(out, "Assessment Quality: {}", summary.assessment_quality);
    let _ = writeln!(
        out,
        "\nNote: this tool is not diagnostic and is no substitute for professional evaluation."
    );

    out
}

/// Write a plain-text report to a file.
pub fn write_text_report(report: &SessionReport, path: &Path) -> Result<()> {
    let text = generate_text(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use earlyedge_core::model::{Attempt, ChildProfile, Classification, Stimulus, TestKind};
    use earlyedge_core::statistics::Summary;
    use uuid::Uuid;

    fn make_report() -> SessionReport {
        SessionReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            test: TestKind::PhonoSpeech,
            test_label: TestKind::PhonoSpeech.profile_label().to_string(),
            child: Some(ChildProfile {
                id: None,
                name: "Alex".into(),
                birthday: Some("2018-03-04".into()),
            }),
            summary: Summary {
                total_attempts: 1,
                total_correct: 0,
                average_time_secs: 3.4,
                classification: Classification::new("Emerging", 0.57),
                speed_category: Some("Moderate".into()),
                risk_count: None,
                assessment_quality: "Insufficient attempts".into(),
            },
            attempts: vec![Attempt {
                ordinal: 0,
                round: 1,
                stimulus: Stimulus::PhonoSpeech {
                    question: "Say the word 'ship'".into(),
                },
                response: Response::Transcript("sip".into()),
                is_correct: None,
                response_time_secs: 3.4,
                classification: Some(Classification::new("Emerging", 0.57)),
            }],
        }
    }

    #[test]
    fn text_report_contains_child_and_breakdown() {
        let text = generate_text(&make_report());
        assert!(text.contains("PhonoSpeech Test - Dyslexia Report"));
        assert!(text.contains("Child Name: Alex"));
        assert!(text.contains("Say the word 'ship'"));
        assert!(text.contains("said \"sip\""));
        assert!(text.contains("Result: Emerging"));
        assert!(text.contains("not diagnostic"));
    }

    #[test]
    fn text_report_writes_to_file() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("session.txt");

        write_text_report(&report, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Total Correct: 0 / 1"));
    }
}
