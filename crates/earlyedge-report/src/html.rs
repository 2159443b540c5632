//! Printable HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::Result;
use std::path::Path;

use earlyedge_core::model::Response;
use earlyedge_core::report::SessionReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn response_cell(response: &Response) -> String {
    match response {
        Response::Choice(v) => v.to_string(),
        Response::Side(side) => side.to_string(),
        Response::Letter(l) => html_escape(l),
        Response::TypedWord(w) => html_escape(w),
        Response::Transcript(t) => html_escape(t),
        Response::Trace { accuracy, .. } => format!("trace ({:.0}% accuracy)", accuracy * 100.0),
        Response::Images(images) => format!("{} image(s)", images.len()),
    }
}

/// Generate a printable HTML report from a finished session.
pub fn generate_html(report: &SessionReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>{}</title>\n",
        html_escape(&report.test_label)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.test_label)));

    // Child information
    html.push_str("<section class=\"report-section\">\n<h2>Child Information</h2>\n");
    match &report.child {
        Some(child) => {
            html.push_str(&format!(
                "<p><strong>Name:</strong> {}</p>\n",
                html_escape(&child.name)
            ));
            if let Some(birthday) = &child.birthday {
                html.push_str(&format!(
                    "<p><strong>Birthday:</strong> {}</p>\n",
                    html_escape(birthday)
                ));
            }
        }
        None => html.push_str("<p>No profile attached.</p>\n"),
    }
    html.push_str(&format!(
        "<p><strong>Date:</strong> {}</p>\n",
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    html.push_str("</section>\n");

    // Attempt breakdown
    html.push_str("<section class=\"report-section\">\n<h2>Attempts</h2>\n");
    html.push_str("<table>\n");
    html.push_str("<thead><tr><th>#</th><th>Stimulus</th><th>Response</th><th>Correct</th><th>Time (s)</th><th>Prediction</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for attempt in &report.attempts {
        let (row_class, correct_text) = match attempt.is_correct {
            Some(true) => ("pass", "yes"),
            Some(false) => ("fail", "no"),
            None => ("", "-"),
        };
        let prediction = attempt
            .classification
            .as_ref()
            .map(|c| format!("{} ({:.0}%)", html_escape(&c.label), c.confidence * 100.0))
            .unwrap_or_else(|| "-".to_string());
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td></tr>\n",
            row_class,
            attempt.ordinal + 1,
            html_escape(&attempt.stimulus.prompt()),
            response_cell(&attempt.response),
            correct_text,
            attempt.response_time_secs,
            prediction,
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Summary
    let summary = &report.summary;
    html.push_str("<section class=\"report-section\">\n<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p><strong>Total Correct:</strong> {} / {}</p>\n",
        summary.total_correct, summary.total_attempts
    ));
    html.push_str(&format!(
        "<p><strong>Average Time:</strong> {:.2}s</p>\n",
        summary.average_time_secs
    ));
    if let Some(speed) = &summary.speed_category {
        html.push_str(&format!(
            "<p><strong>Speed Category:</strong> {}</p>\n",
            html_escape(speed)
        ));
    }
    html.push_str(&format!(
        "<p><strong>Result:</strong> {} ({:.0}% confidence)</p>\n",
        html_escape(&summary.classification.label),
        summary.classification.confidence * 100.0
    ));
    html.push_str(&format!(
        "<p><strong>Assessment Quality:</strong> {}</p>\n",
        html_escape(&summary.assessment_quality)
    ));
    html.push_str("</section>\n");

    html.push_str("<p class=\"disclaimer\">This tool analyzes responses for potential early indicators. It is not a diagnostic tool and should not replace professional evaluation.</p>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write a printable HTML report to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; color: #1a1a1a; }
h1 { text-align: center; }
.report-section { margin-bottom: 20px; }
.report-section h2 { border-bottom: 1px solid #ccc; padding-bottom: 5px; }
.report-section p { margin: 5px 0; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid #e5e7eb; padding: 0.4rem 0.8rem; text-align: left; }
.pass { background: #dcfce7; }
.fail { background: #fde2e2; }
.disclaimer { font-size: 0.85rem; font-style: italic; color: #b91c1c; }
"#;
