//! The `earlyedge run` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use earlyedge_capture::{ScriptedCapture, TerminalCapture};
use earlyedge_clients::config::{create_profile_store, create_scorer, load_config_from};
use earlyedge_clients::numbersense::NumberSenseClient;
use earlyedge_clients::phonospeech::PhonoSpeechClient;
use earlyedge_clients::spelling::SpellingClient;
use earlyedge_clients::EarlyEdgeConfig;
use earlyedge_core::error::CaptureError;
use earlyedge_core::model::{Attempt, Category, Modality, Response, Stimulus, TestKind};
use earlyedge_core::parser;
use earlyedge_core::report::SessionReport;
use earlyedge_core::session::{run_session, SessionConfig, SessionController, SessionObserver};
use earlyedge_core::statistics::Summary;
use earlyedge_core::stimulus::{ProceduralArithmetic, StaticBank};
use earlyedge_core::traits::{ResponseCapture, StimulusSource};
use earlyedge_report::{write_html_report, write_text_report};

/// Console progress observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_trial_started(&self, ordinal: usize, total: usize, stimulus: &Stimulus) {
        eprintln!("  Trial {}/{}: {}", ordinal + 1, total, stimulus.prompt());
    }

    fn on_attempt_recorded(&self, attempt: &Attempt) {
        let verdict = match attempt.is_correct {
            Some(true) => " correct",
            Some(false) => " incorrect",
            None => "",
        };
        eprintln!(
            "  Recorded attempt {}{} ({:.2}s)",
            attempt.ordinal + 1,
            verdict,
            attempt.response_time_secs
        );
    }

    fn on_processing_stage(&self, stage: &str) {
        eprintln!("  {stage}");
    }

    fn on_summary_ready(&self, summary: &Summary) {
        eprintln!(
            "\nDone: {}/{} correct, {}",
            summary.total_correct, summary.total_attempts, summary.classification.label
        );
    }
}

/// Wraps a capture surface with a pre-selected arithmetic category.
struct WithCategory<C> {
    inner: C,
    category: Category,
}

#[async_trait]
impl<C: ResponseCapture> ResponseCapture for WithCategory<C> {
    fn supports(&self, modality: Modality) -> bool {
        self.inner.supports(modality)
    }

    async fn acknowledge(&mut self, message: &str) -> Result<(), CaptureError> {
        self.inner.acknowledge(message).await
    }

    async fn select_category(&mut self) -> Result<Category, CaptureError> {
        Ok(self.category)
    }

    async fn capture(&mut self, stimulus: &Stimulus) -> Result<Response, CaptureError> {
        self.inner.capture(stimulus).await
    }
}

pub async fn execute(
    test_str: String,
    category_str: Option<String>,
    bank: Option<PathBuf>,
    script: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let test: TestKind = test_str
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;
    let category: Option<Category> = category_str
        .as_deref()
        .map(|c| c.parse().map_err(|e: String| anyhow::anyhow!("{e}")))
        .transpose()?;

    let config = load_config_from(config_path.as_deref())?;
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());

    let scorer = Arc::from(create_scorer(test, &config));
    let source = build_source(test, &config, bank.as_deref()).await?;

    let mut controller = SessionController::new(SessionConfig::for_test(test), source, scorer)
        .with_observer(Arc::new(ConsoleObserver));
    if let Some(profiles) = create_profile_store(&config) {
        controller = controller.with_profiles(Arc::from(profiles));
    }

    eprintln!(
        "earlyedge v{} — {} ({} trials)",
        env!("CARGO_PKG_VERSION"),
        test,
        controller.config().total_trials
    );

    match (script, category) {
        (Some(script), category) => {
            let mut capture = ScriptedCapture::from_toml_path(&script)?;
            if let Some(category) = category {
                capture = capture.with_category(category);
            }
            run_session(&mut controller, &mut capture).await?;
        }
        (None, Some(category)) => {
            let mut capture = WithCategory {
                inner: TerminalCapture::new(),
                category,
            };
            run_session(&mut controller, &mut capture).await?;
        }
        (None, None) => {
            let mut capture = TerminalCapture::new();
            run_session(&mut controller, &mut capture).await?;
        }
    }

    let report = controller
        .report()
        .context("session finished without a report")?;
    print_breakdown(&report);
    write_outputs(&report, &output_dir, &format)?;

    Ok(())
}

/// Pick the stimulus source for a test: procedural, static bank, or the
/// scoring service's sibling endpoints.
async fn build_source(
    test: TestKind,
    config: &EarlyEdgeConfig,
    bank_path: Option<&Path>,
) -> Result<Box<dyn StimulusSource>> {
    let load_bank = |expected: TestKind| -> Result<StaticBank> {
        let bank = match bank_path {
            Some(path) => parser::parse_bank(path)?,
            None => {
                let dir = config.bank_dir.as_deref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "--bank is required for {expected} (or set bank_dir in the config)"
                    )
                })?;
                parser::load_bank_directory(dir)?
                    .into_iter()
                    .find(|b| b.test == expected)
                    .ok_or_else(|| {
                        anyhow::anyhow!("no {expected} bank found in {}", dir.display())
                    })?
            }
        };
        anyhow::ensure!(
            bank.test == test,
            "bank '{}' is for test '{}', not '{}'",
            bank.id,
            bank.test,
            test
        );
        Ok(StaticBank::new(bank.stimuli))
    };

    Ok(match test {
        TestKind::Arithmetic => Box::new(ProceduralArithmetic::new()),
        TestKind::NumberComparison => Box::new(NumberSenseClient::with_timeout(
            &config.scorer_base_url,
            config.timeout_secs,
        )),
        TestKind::Spelling => Box::new(SpellingClient::with_timeout(
            &config.scorer_base_url,
            config.timeout_secs,
        )),
        TestKind::PhonoSpeech => {
            if bank_path.is_some() {
                Box::new(load_bank(TestKind::PhonoSpeech)?)
            } else {
                let client = PhonoSpeechClient::with_timeout(
                    &config.scorer_base_url,
                    config.timeout_secs,
                );
                Box::new(
                    client
                        .fetch_question_bank()
                        .await
                        .context("failed to fetch the question list")?,
                )
            }
        }
        TestKind::LetterConfusion => Box::new(load_bank(TestKind::LetterConfusion)?),
        TestKind::LetterTracing => {
            if bank_path.is_some() || config.bank_dir.is_some() {
                match load_bank(TestKind::LetterTracing) {
                    Ok(bank) => Box::new(bank),
                    Err(_) if bank_path.is_none() => Box::new(StaticBank::letter_tracing()),
                    Err(e) => return Err(e),
                }
            } else {
                Box::new(StaticBank::letter_tracing())
            }
        }
        TestKind::Handwriting => Box::new(StaticBank::new(vec![Stimulus::Handwriting {
            slots: 3,
        }])),
    })
}

fn print_breakdown(report: &SessionReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "#",
        "Stimulus",
        "Correct",
        "Time (s)",
        "Prediction",
    ]);

    for attempt in &report.attempts {
        let correct = match attempt.is_correct {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        let prediction = attempt
            .classification
            .as_ref()
            .map(|c| format!("{} ({:.0}%)", c.label, c.confidence * 100.0))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(attempt.ordinal + 1),
            Cell::new(attempt.stimulus.prompt()),
            Cell::new(correct),
            Cell::new(format!("{:.2}", attempt.response_time_secs)),
            Cell::new(prediction),
        ]);
    }

    println!("\n{table}");

    let summary = &report.summary;
    println!(
        "Total Correct: {} / {}",
        summary.total_correct, summary.total_attempts
    );
    println!("Avg. Time: {:.2}s", summary.average_time_secs);
    if let Some(speed) = &summary.speed_category {
        println!("Speed Category: {speed}");
    }
    println!("Risk Level: {}", summary.classification.label);
}

fn write_outputs(report: &SessionReport, output_dir: &Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["text", "html", "json"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output_dir.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "text" => {
                let path = output_dir.join(format!("report-{timestamp}.txt"));
                write_text_report(report, &path)?;
                eprintln!("Text report: {}", path.display());
            }
            "html" => {
                let path = output_dir.join(format!("report-{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}
