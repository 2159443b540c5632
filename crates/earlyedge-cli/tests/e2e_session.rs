//! End-to-end session runs against a mocked scoring service.
//!
//! These drive the real binary with scripted responses and verify the full
//! pipeline: stimulus fetch → submit → score → summary → report files.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn earlyedge() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("earlyedge").unwrap()
}

fn write_config(dir: &TempDir, scorer_url: &str) -> std::path::PathBuf {
    let config_path = dir.path().join("earlyedge.toml");
    std::fs::write(
        &config_path,
        format!("scorer_base_url = \"{scorer_url}\"\ntimeout_secs = 10\n"),
    )
    .unwrap();
    config_path
}

#[tokio::test(flavor = "multi_thread")]
async fn spelling_session_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spelling_test/get-audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio_file": "audio/correct/apple.wav",
            "correct_word": "apple"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/spelling_test/validate-answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_correct": true,
            "user_answer": "apple",
            "correct_word": "apple",
            "dyslexia_score": 0.1,
            "risk": "Low"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &server.uri());

    let script_path = dir.path().join("script.toml");
    let mut script = String::new();
    for _ in 0..5 {
        script.push_str("[[responses]]\naction = \"correct\"\n\n");
    }
    std::fs::write(&script_path, script).unwrap();

    let output_dir = dir.path().join("out");

    earlyedge()
        .arg("run")
        .arg("--test")
        .arg("spelling")
        .arg("--script")
        .arg(&script_path)
        .arg("--config")
        .arg(&config_path)
        .arg("--output")
        .arg(&output_dir)
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Correct: 5 / 5"))
        .stdout(predicate::str::contains("Risk Level: Minimal indicators"));

    let extensions: Vec<String> = std::fs::read_dir(&output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            e.path()
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
        })
        .collect();
    assert!(extensions.contains(&"json".to_string()));
    assert!(extensions.contains(&"txt".to_string()));
    assert!(extensions.contains(&"html".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn arithmetic_session_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/arithmetic_test/api/arithmetic/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total_correct": 15,
            "average_time": 0.01,
            "overall_risk": "No risk",
            "speed_category": "Fast",
            "risk_count": 0,
            "total_attempts": 15,
            "assessment_quality": "Ideal (optimal for ML pattern detection)"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &server.uri());

    let script_path = dir.path().join("script.toml");
    let mut script = String::from("category = \"addition\"\n\n");
    for _ in 0..15 {
        script.push_str("[[responses]]\naction = \"correct\"\n\n");
    }
    std::fs::write(&script_path, script).unwrap();

    let output_dir = dir.path().join("out");

    earlyedge()
        .arg("run")
        .arg("--test")
        .arg("arithmetic")
        .arg("--script")
        .arg(&script_path)
        .arg("--config")
        .arg(&config_path)
        .arg("--output")
        .arg(&output_dir)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Correct: 15 / 15"))
        .stdout(predicate::str::contains("Risk Level: No risk"));
}

#[tokio::test(flavor = "multi_thread")]
async fn scorer_failure_is_reported_without_losing_the_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spelling_test/get-audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio_file": "audio/correct/apple.wav",
            "correct_word": "apple"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/spelling_test/validate-answer"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &server.uri());

    let script_path = dir.path().join("script.toml");
    std::fs::write(&script_path, "[[responses]]\naction = \"correct\"\n").unwrap();

    earlyedge()
        .arg("run")
        .arg("--test")
        .arg("spelling")
        .arg("--script")
        .arg(&script_path)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("scoring failed"));
}
