//! Harness configuration and client factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use earlyedge_core::model::TestKind;
use earlyedge_core::traits::{ProfileStore, RemoteScorer};

use crate::arithmetic::ArithmeticClient;
use crate::handwriting::HandwritingClient;
use crate::letter_confusion::LetterConfusionClient;
use crate::letter_trace::LetterTraceClient;
use crate::numbersense::NumberSenseClient;
use crate::phonospeech::PhonoSpeechClient;
use crate::profile::ProfileClient;
use crate::spelling::SpellingClient;

/// Top-level earlyedge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyEdgeConfig {
    /// Base URL of the scoring service.
    #[serde(default = "default_scorer_url")]
    pub scorer_base_url: String,
    /// Base URL of the account/profile service.
    #[serde(default = "default_profile_url")]
    pub profile_base_url: String,
    /// Parent/account identifier attached to profile requests. Without it,
    /// sessions run without profile persistence.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Output directory for session reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory searched for question banks.
    #[serde(default)]
    pub bank_dir: Option<PathBuf>,
}

fn default_scorer_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_profile_url() -> String {
    "http://127.0.0.1:3000/api/auth/account".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./earlyedge-results")
}

impl Default for EarlyEdgeConfig {
    fn default() -> Self {
        Self {
            scorer_base_url: default_scorer_url(),
            profile_base_url: default_profile_url(),
            parent_id: None,
            timeout_secs: default_timeout(),
            output_dir: default_output_dir(),
            bank_dir: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `earlyedge.toml` in the current directory
/// 2. `~/.config/earlyedge/config.toml`
///
/// Environment variable overrides: `EARLYEDGE_SCORER_URL`,
/// `EARLYEDGE_PROFILE_URL`, `EARLYEDGE_PARENT_ID`.
pub fn load_config() -> Result<EarlyEdgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EarlyEdgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("earlyedge.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<EarlyEdgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EarlyEdgeConfig::default(),
    };

    // Apply env var overrides
    if let Ok(url) = std::env::var("EARLYEDGE_SCORER_URL") {
        config.scorer_base_url = url;
    }
    if let Ok(url) = std::env::var("EARLYEDGE_PROFILE_URL") {
        config.profile_base_url = url;
    }
    if let Ok(id) = std::env::var("EARLYEDGE_PARENT_ID") {
        config.parent_id = Some(id);
    }

    // Resolve env vars in the string-valued fields
    config.scorer_base_url = resolve_env_vars(&config.scorer_base_url);
    config.profile_base_url = resolve_env_vars(&config.profile_base_url);
    config.parent_id = config.parent_id.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("earlyedge"))
}

/// Create the scorer client for a test from the configuration.
pub fn create_scorer(test: TestKind, config: &EarlyEdgeConfig) -> Box<dyn RemoteScorer> {
    let url = &config.scorer_base_url;
    let timeout = config.timeout_secs;
    match test {
        TestKind::Arithmetic => Box::new(ArithmeticClient::with_timeout(url, timeout)),
        TestKind::NumberComparison => Box::new(NumberSenseClient::with_timeout(url, timeout)),
        TestKind::LetterConfusion => Box::new(LetterConfusionClient::with_timeout(url, timeout)),
        TestKind::LetterTracing => Box::new(LetterTraceClient::with_timeout(url, timeout)),
        TestKind::Spelling => Box::new(SpellingClient::with_timeout(url, timeout)),
        TestKind::PhonoSpeech => Box::new(PhonoSpeechClient::with_timeout(url, timeout)),
        TestKind::Handwriting => Box::new(HandwritingClient::with_timeout(url, timeout)),
    }
}

/// Create the profile store, if a parent account is configured.
pub fn create_profile_store(config: &EarlyEdgeConfig) -> Option<Box<dyn ProfileStore>> {
    config.parent_id.as_deref().map(|parent_id| {
        Box::new(ProfileClient::with_timeout(
            &config.profile_base_url,
            parent_id,
            config.timeout_secs,
        )) as Box<dyn ProfileStore>
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_EARLYEDGE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_EARLYEDGE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_EARLYEDGE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_EARLYEDGE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = EarlyEdgeConfig::default();
        assert_eq!(config.scorer_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.parent_id.is_none());
    }

    #[test]
    fn parse_config_toml() {
        let toml_str = r#"
scorer_base_url = "http://scoring.internal:8000"
profile_base_url = "http://accounts.internal/api/auth/account"
parent_id = "parent-42"
timeout_secs = 10
bank_dir = "./banks"
"#;
        let config: EarlyEdgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scorer_base_url, "http://scoring.internal:8000");
        assert_eq!(config.parent_id.as_deref(), Some("parent-42"));
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.bank_dir.as_deref(), Some(Path::new("./banks")));
    }

    #[test]
    fn load_explicit_missing_path_fails() {
        let result = load_config_from(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("earlyedge.toml");
        std::fs::write(&path, "timeout_secs = 5\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.timeout_secs, 5);
        // Unset fields keep their defaults.
        assert_eq!(config.scorer_base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn scorer_factory_covers_every_test() {
        let config = EarlyEdgeConfig::default();
        for test in [
            TestKind::Arithmetic,
            TestKind::NumberComparison,
            TestKind::LetterConfusion,
            TestKind::LetterTracing,
            TestKind::Spelling,
            TestKind::PhonoSpeech,
            TestKind::Handwriting,
        ] {
            let scorer = create_scorer(test, &config);
            assert!(!scorer.name().is_empty());
        }
    }

    #[test]
    fn profile_store_requires_parent_id() {
        let config = EarlyEdgeConfig::default();
        assert!(create_profile_store(&config).is_none());

        let config = EarlyEdgeConfig {
            parent_id: Some("parent-42".into()),
            ..config
        };
        assert!(create_profile_store(&config).is_some());
    }
}
