//! Scripted response capture for automation and tests.
//!
//! Actions are resolved against the live stimulus, so a script can say
//! "answer correctly" without knowing the procedurally generated question
//! in advance.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use earlyedge_core::error::CaptureError;
use earlyedge_core::model::{
    Category, ComparisonSide, ImageUpload, Modality, Response, Stimulus,
};
use earlyedge_core::traits::ResponseCapture;

use crate::strokes::TraceSample;

/// One scripted response. `Correct`/`Incorrect` are resolved against the
/// stimulus at capture time.
#[derive(Debug, Clone)]
pub enum ScriptedAction {
    Correct,
    Incorrect,
    Choice(f64),
    Side(ComparisonSide),
    Letter(String),
    Word(String),
    Transcript(String),
    Trace {
        snapshot: String,
        duration_secs: f64,
        accuracy: f64,
    },
    Images(Vec<PathBuf>),
}

impl ScriptedAction {
    fn resolve(&self, stimulus: &Stimulus) -> Result<Response, CaptureError> {
        match (self, stimulus) {
            (ScriptedAction::Correct, Stimulus::Arithmetic(q)) => Ok(Response::Choice(q.correct)),
            (ScriptedAction::Incorrect, Stimulus::Arithmetic(q)) => {
                Ok(Response::Choice(q.distractor))
            }
            (ScriptedAction::Correct, Stimulus::NumberComparison(p)) => {
                Ok(Response::Side(p.correct_side))
            }
            (ScriptedAction::Incorrect, Stimulus::NumberComparison(p)) => {
                Ok(Response::Side(match p.correct_side {
                    ComparisonSide::Left => ComparisonSide::Right,
                    ComparisonSide::Right => ComparisonSide::Left,
                }))
            }
            (ScriptedAction::Correct, Stimulus::LetterConfusion(item)) => {
                Ok(Response::Letter(item.answer.clone()))
            }
            (ScriptedAction::Incorrect, Stimulus::LetterConfusion(item)) => item
                .options
                .iter()
                .find(|o| **o != item.answer)
                .map(|o| Response::Letter(o.clone()))
                .ok_or_else(|| CaptureError::Invalid("no incorrect option available".into())),
            (ScriptedAction::Correct, Stimulus::Spelling(p)) => {
                Ok(Response::TypedWord(p.correct_word.clone()))
            }
            (ScriptedAction::Incorrect, Stimulus::Spelling(p)) => {
                Ok(Response::TypedWord(format!("{}x", p.correct_word)))
            }
            (ScriptedAction::Correct | ScriptedAction::Incorrect, other) => Err(
                CaptureError::Invalid(format!("cannot auto-answer stimulus: {}", other.prompt())),
            ),
            (ScriptedAction::Choice(v), _) => Ok(Response::Choice(*v)),
            (ScriptedAction::Side(side), _) => Ok(Response::Side(*side)),
            (ScriptedAction::Letter(l), _) => Ok(Response::Letter(l.clone())),
            (ScriptedAction::Word(w), _) => Ok(Response::TypedWord(w.clone())),
            (ScriptedAction::Transcript(t), _) => Ok(Response::Transcript(t.clone())),
            (
                ScriptedAction::Trace {
                    snapshot,
                    duration_secs,
                    accuracy,
                },
                _,
            ) => Ok(Response::Trace {
                snapshot: snapshot.clone(),
                duration_secs: *duration_secs,
                accuracy: *accuracy,
            }),
            (ScriptedAction::Images(paths), _) => {
                let images = paths
                    .iter()
                    .map(|path| {
                        let bytes = std::fs::read(path)
                            .map_err(|e| CaptureError::Io(format!("{}: {e}", path.display())))?;
                        Ok(ImageUpload {
                            filename: path
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_else(|| "upload.png".to_string()),
                            bytes,
                        })
                    })
                    .collect::<Result<Vec<_>, CaptureError>>()?;
                Ok(Response::Images(images))
            }
        }
    }
}

/// A capture surface that replays a fixed queue of actions. Supports every
/// modality; an exhausted queue aborts the session.
pub struct ScriptedCapture {
    actions: VecDeque<ScriptedAction>,
    category: Option<Category>,
    acknowledged: bool,
}

impl ScriptedCapture {
    pub fn new(actions: Vec<ScriptedAction>) -> Self {
        Self {
            actions: actions.into(),
            category: None,
            acknowledged: false,
        }
    }

    /// Repeat one action `n` times.
    pub fn repeating(action: ScriptedAction, n: usize) -> Self {
        Self::new(vec![action; n])
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Whether the disclaimer was acknowledged during the run.
    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Load a script from a TOML file.
    ///
    /// ```toml
    /// category = "addition"
    ///
    /// [[responses]]
    /// action = "correct"
    ///
    /// [[responses]]
    /// action = "word"
    /// value = "apple"
    /// ```
    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct ScriptFile {
            #[serde(default)]
            category: Option<String>,
            #[serde(default)]
            responses: Vec<ScriptEntry>,
        }

        #[derive(Deserialize)]
        struct ScriptEntry {
            action: String,
            #[serde(default)]
            value: Option<toml::Value>,
            #[serde(default)]
            snapshot: Option<String>,
            #[serde(default)]
            duration: Option<f64>,
            #[serde(default)]
            accuracy: Option<f64>,
            #[serde(default)]
            paths: Vec<PathBuf>,
        }

        let file: ScriptFile = toml::from_str(content).context("failed to parse script TOML")?;

        let category = file
            .category
            .as_deref()
            .map(|c| c.parse::<Category>().map_err(|e| anyhow::anyhow!(e)))
            .transpose()?;

        let string_value = |entry: &ScriptEntry, action: &str| -> Result<String> {
            entry
                .value
                .as_ref()
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("action '{action}' needs a string 'value'"))
        };

        let mut actions = Vec::new();
        for entry in &file.responses {
            let action = match entry.action.as_str() {
                "correct" => ScriptedAction::Correct,
                "incorrect" => ScriptedAction::Incorrect,
                "choice" => ScriptedAction::Choice(
                    entry
                        .value
                        .as_ref()
                        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                        .ok_or_else(|| anyhow::anyhow!("action 'choice' needs a numeric 'value'"))?,
                ),
                "side" => ScriptedAction::Side(
                    string_value(entry, "side")?
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!(e))?,
                ),
                "letter" => ScriptedAction::Letter(string_value(entry, "letter")?),
                "word" => ScriptedAction::Word(string_value(entry, "word")?),
                "transcript" => ScriptedAction::Transcript(string_value(entry, "transcript")?),
                "trace" => ScriptedAction::Trace {
                    snapshot: entry.snapshot.clone().unwrap_or_else(|| "[]".to_string()),
                    duration_secs: entry.duration.unwrap_or(0.0),
                    accuracy: entry.accuracy.unwrap_or(0.0),
                },
                "trace-file" => {
                    let sample = TraceSample::load(Path::new(&string_value(entry, "trace-file")?))?;
                    ScriptedAction::Trace {
                        snapshot: sample.snapshot(),
                        duration_secs: sample.duration_secs,
                        accuracy: sample.accuracy(),
                    }
                }
                "images" => ScriptedAction::Images(entry.paths.clone()),
                other => anyhow::bail!("unknown script action: {other}"),
            };
            actions.push(action);
        }

        let mut capture = Self::new(actions);
        capture.category = category;
        Ok(capture)
    }
}

#[async_trait]
impl ResponseCapture for ScriptedCapture {
    fn supports(&self, _modality: Modality) -> bool {
        true
    }

    async fn acknowledge(&mut self, _message: &str) -> Result<(), CaptureError> {
        self.acknowledged = true;
        Ok(())
    }

    async fn select_category(&mut self) -> Result<Category, CaptureError> {
        self.category
            .ok_or_else(|| CaptureError::Invalid("no category scripted".into()))
    }

    async fn capture(&mut self, stimulus: &Stimulus) -> Result<Response, CaptureError> {
        let action = self.actions.pop_front().ok_or(CaptureError::Aborted)?;
        action.resolve(stimulus)
    }
}
