//! TOML question bank parser.
//!
//! Loads static stimulus banks from TOML files and directories, and
//! validates them. Only the bank-driven tests (letter confusion, letter
//! tracing, phonological speech) accept banks; the remaining tests generate
//! or fetch their stimuli.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{LetterItem, Stimulus, TestKind};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<TomlBankItem>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    test: String,
    /// Letter sequence for tracing banks.
    #[serde(default)]
    letters: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlBankItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    question_type: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    answer: Option<String>,
    /// Phonological banks carry a plain question per item.
    #[serde(default)]
    question: Option<String>,
}

/// A parsed, ordered stimulus bank.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub test: TestKind,
    pub stimuli: Vec<Stimulus>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;
    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let test: TestKind = parsed
        .bank
        .test
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let stimuli = match test {
        TestKind::LetterConfusion => parsed
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let answer = item
                    .answer
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("item {i}: missing 'answer'"))?;
                Ok(Stimulus::LetterConfusion(LetterItem {
                    id: item.id.clone().unwrap_or_else(|| format!("item-{i}")),
                    question_type: item
                        .question_type
                        .clone()
                        .unwrap_or_else(|| "matching".to_string()),
                    prompt: item.prompt.clone().unwrap_or_default(),
                    options: item.options.clone(),
                    answer,
                }))
            })
            .collect::<Result<Vec<_>>>()?,
        TestKind::LetterTracing => {
            let letters = parsed
                .bank
                .letters
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("letter-tracing bank needs a 'letters' field"))?;
            letters
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|letter| Ok(Stimulus::LetterTracing { letter }))
                .collect::<Result<Vec<_>>>()?
        }
        TestKind::PhonoSpeech => parsed
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let question = item
                    .question
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("item {i}: missing 'question'"))?;
                Ok(Stimulus::PhonoSpeech { question })
            })
            .collect::<Result<Vec<_>>>()?,
        other => anyhow::bail!("test '{other}' does not take a question bank"),
    };

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        test,
        stimuli,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.stimuli.is_empty() {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "bank has no items".into(),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for stimulus in &bank.stimuli {
        match stimulus {
            Stimulus::LetterConfusion(item) => {
                if !seen_ids.insert(item.id.clone()) {
                    warnings.push(ValidationWarning {
                        item_id: Some(item.id.clone()),
                        message: format!("duplicate item ID: {}", item.id),
                    });
                }
                if item.options.is_empty() {
                    warnings.push(ValidationWarning {
                        item_id: Some(item.id.clone()),
                        message: "item has no options".into(),
                    });
                } else if !item.options.contains(&item.answer) {
                    warnings.push(ValidationWarning {
                        item_id: Some(item.id.clone()),
                        message: format!("answer '{}' is not among the options", item.answer),
                    });
                }
                if item.prompt.trim().is_empty() {
                    warnings.push(ValidationWarning {
                        item_id: Some(item.id.clone()),
                        message: "prompt is empty".into(),
                    });
                }
            }
            Stimulus::PhonoSpeech { question } => {
                if question.trim().is_empty() {
                    warnings.push(ValidationWarning {
                        item_id: None,
                        message: "question is empty".into(),
                    });
                }
                if !seen_ids.insert(question.clone()) {
                    warnings.push(ValidationWarning {
                        item_id: None,
                        message: format!("duplicate question: {question}"),
                    });
                }
            }
            _ => {}
        }
    }

    warnings
}
