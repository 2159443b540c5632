//! Core data model types for earlyedge.
//!
//! These are the fundamental types that the entire earlyedge system uses
//! to represent screening tests, stimuli, responses, and recorded attempts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The screening tests the harness knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    Arithmetic,
    NumberComparison,
    LetterConfusion,
    LetterTracing,
    Spelling,
    PhonoSpeech,
    Handwriting,
}

impl TestKind {
    /// The input modality a session of this test needs from its environment.
    pub fn modality(&self) -> Modality {
        match self {
            TestKind::Arithmetic | TestKind::NumberComparison | TestKind::LetterConfusion => {
                Modality::Choice
            }
            TestKind::LetterTracing => Modality::Drawing,
            TestKind::Spelling => Modality::Text,
            TestKind::PhonoSpeech => Modality::Speech,
            TestKind::Handwriting => Modality::ImageUpload,
        }
    }

    /// Free-text label stored against the child profile, matching the
    /// wording the profile service expects.
    pub fn profile_label(&self) -> &'static str {
        match self {
            TestKind::Arithmetic => "Arithmetic Test - Dyscalculia",
            TestKind::NumberComparison => "Number Understanding Test - Dyscalculia",
            TestKind::LetterConfusion => "Letter Confusion Test - Dyslexia",
            TestKind::LetterTracing => "Letter Tracing Test - Dysgraphia",
            TestKind::Spelling => "Spelling Test - Dyslexia",
            TestKind::PhonoSpeech => "PhonoSpeech Test - Dyslexia",
            TestKind::Handwriting => "Handwriting Test - Dysgraphia",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Arithmetic => write!(f, "arithmetic"),
            TestKind::NumberComparison => write!(f, "number-comparison"),
            TestKind::LetterConfusion => write!(f, "letter-confusion"),
            TestKind::LetterTracing => write!(f, "letter-tracing"),
            TestKind::Spelling => write!(f, "spelling"),
            TestKind::PhonoSpeech => write!(f, "phono-speech"),
            TestKind::Handwriting => write!(f, "handwriting"),
        }
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arithmetic" => Ok(TestKind::Arithmetic),
            "number-comparison" | "numbercomparison" | "number-understanding" => {
                Ok(TestKind::NumberComparison)
            }
            "letter-confusion" | "letterconfusion" => Ok(TestKind::LetterConfusion),
            "letter-tracing" | "lettertracing" => Ok(TestKind::LetterTracing),
            "spelling" => Ok(TestKind::Spelling),
            "phono-speech" | "phonospeech" => Ok(TestKind::PhonoSpeech),
            "handwriting" | "handwritten" => Ok(TestKind::Handwriting),
            other => Err(format!("unknown test: {other}")),
        }
    }
}

/// How a stimulus is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Choice,
    Text,
    Drawing,
    Speech,
    ImageUpload,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Choice => write!(f, "choice"),
            Modality::Text => write!(f, "text"),
            Modality::Drawing => write!(f, "drawing"),
            Modality::Speech => write!(f, "speech"),
            Modality::ImageUpload => write!(f, "image upload"),
        }
    }
}

/// Arithmetic operation category, selected before the arithmetic test starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Category {
    /// Operator symbol as sent to the scoring service.
    pub fn operator(&self) -> &'static str {
        match self {
            Category::Addition => "+",
            Category::Subtraction => "-",
            Category::Multiplication => "*",
            Category::Division => "/",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Addition => write!(f, "addition"),
            Category::Subtraction => write!(f, "subtraction"),
            Category::Multiplication => write!(f, "multiplication"),
            Category::Division => write!(f, "division"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "addition" | "+" => Ok(Category::Addition),
            "subtraction" | "-" => Ok(Category::Subtraction),
            "multiplication" | "*" => Ok(Category::Multiplication),
            "division" | "/" => Ok(Category::Division),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Which side of a number pair the child picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonSide {
    Left,
    Right,
}

impl fmt::Display for ComparisonSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonSide::Left => write!(f, "left"),
            ComparisonSide::Right => write!(f, "right"),
        }
    }
}

impl FromStr for ComparisonSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(ComparisonSide::Left),
            "right" => Ok(ComparisonSide::Right),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// A procedurally generated two-operand arithmetic question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithmeticQuestion {
    pub op1: i32,
    pub op2: i32,
    pub category: Category,
    /// The canonical correct answer (division rounded to 2 decimals).
    pub correct: f64,
    /// Distractor answer; always a small nonzero offset from `correct`.
    pub distractor: f64,
}

/// A "which number is larger/smaller" comparison item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberPair {
    pub question_type: String,
    pub left: f64,
    pub right: f64,
    pub correct_side: ComparisonSide,
}

/// A letter-confusion item loaded from a question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterItem {
    pub id: String,
    /// Wire token for the task family (e.g. "matching", "same_different").
    pub question_type: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// A dictated word the child must spell, served by the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellingPrompt {
    pub audio_file: String,
    pub correct_word: String,
}

/// An uploaded handwriting sample. Raw bytes are never serialized into
/// reports; only the filename is echoed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUpload {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// The material presented for one trial. Immutable while the trial runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Stimulus {
    Arithmetic(ArithmeticQuestion),
    NumberComparison(NumberPair),
    LetterConfusion(LetterItem),
    LetterTracing { letter: char },
    Spelling(SpellingPrompt),
    PhonoSpeech { question: String },
    Handwriting { slots: usize },
}

impl Stimulus {
    pub fn kind(&self) -> TestKind {
        match self {
            Stimulus::Arithmetic(_) => TestKind::Arithmetic,
            Stimulus::NumberComparison(_) => TestKind::NumberComparison,
            Stimulus::LetterConfusion(_) => TestKind::LetterConfusion,
            Stimulus::LetterTracing { .. } => TestKind::LetterTracing,
            Stimulus::Spelling(_) => TestKind::Spelling,
            Stimulus::PhonoSpeech { .. } => TestKind::PhonoSpeech,
            Stimulus::Handwriting { .. } => TestKind::Handwriting,
        }
    }

    /// Human-readable prompt line for display surfaces.
    pub fn prompt(&self) -> String {
        match self {
            Stimulus::Arithmetic(q) => {
                format!("{} {} {}", q.op1, q.category.operator(), q.op2)
            }
            Stimulus::NumberComparison(p) => {
                format!("{}: {} vs {}", p.question_type, p.left, p.right)
            }
            Stimulus::LetterConfusion(item) => {
                format!("{} [{}]", item.prompt, item.options.join(", "))
            }
            Stimulus::LetterTracing { letter } => format!("Trace the letter '{letter}'"),
            Stimulus::Spelling(p) => format!("Spell the word you hear ({})", p.audio_file),
            Stimulus::PhonoSpeech { question } => question.clone(),
            Stimulus::Handwriting { slots } => {
                format!("Upload up to {slots} handwriting samples")
            }
        }
    }

    /// Locally derivable correctness of a response against this stimulus.
    ///
    /// Returns `None` for tests where correctness is only known to the
    /// scoring service (tracing, speech, handwriting).
    pub fn check(&self, response: &Response) -> Option<bool> {
        match (self, response) {
            (Stimulus::Arithmetic(q), Response::Choice(v)) => {
                Some((v - q.correct).abs() < 1e-9)
            }
            (Stimulus::NumberComparison(p), Response::Side(side)) => {
                Some(*side == p.correct_side)
            }
            (Stimulus::LetterConfusion(item), Response::Letter(l)) => Some(*l == item.answer),
            (Stimulus::Spelling(p), Response::TypedWord(w)) => Some(
                w.trim()
                    .eq_ignore_ascii_case(p.correct_word.trim()),
            ),
            _ => None,
        }
    }
}

/// What the child did during one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Response {
    /// A numeric answer button.
    Choice(f64),
    /// Left/right pick in a comparison.
    Side(ComparisonSide),
    /// A letter option.
    Letter(String),
    /// A word typed from dictation.
    TypedWord(String),
    /// A speech-recognition transcript.
    Transcript(String),
    /// A drawn trace: serialized snapshot plus frontend-derived metrics.
    Trace {
        snapshot: String,
        duration_secs: f64,
        accuracy: f64,
    },
    /// Uploaded handwriting samples.
    Images(Vec<ImageUpload>),
}

/// A classification returned by the scoring service.
///
/// The label is an opaque, test-specific token. It is never matched against
/// a closed set; the harness only displays it or folds it through the
/// configured risk policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    /// Confidence/probability in [0, 1].
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// The record of one completed trial. Append-only; never mutated after the
/// trial ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Insertion index within the session.
    pub ordinal: usize,
    /// 1-based round number for tests that run multiple rounds.
    pub round: usize,
    pub stimulus: Stimulus,
    pub response: Response,
    #[serde(default)]
    pub is_correct: Option<bool>,
    /// Wall-clock delta between stimulus activation and submission.
    pub response_time_secs: f64,
    /// Per-trial classification, when the test scores each attempt.
    #[serde(default)]
    pub classification: Option<Classification>,
}

/// A child profile fetched from the account service. Read-only here; this
/// harness never owns its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub birthday: Option<String>,
}
