//! Interactive terminal capture.
//!
//! Speech recognition is not available in a terminal; the capability check
//! fails fast so speech-driven tests never start a trial here. Letter
//! traces are supplied as stroke-sample files and handwriting as image
//! paths.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use earlyedge_core::error::CaptureError;
use earlyedge_core::model::{Category, ImageUpload, Modality, Response, Stimulus};
use earlyedge_core::traits::ResponseCapture;

use crate::strokes::TraceSample;

/// Capture surface backed by stdin/stdout.
pub struct TerminalCapture;

impl TerminalCapture {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalCapture {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_line(prompt: &str) -> Result<String, CaptureError> {
    println!("{prompt}");
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map(|_| line.trim().to_string())
    })
    .await
    .map_err(|e| CaptureError::Io(e.to_string()))?
    .map_err(|e| CaptureError::Io(e.to_string()))
}

/// Parse a typed numeric answer.
pub(crate) fn parse_choice(input: &str) -> Result<f64, CaptureError> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|_| CaptureError::Invalid(format!("not a number: '{input}'")))
}

/// Split a comma-separated path list.
pub(crate) fn parse_paths(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageUpload>, CaptureError> {
    paths
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
        .collect()
}

fn load_trace(path: &Path) -> Result<Response, CaptureError> {
    let sample = TraceSample::load(path).map_err(|e| CaptureError::Io(e.to_string()))?;
    Ok(Response::Trace {
        snapshot: sample.snapshot(),
        duration_secs: sample.duration_secs,
        accuracy: sample.accuracy(),
    })
}

#[async_trait]
impl ResponseCapture for TerminalCapture {
    fn supports(&self, modality: Modality) -> bool {
        match modality {
            Modality::Choice | Modality::Text | Modality::Drawing | Modality::ImageUpload => true,
            Modality::Speech => false,
        }
    }

    async fn acknowledge(&mut self, message: &str) -> Result<(), CaptureError> {
        println!("\n{message}");
        read_line("Press Enter to continue.").await?;
        Ok(())
    }

    async fn select_category(&mut self) -> Result<Category, CaptureError> {
        let input = read_line(
            "Choose an operation: addition (+), subtraction (-), multiplication (*), division (/)",
        )
        .await?;
        input
            .parse()
            .map_err(|e: String| CaptureError::Invalid(e))
    }

    async fn capture(&mut self, stimulus: &Stimulus) -> Result<Response, CaptureError> {
        match stimulus {
            Stimulus::Arithmetic(q) => {
                let mut answers = [q.correct, q.distractor];
                answers.sort_by(|a, b| a.total_cmp(b));
                let input = read_line(&format!(
                    "\n{}  —  type your answer ({} or {})",
                    stimulus.prompt(),
                    answers[0],
                    answers[1]
                ))
                .await?;
                Ok(Response::Choice(parse_choice(&input)?))
            }
            Stimulus::NumberComparison(_) => {
                let input =
                    read_line(&format!("\n{}  —  type left or right", stimulus.prompt())).await?;
                let side = input
                    .parse()
                    .map_err(|e: String| CaptureError::Invalid(e))?;
                Ok(Response::Side(side))
            }
            Stimulus::LetterConfusion(item) => {
                let input = read_line(&format!(
                    "\n{}  —  options: {}",
                    item.prompt,
                    item.options.join(", ")
                ))
                .await?;
                Ok(Response::Letter(input))
            }
            Stimulus::Spelling(_) => {
                let input = read_line("\nType the word you heard:").await?;
                Ok(Response::TypedWord(input))
            }
            Stimulus::LetterTracing { letter } => {
                let input = read_line(&format!(
                    "\nTrace the letter '{letter}' and enter the stroke-sample file path:"
                ))
                .await?;
                load_trace(Path::new(&input))
            }
            Stimulus::PhonoSpeech { .. } => Err(CaptureError::Unsupported(Modality::Speech)),
            Stimulus::Handwriting { slots } => {
                let input = read_line(&format!(
                    "\nEnter up to {slots} image paths, comma-separated:"
                ))
                .await?;
                let paths = parse_paths(&input);
                if paths.is_empty() {
                    return Err(CaptureError::Invalid("no image paths given".into()));
                }
                Ok(Response::Images(read_images(&paths)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_is_not_supported() {
        let capture = TerminalCapture::new();
        assert!(!capture.supports(Modality::Speech));
        assert!(capture.supports(Modality::Choice));
        assert!(capture.supports(Modality::Drawing));
    }

    #[test]
    fn parse_choice_accepts_decimals() {
        assert_eq!(parse_choice(" 7 ").unwrap(), 7.0);
        assert_eq!(parse_choice("0.33").unwrap(), 0.33);
        assert!(parse_choice("seven").is_err());
    }

    #[test]
    fn parse_paths_splits_and_trims() {
        let paths = parse_paths("a.png, b.png , ,c.png");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.png"),
                PathBuf::from("c.png")
            ]
        );
    }

    #[test]
    fn missing_image_is_io_error() {
        let err = read_images(&[PathBuf::from("/definitely/not/here.png")]).unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
    }
}
