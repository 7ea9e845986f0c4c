//! OCR engine boundary
//!
//! The classifier talks to OCR through the `OcrEngine` trait. The production
//! implementation shells out to the `tesseract` command-line tool and reads
//! its TSV output, which carries per-word confidences.

use async_trait::async_trait;
use nyxa_common::config::OcrConfig;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Progress sink for recognition (0-100)
pub type ProgressCallback = dyn Fn(u8) + Send + Sync;

/// OCR engine errors
#[derive(Debug, Error)]
pub enum OcrError {
    /// OCR binary not found
    #[error("OCR binary not found: {0}")]
    BinaryNotFound(String),

    /// Failed to execute the OCR command
    #[error("Failed to execute OCR engine: {0}")]
    ExecutionError(String),

    /// Engine ran but reported failure
    #[error("OCR recognition failed: {0}")]
    RecognitionFailed(String),

    /// Engine did not finish in time
    #[error("OCR recognition timed out after {0}s")]
    Timeout(u64),

    /// Engine output could not be parsed
    #[error("Failed to parse OCR output: {0}")]
    ParseError(String),

    /// I/O error (scratch file write)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Recognized text and the engine's confidence score (0-100)
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub confidence: f32,
}

/// Opaque OCR collaborator
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logging
    fn name(&self) -> &'static str;

    /// Recognize text in a PNG-encoded image
    async fn recognize(
        &self,
        image_png: &[u8],
        language: &str,
        progress: &ProgressCallback,
    ) -> Result<OcrOutput, OcrError>;
}

/// Tesseract command-line engine
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: String,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.binary.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn recognize(
        &self,
        image_png: &[u8],
        language: &str,
        progress: &ProgressCallback,
    ) -> Result<OcrOutput, OcrError> {
        progress(0);

        let input = tempfile::Builder::new()
            .prefix("nyxa-ocr-")
            .suffix(".png")
            .tempfile()?;
        tokio::fs::write(input.path(), image_png).await?;

        let mut command = Command::new(&self.binary);
        command
            .arg(input.path())
            .arg("stdout")
            .args(["-l", language])
            .arg("tsv")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(binary = %self.binary, language, "Running OCR engine");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(OcrError::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::BinaryNotFound(self.binary.clone()))
            }
            Ok(Err(e)) => return Err(OcrError::ExecutionError(e.to_string())),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RecognitionFailed(stderr.trim().to_string()));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let result = parse_tsv(&tsv)?;
        progress(100);
        Ok(result)
    }
}

/// Word-level TSV row fields used here
struct TsvWord<'a> {
    line_key: (u32, u32, u32, u32),
    confidence: f32,
    text: &'a str,
}

/// Rebuild text and mean word confidence from Tesseract TSV output
///
/// Words are joined by spaces within a line and lines by newlines. Confidence
/// is the mean over recognized words; rows with negative confidence are
/// layout rows, not words.
pub fn parse_tsv(tsv: &str) -> Result<OcrOutput, OcrError> {
    let mut lines = tsv.lines();
    let header = lines
        .next()
        .ok_or_else(|| OcrError::ParseError("empty output".to_string()))?;
    if !header.starts_with("level") {
        return Err(OcrError::ParseError(format!("unexpected header: {}", header)));
    }

    let mut by_line: BTreeMap<(u32, u32, u32, u32), Vec<&str>> = BTreeMap::new();
    let mut confidence_sum = 0.0f64;
    let mut word_count = 0usize;

    for row in lines.filter(|l| !l.trim().is_empty()) {
        let Some(word) = parse_word_row(row)? else {
            continue;
        };
        confidence_sum += f64::from(word.confidence);
        word_count += 1;
        by_line.entry(word.line_key).or_default().push(word.text);
    }

    let text = by_line
        .values()
        .map(|words| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    let confidence = if word_count > 0 {
        (confidence_sum / word_count as f64) as f32
    } else {
        0.0
    };

    Ok(OcrOutput { text, confidence })
}

fn parse_word_row(row: &str) -> Result<Option<TsvWord<'_>>, OcrError> {
    let fields: Vec<&str> = row.split('\t').collect();
    if fields.len() < 11 {
        return Err(OcrError::ParseError(format!("short row: {}", row)));
    }

    let number = |i: usize| -> Result<u32, OcrError> {
        fields[i]
            .trim()
            .parse::<u32>()
            .map_err(|e| OcrError::ParseError(format!("field {}: {}", i, e)))
    };

    // Level 5 rows are words
    if number(0)? != 5 {
        return Ok(None);
    }

    let confidence = fields[10]
        .trim()
        .parse::<f32>()
        .map_err(|e| OcrError::ParseError(format!("confidence: {}", e)))?;
    let text = fields.get(11).map(|t| t.trim()).unwrap_or_default();
    if confidence < 0.0 || text.is_empty() {
        return Ok(None);
    }

    Ok(Some(TsvWord {
        line_key: (number(1)?, number(2)?, number(3)?, number(4)?),
        confidence,
        text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn parse_tsv_rebuilds_lines_and_mean_confidence() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n\
             5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t90.0\tRatings\n\
             5\t1\t1\t1\t1\t2\t0\t0\t10\t10\t80.0\t&\n\
             5\t1\t1\t1\t1\t3\t0\t0\t10\t10\t70.0\tReviews\n\
             5\t1\t1\t1\t2\t1\t0\t0\t10\t10\t60.0\t5.0\n"
        );
        let output = parse_tsv(&tsv).unwrap();
        assert_eq!(output.text, "Ratings & Reviews\n5.0");
        assert!((output.confidence - 75.0).abs() < 1e-4);
    }

    #[test]
    fn parse_tsv_without_words_has_zero_confidence() {
        let tsv = format!("{HEADER}\n1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n");
        let output = parse_tsv(&tsv).unwrap();
        assert_eq!(output.text, "");
        assert_eq!(output.confidence, 0.0);
    }

    #[test]
    fn parse_tsv_rejects_garbage() {
        assert!(matches!(parse_tsv(""), Err(OcrError::ParseError(_))));
        assert!(matches!(parse_tsv("hello world"), Err(OcrError::ParseError(_))));
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let engine = TesseractCli::new("nyxa-definitely-missing-ocr-binary", Duration::from_secs(5));
        let err = engine.recognize(&[0u8; 4], "eng", &|_| {}).await.unwrap_err();
        assert!(matches!(err, OcrError::BinaryNotFound(_)));
    }
}
