//! Screenshot classifier
//!
//! Preprocesses an uploaded screenshot, runs it through the OCR engine and
//! reads a star rating out of the recognized text with the rule tables in
//! `rating_rules`.
//!
//! **Failure handling:** decode or recognition failures are not propagated to
//! the flow. `analyze` folds them into the engine-failure result (verdict
//! fail, zero stars, zero confidence) so the visitor lands in Feedback.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::image_preprocessor::{preprocess_image, PreprocessError};
use super::ocr_engine::{OcrEngine, OcrError, ProgressCallback};
use super::rating_rules::detect_rating;
use crate::models::{ClassificationResult, UploadedArtifact};

/// Default OCR language
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Classifier errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// Classification task died before producing a result
    #[error("Classification aborted: {0}")]
    Aborted(String),
}

/// Seam between the flow controller and the classifier
///
/// An `Err` means the classifier itself failed; the flow returns to
/// Verification instead of showing a verdict.
#[async_trait]
pub trait ReviewClassifier: Send + Sync {
    async fn classify(
        &self,
        artifact: &UploadedArtifact,
        progress: &ProgressCallback,
    ) -> Result<ClassificationResult, ClassifierError>;
}

/// OCR-backed classifier
pub struct ScreenshotClassifier {
    engine: Arc<dyn OcrEngine>,
    language: String,
}

impl ScreenshotClassifier {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Classify a screenshot, converting any failure into the engine-failure
    /// result
    pub async fn analyze(
        &self,
        artifact: &UploadedArtifact,
        progress: &ProgressCallback,
    ) -> ClassificationResult {
        match self.try_analyze(artifact, progress).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    engine = self.engine.name(),
                    error = %e,
                    "Screenshot analysis failed"
                );
                ClassificationResult::engine_failure()
            }
        }
    }

    /// Preprocess, recognize and classify, surfacing the first failure
    pub async fn try_analyze(
        &self,
        artifact: &UploadedArtifact,
        progress: &ProgressCallback,
    ) -> Result<ClassificationResult, ClassifierError> {
        // Decoding and pixel work are CPU-bound
        let owned = artifact.clone();
        let prepared = tokio::task::spawn_blocking(move || preprocess_image(owned.bytes()))
            .await
            .map_err(|e| ClassifierError::Aborted(format!("Preprocess task failed: {}", e)))??;

        debug!(
            width = prepared.width,
            height = prepared.height,
            mean_luminance = prepared.mean_luminance,
            inverted = prepared.inverted,
            "Screenshot preprocessed"
        );

        let output = self
            .engine
            .recognize(&prepared.png_bytes, &self.language, progress)
            .await?;

        debug!(text = %output.text, confidence = output.confidence, "OCR text");

        let result = classify_text(&output.text, output.confidence);
        info!(
            verdict = %result.verdict,
            detected_stars = ?result.detected_stars,
            confidence = result.confidence,
            "Screenshot classified"
        );
        Ok(result)
    }
}

#[async_trait]
impl ReviewClassifier for ScreenshotClassifier {
    async fn classify(
        &self,
        artifact: &UploadedArtifact,
        progress: &ProgressCallback,
    ) -> Result<ClassificationResult, ClassifierError> {
        Ok(self.analyze(artifact, progress).await)
    }
}

/// Classify already-recognized text
pub fn classify_text(text: &str, confidence: f32) -> ClassificationResult {
    ClassificationResult::from_detection(detect_rating(text), confidence)
}
