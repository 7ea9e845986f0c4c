//! Screenshot classification results

use nyxa_common::events::Verdict;
use serde::{Deserialize, Serialize};

/// Message shown when a 5-star rating was read from the screenshot
pub const FIVE_STAR_MESSAGE: &str = "5-star rating detected! You qualify for the reward.";

/// Message shown when only review-section context was found
pub const CONTEXT_ONLY_MESSAGE: &str = "App Store review detected! You qualify for the reward.";

/// Message shown when nothing review-like was found
pub const NOT_DETECTED_MESSAGE: &str = "We couldn't detect an App Store review in this screenshot. \
     Please upload a clear screenshot showing your 5-star review.";

/// Message shown when decoding or recognition failed
pub const ENGINE_FAILURE_MESSAGE: &str =
    "Error analyzing image. Please try again with a different screenshot.";

/// Which rule category produced the verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    /// A definite five-star pattern matched
    FiveStarPattern { rule: String },
    /// Five or more star glyphs were recognized
    StarGlyphs { count: usize },
    /// A numeric rating between 1 and 5 was extracted
    NumericRating { rating: u8, rule: String },
    /// Between one and four star glyphs were recognized
    PartialStarGlyphs { count: usize },
    /// No rating, but the text reads like an app-store review screen
    ContextOnly { marker: String },
    /// Nothing matched
    Nothing,
    /// Decoding or recognition failed
    EngineFailure,
}

/// Outcome of one classification attempt
///
/// Immutable once produced. `confidence` is the OCR engine's own score and
/// never influences the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    /// Detected star count; `None` when no rating could be read at all
    pub detected_stars: Option<u8>,
    pub message: String,
    /// Engine confidence (0-100)
    pub confidence: f32,
    pub detection: Detection,
}

impl ClassificationResult {
    /// Build the result for a text detection
    pub fn from_detection(detection: Detection, confidence: f32) -> Self {
        let confidence = confidence.clamp(0.0, 100.0);
        let (verdict, detected_stars, message) = match &detection {
            Detection::FiveStarPattern { .. } | Detection::StarGlyphs { .. } => {
                (Verdict::Pass, Some(5), FIVE_STAR_MESSAGE.to_string())
            }
            Detection::NumericRating { rating: 5, .. } => {
                (Verdict::Pass, Some(5), FIVE_STAR_MESSAGE.to_string())
            }
            Detection::NumericRating { rating, .. } => {
                (Verdict::Fail, Some(*rating), partial_rating_message(*rating as usize))
            }
            Detection::PartialStarGlyphs { count } => (
                Verdict::Fail,
                Some((*count).min(5) as u8),
                partial_rating_message(*count),
            ),
            Detection::ContextOnly { .. } => {
                (Verdict::Pass, Some(5), CONTEXT_ONLY_MESSAGE.to_string())
            }
            Detection::Nothing => (Verdict::Fail, None, NOT_DETECTED_MESSAGE.to_string()),
            Detection::EngineFailure => {
                return Self::engine_failure();
            }
        };

        Self {
            verdict,
            detected_stars,
            message,
            confidence,
            detection,
        }
    }

    /// Result used whenever decoding or recognition fails
    pub fn engine_failure() -> Self {
        Self {
            verdict: Verdict::Fail,
            detected_stars: Some(0),
            message: ENGINE_FAILURE_MESSAGE.to_string(),
            confidence: 0.0,
            detection: Detection::EngineFailure,
        }
    }

    pub fn qualifies(&self) -> bool {
        self.verdict.qualifies()
    }
}

fn partial_rating_message(stars: usize) -> String {
    format!(
        "We detected {} stars. Please update your review to 5 stars and try again.",
        stars
    )
}
