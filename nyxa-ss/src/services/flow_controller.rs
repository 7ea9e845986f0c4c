//! Flow controller
//!
//! Drives a `FlowState` through validation and classification:
//! - `begin_upload` validates and admits an artifact (Verification → Processing)
//! - `finish_classification` folds the classifier outcome back
//!   (Processing → Reward | Feedback, or back to Verification on failure)
//!
//! The two halves are separate so the HTTP layer can release the session
//! lock while the classifier runs. `FlowController` wires them together for
//! single-owner use (the `verify` CLI and tests).

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::input_validator::{validate_image_file, ValidationError};
use super::ocr_engine::ProgressCallback;
use super::screenshot_classifier::{ClassifierError, ReviewClassifier};
use crate::models::{ClassificationResult, FlowError, FlowState, StepTransition, UploadedArtifact};

/// Shown when the classifier fails outright
pub const PROCESSING_FAILED_MESSAGE: &str =
    "An error occurred while processing your image. Please try again.";

/// Result of offering an upload to a flow in Verification
#[derive(Debug)]
pub enum UploadAdmission {
    /// Validation failed; the flow stays in Verification with `error` set
    Rejected(ValidationError),
    /// Artifact stored; the flow is now in Processing
    Accepted {
        artifact: UploadedArtifact,
        transition: StepTransition,
    },
}

/// Validate an upload and, if acceptable, move the flow into Processing
///
/// Uploads outside Verification are refused before validation runs.
pub fn begin_upload(
    state: &mut FlowState,
    artifact: UploadedArtifact,
) -> Result<UploadAdmission, FlowError> {
    state.check_upload_allowed()?;

    if let Err(e) = validate_image_file(&artifact.descriptor()) {
        state.reject_upload(e.to_string())?;
        info!(
            declared_mime = %artifact.declared_mime(),
            size_bytes = artifact.size_bytes(),
            reason = %e,
            "Upload rejected"
        );
        return Ok(UploadAdmission::Rejected(e));
    }

    let transition = state.accept_upload(artifact.clone())?;
    debug!(
        file_name = ?artifact.file_name(),
        size_bytes = artifact.size_bytes(),
        "Upload accepted"
    );
    Ok(UploadAdmission::Accepted {
        artifact,
        transition,
    })
}

/// Apply a classifier outcome to a flow in Processing
pub fn finish_classification(
    state: &mut FlowState,
    outcome: Result<ClassificationResult, ClassifierError>,
) -> Result<StepTransition, FlowError> {
    match outcome {
        Ok(result) => state.complete_classification(result),
        Err(e) => {
            warn!(error = %e, "Classifier failed, returning to verification");
            state.fail_classification(PROCESSING_FAILED_MESSAGE)
        }
    }
}

/// What happened to an upload handed to `FlowController::upload_file`
#[derive(Debug)]
pub enum UploadOutcome {
    Rejected(ValidationError),
    Completed(StepTransition),
}

/// Single-owner flow driver
pub struct FlowController {
    state: FlowState,
    classifier: Arc<dyn ReviewClassifier>,
}

impl FlowController {
    pub fn new(classifier: Arc<dyn ReviewClassifier>) -> Self {
        Self {
            state: FlowState::new(),
            classifier,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn start_verification(&mut self) -> Result<StepTransition, FlowError> {
        self.state.start_verification()
    }

    /// Validate, classify and settle an upload
    ///
    /// Returns once the flow has left Processing.
    pub async fn upload_file(
        &mut self,
        artifact: UploadedArtifact,
        progress: &ProgressCallback,
    ) -> Result<UploadOutcome, FlowError> {
        let artifact = match begin_upload(&mut self.state, artifact)? {
            UploadAdmission::Rejected(e) => return Ok(UploadOutcome::Rejected(e)),
            UploadAdmission::Accepted { artifact, .. } => artifact,
        };

        let outcome = self.classifier.classify(&artifact, progress).await;
        let transition = finish_classification(&mut self.state, outcome)?;
        Ok(UploadOutcome::Completed(transition))
    }

    pub fn retry_upload(&mut self) -> Result<StepTransition, FlowError> {
        self.state.retry_upload()
    }

    pub fn reset(&mut self) -> StepTransition {
        self.state.reset()
    }
}
