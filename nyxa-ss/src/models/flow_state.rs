//! Review & reward flow state machine
//!
//! Five steps, one active at a time:
//! ACQUISITION → VERIFICATION → PROCESSING → FEEDBACK | REWARD
//!
//! `FlowState` only knows the transition table. Validation and the
//! classifier call are driven by `services::flow_controller`.

use chrono::{DateTime, Utc};
use nyxa_common::events::FlowStep;
use serde::Serialize;
use thiserror::Error;

use super::artifact::{ArtifactSummary, UploadedArtifact};
use super::classification::ClassificationResult;

/// Actions a visitor (or the classifier) can perform on a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    StartVerification,
    UploadFile,
    CompleteClassification,
    RetryUpload,
    Reset,
}

impl std::fmt::Display for FlowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowAction::StartVerification => "start_verification",
            FlowAction::UploadFile => "upload_file",
            FlowAction::CompleteClassification => "complete_classification",
            FlowAction::RetryUpload => "retry_upload",
            FlowAction::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Flow state machine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Action is not defined for the current step; state is unchanged
    #[error("Action '{action}' is not valid in step '{step}'")]
    InvalidTransition { action: FlowAction, step: FlowStep },
}

/// Step change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepTransition {
    pub old_step: FlowStep,
    pub new_step: FlowStep,
    pub transitioned_at: DateTime<Utc>,
}

impl StepTransition {
    pub fn changed(&self) -> bool {
        self.old_step != self.new_step
    }
}

/// Per-session flow record
#[derive(Debug, Clone)]
pub struct FlowState {
    step: FlowStep,
    uploaded_artifact: Option<UploadedArtifact>,
    classification: Option<ClassificationResult>,
    error: Option<String>,
}

/// Serializable view of a flow, without image bytes
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub step: FlowStep,
    pub artifact: Option<ArtifactSummary>,
    pub classification: Option<ClassificationResult>,
    pub error: Option<String>,
}

impl Default for FlowState {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowState {
    /// Fresh flow in the Acquisition step with every optional slot empty
    pub fn new() -> Self {
        Self {
            step: FlowStep::Acquisition,
            uploaded_artifact: None,
            classification: None,
            error: None,
        }
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn uploaded_artifact(&self) -> Option<&UploadedArtifact> {
        self.uploaded_artifact.as_ref()
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            step: self.step,
            artifact: self.uploaded_artifact.as_ref().map(UploadedArtifact::summary),
            classification: self.classification.clone(),
            error: self.error.clone(),
        }
    }

    /// Acquisition → Verification
    pub fn start_verification(&mut self) -> Result<StepTransition, FlowError> {
        self.require(FlowAction::StartVerification, FlowStep::Acquisition)?;
        self.error = None;
        Ok(self.transition_to(FlowStep::Verification))
    }

    /// Whether an upload may be offered in the current step
    pub fn check_upload_allowed(&self) -> Result<(), FlowError> {
        self.require(FlowAction::UploadFile, FlowStep::Verification)
    }

    /// Verification → Verification, recording a validation message
    pub fn reject_upload(&mut self, message: impl Into<String>) -> Result<(), FlowError> {
        self.require(FlowAction::UploadFile, FlowStep::Verification)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Verification → Processing, storing the artifact
    pub fn accept_upload(&mut self, artifact: UploadedArtifact) -> Result<StepTransition, FlowError> {
        self.require(FlowAction::UploadFile, FlowStep::Verification)?;
        self.uploaded_artifact = Some(artifact);
        self.classification = None;
        self.error = None;
        Ok(self.transition_to(FlowStep::Processing))
    }

    /// Processing → Reward (pass) or Feedback (fail)
    pub fn complete_classification(
        &mut self,
        result: ClassificationResult,
    ) -> Result<StepTransition, FlowError> {
        self.require(FlowAction::CompleteClassification, FlowStep::Processing)?;
        let next = if result.qualifies() {
            FlowStep::Reward
        } else {
            FlowStep::Feedback
        };
        self.classification = Some(result);
        Ok(self.transition_to(next))
    }

    /// Processing → Verification after the classifier itself failed
    ///
    /// The artifact reference is dropped so the visitor can upload again.
    pub fn fail_classification(
        &mut self,
        message: impl Into<String>,
    ) -> Result<StepTransition, FlowError> {
        self.require(FlowAction::CompleteClassification, FlowStep::Processing)?;
        self.uploaded_artifact = None;
        self.classification = None;
        self.error = Some(message.into());
        Ok(self.transition_to(FlowStep::Verification))
    }

    /// Feedback → Verification, clearing every optional slot
    pub fn retry_upload(&mut self) -> Result<StepTransition, FlowError> {
        self.require(FlowAction::RetryUpload, FlowStep::Feedback)?;
        self.clear();
        Ok(self.transition_to(FlowStep::Verification))
    }

    /// Any step → Acquisition, clearing every optional slot
    pub fn reset(&mut self) -> StepTransition {
        self.clear();
        self.transition_to(FlowStep::Acquisition)
    }

    fn require(&self, action: FlowAction, expected: FlowStep) -> Result<(), FlowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                action,
                step: self.step,
            })
        }
    }

    fn clear(&mut self) {
        self.uploaded_artifact = None;
        self.classification = None;
        self.error = None;
    }

    fn transition_to(&mut self, new_step: FlowStep) -> StepTransition {
        let transition = StepTransition {
            old_step: self.step,
            new_step,
            transitioned_at: Utc::now(),
        };
        self.step = new_step;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classification::Detection;

    fn png_artifact() -> UploadedArtifact {
        UploadedArtifact::new(Some("review.png".into()), "image/png", vec![1, 2, 3])
    }

    fn processing_state() -> FlowState {
        let mut state = FlowState::new();
        state.start_verification().unwrap();
        state.accept_upload(png_artifact()).unwrap();
        state
    }

    #[test]
    fn new_state_is_empty_acquisition() {
        let state = FlowState::new();
        assert_eq!(state.step(), FlowStep::Acquisition);
        assert!(state.uploaded_artifact().is_none());
        assert!(state.classification().is_none());
        assert!(state.error().is_none());
    }

    #[test]
    fn start_verification_only_from_acquisition() {
        let mut state = FlowState::new();
        let transition = state.start_verification().unwrap();
        assert_eq!(transition.old_step, FlowStep::Acquisition);
        assert_eq!(transition.new_step, FlowStep::Verification);

        let err = state.start_verification().unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidTransition {
                action: FlowAction::StartVerification,
                step: FlowStep::Verification
            }
        );
    }

    #[test]
    fn rejected_upload_keeps_step_and_sets_error() {
        let mut state = FlowState::new();
        state.start_verification().unwrap();
        state.reject_upload("bad file").unwrap();
        assert_eq!(state.step(), FlowStep::Verification);
        assert_eq!(state.error(), Some("bad file"));
    }

    #[test]
    fn accepted_upload_clears_previous_error() {
        let mut state = FlowState::new();
        state.start_verification().unwrap();
        state.reject_upload("bad file").unwrap();
        state.accept_upload(png_artifact()).unwrap();
        assert_eq!(state.step(), FlowStep::Processing);
        assert!(state.error().is_none());
        assert!(state.uploaded_artifact().is_some());
    }

    #[test]
    fn second_upload_while_processing_is_rejected() {
        let mut state = processing_state();
        let err = state.accept_upload(png_artifact()).unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidTransition { step: FlowStep::Processing, .. }
        ));
    }

    #[test]
    fn passing_result_leads_to_reward() {
        let mut state = processing_state();
        let result = ClassificationResult::from_detection(
            Detection::FiveStarPattern { rule: "five_point_zero".into() },
            90.0,
        );
        let transition = state.complete_classification(result).unwrap();
        assert_eq!(transition.new_step, FlowStep::Reward);
        assert!(state.classification().unwrap().qualifies());
        assert!(state.uploaded_artifact().is_some());
    }

    #[test]
    fn failing_result_leads_to_feedback() {
        let mut state = processing_state();
        let result = ClassificationResult::from_detection(Detection::Nothing, 40.0);
        state.complete_classification(result).unwrap();
        assert_eq!(state.step(), FlowStep::Feedback);
    }

    #[test]
    fn classifier_failure_returns_to_verification_without_artifact() {
        let mut state = processing_state();
        state.fail_classification("try again").unwrap();
        assert_eq!(state.step(), FlowStep::Verification);
        assert!(state.uploaded_artifact().is_none());
        assert_eq!(state.error(), Some("try again"));
    }

    #[test]
    fn retry_only_from_feedback() {
        let mut state = processing_state();
        assert!(state.retry_upload().is_err());

        state
            .complete_classification(ClassificationResult::from_detection(Detection::Nothing, 0.0))
            .unwrap();
        state.retry_upload().unwrap();
        assert_eq!(state.step(), FlowStep::Verification);
        assert!(state.uploaded_artifact().is_none());
        assert!(state.classification().is_none());
        assert!(state.error().is_none());
    }

    #[test]
    fn reset_from_processing_clears_everything() {
        let mut state = processing_state();
        let transition = state.reset();
        assert_eq!(transition.old_step, FlowStep::Processing);
        assert_eq!(state.step(), FlowStep::Acquisition);
        assert!(state.uploaded_artifact().is_none());
    }

    #[test]
    fn snapshot_summarises_artifact() {
        let state = processing_state();
        let snapshot = state.snapshot();
        let artifact = snapshot.artifact.unwrap();
        assert_eq!(artifact.size_bytes, 3);
        assert_eq!(artifact.declared_mime, "image/png");
    }
}
