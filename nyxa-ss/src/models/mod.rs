//! Data models for nyxa-ss (review & reward self-service)
//!
//! - Flow state machine record and its transitions
//! - Uploaded screenshot artifacts
//! - Classification results
//! - Static reward tiers

pub mod artifact;
pub mod classification;
pub mod flow_state;
pub mod reward;
pub mod session;

pub use artifact::{ArtifactSummary, FileDescriptor, UploadedArtifact};
pub use classification::{
    ClassificationResult, Detection, CONTEXT_ONLY_MESSAGE, ENGINE_FAILURE_MESSAGE, FIVE_STAR_MESSAGE,
    NOT_DETECTED_MESSAGE,
};
pub use flow_state::{FlowAction, FlowError, FlowSnapshot, FlowState, StepTransition};
pub use nyxa_common::events::{FlowStep, Verdict};
pub use reward::{reward_links, ManualFallback, RewardLink, RewardTier, MANUAL_FALLBACK, REWARD_TIERS};
pub use session::FlowSession;
