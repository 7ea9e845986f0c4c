//! Background classification of an accepted upload
//!
//! Runs the classifier outside the session lock, streams progress on the
//! event bus and folds the outcome back into the session. A panic inside the
//! classifier is contained and treated as a classifier failure, so the
//! session never stays in Processing.

use chrono::Utc;
use nyxa_common::events::{EventBus, FlowEvent, FlowStep};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::flow_controller::finish_classification;
use super::screenshot_classifier::{ClassifierError, ReviewClassifier};
use super::session_registry::SessionRegistry;
use crate::models::UploadedArtifact;

/// Classify `artifact` for `session_id` in the background
///
/// `attempt` is the session's `upload_attempt` at admission; a result for an
/// older attempt (the visitor reset meanwhile) is discarded.
pub fn spawn_classification(
    registry: SessionRegistry,
    classifier: Arc<dyn ReviewClassifier>,
    event_bus: EventBus,
    session_id: Uuid,
    attempt: u64,
    artifact: UploadedArtifact,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let progress_bus = event_bus.clone();
        let progress = move |percent: u8| {
            progress_bus.emit_lossy(FlowEvent::ClassificationProgress {
                session_id,
                percent: percent.min(100),
                timestamp: Utc::now(),
            });
        };

        let worker = tokio::spawn(async move { classifier.classify(&artifact, &progress).await });
        let outcome = match worker.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%session_id, error = %e, "Classification task aborted");
                Err(ClassifierError::Aborted(e.to_string()))
            }
        };

        let completed = outcome.as_ref().ok().map(|r| FlowEvent::ClassificationCompleted {
            session_id,
            verdict: r.verdict,
            detected_stars: r.detected_stars,
            confidence: r.confidence,
            timestamp: Utc::now(),
        });

        let applied = registry
            .with_session(session_id, |session| {
                if session.upload_attempt != attempt || session.state.step() != FlowStep::Processing {
                    return None;
                }
                Some(finish_classification(&mut session.state, outcome))
            })
            .await
            .flatten();

        match applied {
            Some(Ok(transition)) => {
                info!(
                    %session_id,
                    new_step = %transition.new_step,
                    "Classification applied"
                );
                if let Some(event) = completed {
                    event_bus.emit_lossy(event);
                }
                event_bus.emit_lossy(FlowEvent::FlowStepChanged {
                    session_id,
                    old_step: transition.old_step,
                    new_step: transition.new_step,
                    timestamp: transition.transitioned_at,
                });
            }
            Some(Err(e)) => {
                warn!(%session_id, error = %e, "Classification result could not be applied");
            }
            None => {
                debug!(%session_id, attempt, "Discarding stale classification result");
            }
        }
    })
}
