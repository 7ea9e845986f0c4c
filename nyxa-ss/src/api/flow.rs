//! Flow API handlers
//!
//! POST /flow, GET|DELETE /flow/{id}, POST /flow/{id}/{start,upload,retry,reset}

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use nyxa_common::events::FlowEvent;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        reward_links, FlowError, FlowSnapshot, FlowState, FlowStep, ManualFallback, RewardLink,
        StepTransition, UploadedArtifact, MANUAL_FALLBACK,
    },
    services::{begin_upload, spawn_classification, UploadAdmission},
    AppState,
};

/// Multipart field carrying the screenshot
pub const SCREENSHOT_FIELD: &str = "screenshot";

/// Reason attached to sessions closed through DELETE
pub const CLOSED_BY_VISITOR: &str = "closed";

/// Flow snapshot as returned by every flow endpoint
#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub flow: FlowSnapshot,
    /// Present only in the Reward step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Vec<RewardLink>>,
    /// Present when automatic verification did not succeed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_fallback: Option<ManualFallback>,
}

impl FlowResponse {
    pub fn new(session_id: Uuid, flow: FlowSnapshot) -> Self {
        let rewards = (flow.step == FlowStep::Reward).then(reward_links);
        let needs_fallback = flow.step == FlowStep::Feedback
            || (flow.step == FlowStep::Verification && flow.error.is_some());
        Self {
            session_id,
            rewards,
            manual_fallback: needs_fallback.then_some(MANUAL_FALLBACK),
            flow,
        }
    }
}

/// Build flow routes
pub fn flow_routes() -> Router<AppState> {
    Router::new()
        .route("/flow", post(create_flow))
        .route("/flow/:session_id", get(get_flow).delete(delete_flow))
        .route("/flow/:session_id/start", post(start_verification))
        .route("/flow/:session_id/upload", post(upload_screenshot))
        .route("/flow/:session_id/retry", post(retry_upload))
        .route("/flow/:session_id/reset", post(reset_flow))
        .route("/flow/:session_id/events", get(super::sse::flow_event_stream))
}

fn session_not_found(session_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Flow session not found: {}", session_id))
}

fn emit_step_change(state: &AppState, session_id: Uuid, transition: &StepTransition) {
    if !transition.changed() {
        return;
    }
    state.event_bus.emit_lossy(FlowEvent::FlowStepChanged {
        session_id,
        old_step: transition.old_step,
        new_step: transition.new_step,
        timestamp: transition.transitioned_at,
    });
}

/// Run one state-machine action on a session and return the new snapshot
async fn apply_action(
    state: &AppState,
    session_id: Uuid,
    action: impl FnOnce(&mut FlowState) -> Result<StepTransition, FlowError>,
) -> ApiResult<Json<FlowResponse>> {
    let (transition, snapshot) = state
        .sessions
        .with_session(session_id, |session| {
            action(&mut session.state).map(|t| (t, session.state.snapshot()))
        })
        .await
        .ok_or_else(|| session_not_found(session_id))??;

    tracing::info!(
        session_id = %session_id,
        old_step = %transition.old_step,
        new_step = %transition.new_step,
        "Flow step changed"
    );
    emit_step_change(state, session_id, &transition);

    Ok(Json(FlowResponse::new(session_id, snapshot)))
}

/// POST /flow
///
/// Create a session in the Acquisition step. Returns 201.
pub async fn create_flow(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<FlowResponse>)> {
    let session_id = state.sessions.create().await;
    let session = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::Internal("Session vanished after creation".to_string()))?;

    tracing::info!(session_id = %session_id, "Flow session created");
    state.event_bus.emit_lossy(FlowEvent::FlowSessionCreated {
        session_id,
        timestamp: session.created_at,
    });

    Ok((
        StatusCode::CREATED,
        Json(FlowResponse::new(session_id, session.state.snapshot())),
    ))
}

/// GET /flow/{session_id}
pub async fn get_flow(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<FlowResponse>> {
    let session = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))?;

    tracing::debug!(session_id = %session_id, step = %session.state.step(), "Status query");
    Ok(Json(FlowResponse::new(session_id, session.state.snapshot())))
}

/// DELETE /flow/{session_id}
///
/// Visitor navigated away. A classification still in flight finds no
/// session and its result is dropped.
pub async fn delete_flow(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .remove(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))?;

    tracing::info!(session_id = %session_id, "Flow session closed");
    state.event_bus.emit_lossy(FlowEvent::FlowSessionClosed {
        session_id,
        reason: CLOSED_BY_VISITOR.to_string(),
        timestamp: Utc::now(),
    });

    Ok(StatusCode::NO_CONTENT)
}

/// POST /flow/{session_id}/start
pub async fn start_verification(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<FlowResponse>> {
    apply_action(&state, session_id, FlowState::start_verification).await
}

/// POST /flow/{session_id}/retry
pub async fn retry_upload(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<FlowResponse>> {
    apply_action(&state, session_id, FlowState::retry_upload).await
}

/// POST /flow/{session_id}/reset
pub async fn reset_flow(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<FlowResponse>> {
    apply_action(&state, session_id, |flow| Ok(flow.reset())).await
}

/// POST /flow/{session_id}/upload
///
/// Multipart upload with the screenshot in the `screenshot` field.
/// - 422 + snapshot: validation failed, flow stays in Verification
/// - 202 + snapshot: accepted, flow is in Processing, classification runs in
///   the background and reports over SSE
pub async fn upload_screenshot(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<FlowResponse>)> {
    if state.sessions.get(session_id).await.is_none() {
        return Err(session_not_found(session_id));
    }

    let artifact = read_screenshot(multipart).await?;

    let (admission, attempt, snapshot) = state
        .sessions
        .with_session(session_id, |session| {
            let admission = begin_upload(&mut session.state, artifact)?;
            if matches!(admission, UploadAdmission::Accepted { .. }) {
                session.upload_attempt += 1;
            }
            Ok::<_, FlowError>((admission, session.upload_attempt, session.state.snapshot()))
        })
        .await
        .ok_or_else(|| session_not_found(session_id))??;

    match admission {
        UploadAdmission::Rejected(reason) => {
            tracing::info!(session_id = %session_id, reason = %reason, "Screenshot rejected");
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(FlowResponse::new(session_id, snapshot)),
            ))
        }
        UploadAdmission::Accepted {
            artifact,
            transition,
        } => {
            tracing::info!(
                session_id = %session_id,
                attempt,
                size_bytes = artifact.size_bytes(),
                "Screenshot accepted, classification started"
            );
            emit_step_change(&state, session_id, &transition);
            spawn_classification(
                state.sessions.clone(),
                state.classifier.clone(),
                state.event_bus.clone(),
                session_id,
                attempt,
                artifact,
            );
            Ok((
                StatusCode::ACCEPTED,
                Json(FlowResponse::new(session_id, snapshot)),
            ))
        }
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Malformed multipart body: {}", e.body_text()))
    }
}

/// Pull the screenshot field out of a multipart body
async fn read_screenshot(mut multipart: Multipart) -> ApiResult<UploadedArtifact> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(SCREENSHOT_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let declared_mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(UploadedArtifact::new(file_name, declared_mime, bytes.to_vec()));
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        SCREENSHOT_FIELD
    )))
}
