// src/handlers/session.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{answer::SubmitSessionRequest, permission::Permission, session::SessionListParams},
    services::{
        Pagination, Viewer,
        permission_gate::{ensure, grants_all},
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Resolves the caller and whether they may see sessions they do not own.
async fn viewer_with(
    state: &AppState,
    claims: &Claims,
    required: Permission,
) -> Result<Viewer, AppError> {
    let user_id = claims.user_id()?;
    let granted = state.gate.granted(user_id).await?;
    ensure(&granted, &[required])?;

    let full_access = grants_all(&granted, &[Permission::SessionReadAny]);

    Ok(Viewer { user_id, full_access })
}

/// Submits the caller's answers for an in-progress session and grades them.
///
/// * Requires `session_update`.
/// * Returns the completed session with its earned points.
pub async fn submit_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<i64>,
    Json(payload): Json<SubmitSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    state
        .gate
        .check_permissions(user_id, &[Permission::SessionUpdate])
        .await?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let session = state
        .scoring
        .submit_session(user_id, session_id, &payload.answers)
        .await?;

    Ok(Json(session))
}

/// Returns the graded results of a completed session.
/// Owners see their own; `session_read_any` holders see any.
pub async fn get_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer_with(&state, &claims, Permission::SessionRead).await?;
    let result = state.results.get_result(viewer, session_id).await?;

    Ok(Json(result))
}

/// Lists sessions (most recently updated first).
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<SessionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer_with(&state, &claims, Permission::SessionRead).await?;
    let statuses = params.statuses()?;
    let pagination = Pagination::new(params.page, params.limit);

    let page = state.lister.list(viewer, pagination, statuses).await?;

    Ok(Json(page))
}
