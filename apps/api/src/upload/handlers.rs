//! Axum route handlers for the upload page and stored resumes.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{resume_key, ResumeRecord};
use crate::state::AppState;
use crate::upload::form::read_upload_form;
use crate::upload::page::{FormFields, PageSnapshot, UploadPage};
use crate::upload::pipeline::analyse;

async fn find_page(state: &AppState, id: Uuid) -> Result<Arc<UploadPage>, AppError> {
    state
        .pages
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Upload session {id} not found")))
}

/// POST /api/v1/upload/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<PageSnapshot>) {
    let page = state.pages.open().await;
    (StatusCode::CREATED, Json(page.snapshot().await))
}

/// GET /api/v1/upload/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PageSnapshot>, AppError> {
    let page = find_page(&state, id).await?;
    Ok(Json(page.snapshot().await))
}

/// PUT /api/v1/upload/sessions/:id/file
///
/// Expects a multipart body with a `file` part.
pub async fn handle_select_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<PageSnapshot>, AppError> {
    let page = find_page(&state, id).await?;
    let form = read_upload_form(multipart, state.config.max_upload_bytes).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::Validation("A file part is required".to_string()))?;
    Ok(Json(page.select_file(Some(file)).await?))
}

/// DELETE /api/v1/upload/sessions/:id/file
pub async fn handle_clear_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PageSnapshot>, AppError> {
    let page = find_page(&state, id).await?;
    Ok(Json(page.select_file(None).await?))
}

/// POST /api/v1/upload/sessions/:id/submit
///
/// Starts the analysis in the background and returns 202. Without a selected
/// file nothing happens and the unchanged page comes back with 200. Once the
/// run ends the session stays readable for `session_retention`, then is dropped.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(fields): Json<FormFields>,
) -> Result<(StatusCode, Json<PageSnapshot>), AppError> {
    let page = find_page(&state, id).await?;
    let Some(submission) = page.begin(fields).await? else {
        return Ok((StatusCode::OK, Json(page.snapshot().await)));
    };

    info!("Upload session {id}: analysing {}", submission.file.name);
    let services = state.services.clone();
    let pages = state.pages.clone();
    let retention = state.config.session_retention;
    let running = page.clone();
    tokio::spawn(async move {
        let outcome = analyse(&services, submission, running.as_ref()).await;
        running.finish(&outcome).await;
        drop(running);

        tokio::time::sleep(retention).await;
        pages.remove(id).await;
        debug!("Upload session {id} expired");
    });

    Ok((StatusCode::ACCEPTED, Json(page.snapshot().await)))
}

/// POST /api/v1/upload
///
/// One-shot form post: selects the file, submits, and waits for the pipeline
/// to finish or stall before responding. The page is never registered, so
/// nothing outlives the request.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PageSnapshot>, AppError> {
    let form = read_upload_form(multipart, state.config.max_upload_bytes).await?;
    let page = UploadPage::new(Uuid::new_v4());
    page.select_file(form.file).await?;

    if let Some(submission) = page.begin(form.fields).await? {
        info!("Upload session {}: analysing {}", page.id(), submission.file.name);
        let outcome = analyse(&state.services, submission, &page).await;
        page.finish(&outcome).await;
    }

    Ok(Json(page.snapshot().await))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    let raw = state
        .services
        .kv
        .get(&resume_key(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let record: ResumeRecord = serde_json::from_str(&raw)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored resume {id} is corrupt: {e}")))?;
    Ok(Json(record))
}
