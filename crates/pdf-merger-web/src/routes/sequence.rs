//! Sequence mutation routes - reorder, remove, select, clear.
//!
//! Each handler applies exactly one state transition under the session
//! write lock and answers with the workspace fragment reflecting the new
//! state. Out-of-range indices are no-ops in the core, so the fragment
//! simply re-renders the unchanged state; they are never errors.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Form;
use pdf_merger_core::{MoveDirection, SourceId};
use std::sync::Arc;

use super::{workspace_fragment, MoveForm};
use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::WorkspaceTemplate;

/// Move a page from one position to another (drag-and-drop drop target).
pub async fn move_page(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Form(form): Form<MoveForm>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| s.merger.move_page(form.from, form.to))
        .await
        .or_not_found("Session not found")?;

    workspace_fragment(&state, &session_id).await
}

/// Nudge a page one position up or down.
pub async fn nudge_page(
    State(state): State<Arc<AppState>>,
    Path((session_id, index, direction)): Path<(String, usize, String)>,
) -> RouteResult<WorkspaceTemplate> {
    let direction = MoveDirection::from_name(&direction)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Invalid direction".to_string()))?;

    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| s.merger.move_page_by(index, direction))
        .await
        .or_not_found("Session not found")?;

    workspace_fragment(&state, &session_id).await
}

/// Delete a single page from the sequence.
pub async fn remove_page(
    State(state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(String, usize)>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| s.merger.remove_page(index))
        .await
        .or_not_found("Session not found")?;

    workspace_fragment(&state, &session_id).await
}

/// Select a page for the preview panel.
pub async fn select_page(
    State(state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(String, usize)>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| s.merger.select_page(index))
        .await
        .or_not_found("Session not found")?;

    workspace_fragment(&state, &session_id).await
}

/// Remove a source and every page referencing it.
pub async fn remove_source(
    State(state): State<Arc<AppState>>,
    Path((session_id, source_id)): Path<(String, String)>,
) -> RouteResult<WorkspaceTemplate> {
    let source_id = SourceId::parse(&source_id)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Invalid source id".to_string()))?;

    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| {
            s.merger.remove_source(source_id);
            s.preview_store.remove_source(source_id);
        })
        .await
        .or_not_found("Session not found")?;

    workspace_fragment(&state, &session_id).await
}

/// Remove all sources and pages.
pub async fn clear_workspace(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| {
            s.merger.clear();
            s.preview_store.clear();
        })
        .await
        .or_not_found("Session not found")?;

    workspace_fragment(&state, &session_id).await
}
