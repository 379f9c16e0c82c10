//! Page routes - full HTML page renders.

use axum::extract::{Path, Query, State};
use std::sync::Arc;

use super::WorkspaceQuery;
use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{AppTemplate, IndexTemplate, WorkspaceView};

/// Landing page with upload form.
pub async fn index() -> IndexTemplate {
    IndexTemplate
}

/// The merge workspace (for direct URL access and post-upload redirects).
pub async fn workspace_page(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
) -> RouteResult<AppTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let workspace = session
        .with_session(|s| WorkspaceView::from_merger(&session_id, &s.merger))
        .await
        .or_not_found("Session not found")?;

    let failed = query
        .failed
        .map(|names| names.split(',').map(str::to_string).collect())
        .unwrap_or_default();

    Ok(AppTemplate { workspace, failed })
}
