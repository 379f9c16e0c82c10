//! HTTP route handlers for the PDF merger web application.
//!
//! All routes return either HTML (for HTMX consumption) or binary data
//! (preview images, the merged PDF). HTML routes use Askama templates from
//! the `templates` module; every sequence mutation answers with the
//! workspace fragment so the page list and preview panel stay in sync.

mod download;
mod pages;
mod preview;
mod sequence;
mod upload;

pub use download::download_pdf;
pub use pages::{index, workspace_page};
pub use preview::preview_image;
pub use sequence::{
    clear_workspace, move_page, nudge_page, remove_page, remove_source, select_page,
};
pub use upload::{upload_more, upload_new};

use std::sync::Arc;

use serde::Deserialize as SerdeDeserialize;

use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{WorkspaceTemplate, WorkspaceView};

/// Form data for a drag-and-drop move.
#[derive(SerdeDeserialize)]
pub struct MoveForm {
    /// Index the drag started from
    pub from: usize,
    /// Index the slot was dropped at
    pub to: usize,
}

/// Query params for the workspace page.
#[derive(SerdeDeserialize, Default)]
pub struct WorkspaceQuery {
    /// Comma-separated names of files the last upload failed to load
    #[serde(default)]
    pub failed: Option<String>,
}

/// Render the workspace fragment for a session's current state.
pub async fn workspace_fragment(
    state: &Arc<AppState>,
    session_id: &str,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(session_id)
        .await
        .or_not_found("Session not found")?;

    let workspace = session
        .with_session(|s| WorkspaceView::from_merger(session_id, &s.merger))
        .await
        .or_not_found("Session not found")?;

    Ok(WorkspaceTemplate { workspace })
}
