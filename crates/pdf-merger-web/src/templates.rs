//! Askama templates for HTMX responses.
//!
//! ## HTMX Patterns Used
//!
//! - Every sequence mutation returns the `partials/workspace.html` fragment,
//!   which replaces `#workspace` wholesale - the page list and preview panel
//!   always reflect the post-mutation state in one swap
//! - `hx-disabled-elt` prevents double-clicks during requests
//! - Drag-and-drop lives in `static/app.js`; it translates a drop into a
//!   single POST to the move endpoint
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with CSS/JS
//! - `index.html` - Landing page with upload form
//! - `app.html` - Main app after upload
//! - `partials/workspace.html` - Page list + preview panel fragment

use askama::Template;
use askama_web::WebTemplate;
use pdf_merger_core::PdfMerger;

/// One row in the page list.
pub struct PageEntry {
    pub index: usize,
    pub label: String,
    pub selected: bool,
    pub source_id: String,
    pub page_index: usize,
}

/// One loaded source, for the sources sidebar.
pub struct SourceEntry {
    pub id: String,
    pub name: String,
    pub page_count: usize,
}

/// The currently selected page, for the preview panel.
pub struct PreviewEntry {
    pub source_id: String,
    pub page_index: usize,
    pub label: String,
}

/// Snapshot of a session's merge state, shaped for rendering.
pub struct WorkspaceView {
    pub session_id: String,
    pub entries: Vec<PageEntry>,
    pub sources: Vec<SourceEntry>,
    pub preview: Option<PreviewEntry>,
}

impl WorkspaceView {
    /// Build a view from the merger state. Runs inside the session lock;
    /// does nothing but clone strings.
    pub fn from_merger(session_id: &str, merger: &PdfMerger) -> Self {
        let selected = merger.sequence().selected();

        let entries = merger
            .sequence()
            .slots()
            .iter()
            .enumerate()
            .map(|(index, slot)| PageEntry {
                index,
                label: slot.label().to_string(),
                selected: selected == Some(index),
                source_id: slot.source_id().to_string(),
                page_index: slot.page_index(),
            })
            .collect();

        let sources = merger
            .registry()
            .iter()
            .map(|source| SourceEntry {
                id: source.id().to_string(),
                name: source.display_name().to_string(),
                page_count: source.page_count(),
            })
            .collect();

        let preview = merger.selected_page().map(|(slot, _)| PreviewEntry {
            source_id: slot.source_id().to_string(),
            page_index: slot.page_index(),
            label: slot.label().to_string(),
        });

        Self {
            session_id: session_id.to_string(),
            entries,
            sources,
            preview,
        }
    }
}

// =============================================================================
// Full Page Templates
// =============================================================================

/// Landing page with upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Main app page after upload.
///
/// Shows the page list, sources sidebar, and preview panel.
#[derive(Template, WebTemplate)]
#[template(path = "app.html")]
pub struct AppTemplate {
    pub workspace: WorkspaceView,
    /// Names of files that failed to load in the last upload
    pub failed: Vec<String>,
}

// =============================================================================
// Fragment Templates (HTMX partial responses)
// =============================================================================

/// Workspace fragment returned by every sequence mutation.
#[derive(Template, WebTemplate)]
#[template(path = "partials/workspace.html")]
pub struct WorkspaceTemplate {
    pub workspace: WorkspaceView,
}
