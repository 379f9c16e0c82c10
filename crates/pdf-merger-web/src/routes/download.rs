//! Download route - assembled PDF download.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use pdf_merger_core::Error;
use std::sync::Arc;
use tracing::warn;

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Assemble the current page sequence and download the result.
///
/// Assembly runs on a blocking thread against a snapshot taken under the
/// lock, so in-flight edits neither block on nor tear the output.
pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Snapshot inside the lock (O(1) - document bytes are Arc'd)
    let merger = session
        .with_session(|s| s.merger.clone())
        .await
        .or_not_found("Session not found")?;

    if merger.sequence().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No pages to merge".to_string()));
    }

    let download_name = merger.output_filename();

    let assembled = tokio::task::spawn_blocking(move || merger.assemble())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Assembly task panicked: {e}"),
            )
        })?
        .map_err(|e| match e {
            Error::AssembleEmpty { skipped } => (
                StatusCode::BAD_REQUEST,
                format!("No pages could be merged ({skipped} skipped)"),
            ),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;

    for skip in &assembled.skipped {
        warn!(
            "Session {}: skipped page {} of source {}: {}",
            session_id,
            skip.page_index + 1,
            skip.source_id,
            skip.reason
        );
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{download_name}\""),
        )
        .body(Body::from(assembled.bytes))
        .or_internal_error()
}
