//! Preview route - rendered page images.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use pdf_merger_core::SourceId;
use std::sync::Arc;

use crate::helpers::{validate_page, OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Get a page preview image.
///
/// Sources are immutable once loaded, so previews are cached aggressively:
/// on disk per session, and in the browser via an ETag derived from the
/// document's content hash.
pub async fn preview_image(
    State(state): State<Arc<AppState>>,
    Path((session_id, source_id, page)): Path<(String, String, usize)>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let source_id = SourceId::parse(&source_id)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Invalid source id".to_string()))?;

    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Gather metadata inside the lock (fast)
    let (content_id, page_count, cached, path, format) = session
        .with_session(|s| {
            s.merger.registry().get(source_id).map(|source| {
                (
                    source.document().content_id().to_string(),
                    source.page_count(),
                    s.preview_store.has(source_id, page),
                    s.preview_store.preview_path(source_id, page),
                    s.preview_store.format(),
                )
            })
        })
        .await
        .or_not_found("Session not found")?
        .or_not_found("Source not found")?;

    validate_page(page, page_count)?;

    let scale = state.config.render_scale;
    let etag = format!("\"{content_id}-{page}-{}-{scale}\"", format.extension());

    // Check If-None-Match header for 304 response
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.to_str().ok() == Some(etag.as_str())
    {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .body(Body::empty())
            .or_internal_error();
    }

    let image_data = if cached {
        // Load from the preview store (async, outside lock)
        tokio::fs::read(&path).await.or_internal_error()?
    } else {
        // Snapshot the merger inside the lock (O(1) - Arc'd bytes), render
        // in a blocking task to avoid stalling the async runtime.
        let merger = session
            .with_session(|s| s.merger.clone())
            .await
            .or_not_found("Session not found")?;

        let image_data = tokio::task::spawn_blocking(move || {
            merger.render_preview(source_id, page)
        })
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Render task panicked: {e}"),
            )
        })?
        .or_internal_error()?;

        // Persist for next time; only mark stored after a successful write.
        if tokio::fs::write(&path, &image_data).await.is_ok() {
            session
                .with_session_mut(|s| s.preview_store.mark_stored(source_id, page))
                .await;
        }

        image_data
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, "private, max-age=3600, immutable")
        .body(Body::from(image_data))
        .or_internal_error()
}
