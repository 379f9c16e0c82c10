//! Upload routes - PDF file upload handling.
//!
//! Uploads may carry several files at once. Every file is parsed to
//! completion on a blocking thread before anything is merged into the
//! session, and the merge itself happens in a single locked step: a
//! malformed file reports its own failure without touching a valid
//! sibling, and a partially parsed file can never become visible.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use axum_extra::extract::Multipart;
use pdf_merger_core::PdfDocument;
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Upload PDFs into a fresh session - redirects to the workspace page
/// (POST-Redirect-GET pattern).
pub async fn upload_new(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> RouteResult<Response> {
    let files = collect_files(multipart).await?;
    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }

    let session_id = state.create_session().await.map_err(|e| {
        error!("Failed to create session: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let failed = load_into_session(&state, &session_id, files).await?;
    redirect_to_workspace(&headers, &session_id, &failed)
}

/// Upload additional PDFs into an existing session.
///
/// New pages append at the end; the user's manual ordering of the
/// existing pages is untouched.
pub async fn upload_more(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> RouteResult<Response> {
    let files = collect_files(multipart).await?;
    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }

    let failed = load_into_session(&state, &session_id, files).await?;
    redirect_to_workspace(&headers, &session_id, &failed)
}

/// Drain the multipart body into (filename, bytes) pairs.
async fn collect_files(mut multipart: Multipart) -> RouteResult<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        if name != "files" {
            continue;
        }
        let filename = field.file_name().unwrap_or("document.pdf").to_string();
        let data = field.bytes().await.or_bad_request()?;
        files.push((filename, data.to_vec()));
    }
    Ok(files)
}

/// Parse all files on blocking threads, then merge the successes into the
/// session in one locked step. Returns the names of files that failed.
async fn load_into_session(
    state: &Arc<AppState>,
    session_id: &str,
    files: Vec<(String, Vec<u8>)>,
) -> RouteResult<Vec<String>> {
    // Spawn all parses up front so they run concurrently; parse order does
    // not matter, registration below follows input order.
    let tasks: Vec<_> = files
        .into_iter()
        .map(|(filename, data)| {
            let task = tokio::task::spawn_blocking(move || PdfDocument::from_bytes(data));
            (filename, task)
        })
        .collect();

    let mut parsed = Vec::with_capacity(tasks.len());
    for (filename, task) in tasks {
        let result = task.await.map_err(|e| {
            error!("PDF parsing task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PDF parsing failed".to_string(),
            )
        })?;
        parsed.push((filename, result));
    }

    let session = state
        .get_session(session_id)
        .await
        .or_not_found("Session not found")?;

    let (loaded, failed) = session
        .with_session_mut(|s| {
            let mut loaded = 0_usize;
            let mut failed = Vec::new();
            for (filename, result) in parsed {
                match result {
                    Ok(doc) => {
                        s.merger.add_parsed(&filename, doc);
                        loaded += 1;
                    }
                    Err(e) => {
                        error!("Failed to parse {}: {}", filename, e);
                        failed.push(filename);
                    }
                }
            }
            (loaded, failed)
        })
        .await
        .or_not_found("Session not found")?;

    info!(
        "Session {}: loaded {} files, {} failed",
        session_id,
        loaded,
        failed.len()
    );

    Ok(failed)
}

/// POST-Redirect-GET to the workspace page, carrying failed filenames.
///
/// Supports both HTMX requests (HX-Redirect header) and standard form
/// submissions (HTTP 303 See Other) for graceful degradation without
/// JavaScript.
fn redirect_to_workspace(
    headers: &HeaderMap,
    session_id: &str,
    failed: &[String],
) -> RouteResult<Response> {
    let mut redirect_url = format!("/workspace/{session_id}");
    if !failed.is_empty() {
        redirect_url.push_str("?failed=");
        redirect_url.push_str(&failed.join(","));
    }

    // Check if this is an HTMX request
    let is_htmx = headers.get("HX-Request").is_some();

    if is_htmx {
        // HX-Redirect tells HTMX to do a full page navigation
        Response::builder()
            .status(StatusCode::OK)
            .header("HX-Redirect", redirect_url)
            .body(Body::empty())
            .or_internal_error()
    } else {
        // Standard HTTP redirect for non-JS clients (303 See Other)
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, redirect_url)
            .body(Body::empty())
            .or_internal_error()
    }
}
