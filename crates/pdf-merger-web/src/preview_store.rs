//! Disk-backed storage for rendered page previews.
//!
//! Instead of keeping preview images in memory, we write them to temporary
//! files and serve them lazily. Source documents are immutable once loaded,
//! so a rendered preview never goes stale; HTTP caching handles the hot
//! path at the browser level.
//!
//! ## Design: Separating Metadata from I/O
//!
//! The PreviewStore separates fast metadata operations (key tracking, path
//! generation) from slow I/O operations (reading/writing files). This allows:
//!
//! - Metadata ops inside session locks (fast, won't block other requests)
//! - File I/O outside locks with `tokio::fs` (async, won't block runtime)
//!
//! Each session gets its own temp directory that's automatically cleaned
//! up when the PreviewStore (and thus the Session) is dropped.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use pdf_merger_core::{PreviewFormat, SourceId};
use tempfile::TempDir;
use tracing::debug;

/// Disk-backed cache of rendered previews, keyed by source and page.
///
/// # Usage Pattern
///
/// ```ignore
/// // Inside session lock - fast metadata only
/// let path = session.preview_store.preview_path(source_id, page);
/// let cached = session.preview_store.has(source_id, page);
///
/// // Outside session lock - async I/O
/// let data = tokio::fs::read(&path).await?;
/// ```
pub struct PreviewStore {
    /// Temp directory - auto-cleaned on drop
    dir: TempDir,
    /// Keys of previews already rendered to disk
    stored: HashSet<(SourceId, usize)>,
    /// Image format previews are encoded in
    format: PreviewFormat,
}

impl PreviewStore {
    /// Create a new preview store with a fresh temp directory.
    pub fn new(format: PreviewFormat) -> io::Result<Self> {
        let dir = TempDir::new()?;
        debug!("Created preview store at {}", dir.path().display());
        Ok(Self {
            dir,
            stored: HashSet::new(),
            format,
        })
    }

    // =========================================================================
    // Metadata operations (fast, safe inside session locks)
    // =========================================================================

    /// Get the file path for a preview.
    ///
    /// This is a fast operation - just string concatenation.
    /// Use this inside session locks, then do I/O outside.
    pub fn preview_path(&self, source_id: SourceId, page: usize) -> PathBuf {
        self.dir
            .path()
            .join(format!("{source_id}_{page}.{}", self.format.extension()))
    }

    pub fn has(&self, source_id: SourceId, page: usize) -> bool {
        self.stored.contains(&(source_id, page))
    }

    pub const fn format(&self) -> PreviewFormat {
        self.format
    }

    /// Register that a preview has been written to disk.
    ///
    /// Call this AFTER successfully writing the file.
    pub fn mark_stored(&mut self, source_id: SourceId, page: usize) {
        self.stored.insert((source_id, page));
        debug!("Marked preview {}/{} stored", source_id, page);
    }

    /// Drop all previews of a removed source (sync).
    pub fn remove_source(&mut self, source_id: SourceId) {
        let pages: Vec<_> = self
            .stored
            .iter()
            .filter(|(id, _)| *id == source_id)
            .copied()
            .collect();
        for (id, page) in pages {
            let _ = std::fs::remove_file(self.preview_path(id, page));
            self.stored.remove(&(id, page));
        }
        debug!("Dropped previews for source {}", source_id);
    }

    /// Clear all previews (sync).
    pub fn clear(&mut self) {
        for (id, page) in &self.stored {
            let _ = std::fs::remove_file(self.preview_path(*id, *page));
        }
        self.stored.clear();
        debug!("Cleared all previews");
    }

    // =========================================================================
    // Test helpers - sync I/O for unit tests
    // =========================================================================

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.stored.len()
    }

    /// Store a preview to disk (sync, for tests).
    #[cfg(test)]
    pub fn store_sync(&mut self, source_id: SourceId, page: usize, data: &[u8]) -> io::Result<()> {
        std::fs::write(self.preview_path(source_id, page), data)?;
        self.mark_stored(source_id, page);
        Ok(())
    }

    /// Load a preview from disk (sync, for tests).
    #[cfg(test)]
    pub fn load_sync(&self, source_id: SourceId, page: usize) -> io::Result<Option<Vec<u8>>> {
        if !self.has(source_id, page) {
            return Ok(None);
        }
        Ok(Some(std::fs::read(self.preview_path(source_id, page))?))
    }
}
