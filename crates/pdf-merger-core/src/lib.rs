//! PDF Merger Core Library
//!
//! This library provides the core functionality for merging PDF documents:
//! - Permissive PDF loading and page counting
//! - An ordered page sequence with reorder/remove operations and a
//!   selection cursor that stays consistent under every mutation
//! - Assembly of a new document from pages of multiple sources
//! - Page preview rendering (PNG/WebP)

pub mod config;
pub mod error;
pub mod pdf;
pub mod registry;
pub mod sequence;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AppConfig, PreviewFormat};
pub use error::{Error, Result};
pub use pdf::{Assembled, PageRenderer, PdfDocument, SkipReason, SkippedSlot};
pub use registry::{SourceDocument, SourceId, SourceRegistry};
pub use sequence::{MoveDirection, PageSequence, PageSlot, SlotId};

use tracing::info;

/// The merge workspace: loaded sources plus the ordered page sequence.
///
/// Every user-facing operation is a method here, and each one leaves the
/// sequence and its selection cursor consistent in a single step. The
/// struct is cheap to clone (document bytes are reference-counted), so
/// callers can snapshot it and assemble from the snapshot while the
/// original keeps taking mutations.
#[derive(Debug, Clone)]
pub struct PdfMerger {
    registry: SourceRegistry,
    sequence: PageSequence,
    config: AppConfig,
}

impl PdfMerger {
    /// Create an empty workspace with the given configuration
    pub fn new(config: AppConfig) -> Self {
        Self {
            registry: SourceRegistry::new(),
            sequence: PageSequence::new(),
            config,
        }
    }

    /// Load one file and append its pages to the sequence.
    ///
    /// A failed load changes nothing.
    pub fn add_source(&mut self, display_name: impl Into<String>, bytes: Vec<u8>) -> Result<SourceId> {
        let id = self.registry.load(display_name, bytes)?;
        // Registered above, lookup cannot miss
        if let Some(source) = self.registry.get(id) {
            self.sequence.extend_from_source(source);
        }
        Ok(id)
    }

    /// Register an already-parsed document and append its pages.
    pub fn add_parsed(&mut self, display_name: impl Into<String>, document: PdfDocument) -> SourceId {
        let id = self.registry.register(display_name, document);
        if let Some(source) = self.registry.get(id) {
            self.sequence.extend_from_source(source);
        }
        id
    }

    /// Load several files submitted together, appending pages for each
    /// success in input order. Failures are reported per file and leave
    /// their siblings untouched.
    pub fn add_sources(&mut self, inputs: Vec<(String, Vec<u8>)>) -> Vec<Result<SourceId>> {
        let results = self.registry.load_batch(inputs);
        for id in results.iter().filter_map(|r| r.as_ref().ok()) {
            if let Some(source) = self.registry.get(*id) {
                self.sequence.extend_from_source(source);
            }
        }
        results
    }

    /// Remove a source and cascade-remove its page slots.
    pub fn remove_source(&mut self, id: SourceId) -> bool {
        let Some(source) = self.registry.remove(id) else {
            return false;
        };
        let removed = self.sequence.remove_source(id);
        info!(
            "Removed source {} and {} of its pages",
            source.display_name(),
            removed
        );
        true
    }

    /// Move a page from one position to another (drag-and-drop).
    pub fn move_page(&mut self, source_index: usize, dest_index: usize) -> bool {
        self.sequence.move_to(source_index, dest_index)
    }

    /// Nudge a page one position up or down.
    pub fn move_page_by(&mut self, index: usize, direction: MoveDirection) -> bool {
        self.sequence.move_by(index, direction)
    }

    /// Delete a single page from the sequence.
    pub fn remove_page(&mut self, index: usize) -> Option<PageSlot> {
        self.sequence.remove_at(index)
    }

    /// Select a page for preview.
    pub fn select_page(&mut self, index: usize) -> bool {
        self.sequence.select(index)
    }

    pub fn clear_selection(&mut self) {
        self.sequence.clear_selection();
    }

    /// Remove all sources and pages.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.sequence.clear();
    }

    pub const fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub const fn sequence(&self) -> &PageSequence {
        &self.sequence
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The selected slot together with its source, for preview rendering.
    pub fn selected_page(&self) -> Option<(&PageSlot, &SourceDocument)> {
        let slot = self.sequence.selected_slot()?;
        let source = self.registry.get(slot.source_id())?;
        Some((slot, source))
    }

    /// Assemble the output document from the current sequence.
    pub fn assemble(&self) -> Result<Assembled> {
        pdf::assemble(self.sequence.slots(), &self.registry)
    }

    /// Filename for the assembled output (`<prefix>_<unix-millis>.pdf`).
    pub fn output_filename(&self) -> String {
        util::output_filename(&self.config.output_prefix)
    }

    /// Render a preview image for one page of a loaded source, using the
    /// configured scale and format.
    pub fn render_preview(&self, source_id: SourceId, page_index: usize) -> Result<Vec<u8>> {
        let source = self.registry.get(source_id).ok_or_else(|| Error::PdfRender {
            page: page_index,
            reason: format!("source {source_id} is not loaded"),
        })?;
        let renderer = PageRenderer::with_scale(source.document(), self.config.render_scale);
        match self.config.preview_format {
            PreviewFormat::Png => renderer.render_page_png(page_index),
            PreviewFormat::Webp => renderer.render_page_webp(page_index),
        }
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Convenience function to render a page from a document as PNG
pub fn render_page(doc: &PdfDocument, page_num: usize, scale: f32) -> Result<Vec<u8>> {
    let renderer = PageRenderer::with_scale(doc, scale);
    renderer.render_page_png(page_num)
}

/// Convenience function to render a page from a document as WebP (lossy)
pub fn render_page_webp(doc: &PdfDocument, page_num: usize, scale: f32) -> Result<Vec<u8>> {
    let renderer = PageRenderer::with_scale(doc, scale);
    renderer.render_page_webp(page_num)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::minimal_pdf;

    #[test]
    fn test_add_source_appends_slots() {
        let mut merger = PdfMerger::default();
        let id = merger.add_source("a.pdf", minimal_pdf(&["1", "2"])).unwrap();

        assert_eq!(merger.registry().len(), 1);
        assert_eq!(merger.sequence().len(), 2);
        assert!(merger
            .sequence()
            .slots()
            .iter()
            .all(|s| s.source_id() == id));
    }

    #[test]
    fn test_remove_source_cascades() {
        let mut merger = PdfMerger::default();
        let a = merger.add_source("a.pdf", minimal_pdf(&["1", "2"])).unwrap();
        let b = merger.add_source("b.pdf", minimal_pdf(&["3"])).unwrap();

        assert!(merger.remove_source(a));
        assert_eq!(merger.registry().len(), 1);
        assert_eq!(merger.sequence().len(), 1);
        assert_eq!(merger.sequence().get(0).unwrap().source_id(), b);

        assert!(!merger.remove_source(a));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut merger = PdfMerger::default();
        merger.add_source("a.pdf", minimal_pdf(&["1"])).unwrap();
        merger.select_page(0);

        merger.clear();
        assert!(merger.registry().is_empty());
        assert!(merger.sequence().is_empty());
        assert_eq!(merger.sequence().selected(), None);
    }

    #[test]
    fn test_selected_page_pairs_slot_with_source() {
        let mut merger = PdfMerger::default();
        let id = merger.add_source("a.pdf", minimal_pdf(&["1"])).unwrap();

        assert!(merger.selected_page().is_none());
        merger.select_page(0);
        let (slot, source) = merger.selected_page().unwrap();
        assert_eq!(slot.source_id(), id);
        assert_eq!(source.id(), id);
    }
}
