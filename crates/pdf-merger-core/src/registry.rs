//! Loaded source documents, keyed by stable id and kept in load order.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::pdf::PdfDocument;

/// Stable identifier for a loaded source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceId(Uuid);

impl SourceId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its string form (e.g. out of a URL path).
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One loaded input file: the parsed document plus display bookkeeping.
///
/// Read-only once created; destroyed by explicit removal from the registry.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    id: SourceId,
    display_name: String,
    document: PdfDocument,
}

impl SourceDocument {
    pub const fn id(&self) -> SourceId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub const fn document(&self) -> &PdfDocument {
        &self.document
    }

    pub const fn page_count(&self) -> usize {
        self.document.page_count()
    }
}

/// Owns the loaded sources, in load order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDocument>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-parsed document under a fresh id.
    ///
    /// Callers that parse on another thread (e.g. a web upload) use this to
    /// merge only fully-completed loads into the registry.
    pub fn register(
        &mut self,
        display_name: impl Into<String>,
        document: PdfDocument,
    ) -> SourceId {
        let display_name = display_name.into();
        let id = SourceId::new();
        info!(
            "Loaded {} ({} pages) as source {}",
            display_name,
            document.page_count(),
            id
        );
        self.sources.push(SourceDocument {
            id,
            display_name,
            document,
        });
        id
    }

    /// Parse `bytes` and register the result under a fresh id.
    ///
    /// A failed parse leaves the registry exactly as before the call.
    pub fn load(&mut self, display_name: impl Into<String>, bytes: Vec<u8>) -> Result<SourceId> {
        let document = PdfDocument::from_bytes(bytes)?;
        Ok(self.register(display_name, document))
    }

    /// Load several files submitted together, reporting success or failure
    /// per file.
    ///
    /// All inputs are parsed before anything is registered, so a partially
    /// parsed file can never become visible and a malformed file never
    /// affects a valid sibling. Successes register in input order.
    pub fn load_batch(
        &mut self,
        inputs: Vec<(String, Vec<u8>)>,
    ) -> Vec<Result<SourceId>> {
        let parsed: Vec<(String, Result<PdfDocument>)> = inputs
            .into_iter()
            .map(|(name, bytes)| {
                let result = PdfDocument::from_bytes(bytes);
                (name, result)
            })
            .collect();

        parsed
            .into_iter()
            .map(|(display_name, result)| Ok(self.register(display_name, result?)))
            .collect()
    }

    /// Delete a source, returning it. The caller cascade-removes any page
    /// slots that referenced it.
    pub fn remove(&mut self, id: SourceId) -> Option<SourceDocument> {
        let index = self.sources.iter().position(|s| s.id == id)?;
        let source = self.sources.remove(index);
        debug!("Removed source {} ({})", id, source.display_name);
        Some(source)
    }

    /// Remove all sources.
    pub fn clear(&mut self) {
        debug!("Cleared {} sources", self.sources.len());
        self.sources.clear();
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceDocument> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate sources in load order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceDocument> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_support::minimal_pdf;

    #[test]
    fn test_load_and_get() {
        let mut registry = SourceRegistry::new();
        let id = registry.load("doc.pdf", minimal_pdf(&["one", "two"])).unwrap();

        let source = registry.get(id).unwrap();
        assert_eq!(source.display_name(), "doc.pdf");
        assert_eq!(source.page_count(), 2);
        assert!(registry.contains(id));
    }

    #[test]
    fn test_failed_load_leaves_registry_untouched() {
        let mut registry = SourceRegistry::new();
        registry.load("ok.pdf", minimal_pdf(&["page"])).unwrap();

        let result = registry.load("bad.pdf", vec![0, 1, 2, 3]);
        assert!(matches!(result, Err(Error::PdfOpen(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_batch_reports_per_file() {
        let mut registry = SourceRegistry::new();
        let results = registry.load_batch(vec![
            ("good.pdf".to_string(), minimal_pdf(&["a"])),
            ("broken.pdf".to_string(), b"not a pdf".to_vec()),
            ("also-good.pdf".to_string(), minimal_pdf(&["b", "c"])),
        ]);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::PdfOpen(_))));
        assert!(results[2].is_ok());

        // Only the successes registered, in input order.
        assert_eq!(registry.len(), 2);
        let names: Vec<_> = registry.iter().map(SourceDocument::display_name).collect();
        assert_eq!(names, vec!["good.pdf", "also-good.pdf"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut registry = SourceRegistry::new();
        let a = registry.load("a.pdf", minimal_pdf(&["a"])).unwrap();
        let b = registry.load("b.pdf", minimal_pdf(&["b"])).unwrap();

        let removed = registry.remove(a).unwrap();
        assert_eq!(removed.id(), a);
        assert!(!registry.contains(a));
        assert!(registry.contains(b));
        assert!(registry.remove(a).is_none());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_source_id_parse_round_trip() {
        let mut registry = SourceRegistry::new();
        let id = registry.load("a.pdf", minimal_pdf(&["a"])).unwrap();

        let parsed = SourceId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(SourceId::parse("not-a-uuid").is_none());
    }
}
