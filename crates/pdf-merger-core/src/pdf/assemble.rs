//! Assembly of the output document.
//!
//! Walks the page sequence in order, copying each referenced page out of
//! its source document into a fresh output PDF. Sources are loaded into
//! lopdf once each and renumbered into disjoint object-id ranges; pages
//! referenced more than once are cloned under fresh ids so every kid in
//! the output page tree is a distinct object.
//!
//! A slot whose source has vanished, fails to load, or whose page index is
//! out of range is skipped and reported, not fatal. Assembly only fails
//! when no page at all could be copied.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::registry::{SourceId, SourceRegistry};
use crate::sequence::{PageSlot, SlotId};

/// Page attributes that may be inherited from ancestor page-tree nodes.
/// The source trees are not carried into the output, so these must be
/// resolved onto each page before it is copied.
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Why a queued page did not make it into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The slot's source is no longer in the registry
    SourceMissing,
    /// The source bytes could not be loaded for page copying
    SourceUnreadable,
    /// The slot's page index exceeds the source's page count
    PageOutOfRange { total: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceMissing => write!(f, "source no longer loaded"),
            Self::SourceUnreadable => write!(f, "source could not be read"),
            Self::PageOutOfRange { total } => {
                write!(f, "page index out of range (source has {total} pages)")
            }
        }
    }
}

/// A slot that was skipped during assembly. Surfaced as a warning to the
/// caller; never aborts the rest of the assembly.
#[derive(Debug, Clone)]
pub struct SkippedSlot {
    pub slot: SlotId,
    pub source_id: SourceId,
    pub page_index: usize,
    pub reason: SkipReason,
}

/// Result of a successful assembly.
pub struct Assembled {
    /// The output document bytes
    pub bytes: Vec<u8>,
    /// Slots that could not be copied (empty on a clean run)
    pub skipped: Vec<SkippedSlot>,
}

/// Pages of one source, loaded and renumbered, ready to copy from.
enum LoadedSource {
    /// Page dictionaries in page order, inheritable attributes resolved
    Ready(Vec<(ObjectId, Dictionary)>),
    Unreadable,
}

/// Copy the pages referenced by `slots`, in slot order, into a single new
/// PDF document.
pub fn assemble(slots: &[PageSlot], registry: &SourceRegistry) -> Result<Assembled> {
    if slots.is_empty() {
        return Err(Error::AssembleEmpty { skipped: 0 });
    }

    // Phase 1: load each referenced source once, renumbering object ids
    // into disjoint ranges, and harvest everything the pages may point at.
    let mut max_id: u32 = 1;
    let mut loaded: HashMap<SourceId, LoadedSource> = HashMap::new();
    let mut harvested: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for slot in slots {
        let source_id = slot.source_id();
        if loaded.contains_key(&source_id) {
            continue;
        }
        // A source absent from the registry gets no entry; phase 2 reports
        // its slots as SourceMissing.
        let Some(source) = registry.get(source_id) else {
            continue;
        };

        match Document::load_mem(source.document().bytes()) {
            Ok(mut doc) => {
                doc.renumber_objects_with(max_id);
                max_id = doc.max_id + 1;

                // get_pages is keyed by 1-based page number, so iteration
                // yields the pages in document order.
                let mut pages = Vec::new();
                for page_id in doc.get_pages().into_values() {
                    if let Ok(object) = doc.get_object(page_id)
                        && let Ok(dict) = object.as_dict()
                    {
                        let mut dict = dict.clone();
                        resolve_inherited(&mut dict, &doc);
                        pages.push((page_id, dict));
                    }
                }
                debug!(
                    "Staged {} pages from {} for assembly",
                    pages.len(),
                    source.display_name()
                );

                for (object_id, object) in doc.objects {
                    match object.type_name().unwrap_or(b"") {
                        b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                        _ => {
                            harvested.insert(object_id, object);
                        }
                    }
                }

                loaded.insert(source_id, LoadedSource::Ready(pages));
            }
            Err(e) => {
                warn!("Failed to load source {} for assembly: {}", source_id, e);
                loaded.insert(source_id, LoadedSource::Unreadable);
            }
        }
    }

    // Phase 2: walk the slots in order, wiring each referenced page into
    // the new page tree.
    let pages_root_id: ObjectId = (max_id, 0);
    max_id += 1;

    let mut skipped = Vec::new();
    let mut kids: Vec<ObjectId> = Vec::new();
    let mut out_pages: Vec<(ObjectId, Dictionary)> = Vec::new();

    for slot in slots {
        let skip = |reason: SkipReason| SkippedSlot {
            slot: slot.id(),
            source_id: slot.source_id(),
            page_index: slot.page_index(),
            reason,
        };

        let pages = match loaded.get(&slot.source_id()) {
            Some(LoadedSource::Ready(pages)) => pages,
            Some(LoadedSource::Unreadable) => {
                skipped.push(skip(SkipReason::SourceUnreadable));
                continue;
            }
            None => {
                skipped.push(skip(SkipReason::SourceMissing));
                continue;
            }
        };

        let Some((page_id, dict)) = pages.get(slot.page_index()) else {
            skipped.push(skip(SkipReason::PageOutOfRange { total: pages.len() }));
            continue;
        };

        let mut dict = dict.clone();
        dict.set("Parent", Object::Reference(pages_root_id));

        // A page queued more than once gets a fresh id for each repeat;
        // the clones share their Contents/Resources references.
        let out_id = if kids.contains(page_id) {
            let fresh = (max_id, 0);
            max_id += 1;
            fresh
        } else {
            *page_id
        };

        out_pages.push((out_id, dict));
        kids.push(out_id);
    }

    for skip in &skipped {
        warn!(
            "Skipping page {} of source {}: {}",
            skip.page_index + 1,
            skip.source_id,
            skip.reason
        );
    }

    if kids.is_empty() {
        return Err(Error::AssembleEmpty {
            skipped: skipped.len(),
        });
    }

    // Phase 3: emit the output document.
    let mut document = Document::with_version("1.5");
    document.objects.extend(harvested);
    for (object_id, dict) in out_pages {
        document.objects.insert(object_id, Object::Dictionary(dict));
    }

    #[allow(clippy::cast_possible_truncation)]
    let total_pages = kids.len() as u32;

    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        (
            "Kids",
            Object::Array(kids.into_iter().map(Object::Reference).collect()),
        ),
        ("Count", Object::Integer(i64::from(total_pages))),
    ]);
    document
        .objects
        .insert(pages_root_id, Object::Dictionary(pages_dict));

    let catalog_id: ObjectId = (max_id, 0);
    let catalog_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_root_id)),
    ]);
    document
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    document.trailer.set("Root", Object::Reference(catalog_id));
    document.max_id = max_id;

    document.renumber_objects();
    document.compress();

    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|e| Error::PdfSave(format!("Failed to save assembled PDF: {e}")))?;

    debug!(
        "Assembled {} pages ({} skipped, {} bytes)",
        total_pages,
        skipped.len(),
        output.len()
    );

    Ok(Assembled {
        bytes: output,
        skipped,
    })
}

/// Copy inheritable attributes down onto a page dictionary by walking its
/// Parent chain inside the source document.
fn resolve_inherited(dict: &mut Dictionary, doc: &Document) {
    for key in INHERITABLE_PAGE_KEYS {
        if dict.get(key).is_ok() {
            continue;
        }
        if let Some(value) = lookup_inherited(doc, dict, key) {
            dict.set(key, value);
        }
    }
}

fn lookup_inherited(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = dict.get(b"Parent").ok().cloned();
    while let Some(Object::Reference(parent_id)) = parent {
        let node = doc.get_object(parent_id).ok()?.as_dict().ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").ok().cloned();
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sequence::PageSequence;
    use crate::test_support::{minimal_pdf, page_texts};

    fn setup(
        a_pages: &[&str],
        b_pages: &[&str],
    ) -> (SourceRegistry, PageSequence, SourceId, SourceId) {
        // Flattened sequence over two loaded sources, in load order.
        let mut registry = SourceRegistry::new();
        let a = registry.load("a.pdf", minimal_pdf(a_pages)).unwrap();
        let b = registry.load("b.pdf", minimal_pdf(b_pages)).unwrap();

        let mut sequence = PageSequence::new();
        for source in registry.iter() {
            sequence.extend_from_source(source);
        }
        (registry, sequence, a, b)
    }

    #[test]
    fn test_assemble_empty_sequence_fails() {
        let registry = SourceRegistry::new();
        let result = assemble(&[], &registry);
        assert!(matches!(result, Err(Error::AssembleEmpty { skipped: 0 })));
    }

    #[test]
    fn test_assemble_keeps_sequence_order() {
        let (registry, mut sequence, ..) = setup(&["A1", "A2"], &["B1", "B2"]);
        // [a0, a1, b0, b1] -> [b1, a0, a1, b0]
        sequence.move_to(3, 0);

        let assembled = assemble(sequence.slots(), &registry).unwrap();
        assert!(assembled.skipped.is_empty());
        assert!(assembled.bytes.starts_with(b"%PDF"));

        let texts = page_texts(&assembled.bytes);
        assert_eq!(texts, vec!["B2", "A1", "A2", "B1"]);
    }

    #[test]
    fn test_assemble_repeated_page() {
        let (registry, sequence, ..) = setup(&["A1", "A2"], &["B1"]);

        // The same physical page queued twice, as an order spec allows.
        let mut slots = sequence.slots().to_vec();
        slots.push(slots[0].clone());

        let assembled = assemble(&slots, &registry).unwrap();
        assert!(assembled.skipped.is_empty());
        assert_eq!(page_texts(&assembled.bytes), vec!["A1", "A2", "B1", "A1"]);
    }

    #[test]
    fn test_assemble_interleaved_sources() {
        let (registry, mut sequence, a, b) = setup(&["A1", "A2"], &["B1", "B2"]);

        // [a0, a1, b0, b1] -> drop b0 -> [a0, a1, b1] -> move b1 between
        // the two a pages -> [a0, b1, a1]
        sequence.remove_at(2);
        sequence.move_to(2, 1);

        let refs: Vec<_> = sequence
            .slots()
            .iter()
            .map(|s| (s.source_id(), s.page_index()))
            .collect();
        assert_eq!(refs, vec![(a, 0), (b, 1), (a, 1)]);

        let assembled = assemble(sequence.slots(), &registry).unwrap();
        assert!(assembled.skipped.is_empty());
        assert_eq!(page_texts(&assembled.bytes), vec!["A1", "B2", "A2"]);
    }

    #[test]
    fn test_assemble_missing_source_skips_not_fails() {
        let (mut registry, sequence, a, _b) = setup(&["A1", "A2"], &["B1"]);

        // Remove a source from the registry but keep the stale slots, as
        // if cascade-removal had been bypassed.
        registry.remove(a);

        let assembled = assemble(sequence.slots(), &registry).unwrap();
        assert_eq!(assembled.skipped.len(), 2);
        assert!(assembled
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::SourceMissing && s.source_id == a));
        assert_eq!(page_texts(&assembled.bytes), vec!["B1"]);
    }

    #[test]
    fn test_assemble_all_skipped_fails() {
        let (mut registry, sequence, a, b) = setup(&["A1"], &["B1"]);
        registry.remove(a);
        registry.remove(b);
        assert_eq!(sequence.len(), 2);

        let result = assemble(sequence.slots(), &registry);
        assert!(matches!(result, Err(Error::AssembleEmpty { skipped: 2 })));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let (registry, mut sequence, ..) = setup(&["A1", "A2", "A3"], &["B1"]);
        sequence.move_to(0, 3);

        let first = assemble(sequence.slots(), &registry).unwrap();
        let second = assemble(sequence.slots(), &registry).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_assembled_output_is_parseable() {
        let (registry, sequence, ..) = setup(&["A1"], &["B1", "B2"]);

        let assembled = assemble(sequence.slots(), &registry).unwrap();
        let reloaded = Document::load_mem(&assembled.bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 3);
    }
}
