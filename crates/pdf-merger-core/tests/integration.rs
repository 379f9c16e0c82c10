//! Integration tests for pdf-merger-core
//!
//! These tests verify the end-to-end workflow:
//! - Loading batches of sources, including malformed siblings
//! - Sequence mutations with a live selection cursor
//! - Assembly of the output document from a mutated sequence

#![allow(clippy::unwrap_used)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};
use pdf_merger_core::{Error, MoveDirection, PdfMerger, SkipReason};

// =============================================================================
// Test Fixtures
// =============================================================================

/// Build a small PDF with one page per entry, each page showing its text.
fn fixture_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut page_ids = Vec::with_capacity(page_texts.len());
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };

        let content_bytes = content.encode().unwrap();
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let page_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]));
        page_ids.push(page_id);
    }

    #[allow(clippy::cast_possible_wrap)]
    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
        ),
        ("Count", Object::Integer(page_ids.len() as i64)),
    ]);
    doc.objects
        .insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Extract the text of every page of an assembled document, in page order.
fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_keys()
        .map(|page_num| {
            doc.extract_text(&[page_num])
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .collect()
}

// =============================================================================
// Loading Tests
// =============================================================================

#[test]
fn test_batch_load_with_malformed_sibling() {
    let mut merger = PdfMerger::default();

    let results = merger.add_sources(vec![
        ("good.pdf".to_string(), fixture_pdf(&["G1", "G2"])),
        ("broken.pdf".to_string(), b"definitely not a pdf".to_vec()),
    ]);

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::PdfOpen(_))));

    // The valid file is fully available, the broken one left no trace.
    assert_eq!(merger.registry().len(), 1);
    assert_eq!(merger.sequence().len(), 2);
}

#[test]
fn test_load_order_determines_initial_sequence() {
    let mut merger = PdfMerger::default();
    merger.add_source("b.pdf", fixture_pdf(&["B1"])).unwrap();
    merger.add_source("a.pdf", fixture_pdf(&["A1", "A2"])).unwrap();

    let labels: Vec<_> = merger
        .sequence()
        .slots()
        .iter()
        .map(|s| s.label().to_string())
        .collect();
    assert_eq!(labels, vec!["b.pdf - p.1", "a.pdf - p.1", "a.pdf - p.2"]);
}

#[test]
fn test_late_load_appends_and_preserves_reordering() {
    let mut merger = PdfMerger::default();
    merger.add_source("a.pdf", fixture_pdf(&["A1", "A2"])).unwrap();

    // User flips the two pages, then loads another file.
    merger.move_page(0, 1);
    merger.add_source("b.pdf", fixture_pdf(&["B1"])).unwrap();

    let labels: Vec<_> = merger
        .sequence()
        .slots()
        .iter()
        .map(|s| s.label().to_string())
        .collect();
    assert_eq!(labels, vec!["a.pdf - p.2", "a.pdf - p.1", "b.pdf - p.1"]);
}

// =============================================================================
// Assembly Tests
// =============================================================================

#[test]
fn test_assemble_interleaved_sources() {
    let mut merger = PdfMerger::default();
    merger.add_source("a.pdf", fixture_pdf(&["A1", "A2"])).unwrap();
    merger.add_source("b.pdf", fixture_pdf(&["B1", "B2"])).unwrap();

    // [A1, A2, B1, B2] -> remove B1 -> [A1, A2, B2] -> move B2 into the
    // middle -> [A1, B2, A2]
    merger.remove_page(2);
    merger.move_page(2, 1);

    let assembled = merger.assemble().unwrap();
    assert!(assembled.skipped.is_empty());
    assert!(assembled.bytes.starts_with(b"%PDF"));
    assert_eq!(page_texts(&assembled.bytes), vec!["A1", "B2", "A2"]);
}

#[test]
fn test_assemble_after_source_removal() {
    let mut merger = PdfMerger::default();
    let a = merger.add_source("a.pdf", fixture_pdf(&["A1", "A2"])).unwrap();
    merger.add_source("b.pdf", fixture_pdf(&["B1"])).unwrap();

    merger.remove_source(a);

    let assembled = merger.assemble().unwrap();
    assert!(assembled.skipped.is_empty());
    assert_eq!(page_texts(&assembled.bytes), vec!["B1"]);
}

#[test]
fn test_assemble_empty_workspace_fails() {
    let merger = PdfMerger::default();
    assert!(matches!(
        merger.assemble(),
        Err(Error::AssembleEmpty { skipped: 0 })
    ));
}

#[test]
fn test_assemble_from_snapshot_matches_live_state() {
    let mut merger = PdfMerger::default();
    merger.add_source("a.pdf", fixture_pdf(&["A1", "A2"])).unwrap();
    merger.move_page(0, 1);

    // Snapshot, then keep mutating the original.
    let snapshot = merger.clone();
    merger.remove_page(0);

    let assembled = snapshot.assemble().unwrap();
    assert_eq!(page_texts(&assembled.bytes), vec!["A2", "A1"]);
    assert_eq!(merger.sequence().len(), 1);
}

#[test]
fn test_skipped_slots_are_reported() {
    // Drive the registry and sequence directly so a stale slot survives,
    // bypassing the cascade the merger would normally run.
    use pdf_merger_core::{PageSequence, SourceRegistry, pdf::assemble};

    let mut registry = SourceRegistry::new();
    let a = registry.load("a.pdf", fixture_pdf(&["A1"])).unwrap();
    registry.load("b.pdf", fixture_pdf(&["B1"])).unwrap();

    let mut sequence = PageSequence::new();
    for source in registry.iter() {
        sequence.extend_from_source(source);
    }

    registry.remove(a);

    let assembled = assemble(sequence.slots(), &registry).unwrap();
    assert_eq!(assembled.skipped.len(), 1);
    assert_eq!(assembled.skipped[0].reason, SkipReason::SourceMissing);
    assert_eq!(page_texts(&assembled.bytes), vec!["B1"]);
}

// =============================================================================
// Cursor Tests
// =============================================================================

#[test]
fn test_cursor_survives_full_editing_session() {
    let mut merger = PdfMerger::default();
    let a = merger
        .add_source("a.pdf", fixture_pdf(&["A1", "A2", "A3"]))
        .unwrap();
    merger.add_source("b.pdf", fixture_pdf(&["B1", "B2"])).unwrap();

    merger.select_page(2); // A3
    let selected_id = merger.sequence().selected_slot().unwrap().id();

    merger.move_page(2, 0);
    assert_eq!(merger.sequence().selected(), Some(0));
    assert_eq!(merger.sequence().selected_slot().unwrap().id(), selected_id);

    merger.move_page_by(0, MoveDirection::Down);
    assert_eq!(merger.sequence().selected(), Some(1));
    assert_eq!(merger.sequence().selected_slot().unwrap().id(), selected_id);

    merger.remove_source(a);
    // The selected slot belonged to a; selection fell back to the slot
    // before it, which no longer exists, so it cleared.
    assert_eq!(merger.sequence().selected(), None);
    assert_eq!(merger.sequence().len(), 2);
}

#[test]
fn test_selection_is_positional_not_memoized() {
    let mut merger = PdfMerger::default();
    merger.add_source("a.pdf", fixture_pdf(&["A1", "A2"])).unwrap();

    merger.select_page(0);
    // An explicit re-select points at whatever currently sits at the index.
    merger.move_page(0, 1);
    merger.select_page(0);
    assert_eq!(merger.sequence().selected_slot().unwrap().page_index(), 1);
}
