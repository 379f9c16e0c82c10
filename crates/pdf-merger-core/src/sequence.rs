//! The ordered page list and its selection cursor.
//!
//! A [`PageSequence`] maps visual page positions back to
//! (source document, page index) pairs. All mutations are pure index
//! arithmetic: out-of-range input is a defined no-op, never an error, and
//! the selection cursor is recomputed in the same step as every structural
//! change so it can never dangle.

use std::fmt;

use serde::Serialize;

use crate::registry::{SourceDocument, SourceId};

/// Identifier for a page slot, stable across reorders.
///
/// Allocated from a counter owned by the sequence; never reused within a
/// sequence's lifetime, even across `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SlotId(u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction for single-step page moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Toward the front of the sequence
    Up,
    /// Toward the back of the sequence
    Down,
}

impl MoveDirection {
    pub const fn offset(self) -> isize {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

/// One entry in the output page order: a reference to a single page of a
/// loaded source.
///
/// The `source_id`/`page_index` pair is immutable after creation; only the
/// slot's position in the sequence changes.
#[derive(Debug, Clone, Serialize)]
pub struct PageSlot {
    id: SlotId,
    source_id: SourceId,
    page_index: usize,
    label: String,
}

impl PageSlot {
    pub const fn id(&self) -> SlotId {
        self.id
    }

    pub const fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// The ordered sequence of page slots plus the selection cursor.
///
/// Order is significant: it is the page order of the assembled output.
#[derive(Debug, Clone, Default)]
pub struct PageSequence {
    slots: Vec<PageSlot>,
    selected: Option<usize>,
    next_slot_id: u64,
}

impl PageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[PageSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&PageSlot> {
        self.slots.get(index)
    }

    /// Index of the slot selected for preview, if any.
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_slot(&self) -> Option<&PageSlot> {
        self.selected.and_then(|i| self.slots.get(i))
    }

    /// Append one slot per page of `source`, page index ascending.
    ///
    /// Loading a new source never regenerates the sequence, so manual
    /// reordering of existing slots survives unrelated loads.
    pub fn extend_from_source(&mut self, source: &SourceDocument) {
        let name = source.display_name();
        self.slots.reserve(source.page_count());
        for page_index in 0..source.page_count() {
            let id = SlotId(self.next_slot_id);
            self.next_slot_id += 1;
            self.slots.push(PageSlot {
                id,
                source_id: source.id(),
                page_index,
                label: format!("{} - p.{}", name, page_index + 1),
            });
        }
    }

    /// Move the slot at `index` one position in `direction`.
    ///
    /// No-op when `index` is out of range or the neighbor would be. Returns
    /// whether the sequence changed. A selected slot is tracked through the
    /// move; a selected neighbor shifts the opposite way.
    pub fn move_by(&mut self, index: usize, direction: MoveDirection) -> bool {
        let Some(target) = index.checked_add_signed(direction.offset()) else {
            return false;
        };
        if target >= self.slots.len() {
            return false;
        }
        self.move_to(index, target)
    }

    /// Remove the slot at `source_index` and reinsert it at `dest_index`,
    /// with `dest_index` interpreted against the already-shortened sequence
    /// (standard splice semantics, matching a drag-and-drop).
    ///
    /// No-op if the indices are equal or either is out of range. Returns
    /// whether the sequence changed.
    pub fn move_to(&mut self, source_index: usize, dest_index: usize) -> bool {
        let len = self.slots.len();
        if source_index == dest_index || source_index >= len || dest_index >= len {
            return false;
        }

        let slot = self.slots.remove(source_index);
        self.slots.insert(dest_index, slot);

        // Cursor remap: the moved slot keeps its selection; slots the move
        // crossed shift one position opposite to the move; the rest hold.
        self.selected = self.selected.map(|sel| {
            if sel == source_index {
                dest_index
            } else if source_index < dest_index && sel > source_index && sel <= dest_index {
                sel - 1
            } else if dest_index < source_index && sel >= dest_index && sel < source_index {
                sel + 1
            } else {
                sel
            }
        });

        true
    }

    /// Delete the slot at `index`, returning it.
    ///
    /// No-op (returns `None`) when `index` is out of range. If the deleted
    /// slot was selected, selection moves to the previous slot if one
    /// exists, else clears; selections past the hole shift down by one.
    pub fn remove_at(&mut self, index: usize) -> Option<PageSlot> {
        if index >= self.slots.len() {
            return None;
        }

        let slot = self.slots.remove(index);

        self.selected = match self.selected {
            Some(sel) if sel == index => index.checked_sub(1),
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };

        Some(slot)
    }

    /// Cascade-remove every slot referencing `source_id`, preserving the
    /// relative order of all surviving slots. Returns the number removed.
    ///
    /// Cursor rule: a surviving selected slot keeps its (shifted) position;
    /// a removed one hands selection to the nearest surviving slot before
    /// it, or clears when none survives.
    pub fn remove_source(&mut self, source_id: SourceId) -> usize {
        let selected_id = self.selected_slot().map(PageSlot::id);
        let fallback_id = self.selected.and_then(|sel| {
            self.slots[..sel]
                .iter()
                .rev()
                .find(|s| s.source_id != source_id)
                .map(PageSlot::id)
        });

        let before = self.slots.len();
        self.slots.retain(|s| s.source_id != source_id);
        let removed = before - self.slots.len();

        if removed > 0 {
            self.selected = selected_id
                .and_then(|id| self.position_of(id))
                .or_else(|| fallback_id.and_then(|id| self.position_of(id)));
        }

        removed
    }

    /// Select the slot at `index` for preview. No-op when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Drop all slots and clear the selection.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.selected = None;
    }

    fn position_of(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }
}
