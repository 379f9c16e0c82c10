//! Page index newtype for safe conversion between usize and i32.

use std::fmt;

use crate::error::Error;

/// A page index that can be safely used with mupdf.
///
/// Wraps an i32 and provides checked conversion from usize, centralizing
/// the conversion logic in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    #[must_use]
    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get the index as usize for Rust collections.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // Safe: we check for negative values
    pub const fn as_usize(self) -> usize {
        // PageIndex is always created from non-negative values, but we handle
        // the impossible case gracefully rather than panicking
        if self.0 < 0 {
            0
        } else {
            self.0 as usize
        }
    }

    /// Get the 1-indexed page number for lopdf (which uses 1-based indexing).
    #[must_use]
    pub const fn as_lopdf_page_number(self) -> u32 {
        // Safe because PageIndex is always non-negative and adding 1 won't overflow
        // for any realistic page count. Use cast_unsigned for explicitness.
        (self.0 + 1).cast_unsigned()
    }

    /// Try to create a PageIndex from a usize page number.
    ///
    /// Returns an error if the page number is too large to fit in an i32
    /// or exceeds the total page count.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::PdfInvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = i32::try_from(page_num).map_err(|_| Error::PdfInvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }
}

impl TryFrom<usize> for PageIndex {
    type Error = Error;

    /// Convert a usize to a PageIndex.
    ///
    /// This conversion can fail if the value is too large to fit in an i32.
    /// For production use, prefer `try_from_page_num` which also validates
    /// against the document's page count.
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let index = i32::try_from(value).map_err(|_| Error::PdfInvalidPage {
            page: value,
            total: 0, // Unknown total when using raw conversion
        })?;
        Ok(Self(index))
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
