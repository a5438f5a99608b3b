//! Reading order for regular (prose) pages.
//!
//! Rows spanned by a column separator are split into a left and a right
//! bucket. The buckets are flushed, left first, as soon as a row outside any
//! separator is reached, so a two-column region reads down the left column,
//! then down the right column, then continues with the single-column text
//! below it.

use crate::error::LayoutError;
use crate::layout::rows::Row;
use crate::layout::separator::{detect_separators, Separator};
use crate::model::{LineBlock, Word};

/// Buffered blocks of the two-column region being walked.
#[derive(Default)]
struct ColumnBuffer {
    separator: Option<usize>,
    left: Vec<LineBlock>,
    right: Vec<LineBlock>,
}

impl ColumnBuffer {
    fn push(
        &mut self,
        separator_index: usize,
        separator: &Separator,
        row: &Row,
        out: &mut Vec<Word>,
    ) {
        if self.separator.is_some_and(|current| current != separator_index) {
            self.flush(out);
        }
        self.separator = Some(separator_index);
        let center = separator.center();
        for block in &row.blocks {
            if block.bbox.horizontal_center() < center {
                self.left.push(block.clone());
            } else {
                self.right.push(block.clone());
            }
        }
    }

    fn flush(&mut self, out: &mut Vec<Word>) {
        for block in self.left.drain(..).chain(self.right.drain(..)) {
            out.extend(block.words);
        }
        self.separator = None;
    }
}

/// Emit every row's words in order, ignoring columns.
///
/// This is the fallback order for any page whose layout cannot be
/// reconstructed.
pub fn single_stream(rows: &[Row]) -> Vec<Word> {
    rows.iter().flat_map(|r| r.words().cloned()).collect()
}

/// Reorder a regular page into column-aware reading order.
pub fn reorder_regular(rows: &[Row]) -> Result<Vec<Word>, LayoutError> {
    if let Some(index) = rows.iter().position(|r| !r.bbox.is_finite()) {
        return Err(LayoutError::NonFiniteGeometry(index));
    }

    let separators = detect_separators(rows);
    if separators.is_empty() {
        return Ok(single_stream(rows));
    }
    log::debug!("Reordering regular page around {} separator(s)", separators.len());

    let mut out = Vec::with_capacity(rows.iter().map(|r| r.words().count()).sum());
    let mut buffer = ColumnBuffer::default();

    for (index, row) in rows.iter().enumerate() {
        match separators.iter().position(|s| s.contains_row(index)) {
            Some(separator_index) => {
                buffer.push(separator_index, &separators[separator_index], row, &mut out);
            },
            None => {
                buffer.flush(&mut out);
                out.extend(row.words().cloned());
            },
        }
    }
    buffer.flush(&mut out);

    Ok(out)
}
