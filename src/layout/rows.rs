//! Row segmentation: grouping backend line blocks into visual rows.
//!
//! Backends report lines in roughly top-to-bottom order but with vertical
//! jitter, and blocks that belong to the same visual line (table cells, the
//! two halves of a two-column line) arrive as separate lines. The segmenter
//! walks blocks in backend order and starts a new row whenever
//! [`is_row_ended`] decides the current block no longer continues the
//! previous one.

use crate::geometry::BoundingBox;
use crate::model::{LineBlock, Word};

/// Minimum vertical overlap, as a fraction of either block's height, for two
/// blocks to be considered for the same row.
pub const ROW_OVERLAP_MIN: f32 = 0.32;

/// Accumulated evidence above which a row is considered ended.
pub const ROW_END_SCORE: f32 = 0.5;

const TOP_MISALIGNED_WEIGHT: f32 = 0.3;
const LEFT_RESET_WEIGHT: f32 = 0.4;
const BELOW_CENTER_WEIGHT: f32 = 0.3;

/// Structural type of a row, from the number of horizontal gaps between its
/// blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowType {
    /// No internal gap: a single run of text
    Regular,
    /// One gap: a candidate two-column line
    Column,
    /// Two or more gaps: a table-like line
    Tabular,
}

/// Blocks judged to share one visual line.
///
/// Blocks are kept sorted by their left edge; [`Row::update_bounds`]
/// recomputes the derived fields after any mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Smallest bottom coordinate among the blocks
    pub min_bottom: f32,
    /// Largest bottom coordinate among the blocks
    pub max_bottom: f32,
    /// Box enclosing every block
    pub bbox: BoundingBox,
    /// Blocks of the row, sorted by left edge
    pub blocks: Vec<LineBlock>,
}

impl Row {
    /// Start a row from its first block.
    pub fn new(block: LineBlock) -> Self {
        let bbox = block.bbox;
        Self {
            min_bottom: bbox.bottom,
            max_bottom: bbox.bottom,
            bbox,
            blocks: vec![block],
        }
    }

    /// Build a row from a set of blocks, `None` when there are none.
    pub fn from_blocks(blocks: Vec<LineBlock>) -> Option<Self> {
        let mut iter = blocks.into_iter();
        let mut row = Row::new(iter.next()?);
        row.blocks.extend(iter);
        row.update_bounds();
        Some(row)
    }

    /// Add a block to the row.
    pub fn push(&mut self, block: LineBlock) {
        self.blocks.push(block);
        self.update_bounds();
    }

    /// Re-sort the blocks and recompute the vertical range and box.
    pub fn update_bounds(&mut self) {
        self.blocks.sort_by(|a, b| {
            a.bbox
                .left
                .partial_cmp(&b.bbox.left)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(bbox) = BoundingBox::enclosing(self.blocks.iter().map(|b| &b.bbox)) {
            self.bbox = bbox;
        }
        let bottoms = self.blocks.iter().map(|b| b.bbox.bottom);
        self.min_bottom = bottoms.clone().fold(f32::INFINITY, f32::min);
        self.max_bottom = bottoms.fold(f32::NEG_INFINITY, f32::max);
    }

    /// Number of blocks in the row.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the row has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// `(min_bottom, max_bottom)`.
    pub fn vertical_range(&self) -> (f32, f32) {
        (self.min_bottom, self.max_bottom)
    }

    /// Number of horizontal whitespace gaps between consecutive blocks.
    ///
    /// Blocks that overlap horizontally do not open a gap.
    pub fn gap_count(&self) -> usize {
        let mut gaps = 0;
        let mut reach = f32::NEG_INFINITY;
        for block in &self.blocks {
            if reach.is_finite() && block.bbox.left > reach {
                gaps += 1;
            }
            reach = reach.max(block.bbox.right);
        }
        gaps
    }

    /// Structural type of the row.
    pub fn row_type(&self) -> RowType {
        match self.gap_count() {
            0 => RowType::Regular,
            1 => RowType::Column,
            _ => RowType::Tabular,
        }
    }

    /// Words of the row, block by block from left to right.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.blocks.iter().flat_map(|b| b.words.iter())
    }
}

/// Decide whether `current` starts a new row after `previous`.
///
/// Blocks whose vertical extents overlap by less than [`ROW_OVERLAP_MIN`] of
/// either height always end the row. Otherwise evidence is accumulated:
/// misaligned tops, a return to the left of the previous block, and a top
/// below the previous block's vertical center. The row ends once the score
/// exceeds [`ROW_END_SCORE`].
pub fn is_row_ended(previous: &BoundingBox, current: &BoundingBox) -> bool {
    let overlap = previous.vertical_overlap(current);
    let prev_height = previous.height();
    let cur_height = current.height();
    if prev_height <= 0.0 || cur_height <= 0.0 {
        return overlap <= 0.0 && previous.bottom != current.bottom;
    }
    if overlap / prev_height < ROW_OVERLAP_MIN || overlap / cur_height < ROW_OVERLAP_MIN {
        return true;
    }

    let mut score = 0.0;
    if (current.top - previous.top).abs() > 0.5 * prev_height.min(cur_height) {
        score += TOP_MISALIGNED_WEIGHT;
    }
    if current.left < previous.left {
        score += LEFT_RESET_WEIGHT;
    }
    if current.top >= previous.vertical_center() {
        score += BELOW_CENTER_WEIGHT;
    }
    score > ROW_END_SCORE
}

/// Group blocks into rows, preserving backend order.
pub fn segment_rows(blocks: Vec<LineBlock>) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();
    let mut previous: Option<BoundingBox> = None;

    for block in blocks {
        let bbox = block.bbox;
        match (rows.last_mut(), previous) {
            (Some(row), Some(prev)) if !is_row_ended(&prev, &bbox) => row.push(block),
            _ => rows.push(Row::new(block)),
        }
        previous = Some(bbox);
    }

    log::debug!("Segmented page into {} rows", rows.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str, left: f32, top: f32, right: f32, bottom: f32) -> LineBlock {
        let bbox = BoundingBox::new(left, top, right, bottom);
        LineBlock {
            bbox,
            words: vec![Word::new(text, 1, bbox)],
        }
    }

    #[test]
    fn test_disjoint_lines_end_row() {
        let a = BoundingBox::new(0.0, 100.0, 200.0, 120.0);
        let b = BoundingBox::new(0.0, 125.0, 200.0, 145.0);
        assert!(is_row_ended(&a, &b));
    }

    #[test]
    fn test_jittered_neighbor_continues_row() {
        let a = BoundingBox::new(0.0, 100.0, 100.0, 120.0);
        let b = BoundingBox::new(300.0, 103.0, 400.0, 123.0);
        assert!(!is_row_ended(&a, &b));
    }

    #[test]
    fn test_small_overlap_ends_row() {
        // 5px of overlap on 20px tall blocks is 25%
        let a = BoundingBox::new(0.0, 100.0, 100.0, 120.0);
        let b = BoundingBox::new(300.0, 115.0, 400.0, 135.0);
        assert!(is_row_ended(&a, &b));
    }

    #[test]
    fn test_wrap_back_with_partial_overlap_ends_row() {
        let a = BoundingBox::new(300.0, 100.0, 400.0, 120.0);
        let b = BoundingBox::new(50.0, 112.0, 150.0, 132.0);
        assert!(is_row_ended(&a, &b));
    }

    #[test]
    fn test_segment_rows_groups_cells() {
        let blocks = vec![
            block("Name", 0.0, 0.0, 80.0, 20.0),
            block("Dose", 200.0, 1.0, 260.0, 21.0),
            block("Route", 400.0, 0.0, 470.0, 20.0),
            block("Aspirin", 0.0, 30.0, 90.0, 50.0),
            block("81mg", 200.0, 31.0, 250.0, 51.0),
        ];
        let rows = segment_rows(blocks);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 2);
        assert_eq!(rows[0].row_type(), RowType::Tabular);
        assert_eq!(rows[1].row_type(), RowType::Column);
        assert_eq!(rows[0].vertical_range(), (20.0, 21.0));
    }

    #[test]
    fn test_row_sorts_blocks_by_left() {
        let mut row = Row::new(block("right", 300.0, 0.0, 400.0, 20.0));
        row.push(block("left", 0.0, 0.0, 100.0, 20.0));
        let texts: Vec<&str> = row.words().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["left", "right"]);
        assert_eq!(row.bbox, BoundingBox::new(0.0, 0.0, 400.0, 20.0));
    }

    #[test]
    fn test_overlapping_blocks_open_no_gap() {
        let row = Row::from_blocks(vec![
            block("a", 0.0, 0.0, 120.0, 20.0),
            block("b", 100.0, 0.0, 200.0, 20.0),
        ])
        .unwrap();
        assert_eq!(row.gap_count(), 0);
        assert_eq!(row.row_type(), RowType::Regular);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_rows(Vec::new()).is_empty());
        assert!(Row::from_blocks(Vec::new()).is_none());
    }
}
