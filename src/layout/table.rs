//! Reading order for tabular (form) pages.
//!
//! The widest row on the page fixes the column count. Rows with exactly that
//! many blocks ("full rows") define, per column, the widest horizontal extent
//! a cell has reached (`max_cell_bounds`). Every other row is mapped onto
//! those bounds: short rows usually carry the wrapped continuation of cells
//! from the row above, so their words are folded back into that row's cells.
//!
//! The output grid is linearized cell by cell, left to right, top to bottom.

use crate::error::LayoutError;
use crate::geometry::BoundingBox;
use crate::layout::rows::Row;
use crate::model::Word;

/// Slack, in pixels, when testing a word's left edge against a column bound.
pub const CELL_TOLERANCE: f32 = 10.0;

/// One row of the reconstructed grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    /// Words per cell, left to right
    pub cells: Vec<Vec<Word>>,
}

impl TableRow {
    fn with_columns(column_count: usize) -> Self {
        Self {
            cells: vec![Vec::new(); column_count],
        }
    }

    /// Words of the row, cell by cell.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.cells.iter().flatten()
    }
}

/// A page reconstructed as a grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    /// Highest block count of any row
    pub column_count: usize,
    /// Per-column extent across all full rows
    pub max_cell_bounds: Vec<BoundingBox>,
    /// Grid rows in top-to-bottom order
    pub rows: Vec<TableRow>,
}

impl TableLayout {
    /// Column whose bounds a word starting at `left` belongs to.
    ///
    /// The word moves to the next column once its left edge reaches that
    /// column's left bound minus [`CELL_TOLERANCE`].
    pub fn column_for(&self, left: f32) -> usize {
        let mut column = 0;
        while column + 1 < self.max_cell_bounds.len()
            && left >= self.max_cell_bounds[column + 1].left - CELL_TOLERANCE
        {
            column += 1;
        }
        column
    }

    /// Whether a box falls horizontally inside at least one column bound.
    pub fn is_within_bounds(&self, bbox: &BoundingBox) -> bool {
        self.max_cell_bounds.iter().any(|b| {
            bbox.right >= b.left - CELL_TOLERANCE && bbox.left <= b.right + CELL_TOLERANCE
        })
    }

    /// Linearize the grid into reading order.
    pub fn into_words(self) -> Vec<Word> {
        self.rows
            .into_iter()
            .flat_map(|row| row.cells.into_iter().flatten())
            .collect()
    }

    /// Spread `words` over the cells of grid row `target`.
    ///
    /// Words outside every column bound are kept in a new single-column row
    /// appended after the grid, so nothing is dropped. This can fragment a
    /// table whose boxes are slightly misaligned.
    fn distribute(&mut self, target: usize, words: Vec<Word>) {
        let mut overflow: Option<usize> = None;
        for word in words {
            if !self.is_within_bounds(&word.bbox) {
                log::debug!(
                    "Word {:?} at x={:.1} is outside all column bounds, starting a new row",
                    word.text,
                    word.bbox.left
                );
                let index = *overflow.get_or_insert_with(|| {
                    self.rows.push(TableRow::with_columns(1));
                    self.rows.len() - 1
                });
                self.rows[index].cells[0].push(word);
                continue;
            }
            let column = self.column_for(word.bbox.left);
            self.rows[target].cells[column].push(word);
        }
    }
}

/// Per-column union of the blocks of every full row.
fn max_cell_bounds(rows: &[Row], column_count: usize) -> Vec<BoundingBox> {
    let mut bounds: Vec<Option<BoundingBox>> = vec![None; column_count];
    for row in rows.iter().filter(|r| r.len() == column_count) {
        for (slot, block) in bounds.iter_mut().zip(&row.blocks) {
            *slot = Some(slot.map_or(block.bbox, |b| b.union(&block.bbox)));
        }
    }
    bounds.into_iter().flatten().collect()
}

/// Reconstruct the cell grid of a tabular page.
pub fn build_table(rows: &[Row]) -> Result<TableLayout, LayoutError> {
    if let Some(index) = rows.iter().position(|r| !r.bbox.is_finite()) {
        return Err(LayoutError::NonFiniteGeometry(index));
    }
    let column_count = rows.iter().map(Row::len).max().unwrap_or(0);
    if column_count == 0 {
        return Err(LayoutError::EmptyLayout);
    }

    let mut table = TableLayout {
        column_count,
        max_cell_bounds: max_cell_bounds(rows, column_count),
        rows: Vec::with_capacity(rows.len()),
    };
    log::debug!("Tabular page with {} columns", column_count);

    let mut table_started = false;
    let mut grid_row: Option<usize> = None;

    for row in rows {
        if row.len() >= column_count {
            table.rows.push(TableRow {
                cells: row.blocks.iter().map(|b| b.words.clone()).collect(),
            });
            grid_row = Some(table.rows.len() - 1);
            table_started = true;
        } else if !table_started {
            // Caption or title above the table
            let mut padded = TableRow::with_columns(column_count);
            for (cell, block) in padded.cells.iter_mut().zip(&row.blocks) {
                cell.extend(block.words.iter().cloned());
            }
            table.rows.push(padded);
        } else {
            let words: Vec<Word> = row.words().cloned().collect();
            let target = match grid_row {
                Some(index) if row.len() <= 2 => index,
                _ => {
                    table.rows.push(TableRow::with_columns(column_count));
                    let index = table.rows.len() - 1;
                    grid_row = Some(index);
                    index
                },
            };
            table.distribute(target, words);
        }
    }

    Ok(table)
}

/// Reorder a tabular page into cell-by-cell reading order.
pub fn reorder_tabular(rows: &[Row]) -> Result<Vec<Word>, LayoutError> {
    Ok(build_table(rows)?.into_words())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineBlock;

    fn block(texts: &[&str], left: f32, right: f32, y: f32) -> LineBlock {
        let step = (right - left) / texts.len() as f32;
        let words = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let l = left + i as f32 * step;
                Word::new(*t, 1, BoundingBox::new(l, y, l + step - 2.0, y + 20.0))
            })
            .collect();
        LineBlock::from_words(words).unwrap()
    }

    fn row(blocks: Vec<LineBlock>) -> Row {
        Row::from_blocks(blocks).unwrap()
    }

    fn texts(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.text.as_str()).collect()
    }

    fn header_and_rows() -> Vec<Row> {
        vec![
            row(vec![
                block(&["Test"], 0.0, 100.0, 0.0),
                block(&["Result"], 300.0, 400.0, 0.0),
                block(&["Units"], 600.0, 700.0, 0.0),
            ]),
            row(vec![
                block(&["Glucose"], 0.0, 120.0, 30.0),
                block(&["98"], 300.0, 340.0, 30.0),
                block(&["mg/dL"], 600.0, 680.0, 30.0),
            ]),
        ]
    }

    #[test]
    fn test_full_rows_map_one_block_per_column() {
        let table = build_table(&header_and_rows()).unwrap();
        assert_eq!(table.column_count, 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(texts(&table.rows[1].cells[1]), vec!["98"]);
        assert_eq!(table.max_cell_bounds[0].right, 118.0);
        assert_eq!(table.max_cell_bounds[2].left, 600.0);
    }

    #[test]
    fn test_continuation_row_folds_into_previous_cells() {
        let mut rows = header_and_rows();
        rows.push(row(vec![block(&["(fasting)"], 0.0, 110.0, 55.0)]));
        let table = build_table(&rows).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(texts(&table.rows[1].cells[0]), vec!["Glucose", "(fasting)"]);

        let words = table.into_words();
        assert_eq!(
            texts(&words),
            vec!["Test", "Result", "Units", "Glucose", "(fasting)", "98", "mg/dL"]
        );
    }

    #[test]
    fn test_short_row_words_follow_column_bounds() {
        let mut rows = header_and_rows();
        rows.push(row(vec![
            block(&["left"], 0.0, 60.0, 55.0),
            block(&["right"], 610.0, 690.0, 55.0),
        ]));
        let table = build_table(&rows).unwrap();
        assert_eq!(texts(&table.rows[1].cells[0]), vec!["Glucose", "left"]);
        assert_eq!(texts(&table.rows[1].cells[2]), vec!["mg/dL", "right"]);
    }

    #[test]
    fn test_caption_before_table_is_padded() {
        let mut rows = vec![row(vec![block(&["Lab", "Results"], 0.0, 200.0, -40.0)])];
        rows.extend(header_and_rows());
        let table = build_table(&rows).unwrap();
        assert_eq!(table.rows[0].cells.len(), 3);
        assert_eq!(texts(&table.rows[0].cells[0]), vec!["Lab", "Results"]);
        assert!(table.rows[0].cells[1].is_empty());
    }

    #[test]
    fn test_word_outside_bounds_starts_new_row() {
        let mut rows = header_and_rows();
        rows.push(row(vec![block(&["stray"], 900.0, 980.0, 55.0)]));
        let table = build_table(&rows).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2].cells.len(), 1);
        assert_eq!(texts(&table.rows[2].cells[0]), vec!["stray"]);
    }

    #[test]
    fn test_wide_short_row_after_start_opens_new_grid_row() {
        let mut rows = vec![row(vec![
            block(&["a"], 0.0, 50.0, 0.0),
            block(&["b"], 200.0, 250.0, 0.0),
            block(&["c"], 400.0, 450.0, 0.0),
            block(&["d"], 600.0, 650.0, 0.0),
        ])];
        rows.push(row(vec![
            block(&["e"], 0.0, 50.0, 30.0),
            block(&["f"], 200.0, 250.0, 30.0),
            block(&["g"], 600.0, 650.0, 30.0),
        ]));
        let table = build_table(&rows).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(texts(&table.rows[1].cells[3]), vec!["g"]);
        assert!(table.rows[1].cells[2].is_empty());
    }

    #[test]
    fn test_empty_rows_error() {
        assert_eq!(build_table(&[]), Err(LayoutError::EmptyLayout));
    }
}
