//! Reading-order reconstruction for recognized pages.
//!
//! This module turns a page's line blocks into a linear word stream:
//! - Row segmentation (blocks → horizontal rows)
//! - Layout classification (regular prose vs. tabular form)
//! - Column separator detection for two-column prose
//! - Cell grid reconstruction for tables
//!
//! Failures here are [`LayoutError`](crate::error::LayoutError)s; they are
//! caught by [`crate::pipeline::reconstruct_page`], which falls back to
//! [`single_stream`] ordering.

pub mod classifier;
pub mod regular;
pub mod rows;
pub mod separator;
pub mod table;

// Re-export main types
pub use classifier::{classify_layout, Classification, LayoutKind, TABULAR_THRESHOLD};
pub use regular::{reorder_regular, single_stream};
pub use rows::{is_row_ended, segment_rows, Row, RowType};
pub use separator::{detect_separators, Separator, SeparatorStep, SeparatorTracker};
pub use table::{build_table, reorder_tabular, TableLayout, TableRow};
