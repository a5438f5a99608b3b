//! Column separator detection for regular (non-tabular) pages.
//!
//! A separator is a vertical strip of whitespace shared by a run of rows that
//! each split into a left and a right block. Candidates are accumulated row by
//! row with a [`SeparatorTracker`]; every row either extends the open
//! candidate, or interrupts it, in which case the tracker reports whether the
//! finished candidate is worth keeping.

use crate::geometry::BoundingBox;
use crate::layout::rows::Row;

/// Maximum distance between a separator and the page's horizontal center, as
/// a fraction of the page width.
pub const CENTER_TOLERANCE: f32 = 0.10;

/// More candidates than this means noisy detection; all are dropped.
pub const MAX_SEPARATORS: usize = 3;

/// Smallest ratio between the average block widths on both sides of a
/// separator. Below it the gap looks like a label/value split.
pub const KEY_VALUE_WIDTH_RATIO: f32 = 0.35;

/// Two-block rows a candidate must span to be kept.
pub const MIN_PAIRED_ROWS: usize = 2;

/// Running width statistics for one side of a separator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct SideWidths {
    total: f32,
    count: usize,
}

impl SideWidths {
    fn add(&mut self, width: f32) {
        self.total += width;
        self.count += 1;
    }

    fn average(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f32
        }
    }
}

/// A candidate vertical boundary between two reading columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Separator {
    /// Left edge of the whitespace strip
    pub left: f32,
    /// Right edge of the whitespace strip
    pub right: f32,
    /// Top of the first row spanned
    pub top: f32,
    /// Bottom of the last row spanned
    pub bottom: f32,
    /// Index of the first row spanned
    pub first_row: usize,
    /// Index of the last row spanned
    pub last_row: usize,
    /// Number of two-block rows that contributed
    pub paired_rows: usize,
    left_widths: SideWidths,
    right_widths: SideWidths,
}

impl Separator {
    /// Open a candidate on a row that splits into exactly two blocks.
    ///
    /// Returns `None` when the row does not have two horizontally disjoint
    /// blocks.
    pub fn from_row(index: usize, row: &Row) -> Option<Self> {
        let (left, right) = split_pair(row)?;
        let mut left_widths = SideWidths::default();
        let mut right_widths = SideWidths::default();
        left_widths.add(left.width());
        right_widths.add(right.width());
        Some(Self {
            left: left.right,
            right: right.left,
            top: row.bbox.top,
            bottom: row.bbox.bottom,
            first_row: index,
            last_row: index,
            paired_rows: 1,
            left_widths,
            right_widths,
        })
    }

    /// Horizontal center of the strip.
    pub fn center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// Whether row `index` lies within the rows this separator spans.
    pub fn contains_row(&self, index: usize) -> bool {
        (self.first_row..=self.last_row).contains(&index)
    }

    /// Average width of the blocks seen left of the strip.
    pub fn average_left_width(&self) -> f32 {
        self.left_widths.average()
    }

    /// Average width of the blocks seen right of the strip.
    pub fn average_right_width(&self) -> f32 {
        self.right_widths.average()
    }

    /// Whether the two sides are so unbalanced that the gap is most likely a
    /// label/value split rather than two columns of text.
    pub fn is_key_value(&self) -> bool {
        let left = self.average_left_width();
        let right = self.average_right_width();
        let wider = left.max(right);
        if wider <= 0.0 {
            return true;
        }
        left.min(right) / wider < KEY_VALUE_WIDTH_RATIO
    }

    /// Narrow the strip to the gap of another two-block row.
    ///
    /// Returns false, leaving the separator untouched, when the gaps do not
    /// intersect.
    fn absorb_pair(&mut self, index: usize, row: &Row) -> bool {
        let Some((left, right)) = split_pair(row) else {
            return self.absorb_single(index, &row.bbox);
        };
        let new_left = self.left.max(left.right);
        let new_right = self.right.min(right.left);
        if new_left >= new_right {
            return false;
        }
        self.left = new_left;
        self.right = new_right;
        self.left_widths.add(left.width());
        self.right_widths.add(right.width());
        self.paired_rows += 1;
        self.extend_to(index, row);
        true
    }

    /// Fold a single-block row into the candidate.
    ///
    /// A block on one side extends the separator downwards; a block reaching
    /// into the strip narrows it. A block covering the whole strip interrupts
    /// the candidate and returns false.
    fn absorb_single(&mut self, index: usize, bbox: &BoundingBox) -> bool {
        if bbox.right <= self.left {
            self.left_widths.add(bbox.width());
        } else if bbox.left >= self.right {
            self.right_widths.add(bbox.width());
        } else if bbox.left < self.left && bbox.right < self.right {
            self.left = bbox.right;
            self.left_widths.add(bbox.width());
        } else if bbox.left > self.left && bbox.right > self.right {
            self.right = bbox.left;
            self.right_widths.add(bbox.width());
        } else {
            return false;
        }
        self.bottom = self.bottom.max(bbox.bottom);
        self.last_row = index;
        true
    }

    fn extend_to(&mut self, index: usize, row: &Row) {
        self.bottom = self.bottom.max(row.bbox.bottom);
        self.last_row = index;
    }
}

/// The two boxes of a row made of exactly two disjoint blocks.
fn split_pair(row: &Row) -> Option<(BoundingBox, BoundingBox)> {
    match row.blocks.as_slice() {
        [a, b] if a.bbox.right < b.bbox.left => Some((a.bbox, b.bbox)),
        _ => None,
    }
}

/// Outcome of feeding one row to a [`SeparatorTracker`].
#[derive(Debug, Clone, PartialEq)]
pub enum SeparatorStep {
    /// The open candidate (if any) still holds
    Continue,
    /// The open candidate was interrupted and is worth keeping
    Finalize(Separator),
    /// The open candidate was interrupted and rejected
    Discard,
}

/// Row-by-row accumulator for separator candidates.
#[derive(Debug, Default)]
pub struct SeparatorTracker {
    candidate: Option<Separator>,
}

impl SeparatorTracker {
    /// Create a tracker with no open candidate.
    pub fn new() -> Self {
        Self::default()
    }

    /// The candidate currently being accumulated.
    pub fn candidate(&self) -> Option<&Separator> {
        self.candidate.as_ref()
    }

    /// Feed the next row in top-to-bottom order.
    pub fn push(&mut self, index: usize, row: &Row) -> SeparatorStep {
        let Some(mut candidate) = self.candidate.take() else {
            self.candidate = Separator::from_row(index, row);
            return SeparatorStep::Continue;
        };

        let holds = match row.len() {
            0 => true,
            1 => candidate.absorb_single(index, &row.bbox),
            2 => candidate.absorb_pair(index, row),
            _ => false,
        };
        if holds {
            self.candidate = Some(candidate);
            return SeparatorStep::Continue;
        }

        // A two-block row that broke the old strip may open the next one.
        self.candidate = Separator::from_row(index, row);
        close(candidate)
    }

    /// Close the open candidate at the end of the page.
    pub fn finish(&mut self) -> SeparatorStep {
        match self.candidate.take() {
            Some(candidate) => close(candidate),
            None => SeparatorStep::Continue,
        }
    }
}

fn close(candidate: Separator) -> SeparatorStep {
    if candidate.paired_rows < MIN_PAIRED_ROWS {
        return SeparatorStep::Discard;
    }
    if candidate.is_key_value() {
        log::debug!(
            "Discarding key/value gap at x={:.1} (avg widths {:.1} / {:.1})",
            candidate.center(),
            candidate.average_left_width(),
            candidate.average_right_width()
        );
        return SeparatorStep::Discard;
    }
    SeparatorStep::Finalize(candidate)
}

/// Find the column separators of a page.
///
/// Only separators within [`CENTER_TOLERANCE`] of the horizontal center of
/// the page content survive, and none do when more than [`MAX_SEPARATORS`]
/// candidates were found.
pub fn detect_separators(rows: &[Row]) -> Vec<Separator> {
    let mut tracker = SeparatorTracker::new();
    let mut candidates = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if let SeparatorStep::Finalize(separator) = tracker.push(index, row) {
            candidates.push(separator);
        }
    }
    if let SeparatorStep::Finalize(separator) = tracker.finish() {
        candidates.push(separator);
    }

    if candidates.len() > MAX_SEPARATORS {
        log::debug!("Found {} separator candidates, treating as noise", candidates.len());
        return Vec::new();
    }

    let Some(page) = BoundingBox::enclosing(rows.iter().map(|r| &r.bbox)) else {
        return Vec::new();
    };
    let center = page.horizontal_center();
    let tolerance = page.width() * CENTER_TOLERANCE;
    candidates.retain(|s| {
        let keep = (s.center() - center).abs() <= tolerance;
        if !keep {
            log::debug!(
                "Rejecting off-center separator at x={:.1} (page center {:.1})",
                s.center(),
                center
            );
        }
        keep
    });
    candidates
}
