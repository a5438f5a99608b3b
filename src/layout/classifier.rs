//! Page layout classification: tabular form versus regular prose.

use crate::layout::rows::Row;

/// Fraction of rows with more than two blocks above which a page is tabular.
pub const TABULAR_THRESHOLD: f32 = 0.3;

/// Layout family of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Prose, optionally in two columns
    Regular,
    /// Form or table data
    Tabular,
}

/// Outcome of [`classify_layout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Chosen layout family
    pub kind: LayoutKind,
    /// Share of rows holding more than two blocks
    pub tabular_ratio: f32,
}

/// Classify a page from its rows.
///
/// A page with no rows is regular with a ratio of 0.
///
/// # Examples
///
/// ```
/// use scan_reflow::layout::{classify_layout, LayoutKind};
///
/// let classification = classify_layout(&[]);
/// assert_eq!(classification.kind, LayoutKind::Regular);
/// assert_eq!(classification.tabular_ratio, 0.0);
/// ```
pub fn classify_layout(rows: &[Row]) -> Classification {
    if rows.is_empty() {
        return Classification {
            kind: LayoutKind::Regular,
            tabular_ratio: 0.0,
        };
    }

    let wide_rows = rows.iter().filter(|r| r.len() > 2).count();
    let tabular_ratio = wide_rows as f32 / rows.len() as f32;
    let kind = if tabular_ratio > TABULAR_THRESHOLD {
        LayoutKind::Tabular
    } else {
        LayoutKind::Regular
    };

    Classification {
        kind,
        tabular_ratio,
    }
}
