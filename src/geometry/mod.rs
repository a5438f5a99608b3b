//! Geometric primitives for layout analysis.
//!
//! Recognition backends report every word and line as an axis-aligned box in
//! pixel coordinates of the page image (origin at the top-left corner, `y`
//! growing downwards). All row, column and cell tests in [`crate::layout`] are
//! expressed in terms of [`BoundingBox`].

use serde::{Deserialize, Serialize};

/// An axis-aligned box in page-image pixel space.
///
/// Deserialized boxes are normalized the same way as [`BoundingBox::new`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Edges")]
pub struct BoundingBox {
    /// X coordinate of the left edge
    pub left: f32,
    /// Y coordinate of the top edge
    pub top: f32,
    /// X coordinate of the right edge
    pub right: f32,
    /// Y coordinate of the bottom edge
    pub bottom: f32,
}

/// Edges as reported, in whatever order the backend produced them.
#[derive(Deserialize)]
struct Edges {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl From<Edges> for BoundingBox {
    fn from(e: Edges) -> Self {
        BoundingBox::new(e.left, e.top, e.right, e.bottom)
    }
}

impl BoundingBox {
    /// Create a box from its four edges.
    ///
    /// Edges are normalized so that `left <= right` and `top <= bottom`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scan_reflow::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(bbox.width(), 100.0);
    /// assert_eq!(bbox.height(), 50.0);
    ///
    /// let flipped = BoundingBox::new(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(flipped, bbox);
    /// ```
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Copy of this box with swapped edges put back in order.
    pub fn normalized(&self) -> Self {
        Self::new(self.left, self.top, self.right, self.bottom)
    }

    /// Create a box from a top-left corner plus dimensions.
    pub fn from_origin(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Horizontal center of the box.
    ///
    /// # Examples
    ///
    /// ```
    /// use scan_reflow::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(bbox.horizontal_center(), 50.0);
    /// ```
    pub fn horizontal_center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// Vertical center of the box.
    pub fn vertical_center(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Whether every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    /// Length of the overlap between the vertical extents of two boxes.
    ///
    /// Returns 0.0 when the boxes do not share any vertical range.
    pub fn vertical_overlap(&self, other: &BoundingBox) -> f32 {
        (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0)
    }

    /// Length of the overlap between the horizontal extents of two boxes.
    pub fn horizontal_overlap(&self, other: &BoundingBox) -> f32 {
        (self.right.min(other.right) - self.left.max(other.left)).max(0.0)
    }

    /// Horizontal whitespace between `self` and a box lying to its right.
    ///
    /// Negative when the boxes overlap horizontally.
    pub fn horizontal_gap_to(&self, other: &BoundingBox) -> f32 {
        other.left - self.right
    }

    /// Smallest box containing both boxes.
    ///
    /// # Examples
    ///
    /// ```
    /// use scan_reflow::geometry::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
    /// let b = BoundingBox::new(25.0, 25.0, 75.0, 75.0);
    /// assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 75.0, 75.0));
    /// ```
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow this box in place so it also covers `other`.
    pub fn extend(&mut self, other: &BoundingBox) {
        *self = self.union(other);
    }

    /// Bounding box of a sequence of boxes, `None` when the sequence is empty.
    pub fn enclosing<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| Some(acc.map_or(*b, |a| a.union(b))))
    }
}
