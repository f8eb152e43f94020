//! Geometric checks over a computed layout.
//!
//! The planner places boxes by rule, not by search; these helpers verify the
//! outcome so the API can report overlaps and spacing alongside each plan.

use serde::Serialize;
use utoipa::ToSchema;

use crate::layout::PlacedItem;
use crate::types::BoundingBox;

/// Checks whether two placed items share interior volume.
///
/// Uses Axis-Aligned Bounding Box (AABB) tests around each item's center.
/// Boxes that only touch, and zero-extent boxes, do not intersect.
pub fn intersects(a: &PlacedItem, b: &PlacedItem) -> bool {
    BoundingBox::of(a).intersects(&BoundingBox::of(b))
}

/// Vertical distance from the top of `lower` to the bottom of `upper`.
///
/// Negative values mean the boxes overlap vertically.
pub fn vertical_gap(lower: &PlacedItem, upper: &PlacedItem) -> f64 {
    BoundingBox::of(upper).bottom_y() - BoundingBox::of(lower).top_y()
}

/// Pair of input indices whose boxes overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct OverlapPair {
    pub first: usize,
    pub second: usize,
}

/// Lists every overlapping pair in a layout (O(n²), layouts are small).
pub fn find_overlaps(placed: &[PlacedItem]) -> Vec<OverlapPair> {
    let mut overlaps = Vec::new();
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            if intersects(a, b) {
                overlaps.push(OverlapPair {
                    first: a.index,
                    second: b.index,
                });
            }
        }
    }
    overlaps
}

/// Smallest vertical gap between consecutive items of the same column.
///
/// `None` when no column holds more than one item.
pub fn min_stack_gap(placed: &[PlacedItem]) -> Option<f64> {
    placed
        .windows(2)
        .filter(|pair| pair[0].column == pair[1].column)
        .map(|pair| vertical_gap(&pair[0], &pair[1]))
        .reduce(f64::min)
}
