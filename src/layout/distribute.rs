//! Even distribution along an axis
//!
//! Spreads marker centers evenly between the two outermost markers,
//! which themselves stay put.

use crate::geometry::Point2;
use crate::host::MarkerId;

use super::types::{AnnotationBox, Axis};

/// Compute distribution targets.
///
/// Boxes are sorted by their `up_right` coordinate on the axis; the
/// spacing is the center-to-center range divided by `count - 1`, so
/// equal consecutive input coordinates cannot divide by zero. A single
/// box is a no-op (the caller rejects empty input). Displacements are
/// measured against box centers: distribution re-centers, it never
/// edge-aligns.
pub fn distribute(boxes: &[AnnotationBox], axis: Axis) -> Vec<(MarkerId, Point2)> {
    if boxes.len() < 2 {
        return boxes.iter().map(|b| (b.owner, b.center)).collect();
    }

    let mut sorted: Vec<&AnnotationBox> = boxes.iter().collect();
    match axis {
        Axis::Vertical => sorted.sort_by(|a, b| a.up_right.y.total_cmp(&b.up_right.y)),
        Axis::Horizontal => sorted.sort_by(|a, b| a.up_right.x.total_cmp(&b.up_right.x)),
    }

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    let count = sorted.len() as f64;

    match axis {
        Axis::Vertical => {
            let spacing = (last.center.y - first.center.y) / (count - 1.0);
            sorted
                .iter()
                .enumerate()
                .map(|(i, b)| {
                    let y = first.center.y + i as f64 * spacing;
                    (b.owner, Point2::new(b.center.x, y))
                })
                .collect()
        }
        Axis::Horizontal => {
            let spacing = (last.center.x - first.center.x) / (count - 1.0);
            sorted
                .iter()
                .enumerate()
                .map(|(i, b)| {
                    let x = first.center.x + i as f64 * spacing;
                    (b.owner, Point2::new(x, b.center.y))
                })
                .collect()
        }
    }
}
