//! Untangling stacked markers
//!
//! Markers whose leader ends sit close together tend to overlap on the
//! sheet. Untangle re-stacks their boxes edge-to-edge along one axis,
//! preserving the order of the leader ends so the leaders stop crossing.

use crate::geometry::Point2;
use crate::host::MarkerId;

use super::types::{AnnotationBox, Axis};

/// One untangle participant: a box and the point its leader ends at.
/// Markers without a leader use their box center as the stand-in.
#[derive(Debug, Clone, Copy)]
pub struct UntangleItem {
    pub bbox: AnnotationBox,
    pub leader_end: Point2,
}

impl UntangleItem {
    pub fn new(bbox: AnnotationBox, leader_end: Option<Point2>) -> Self {
        Self {
            bbox,
            leader_end: leader_end.unwrap_or(bbox.center),
        }
    }
}

/// Compute untangle targets.
///
/// Vertical: sort ascending by leader-end y, then walk a cursor up from
/// the first box's top edge, placing each box's `up_left` corner at the
/// cursor and advancing by that box's own height. Each box keeps its
/// horizontal position. Horizontal is the mirror, walking left-to-right
/// by box width. Displacements anchor on the leading corner (`up_left`),
/// never the center.
pub fn untangle(items: &[UntangleItem], axis: Axis) -> Vec<(MarkerId, Point2)> {
    if items.is_empty() {
        return vec![];
    }

    let mut sorted: Vec<&UntangleItem> = items.iter().collect();
    match axis {
        Axis::Vertical => sorted.sort_by(|a, b| a.leader_end.y.total_cmp(&b.leader_end.y)),
        Axis::Horizontal => sorted.sort_by(|a, b| a.leader_end.x.total_cmp(&b.leader_end.x)),
    }

    let mut targets = Vec::with_capacity(sorted.len());
    match axis {
        Axis::Vertical => {
            let mut cursor = sorted[0].bbox.up_left.y;
            for item in sorted {
                targets.push((item.bbox.owner, Point2::new(item.bbox.up_left.x, cursor)));
                cursor += item.bbox.height();
            }
        }
        Axis::Horizontal => {
            let mut cursor = sorted[0].bbox.up_left.x;
            for item in sorted {
                targets.push((item.bbox.owner, Point2::new(cursor, item.bbox.up_left.y)));
                cursor += item.bbox.width();
            }
        }
    }
    targets
}
