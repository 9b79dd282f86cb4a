//! Core types for the layout policies

use crate::geometry::{Point2, Point3};
use crate::host::MarkerId;
use crate::view::ViewFrame;

/// Axis a distribution or untangle operation works along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// The screen-space footprint of one marker in the current view.
///
/// Corners are named for their visual position and hold the invariant
/// `up_left.y == up_right.y >= down_left.y == down_right.y` and
/// `up_left.x == down_left.x <= up_right.x == down_right.x`, regardless
/// of which raw bounding-box corner produced which extreme. Built once
/// per layout invocation and discarded after the move is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationBox {
    pub owner: MarkerId,
    pub up_left: Point2,
    pub up_right: Point2,
    pub down_left: Point2,
    pub down_right: Point2,
    pub center: Point2,
}

impl AnnotationBox {
    /// Build a box from two opposite corners, normalizing extremes.
    pub fn from_extremes(owner: MarkerId, a: Point2, b: Point2) -> Self {
        let left = a.x.min(b.x);
        let right = a.x.max(b.x);
        let top = a.y.max(b.y);
        let bottom = a.y.min(b.y);
        let up_left = Point2::new(left, top);
        let up_right = Point2::new(right, top);
        let down_left = Point2::new(left, bottom);
        let down_right = Point2::new(right, bottom);
        Self {
            owner,
            up_left,
            up_right,
            down_left,
            down_right,
            center: (up_right + down_left) / 2.0,
        }
    }

    /// Project a model-space bounding box into the view plane.
    ///
    /// An axis-aligned 3D box seen through a rotated view plane can put
    /// its visual diagonal on either of two corner pairings. Both are
    /// projected and the pairing with the larger view-plane distance
    /// wins; the losing one is frequently degenerate (near-zero
    /// footprint).
    ///
    /// `pending` is a leader displacement already written to the marker
    /// but not yet reflected in its bounding box; it is subtracted from
    /// the raw extremes (model space) before projecting, so the
    /// footprint reflects the marker as if the leader change had landed.
    pub fn project(
        owner: MarkerId,
        min: Point3,
        max: Point3,
        frame: &ViewFrame,
        pending: Option<Point3>,
    ) -> Self {
        let (min, max) = match pending {
            Some(d) => (min - d, max - d),
            None => (min, max),
        };

        let a1 = frame.project(min);
        let a2 = frame.project(max);
        let b1 = frame.project(Point3::new(min.x, max.y, min.z));
        let b2 = frame.project(Point3::new(max.x, min.y, max.z));

        if a1.distance_to(a2) >= b1.distance_to(b2) {
            Self::from_extremes(owner, a1, a2)
        } else {
            Self::from_extremes(owner, b1, b2)
        }
    }

    pub fn width(&self) -> f64 {
        self.up_right.x - self.up_left.x
    }

    pub fn height(&self) -> f64 {
        self.up_left.y - self.down_left.y
    }

    /// The named corner (or center) of this box
    pub fn corner(&self, corner: Corner) -> Point2 {
        match corner {
            Corner::UpLeft => self.up_left,
            Corner::UpRight => self.up_right,
            Corner::DownLeft => self.down_left,
            Corner::DownRight => self.down_right,
            Corner::Center => self.center,
        }
    }
}

/// Which point of a box a displacement is measured against.
///
/// Each layout kind anchors on a fixed corner: aligning left moves the
/// up-left corner onto the target, distribution re-centers, untangle
/// stacks on the leading corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Center,
}

/// A computed destination for one marker: the policy's target point,
/// the corner the displacement is measured against, and the view frame
/// the point is expressed in.
#[derive(Debug, Clone, Copy)]
pub struct MoveTarget {
    pub marker: MarkerId,
    pub point: Point2,
    pub corner: Corner,
    pub frame: ViewFrame,
}
