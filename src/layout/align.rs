//! Edge and center alignment
//!
//! One generic routine consumes a per-kind rule table: each alignment
//! kind contributes a reference-coordinate extractor, the axis it fixes,
//! and the box corner displacements are measured against.

use crate::geometry::Point2;
use crate::host::MarkerId;

use super::types::{AnnotationBox, Corner};

/// An alignment kind over view-plane boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignKind {
    /// Align left edges on the leftmost box
    Left,
    /// Align right edges on the rightmost box
    Right,
    /// Align top edges on the topmost box
    Up,
    /// Align bottom edges on the bottommost box
    Down,
    /// Align vertical centerlines on the midpoint of the outermost edges
    Center,
    /// Align horizontal centerlines on the midpoint of the outermost edges
    Middle,
}

/// Which coordinate an alignment rule pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pinned {
    X,
    Y,
}

/// The per-kind alignment rule: how to compute the shared reference
/// coordinate and which corner each box is anchored by.
struct AlignRule {
    pinned: Pinned,
    corner: Corner,
    reference: fn(&[AnnotationBox]) -> f64,
}

fn min_up_left_x(boxes: &[AnnotationBox]) -> f64 {
    boxes.iter().map(|b| b.up_left.x).fold(f64::INFINITY, f64::min)
}

fn max_up_right_x(boxes: &[AnnotationBox]) -> f64 {
    boxes.iter().map(|b| b.up_right.x).fold(f64::NEG_INFINITY, f64::max)
}

fn max_up_right_y(boxes: &[AnnotationBox]) -> f64 {
    boxes.iter().map(|b| b.up_right.y).fold(f64::NEG_INFINITY, f64::max)
}

fn min_down_right_y(boxes: &[AnnotationBox]) -> f64 {
    boxes.iter().map(|b| b.down_right.y).fold(f64::INFINITY, f64::min)
}

fn center_x(boxes: &[AnnotationBox]) -> f64 {
    (max_up_right_x(boxes) + min_up_left_x(boxes)) / 2.0
}

fn center_y(boxes: &[AnnotationBox]) -> f64 {
    (max_up_right_y(boxes) + min_down_right_y(boxes)) / 2.0
}

fn rule(kind: AlignKind) -> AlignRule {
    match kind {
        AlignKind::Left => AlignRule {
            pinned: Pinned::X,
            corner: Corner::UpLeft,
            reference: min_up_left_x,
        },
        AlignKind::Right => AlignRule {
            pinned: Pinned::X,
            corner: Corner::UpRight,
            reference: max_up_right_x,
        },
        AlignKind::Up => AlignRule {
            pinned: Pinned::Y,
            corner: Corner::UpRight,
            reference: max_up_right_y,
        },
        AlignKind::Down => AlignRule {
            pinned: Pinned::Y,
            corner: Corner::DownRight,
            reference: min_down_right_y,
        },
        AlignKind::Center => AlignRule {
            pinned: Pinned::X,
            corner: Corner::Center,
            reference: center_x,
        },
        AlignKind::Middle => AlignRule {
            pinned: Pinned::Y,
            corner: Corner::Center,
            reference: center_y,
        },
    }
}

/// The corner a given alignment kind measures displacements against
pub fn anchor_corner(kind: AlignKind) -> Corner {
    rule(kind).corner
}

/// Compute alignment targets for every box.
///
/// The caller guarantees `boxes.len() >= 2`. Each box keeps its own
/// coordinate on the free axis; the pinned axis takes the shared
/// reference. When several boxes share the extreme, any of them can be
/// the reference source since only the coordinate value matters.
pub fn align(boxes: &[AnnotationBox], kind: AlignKind) -> Vec<(MarkerId, Point2)> {
    let rule = rule(kind);
    let reference = (rule.reference)(boxes);

    boxes
        .iter()
        .map(|b| {
            let own = b.corner(rule.corner);
            let target = match rule.pinned {
                Pinned::X => Point2::new(reference, own.y),
                Pinned::Y => Point2::new(own.x, reference),
            };
            (b.owner, target)
        })
        .collect()
}
