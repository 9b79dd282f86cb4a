//! Margin arrangement of leadered tags
//!
//! Relocates every leadered tag in the active view onto evenly spaced
//! slots along the view's left and right margins, resolving leader-line
//! crossings by pairwise slot swaps and bending each leader at a
//! 45-degree elbow.
//!
//! Four strictly ordered phases:
//! 1. detach every candidate leader (free mode, end snapped to the
//!    anchor) inside a committed transaction, so measurements are
//!    isolated from leader-follow side effects;
//! 2. classify each tag to a margin side and record sizes;
//! 3. generate margin slots and greedily assign each tag the nearest
//!    available one;
//! 4. swap assignments that produce crossing leaders (two fixed passes),
//!    then write anchors, leader modes, and elbows back.

use crate::error::LayoutError;
use crate::geometry::{segments_intersect, Point2};
use crate::host::{Host, LeaderState, MarkerId, MarkerKind};
use crate::view::ViewFrame;

use super::types::AnnotationBox;

/// Tuning knobs for the arrange pass
#[derive(Debug, Clone)]
pub struct ArrangeConfig {
    /// Vertical slot step as a multiple of the tallest tag
    pub spacing_factor: f64,
    /// Gap between the crop boundary and the tag body, view units
    pub margin_padding: f64,
    /// Decimal places leader ends are rounded to before comparisons
    pub rounding_decimals: u32,
    /// Fixed number of crossing-resolution passes
    pub crossing_passes: usize,
}

impl Default for ArrangeConfig {
    fn default() -> Self {
        Self {
            spacing_factor: 1.2,
            margin_padding: 0.5,
            rounding_decimals: 4,
            crossing_passes: 2,
        }
    }
}

impl ArrangeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spacing_factor(mut self, factor: f64) -> Self {
        self.spacing_factor = factor;
        self
    }

    pub fn with_margin_padding(mut self, padding: f64) -> Self {
        self.margin_padding = padding;
        self
    }
}

/// Which view margin a tag is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A measured candidate tag awaiting a slot
#[derive(Debug, Clone)]
struct Candidate {
    id: MarkerId,
    bbox: AnnotationBox,
    /// Projected center of the tagged element, rounded
    leader_end: Point2,
    side: Side,
}

/// A tag with its slot assignment and computed elbow
#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: MarkerId,
    pub side: Side,
    pub slot: Point2,
    pub elbow: Point2,
    pub leader_end: Point2,
    pub width: f64,
}

/// Counts reported back to the caller
#[derive(Debug, Clone, Default)]
pub struct ArrangeReport {
    pub arranged: usize,
    /// Tags dropped for a missing bounding box or exhausted slot pool
    pub skipped: usize,
}

/// Compute the 45-degree-constrained elbow for a leader running from
/// `leader_end` to `slot`.
///
/// The elbow sits on the slot's horizontal, positioned so the segment
/// toward the leader end leaves at 45 degrees (drafting convention):
/// for `d = leader_end - slot`, the bend is at
/// `slot.x + d.x - d.y * tan(sign(d.x * d.y) * pi/4)`.
pub fn leader_elbow(leader_end: Point2, slot: Point2) -> Point2 {
    let d = leader_end - slot;
    let sign = (d.x * d.y).signum();
    let tangent = if d.x * d.y == 0.0 {
        0.0
    } else {
        (sign * std::f64::consts::FRAC_PI_4).tan()
    };
    Point2::new(slot.x + d.x - d.y * tangent, slot.y)
}

/// Whether two assigned leaders cross anywhere along their polylines.
///
/// Each leader is two segments, end-elbow and elbow-slot; any of the
/// four segment pairings intersecting counts as a crossing.
pub fn leaders_cross(a: &Assignment, b: &Assignment) -> bool {
    let a_segs = [(a.leader_end, a.elbow), (a.elbow, a.slot)];
    let b_segs = [(b.leader_end, b.elbow), (b.elbow, b.slot)];
    for (a1, a2) in a_segs {
        for (b1, b2) in b_segs {
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Swap slot assignments between pairs whose leaders cross.
///
/// A fixed number of passes over all ordered pairs, not iteration to
/// convergence: two passes remove the bulk of crossings in practice and
/// bound the runtime. The result is not guaranteed crossing-free.
pub fn resolve_crossings(assignments: &mut [Assignment], passes: usize) {
    for _ in 0..passes {
        for i in 0..assignments.len() {
            for j in 0..assignments.len() {
                if i == j {
                    continue;
                }
                if leaders_cross(&assignments[i], &assignments[j]) {
                    let slot_i = assignments[i].slot;
                    let slot_j = assignments[j].slot;
                    assignments[i].slot = slot_j;
                    assignments[j].slot = slot_i;
                    assignments[i].elbow = leader_elbow(assignments[i].leader_end, slot_j);
                    assignments[j].elbow = leader_elbow(assignments[j].leader_end, slot_i);
                }
            }
        }
    }
}

/// Generate candidate slot points along one margin of the crop box,
/// bottom to top.
pub fn margin_slots(frame: &ViewFrame, side: Side, step: f64) -> Vec<Point2> {
    let x = match side {
        Side::Left => frame.crop_min.x,
        Side::Right => frame.crop_max.x,
    };
    let mut slots = Vec::new();
    if step <= 0.0 {
        return slots;
    }
    // Positions come from one multiplication each, not a running sum:
    // accumulated float error can push the topmost slot past crop_max.
    for i in 0.. {
        let y = frame.crop_min.y + i as f64 * step;
        if y > frame.crop_max.y {
            break;
        }
        slots.push(Point2::new(x, y));
    }
    slots
}

/// Pick the slot nearest to `base` and remove it from the pool.
fn take_nearest(slots: &mut Vec<Point2>, base: Point2) -> Option<Point2> {
    let (best, _) = slots
        .iter()
        .enumerate()
        .map(|(i, s)| (i, base.distance_to(*s)))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    Some(slots.swap_remove(best))
}

/// Run the arrange pass over every leadered tag in the active view.
///
/// Fails with `CropBoxRequired` before touching anything if the view
/// has no active crop box. The caller brackets the call in a host
/// transaction group.
pub fn arrange<H: Host + ?Sized>(
    host: &mut H,
    config: &ArrangeConfig,
) -> Result<ArrangeReport, LayoutError> {
    let view = host.active_view().ok_or(LayoutError::NoActiveView)?;
    let frame = host.view_frame(view).ok_or(LayoutError::NoActiveView)?;
    if !frame.crop_active {
        return Err(LayoutError::CropBoxRequired);
    }

    // Candidate reads are fatal on error, like measurement: a marker
    // the host cannot describe means the document changed under us.
    let mut candidates: Vec<MarkerId> = Vec::new();
    for id in host.markers_in_view(view) {
        if host.marker_kind(id)? != MarkerKind::Tag || !host.has_leader(id) {
            continue;
        }
        if host.is_pinned(id)? {
            continue;
        }
        candidates.push(id);
    }

    let mut report = ArrangeReport::default();
    if candidates.is_empty() {
        return Ok(report);
    }

    // Phase 1: detach. The commit is the recompute boundary; boxes read
    // afterwards reflect post-detach geometry.
    host.begin("Detach leaders")?;
    for &id in &candidates {
        let end = frame.project(host.anchor(id)?);
        let leader = host.leader(id).unwrap_or(LeaderState {
            end,
            elbow: end,
            free: true,
        });
        host.set_leader(
            id,
            LeaderState {
                end,
                free: true,
                ..leader
            },
        )?;
    }
    host.commit()?;

    // Phase 2: classify and size
    let mut measured = Vec::with_capacity(candidates.len());
    let mut max_height: f64 = 0.0;
    for &id in &candidates {
        let Some((t_min, t_max)) = host.tagged_element_box(id, view) else {
            report.skipped += 1;
            continue;
        };
        let Some((min, max)) = host.bounding_box(id, view) else {
            report.skipped += 1;
            continue;
        };
        let leader_end = frame
            .project((t_min + t_max) / 2.0)
            .rounded(config.rounding_decimals);
        let side = if leader_end.x < frame.horizontal_center() {
            Side::Left
        } else {
            Side::Right
        };
        let bbox = AnnotationBox::project(id, min, max, &frame, host.pending_leader_displacement(id));
        max_height = max_height.max(bbox.height());
        measured.push(Candidate {
            id,
            bbox,
            leader_end,
            side,
        });
    }

    if measured.is_empty() {
        return Ok(report);
    }

    // Phase 3: slots and greedy nearest assignment, per side
    let step = max_height * config.spacing_factor;
    let mut assignments = Vec::with_capacity(measured.len());
    for side in [Side::Left, Side::Right] {
        let mut pool = margin_slots(&frame, side, step);
        let mut tags: Vec<&Candidate> = measured.iter().filter(|c| c.side == side).collect();
        // Spatial proximity on the page predicts assignment order: sort
        // by leader end, bottom-up, with x breaking ties toward the
        // margin being filled.
        match side {
            Side::Left => tags.sort_by(|a, b| {
                a.leader_end
                    .y
                    .total_cmp(&b.leader_end.y)
                    .then(a.leader_end.x.total_cmp(&b.leader_end.x))
            }),
            Side::Right => tags.sort_by(|a, b| {
                a.leader_end
                    .y
                    .total_cmp(&b.leader_end.y)
                    .then(b.leader_end.x.total_cmp(&a.leader_end.x))
            }),
        }
        for tag in tags {
            let Some(slot) = take_nearest(&mut pool, tag.bbox.center) else {
                report.skipped += 1;
                continue;
            };
            assignments.push(Assignment {
                id: tag.id,
                side,
                slot,
                elbow: leader_elbow(tag.leader_end, slot),
                leader_end: tag.leader_end,
                width: tag.bbox.width(),
            });
        }
    }

    // Phase 4: crossing resolution, then commit
    resolve_crossings(&mut assignments, config.crossing_passes);

    host.begin("Arrange tags")?;
    for a in &assignments {
        let outward = a.width / 2.0 + config.margin_padding;
        let anchor_x = match a.side {
            Side::Left => a.slot.x - outward,
            Side::Right => a.slot.x + outward,
        };
        let anchor = Point2::new(anchor_x, a.slot.y);
        host.set_anchor(a.id, frame.to_model(anchor.to_3d()))?;
        host.set_leader(
            a.id,
            LeaderState {
                end: a.leader_end,
                elbow: a.elbow,
                free: false,
            },
        )?;
        report.arranged += 1;
    }
    host.commit()?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;
    use crate::geometry::Transform;

    fn frame() -> ViewFrame {
        ViewFrame {
            transform: Transform::identity(),
            crop_active: true,
            crop_min: Point3::new(-10.0, -10.0, 0.0),
            crop_max: Point3::new(10.0, 10.0, 0.0),
        }
    }

    #[test]
    fn test_margin_slots_span_crop_height() {
        let slots = margin_slots(&frame(), Side::Left, 5.0);
        assert_eq!(slots.len(), 5); // -10, -5, 0, 5, 10
        assert!(slots.iter().all(|s| s.x == -10.0));
        assert_eq!(slots[0].y, -10.0);
        assert_eq!(slots[4].y, 10.0);
    }

    #[test]
    fn test_margin_slots_reach_crop_top_at_exact_multiple() {
        // Crop height 1.0 with step 0.1: summing 0.1 repeatedly lands
        // short of the top, so the last slot must come from i * step.
        let frame = ViewFrame {
            crop_min: Point3::new(0.0, 0.0, 0.0),
            crop_max: Point3::new(1.0, 1.0, 0.0),
            ..frame()
        };
        let slots = margin_slots(&frame, Side::Left, 0.1);
        assert_eq!(slots.len(), 11);
        assert_eq!(slots.last().unwrap().y, 1.0);
    }

    #[test]
    fn test_margin_slots_right_side() {
        let slots = margin_slots(&frame(), Side::Right, 10.0);
        assert!(slots.iter().all(|s| s.x == 10.0));
    }

    #[test]
    fn test_leader_elbow_45_degrees() {
        // Leader end up-right of the slot: the bend must make the
        // end-elbow segment run at 45 degrees.
        let slot = Point2::new(0.0, 0.0);
        let end = Point2::new(8.0, 3.0);
        let elbow = leader_elbow(end, slot);
        assert_eq!(elbow.y, 0.0);
        // d = (8,3), sign positive, elbow.x = 8 - 3 = 5
        assert_eq!(elbow.x, 5.0);
        let seg = end - elbow;
        assert!((seg.x.abs() - seg.y.abs()).abs() < 1e-12);
    }

    #[test]
    fn test_leader_elbow_axis_aligned_end() {
        // End level with the slot: no bend offset
        let elbow = leader_elbow(Point2::new(6.0, 0.0), Point2::new(0.0, 0.0));
        assert_eq!(elbow, Point2::new(6.0, 0.0));
    }

    fn assignment(id: u64, slot: Point2, end: Point2) -> Assignment {
        Assignment {
            id: MarkerId(id),
            side: Side::Left,
            slot,
            elbow: leader_elbow(end, slot),
            leader_end: end,
            width: 1.0,
        }
    }

    #[test]
    fn test_crossing_pair_swaps_and_uncrosses() {
        // Two tags on the same margin with swapped targets: leader A
        // points high but holds the low slot, and vice versa.
        let mut assignments = vec![
            assignment(1, Point2::new(-10.0, 0.0), Point2::new(0.0, 8.0)),
            assignment(2, Point2::new(-10.0, 8.0), Point2::new(0.0, 0.0)),
        ];
        assert!(leaders_cross(&assignments[0], &assignments[1]));

        resolve_crossings(&mut assignments, 1);

        assert_eq!(assignments[0].slot, Point2::new(-10.0, 8.0));
        assert_eq!(assignments[1].slot, Point2::new(-10.0, 0.0));
        assert!(!leaders_cross(&assignments[0], &assignments[1]));
    }

    #[test]
    fn test_non_crossing_pair_untouched() {
        let mut assignments = vec![
            assignment(1, Point2::new(-10.0, 0.0), Point2::new(0.0, 0.0)),
            assignment(2, Point2::new(-10.0, 8.0), Point2::new(0.0, 8.0)),
        ];
        let before: Vec<Point2> = assignments.iter().map(|a| a.slot).collect();
        resolve_crossings(&mut assignments, 2);
        let after: Vec<Point2> = assignments.iter().map(|a| a.slot).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_default_config() {
        let config = ArrangeConfig::default();
        assert_eq!(config.spacing_factor, 1.2);
        assert_eq!(config.crossing_passes, 2);
    }
}
