//! Applying computed targets to host markers
//!
//! The executor turns a policy's view-plane target into a model-space
//! displacement and writes it through the host, with per-kind leader
//! bookkeeping so leader tips stay put while marker heads move.

use crate::error::HostError;
use crate::geometry::point_in_polygon;
use crate::host::{Host, MarkerKind, MarkerSnapshot};
use crate::layout::types::MoveTarget;

/// Displacements shorter than this are treated as zero and skipped,
/// avoiding spurious no-op host mutations.
const ZERO_TOLERANCE: f64 = 1e-9;

/// What the executor did with one marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    Moved,
    /// Pinned markers never move
    SkippedPinned,
    /// The marker was already at its target
    SkippedZero,
}

/// Apply one move target to its marker.
///
/// The displacement is measured in view-plane coordinates against the
/// corner the policy anchored on, then carried into model space through
/// the marker's view frame.
pub fn apply<H: Host + ?Sized>(
    host: &mut H,
    snapshot: &MarkerSnapshot,
    target: &MoveTarget,
) -> Result<ApplyResult, HostError> {
    if snapshot.pinned {
        return Ok(ApplyResult::SkippedPinned);
    }

    let displacement = (target.point - snapshot.bbox.corner(target.corner)).to_3d();
    if displacement.is_zero(ZERO_TOLERANCE) {
        return Ok(ApplyResult::SkippedZero);
    }
    let model_displacement = target.frame.vector_to_model(displacement);

    match snapshot.kind {
        MarkerKind::Tag => {
            // A free leader's end must stay put while the head moves:
            // capture it, move, write it back.
            let saved = host.leader(target.marker).filter(|l| l.free);
            host.move_anchor(target.marker, model_displacement)?;
            if let Some(leader) = saved {
                host.set_leader(target.marker, leader)?;
            }
        }
        MarkerKind::Text => {
            let saved = host.text_leaders(target.marker);
            host.move_anchor(target.marker, model_displacement)?;
            if !saved.is_empty() {
                host.set_text_leaders(target.marker, saved)?;
            }
        }
        MarkerKind::Spatial => {
            host.move_anchor(target.marker, model_displacement)?;
            // A spatial tag pushed out of its owning region needs a
            // leader back to it; recover silently rather than erroring.
            if !host.is_orphaned(target.marker) && !host.has_leader(target.marker) {
                if let Some(region) = host.owning_region(target.marker) {
                    let anchor = snapshot.frame.project(host.anchor(target.marker)?);
                    if !point_in_polygon(anchor, &region) {
                        host.set_has_leader(target.marker, true)?;
                    }
                }
            }
        }
        MarkerKind::Generic => {
            host.move_anchor(target.marker, model_displacement)?;
        }
    }

    Ok(ApplyResult::Moved)
}
