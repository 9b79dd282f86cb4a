//! Annotation layout engine for CAD drawing views.
//!
//! Markers (tags, text notes, spatial tags) live anchored to 3D model
//! elements but are read on a 2D sheet. This crate measures their
//! view-plane footprints through a [`Host`] document adapter, computes
//! new positions with one of the layout policies (align, distribute,
//! untangle, arrange), and writes the moves back inside host
//! transactions so a failed call leaves the document untouched.
//!
//! [`run_layout`] is the entry point; the [`scene`] module provides an
//! in-memory host for files and tests.

pub mod error;
pub mod executor;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod scene;
pub mod view;

use std::collections::BTreeMap;

use error::LayoutError;
use geometry::Point2;
use host::{Host, MarkerId, MarkerSnapshot};
use layout::types::{Axis, Corner, MoveTarget};
use layout::align::anchor_corner;
use layout::{align, arrange, distribute, untangle, AlignKind, ArrangeConfig, UntangleItem};

pub use error::HostError;
pub use host::{LeaderState, MarkerKind};
pub use scene::{MarkerSpec, Scene};
pub use view::{ViewFrame, ViewId};

/// The layout operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    AlignLeft,
    AlignRight,
    AlignUp,
    AlignDown,
    AlignCenter,
    AlignMiddle,
    DistributeHorizontal,
    DistributeVertical,
    UntangleHorizontal,
    UntangleVertical,
    /// Sweep every leadered tag in the view to the crop margins
    Arrange,
}

impl LayoutKind {
    /// Transaction label shown in the host's undo history
    pub fn label(self) -> &'static str {
        match self {
            LayoutKind::AlignLeft => "Align left",
            LayoutKind::AlignRight => "Align right",
            LayoutKind::AlignUp => "Align up",
            LayoutKind::AlignDown => "Align down",
            LayoutKind::AlignCenter => "Align center",
            LayoutKind::AlignMiddle => "Align middle",
            LayoutKind::DistributeHorizontal => "Distribute horizontally",
            LayoutKind::DistributeVertical => "Distribute vertically",
            LayoutKind::UntangleHorizontal => "Untangle horizontally",
            LayoutKind::UntangleVertical => "Untangle vertically",
            LayoutKind::Arrange => "Arrange tags",
        }
    }

    /// Smallest selection the operation makes sense on.
    /// Arrange finds its own candidates and ignores the selection.
    pub fn min_selection(self) -> usize {
        match self {
            LayoutKind::Arrange => 0,
            _ => 2,
        }
    }

    fn align_kind(self) -> Option<AlignKind> {
        match self {
            LayoutKind::AlignLeft => Some(AlignKind::Left),
            LayoutKind::AlignRight => Some(AlignKind::Right),
            LayoutKind::AlignUp => Some(AlignKind::Up),
            LayoutKind::AlignDown => Some(AlignKind::Down),
            LayoutKind::AlignCenter => Some(AlignKind::Center),
            LayoutKind::AlignMiddle => Some(AlignKind::Middle),
            _ => None,
        }
    }
}

/// One layout call: what to run and on which markers.
///
/// An empty selection triggers the host's interactive pick (except for
/// [`LayoutKind::Arrange`], which always works on the whole view).
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    pub kind: LayoutKind,
    pub selection: Vec<MarkerId>,
}

/// Tuning knobs for a layout run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub arrange: ArrangeConfig,
    /// Dump per-marker targets to stderr
    pub debug: bool,
}

/// What a layout call did, marker by marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutSummary {
    pub moved: usize,
    pub skipped_pinned: usize,
    /// Markers already at their target
    pub skipped_zero: usize,
    /// Markers dropped during measurement (no view, no box)
    pub skipped_unmeasured: usize,
}

/// Terminal outcome of a layout call, for callers that fold errors
/// into a displayable message (CLI, host UI) instead of matching on
/// [`LayoutError`] variants.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOutcome {
    Succeeded(LayoutSummary),
    /// The user aborted the interactive pick; not a failure
    Cancelled,
    Failed(String),
}

impl From<Result<LayoutSummary, LayoutError>> for LayoutOutcome {
    fn from(result: Result<LayoutSummary, LayoutError>) -> Self {
        match result {
            Ok(summary) => LayoutOutcome::Succeeded(summary),
            Err(err) if err.is_cancelled() => LayoutOutcome::Cancelled,
            Err(err) => LayoutOutcome::Failed(err.to_string()),
        }
    }
}

/// Run one layout operation against a host document.
///
/// The whole call is bracketed in a host transaction group: on success
/// it collapses to a single undo step, on failure everything (including
/// committed measurement prep) is rolled back. Cancelling the
/// interactive pick returns [`LayoutError::Cancelled`] before the group
/// opens.
pub fn run_layout<H: Host + ?Sized>(
    host: &mut H,
    request: &LayoutRequest,
    config: &RunConfig,
) -> Result<LayoutSummary, LayoutError> {
    let selection = if request.kind == LayoutKind::Arrange {
        vec![]
    } else if request.selection.is_empty() {
        host.prompt_selection()?
    } else {
        request.selection.clone()
    };

    let needed = request.kind.min_selection();
    if selection.len() < needed {
        return Err(LayoutError::InsufficientSelection {
            needed,
            got: selection.len(),
        });
    }

    host.begin_group(request.kind.label())?;
    match run_inner(host, request.kind, &selection, config) {
        Ok(summary) => {
            host.commit_group()?;
            Ok(summary)
        }
        Err(err) => {
            // Best effort: the rollback error would shadow the real one
            let _ = host.rollback_group();
            Err(err)
        }
    }
}

fn run_inner<H: Host + ?Sized>(
    host: &mut H,
    kind: LayoutKind,
    selection: &[MarkerId],
    config: &RunConfig,
) -> Result<LayoutSummary, LayoutError> {
    if kind == LayoutKind::Arrange {
        let report = arrange(host, &config.arrange)?;
        return Ok(LayoutSummary {
            moved: report.arranged,
            skipped_unmeasured: report.skipped,
            ..Default::default()
        });
    }

    let measured = host::measure(host, selection)?;
    let snapshots: BTreeMap<MarkerId, &MarkerSnapshot> =
        measured.markers.iter().map(|s| (s.id, s)).collect();
    let boxes: Vec<_> = measured.markers.iter().map(|s| s.bbox).collect();

    let (targets, corner): (Vec<(MarkerId, Point2)>, Corner) = match kind {
        LayoutKind::DistributeHorizontal => (distribute(&boxes, Axis::Horizontal), Corner::Center),
        LayoutKind::DistributeVertical => (distribute(&boxes, Axis::Vertical), Corner::Center),
        LayoutKind::UntangleHorizontal | LayoutKind::UntangleVertical => {
            let items: Vec<UntangleItem> = measured
                .markers
                .iter()
                .map(|s| UntangleItem::new(s.bbox, s.leader.map(|l| l.end)))
                .collect();
            let axis = if kind == LayoutKind::UntangleHorizontal {
                Axis::Horizontal
            } else {
                Axis::Vertical
            };
            (untangle(&items, axis), Corner::UpLeft)
        }
        _ => match kind.align_kind() {
            Some(align_kind) => (align(&boxes, align_kind), anchor_corner(align_kind)),
            // Arrange returned above
            None => unreachable!(),
        },
    };

    if config.debug {
        for (id, point) in &targets {
            eprintln!("target {:?} -> ({:.4}, {:.4})", id, point.x, point.y);
        }
    }

    let mut summary = LayoutSummary {
        skipped_unmeasured: measured.skipped,
        ..Default::default()
    };
    host.begin(kind.label())?;
    for (id, point) in targets {
        // Policies only emit targets for measured markers
        let snapshot = snapshots[&id];
        let target = MoveTarget {
            marker: id,
            point,
            corner,
            frame: snapshot.frame,
        };
        match executor::apply(host, snapshot, &target)? {
            executor::ApplyResult::Moved => summary.moved += 1,
            executor::ApplyResult::SkippedPinned => summary.skipped_pinned += 1,
            executor::ApplyResult::SkippedZero => summary.skipped_zero += 1,
        }
    }
    host.commit()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_selection_per_kind() {
        assert_eq!(LayoutKind::AlignLeft.min_selection(), 2);
        assert_eq!(LayoutKind::DistributeVertical.min_selection(), 2);
        assert_eq!(LayoutKind::Arrange.min_selection(), 0);
    }

    #[test]
    fn test_outcome_folds_cancellation_and_failure() {
        let ok: LayoutOutcome = Ok(LayoutSummary::default()).into();
        assert_eq!(ok, LayoutOutcome::Succeeded(LayoutSummary::default()));

        let cancelled: LayoutOutcome = Err(LayoutError::Cancelled).into();
        assert_eq!(cancelled, LayoutOutcome::Cancelled);

        let failed: LayoutOutcome = Err(LayoutError::CropBoxRequired).into();
        match failed {
            LayoutOutcome::Failed(msg) => assert!(msg.contains("crop box")),
            other => panic!("expected failure outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_labels_are_distinct() {
        let kinds = [
            LayoutKind::AlignLeft,
            LayoutKind::AlignRight,
            LayoutKind::AlignUp,
            LayoutKind::AlignDown,
            LayoutKind::AlignCenter,
            LayoutKind::AlignMiddle,
            LayoutKind::DistributeHorizontal,
            LayoutKind::DistributeVertical,
            LayoutKind::UntangleHorizontal,
            LayoutKind::UntangleVertical,
            LayoutKind::Arrange,
        ];
        let mut labels: Vec<_> = kinds.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), kinds.len());
    }
}
