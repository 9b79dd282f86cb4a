//! Host document boundary
//!
//! The engine never owns annotation markers: it sees them as opaque
//! handles and reads/writes them through the [`Host`] trait, which a CAD
//! document adapter implements. The in-memory [`Scene`](crate::scene::Scene)
//! implementation backs the CLI and the test suite.

use serde::{Deserialize, Serialize};

use crate::error::{HostError, LayoutError};
use crate::geometry::{Point2, Point3};
use crate::layout::types::AnnotationBox;
use crate::view::{ViewFrame, ViewId};

/// Opaque handle to an annotation marker owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

/// The capability set of a marker, as a closed variant.
///
/// Dispatch on marker behavior (leader bookkeeping, containment rules)
/// is a pattern match on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Tag with a head position and an optional single leader
    Tag,
    /// Text note with a coordinate and zero-to-many leaders
    Text,
    /// Spatial tag constrained to its owning region unless leadered
    Spatial,
    /// Plain marker with a location point and no leader
    Generic,
}

/// Leader line state for one marker, in view-plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeaderState {
    /// Where the leader points
    pub end: Point2,
    /// Bend point between the marker and the end
    pub elbow: Point2,
    /// True when the end is user-set rather than tied to the tagged element
    pub free: bool,
}

/// Host document contract consumed by the layout engine.
///
/// Bounding boxes and anchors are in model coordinates; leader state is
/// in view-plane coordinates. Transaction primitives bracket the
/// multi-phase algorithms: `begin`/`commit` scope one batch of
/// mutations, the group calls scope a whole layout call, and
/// `revert_and_restart` undoes committed measurement prep while keeping
/// the group open (the revert mechanics stay on the host side).
pub trait Host {
    fn active_view(&self) -> Option<ViewId>;
    fn owner_view(&self, marker: MarkerId) -> Option<ViewId>;
    fn view_frame(&self, view: ViewId) -> Option<ViewFrame>;

    fn marker_kind(&self, marker: MarkerId) -> Result<MarkerKind, HostError>;
    fn is_pinned(&self, marker: MarkerId) -> Result<bool, HostError>;
    /// Axis-aligned bounding box of the marker itself, in model space
    fn bounding_box(&self, marker: MarkerId, view: ViewId) -> Option<(Point3, Point3)>;
    fn anchor(&self, marker: MarkerId) -> Result<Point3, HostError>;
    fn set_anchor(&mut self, marker: MarkerId, point: Point3) -> Result<(), HostError>;
    fn move_anchor(&mut self, marker: MarkerId, displacement: Point3) -> Result<(), HostError>;

    /// Single leader of a tag marker, if any
    fn leader(&self, marker: MarkerId) -> Option<LeaderState>;
    fn set_leader(&mut self, marker: MarkerId, leader: LeaderState) -> Result<(), HostError>;
    /// All leaders of a text marker, in creation order
    fn text_leaders(&self, marker: MarkerId) -> Vec<LeaderState>;
    fn set_text_leaders(
        &mut self,
        marker: MarkerId,
        leaders: Vec<LeaderState>,
    ) -> Result<(), HostError>;
    fn remove_leaders(&mut self, marker: MarkerId) -> Result<(), HostError>;
    fn has_leader(&self, marker: MarkerId) -> bool;
    fn set_has_leader(&mut self, marker: MarkerId, value: bool) -> Result<(), HostError>;

    /// Whether a spatial tag lost the element it annotates
    fn is_orphaned(&self, marker: MarkerId) -> bool;
    /// Owning region polygon of a spatial tag, in view-plane coordinates
    fn owning_region(&self, marker: MarkerId) -> Option<Vec<Point2>>;

    /// Bounding box of the element the marker annotates (not the marker)
    fn tagged_element_box(&self, marker: MarkerId, view: ViewId) -> Option<(Point3, Point3)>;
    /// All markers visible in a view
    fn markers_in_view(&self, view: ViewId) -> Vec<MarkerId>;
    /// Leader-end displacement committed to the marker but not yet
    /// reflected in its bounding box. View-space vector.
    fn pending_leader_displacement(&self, _marker: MarkerId) -> Option<Point3> {
        None
    }

    /// Ask the user to pick markers interactively.
    /// Returns `HostError::Cancelled` when the pick is aborted.
    fn prompt_selection(&mut self) -> Result<Vec<MarkerId>, HostError>;

    fn begin_group(&mut self, label: &str) -> Result<(), HostError>;
    fn commit_group(&mut self) -> Result<(), HostError>;
    fn rollback_group(&mut self) -> Result<(), HostError>;
    fn begin(&mut self, label: &str) -> Result<(), HostError>;
    fn commit(&mut self) -> Result<(), HostError>;
    fn rollback(&mut self) -> Result<(), HostError>;
    /// Undo everything committed since the group opened and start the
    /// group again. Used to measure geometry without keeping the
    /// measurement prep.
    fn revert_and_restart(&mut self) -> Result<(), HostError>;
}

/// One marker's measured state, captured before any policy runs.
#[derive(Debug, Clone)]
pub struct MarkerSnapshot {
    pub id: MarkerId,
    pub kind: MarkerKind,
    pub pinned: bool,
    /// Frame of the marker's owner view (or the active view fallback)
    pub frame: ViewFrame,
    /// Screen-space footprint in that frame
    pub bbox: AnnotationBox,
    /// Leader state at measurement time, if the marker had one
    pub leader: Option<LeaderState>,
}

/// Result of the measurement phase.
#[derive(Debug, Clone)]
pub struct MeasureReport {
    pub markers: Vec<MarkerSnapshot>,
    /// Markers dropped for lacking a resolvable view or bounding box
    pub skipped: usize,
}

/// Measure the selection's view-plane footprints.
///
/// Leader prep runs inside an inner transaction: tag leaders are forced
/// free with their end snapped onto the head, and text leaders are
/// removed, so the measured boxes reflect marker bodies alone. After
/// projection the host reverts the prep (`revert_and_restart`), leaving
/// the document untouched from the caller's perspective while the
/// engine keeps the snapshot.
///
/// Markers whose owner view cannot be resolved (and the document has an
/// active-view fallback that also fails) are skipped, not fatal.
pub fn measure<H: Host + ?Sized>(
    host: &mut H,
    selection: &[MarkerId],
) -> Result<MeasureReport, LayoutError> {
    // Leader ends drive untangle ordering, so capture them before the
    // prep transaction rewrites them.
    let original_leaders: Vec<Option<LeaderState>> =
        selection.iter().map(|&id| host.leader(id)).collect();

    host.begin("Prepare markers")?;
    for &id in selection {
        match host.marker_kind(id)? {
            MarkerKind::Tag => {
                if let Some(mut leader) = host.leader(id) {
                    let view = resolve_view(host, id);
                    if let Some(frame) = view.and_then(|v| host.view_frame(v)) {
                        leader.free = true;
                        leader.end = frame.project(host.anchor(id)?);
                        host.set_leader(id, leader)?;
                    }
                }
            }
            MarkerKind::Text => {
                host.remove_leaders(id)?;
            }
            MarkerKind::Spatial | MarkerKind::Generic => {}
        }
    }
    host.commit()?;

    let mut markers = Vec::with_capacity(selection.len());
    let mut skipped = 0;
    for (i, &id) in selection.iter().enumerate() {
        let Some(view) = resolve_view(host, id) else {
            skipped += 1;
            continue;
        };
        let Some(frame) = host.view_frame(view) else {
            skipped += 1;
            continue;
        };
        let Some((min, max)) = host.bounding_box(id, view) else {
            skipped += 1;
            continue;
        };
        let pending = host.pending_leader_displacement(id);
        let bbox = AnnotationBox::project(id, min, max, &frame, pending);
        markers.push(MarkerSnapshot {
            id,
            kind: host.marker_kind(id)?,
            pinned: host.is_pinned(id)?,
            frame,
            bbox,
            leader: original_leaders[i],
        });
    }

    host.revert_and_restart()?;
    Ok(MeasureReport { markers, skipped })
}

/// Owner view of a marker, falling back to the document's active view.
pub fn resolve_view<H: Host + ?Sized>(host: &H, marker: MarkerId) -> Option<ViewId> {
    host.owner_view(marker).or_else(|| host.active_view())
}
