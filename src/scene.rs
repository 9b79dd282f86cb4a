//! In-memory host document
//!
//! `Scene` is a self-contained [`Host`] implementation: a single view
//! frame plus a set of markers, loadable from TOML. It backs the CLI
//! and the integration tests, including the transactional contract
//! (snapshot-based begin/commit/rollback and measurement revert).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::geometry::{Point2, Point3, Transform};
use crate::host::{Host, LeaderState, MarkerId, MarkerKind};
use crate::view::{ViewFrame, ViewId};

/// Declarative description of one marker, as found in a scene file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub kind: MarkerKind,
    /// Anchor point in model coordinates
    pub anchor: Point3,
    /// Body width and height in view-plane units
    #[serde(default = "default_size")]
    pub size: (f64, f64),
    #[serde(default)]
    pub pinned: bool,
    /// Single leader (tags), view-plane coordinates
    #[serde(default)]
    pub leader: Option<LeaderState>,
    /// Leaders of a text marker, in creation order
    #[serde(default)]
    pub text_leaders: Vec<LeaderState>,
    /// Owning region polygon of a spatial tag, view-plane coordinates
    #[serde(default)]
    pub region: Option<Vec<Point2>>,
    /// Bounding box of the annotated element, model coordinates
    #[serde(default)]
    pub tagged: Option<(Point3, Point3)>,
    /// Spatial tag that lost its annotated element
    #[serde(default)]
    pub orphaned: bool,
}

fn default_size() -> (f64, f64) {
    (2.0, 1.0)
}

impl Default for MarkerSpec {
    fn default() -> Self {
        Self {
            kind: MarkerKind::Generic,
            anchor: Point3::default(),
            size: default_size(),
            pinned: false,
            leader: None,
            text_leaders: vec![],
            region: None,
            tagged: None,
            orphaned: false,
        }
    }
}

/// On-disk scene format: one view and its markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub view: ViewFrame,
    #[serde(default)]
    pub markers: Vec<MarkerSpec>,
}

#[derive(Debug, Clone)]
struct MarkerRecord {
    spec: MarkerSpec,
    /// Leader presence forced on by the engine (spatial tag recovery)
    forced_leader: bool,
}

type MarkerTable = BTreeMap<MarkerId, MarkerRecord>;

/// In-memory host document with snapshot transactions.
#[derive(Debug, Clone)]
pub struct Scene {
    frame: ViewFrame,
    markers: MarkerTable,
    next_id: u64,
    /// Selection handed out by `prompt_selection`; `None` simulates a
    /// cancelled pick
    prompt: Option<Vec<MarkerId>>,
    group_base: Option<MarkerTable>,
    tx_base: Option<MarkerTable>,
}

const VIEW: ViewId = ViewId(1);

impl Scene {
    /// A scene whose view frame is the identity (model == view plane)
    /// with the given crop box.
    pub fn with_flat_view(crop_min: Point3, crop_max: Point3) -> Self {
        Self::new(ViewFrame {
            transform: Transform::identity(),
            crop_active: true,
            crop_min,
            crop_max,
        })
    }

    pub fn new(frame: ViewFrame) -> Self {
        Self {
            frame,
            markers: BTreeMap::new(),
            next_id: 1,
            prompt: None,
            group_base: None,
            tx_base: None,
        }
    }

    /// Load a scene from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let file: SceneFile = toml::from_str(text)?;
        Ok(Self::from(file))
    }

    /// Load a scene file from disk.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::from_toml(&text).map_err(|e| e.to_string())
    }

    /// Serialize the current marker state back to the file format.
    pub fn to_scene_file(&self) -> SceneFile {
        SceneFile {
            view: self.frame,
            markers: self.markers.values().map(|r| r.spec.clone()).collect(),
        }
    }

    /// Add a marker, returning its handle. Handles are sequential.
    pub fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.insert(
            id,
            MarkerRecord {
                spec,
                forced_leader: false,
            },
        );
        id
    }

    /// All marker handles, in id order.
    pub fn marker_ids(&self) -> Vec<MarkerId> {
        self.markers.keys().copied().collect()
    }

    /// Set what the next interactive prompt returns.
    pub fn set_prompt_selection(&mut self, selection: Vec<MarkerId>) {
        self.prompt = Some(selection);
    }

    pub fn set_pinned(&mut self, id: MarkerId, pinned: bool) {
        if let Some(r) = self.markers.get_mut(&id) {
            r.spec.pinned = pinned;
        }
    }

    fn record(&self, id: MarkerId) -> Result<&MarkerRecord, HostError> {
        self.markers.get(&id).ok_or(HostError::MarkerNotFound(id))
    }

    fn record_mut(&mut self, id: MarkerId) -> Result<&mut MarkerRecord, HostError> {
        self.markers
            .get_mut(&id)
            .ok_or(HostError::MarkerNotFound(id))
    }
}

impl From<SceneFile> for Scene {
    fn from(file: SceneFile) -> Self {
        let mut scene = Scene::new(file.view);
        for spec in file.markers {
            scene.add_marker(spec);
        }
        scene
    }
}

impl Host for Scene {
    fn active_view(&self) -> Option<ViewId> {
        Some(VIEW)
    }

    fn owner_view(&self, _marker: MarkerId) -> Option<ViewId> {
        Some(VIEW)
    }

    fn view_frame(&self, view: ViewId) -> Option<ViewFrame> {
        (view == VIEW).then_some(self.frame)
    }

    fn marker_kind(&self, marker: MarkerId) -> Result<MarkerKind, HostError> {
        Ok(self.record(marker)?.spec.kind)
    }

    fn is_pinned(&self, marker: MarkerId) -> Result<bool, HostError> {
        Ok(self.record(marker)?.spec.pinned)
    }

    fn bounding_box(&self, marker: MarkerId, view: ViewId) -> Option<(Point3, Point3)> {
        if view != VIEW {
            return None;
        }
        let record = self.markers.get(&marker)?;
        let (w, h) = record.spec.size;
        // Body centered on the anchor in the view plane; corners are
        // carried back to model space for the host contract.
        let c = self.frame.to_view(record.spec.anchor);
        let lo = self
            .frame
            .to_model(Point3::new(c.x - w / 2.0, c.y - h / 2.0, c.z));
        let hi = self
            .frame
            .to_model(Point3::new(c.x + w / 2.0, c.y + h / 2.0, c.z));
        Some((
            Point3::new(lo.x.min(hi.x), lo.y.min(hi.y), lo.z.min(hi.z)),
            Point3::new(lo.x.max(hi.x), lo.y.max(hi.y), lo.z.max(hi.z)),
        ))
    }

    fn anchor(&self, marker: MarkerId) -> Result<Point3, HostError> {
        Ok(self.record(marker)?.spec.anchor)
    }

    fn set_anchor(&mut self, marker: MarkerId, point: Point3) -> Result<(), HostError> {
        self.record_mut(marker)?.spec.anchor = point;
        Ok(())
    }

    fn move_anchor(&mut self, marker: MarkerId, displacement: Point3) -> Result<(), HostError> {
        let record = self.record_mut(marker)?;
        record.spec.anchor = record.spec.anchor + displacement;
        Ok(())
    }

    fn leader(&self, marker: MarkerId) -> Option<LeaderState> {
        self.markers.get(&marker)?.spec.leader
    }

    fn set_leader(&mut self, marker: MarkerId, leader: LeaderState) -> Result<(), HostError> {
        self.record_mut(marker)?.spec.leader = Some(leader);
        Ok(())
    }

    fn text_leaders(&self, marker: MarkerId) -> Vec<LeaderState> {
        self.markers
            .get(&marker)
            .map(|r| r.spec.text_leaders.clone())
            .unwrap_or_default()
    }

    fn set_text_leaders(
        &mut self,
        marker: MarkerId,
        leaders: Vec<LeaderState>,
    ) -> Result<(), HostError> {
        self.record_mut(marker)?.spec.text_leaders = leaders;
        Ok(())
    }

    fn remove_leaders(&mut self, marker: MarkerId) -> Result<(), HostError> {
        let record = self.record_mut(marker)?;
        record.spec.leader = None;
        record.spec.text_leaders.clear();
        Ok(())
    }

    fn has_leader(&self, marker: MarkerId) -> bool {
        self.markers
            .get(&marker)
            .map(|r| r.spec.leader.is_some() || !r.spec.text_leaders.is_empty() || r.forced_leader)
            .unwrap_or(false)
    }

    fn set_has_leader(&mut self, marker: MarkerId, value: bool) -> Result<(), HostError> {
        self.record_mut(marker)?.forced_leader = value;
        Ok(())
    }

    fn is_orphaned(&self, marker: MarkerId) -> bool {
        self.markers
            .get(&marker)
            .map(|r| r.spec.orphaned)
            .unwrap_or(false)
    }

    fn owning_region(&self, marker: MarkerId) -> Option<Vec<Point2>> {
        self.markers.get(&marker)?.spec.region.clone()
    }

    fn tagged_element_box(&self, marker: MarkerId, view: ViewId) -> Option<(Point3, Point3)> {
        if view != VIEW {
            return None;
        }
        self.markers.get(&marker)?.spec.tagged
    }

    fn markers_in_view(&self, view: ViewId) -> Vec<MarkerId> {
        if view != VIEW {
            return vec![];
        }
        self.marker_ids()
    }

    fn prompt_selection(&mut self) -> Result<Vec<MarkerId>, HostError> {
        self.prompt.take().ok_or(HostError::Cancelled)
    }

    fn begin_group(&mut self, _label: &str) -> Result<(), HostError> {
        if self.group_base.is_some() {
            return Err(HostError::Transaction("group already open".into()));
        }
        self.group_base = Some(self.markers.clone());
        Ok(())
    }

    fn commit_group(&mut self) -> Result<(), HostError> {
        if self.tx_base.is_some() {
            return Err(HostError::Transaction("inner transaction still open".into()));
        }
        self.group_base
            .take()
            .map(|_| ())
            .ok_or_else(|| HostError::Transaction("no open group".into()))
    }

    fn rollback_group(&mut self) -> Result<(), HostError> {
        self.tx_base = None;
        let base = self
            .group_base
            .take()
            .ok_or_else(|| HostError::Transaction("no open group".into()))?;
        self.markers = base;
        Ok(())
    }

    fn begin(&mut self, _label: &str) -> Result<(), HostError> {
        if self.tx_base.is_some() {
            return Err(HostError::Transaction("transaction already open".into()));
        }
        self.tx_base = Some(self.markers.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HostError> {
        self.tx_base
            .take()
            .map(|_| ())
            .ok_or_else(|| HostError::Transaction("no open transaction".into()))
    }

    fn rollback(&mut self) -> Result<(), HostError> {
        let base = self
            .tx_base
            .take()
            .ok_or_else(|| HostError::Transaction("no open transaction".into()))?;
        self.markers = base;
        Ok(())
    }

    fn revert_and_restart(&mut self) -> Result<(), HostError> {
        let base = self
            .group_base
            .as_ref()
            .ok_or_else(|| HostError::Transaction("no open group".into()))?;
        self.markers = base.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with_one_marker() -> Scene {
        let mut scene = Scene::with_flat_view(
            Point3::new(-10.0, -10.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
        );
        scene.add_marker(MarkerSpec {
            anchor: Point3::new(1.0, 2.0, 0.0),
            size: (4.0, 2.0),
            ..Default::default()
        });
        scene
    }

    #[test]
    fn test_bounding_box_centered_on_anchor() {
        let scene = scene_with_one_marker();
        let (min, max) = scene.bounding_box(MarkerId(1), VIEW).unwrap();
        assert_eq!(min, Point3::new(-1.0, 1.0, 0.0));
        assert_eq!(max, Point3::new(3.0, 3.0, 0.0));
    }

    #[test]
    fn test_transaction_rollback_restores_markers() {
        let mut scene = scene_with_one_marker();
        scene.begin("move").unwrap();
        scene
            .move_anchor(MarkerId(1), Point3::new(5.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(scene.anchor(MarkerId(1)).unwrap().x, 6.0);
        scene.rollback().unwrap();
        assert_eq!(scene.anchor(MarkerId(1)).unwrap().x, 1.0);
    }

    #[test]
    fn test_revert_and_restart_undoes_committed_work() {
        let mut scene = scene_with_one_marker();
        scene.begin_group("layout").unwrap();
        scene.begin("prep").unwrap();
        scene
            .move_anchor(MarkerId(1), Point3::new(5.0, 0.0, 0.0))
            .unwrap();
        scene.commit().unwrap();
        assert_eq!(scene.anchor(MarkerId(1)).unwrap().x, 6.0);

        scene.revert_and_restart().unwrap();
        // Committed prep gone, group still open for the real work
        assert_eq!(scene.anchor(MarkerId(1)).unwrap().x, 1.0);
        scene.begin("apply").unwrap();
        scene.commit().unwrap();
        scene.commit_group().unwrap();
    }

    #[test]
    fn test_prompt_selection_cancels_when_unset() {
        let mut scene = scene_with_one_marker();
        assert!(matches!(
            scene.prompt_selection(),
            Err(HostError::Cancelled)
        ));
        scene.set_prompt_selection(vec![MarkerId(1)]);
        assert_eq!(scene.prompt_selection().unwrap(), vec![MarkerId(1)]);
    }

    #[test]
    fn test_scene_toml_roundtrip() {
        let text = r#"
            [view]
            crop_active = true
            crop_min = { x = -10.0, y = -10.0, z = 0.0 }
            crop_max = { x = 10.0, y = 10.0, z = 0.0 }

            [view.transform]
            origin = { x = 0.0, y = 0.0, z = 0.0 }
            basis_x = { x = 1.0, y = 0.0, z = 0.0 }
            basis_y = { x = 0.0, y = 1.0, z = 0.0 }
            basis_z = { x = 0.0, y = 0.0, z = 1.0 }

            [[markers]]
            kind = "tag"
            anchor = { x = 1.0, y = 2.0, z = 0.0 }
            size = [3.0, 1.0]

            [[markers]]
            kind = "text"
            anchor = { x = 5.0, y = 5.0, z = 0.0 }
        "#;
        let scene = Scene::from_toml(text).unwrap();
        assert_eq!(scene.marker_ids().len(), 2);
        assert_eq!(scene.marker_kind(MarkerId(1)).unwrap(), MarkerKind::Tag);
        assert_eq!(scene.marker_kind(MarkerId(2)).unwrap(), MarkerKind::Text);

        let out = toml::to_string(&scene.to_scene_file()).unwrap();
        let back = Scene::from_toml(&out).unwrap();
        assert_eq!(back.anchor(MarkerId(1)).unwrap(), Point3::new(1.0, 2.0, 0.0));
    }
}
