//! End-to-end tests for the selection-based policies (align,
//! distribute, untangle) driven through `run_layout` against an
//! in-memory scene.

use pretty_assertions::assert_eq;

use anno_layout::error::LayoutError;
use anno_layout::geometry::{Point2, Point3};
use anno_layout::host::{Host, MarkerId};
use anno_layout::{
    run_layout, LayoutKind, LayoutRequest, LeaderState, MarkerKind, MarkerSpec, RunConfig, Scene,
};

/// Four generic markers with the footprints (0,0)-(1,1), (2,0)-(3,2),
/// (4,1)-(5,3) and (1,4)-(2,5) on a flat identity view.
fn sample_scene() -> Scene {
    let mut scene = Scene::with_flat_view(
        Point3::new(-50.0, -50.0, 0.0),
        Point3::new(50.0, 50.0, 0.0),
    );
    let boxes = [
        ((0.0, 0.0), (1.0, 1.0)),
        ((2.0, 0.0), (3.0, 2.0)),
        ((4.0, 1.0), (5.0, 3.0)),
        ((1.0, 4.0), (2.0, 5.0)),
    ];
    for ((x0, y0), (x1, y1)) in boxes {
        scene.add_marker(MarkerSpec {
            kind: MarkerKind::Generic,
            anchor: Point3::new((x0 + x1) / 2.0, (y0 + y1) / 2.0, 0.0),
            size: (x1 - x0, y1 - y0),
            ..Default::default()
        });
    }
    scene
}

fn run(scene: &mut Scene, kind: LayoutKind) -> anno_layout::LayoutSummary {
    let request = LayoutRequest {
        kind,
        selection: scene.marker_ids(),
    };
    run_layout(scene, &request, &RunConfig::default()).unwrap()
}

fn left_edge(scene: &Scene, id: MarkerId) -> f64 {
    let view = scene.active_view().unwrap();
    let (min, _) = scene.bounding_box(id, view).unwrap();
    min.x
}

fn center(scene: &Scene, id: MarkerId) -> Point2 {
    let anchor = scene.anchor(id).unwrap();
    Point2::new(anchor.x, anchor.y)
}

#[test]
fn test_align_left_pins_left_edges() {
    let mut scene = sample_scene();
    let summary = run(&mut scene, LayoutKind::AlignLeft);

    for id in scene.marker_ids() {
        assert!((left_edge(&scene, id) - 0.0).abs() < 1e-9);
    }
    // The first marker already sat on the reference edge
    assert_eq!(summary.moved, 3);
    assert_eq!(summary.skipped_zero, 1);
}

#[test]
fn test_align_left_keeps_vertical_positions() {
    let mut scene = sample_scene();
    let before: Vec<f64> = scene.marker_ids().iter().map(|&id| center(&scene, id).y).collect();
    run(&mut scene, LayoutKind::AlignLeft);
    let after: Vec<f64> = scene.marker_ids().iter().map(|&id| center(&scene, id).y).collect();
    assert_eq!(before, after);
}

#[test]
fn test_align_right_pins_right_edges() {
    let mut scene = sample_scene();
    run(&mut scene, LayoutKind::AlignRight);
    let view = scene.active_view().unwrap();
    for id in scene.marker_ids() {
        let (_, max) = scene.bounding_box(id, view).unwrap();
        assert!((max.x - 5.0).abs() < 1e-9);
    }
}

#[test]
fn test_align_middle_centers_between_outer_edges() {
    let mut scene = sample_scene();
    run(&mut scene, LayoutKind::AlignMiddle);
    // Outermost edges: top 5.0, bottom 0.0 -> shared centerline 2.5
    for id in scene.marker_ids() {
        assert!((center(&scene, id).y - 2.5).abs() < 1e-9);
    }
}

#[test]
fn test_distribute_horizontal_spaces_centers_evenly() {
    let mut scene = sample_scene();
    run(&mut scene, LayoutKind::DistributeHorizontal);

    let mut xs: Vec<f64> = scene.marker_ids().iter().map(|&id| center(&scene, id).x).collect();
    xs.sort_by(f64::total_cmp);
    // Center range 0.5..4.5 split over three gaps of 4/3
    assert!((xs[0] - 0.5).abs() < 1e-9);
    assert!((xs[3] - 4.5).abs() < 1e-9);
    let gap = 4.0 / 3.0;
    assert!((xs[1] - (0.5 + gap)).abs() < 1e-9);
    assert!((xs[2] - (0.5 + 2.0 * gap)).abs() < 1e-9);
}

#[test]
fn test_distribute_leaves_extremes_in_place() {
    let mut scene = sample_scene();
    let before_first = center(&scene, MarkerId(1));
    let before_last = center(&scene, MarkerId(3));
    run(&mut scene, LayoutKind::DistributeHorizontal);
    assert_eq!(center(&scene, MarkerId(1)), before_first);
    assert_eq!(center(&scene, MarkerId(3)), before_last);
}

#[test]
fn test_pinned_marker_never_moves() {
    let mut scene = sample_scene();
    scene.set_pinned(MarkerId(2), true);
    let before = center(&scene, MarkerId(2));
    let summary = run(&mut scene, LayoutKind::AlignLeft);
    assert_eq!(center(&scene, MarkerId(2)), before);
    assert_eq!(summary.skipped_pinned, 1);
}

#[test]
fn test_untangle_vertical_stacks_in_leader_order() {
    let mut scene = Scene::with_flat_view(
        Point3::new(-50.0, -50.0, 0.0),
        Point3::new(50.0, 50.0, 0.0),
    );
    // Three tags 2 wide and 1 tall, piled on top of each other, whose
    // leaders point at three separate heights.
    let ends = [3.0, 1.0, 2.0];
    for end_y in ends {
        let end = Point2::new(10.0, end_y);
        scene.add_marker(MarkerSpec {
            kind: MarkerKind::Tag,
            anchor: Point3::new(0.0, 0.5, 0.0),
            size: (2.0, 1.0),
            leader: Some(LeaderState {
                end,
                elbow: end,
                free: true,
            }),
            ..Default::default()
        });
    }

    run(&mut scene, LayoutKind::UntangleVertical);

    // Bottom box keeps its top edge at 1.0, the others stack gap-free
    let view = scene.active_view().unwrap();
    let top = |id: MarkerId| scene.bounding_box(id, view).unwrap().1.y;
    assert!((top(MarkerId(2)) - 1.0).abs() < 1e-9); // leader at y=1, lowest
    assert!((top(MarkerId(3)) - 2.0).abs() < 1e-9);
    assert!((top(MarkerId(1)) - 3.0).abs() < 1e-9);
}

#[test]
fn test_untangle_preserves_leader_ends() {
    let mut scene = Scene::with_flat_view(
        Point3::new(-50.0, -50.0, 0.0),
        Point3::new(50.0, 50.0, 0.0),
    );
    let end = Point2::new(10.0, 3.0);
    for _ in 0..2 {
        scene.add_marker(MarkerSpec {
            kind: MarkerKind::Tag,
            anchor: Point3::new(0.0, 0.5, 0.0),
            size: (2.0, 1.0),
            leader: Some(LeaderState {
                end,
                elbow: end,
                free: true,
            }),
            ..Default::default()
        });
    }
    run(&mut scene, LayoutKind::UntangleVertical);
    for id in scene.marker_ids() {
        assert_eq!(scene.leader(id).unwrap().end, end);
    }
}

#[test]
fn test_insufficient_selection_rejected_before_mutation() {
    let mut scene = sample_scene();
    let before = center(&scene, MarkerId(1));
    let request = LayoutRequest {
        kind: LayoutKind::AlignLeft,
        selection: vec![MarkerId(1)],
    };
    let err = run_layout(&mut scene, &request, &RunConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        LayoutError::InsufficientSelection { needed: 2, got: 1 }
    ));
    assert_eq!(center(&scene, MarkerId(1)), before);
}

#[test]
fn test_empty_selection_prompts_host() {
    let mut scene = sample_scene();
    scene.set_prompt_selection(scene.marker_ids());
    let request = LayoutRequest {
        kind: LayoutKind::AlignLeft,
        selection: vec![],
    };
    let summary = run_layout(&mut scene, &request, &RunConfig::default()).unwrap();
    assert_eq!(summary.moved + summary.skipped_zero, 4);
}

#[test]
fn test_cancelled_prompt_surfaces_as_cancelled() {
    let mut scene = sample_scene();
    // No prompt selection queued: the pick is aborted
    let request = LayoutRequest {
        kind: LayoutKind::AlignLeft,
        selection: vec![],
    };
    let err = run_layout(&mut scene, &request, &RunConfig::default()).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn test_failed_call_rolls_back_whole_group() {
    let mut scene = sample_scene();
    let before: Vec<Point2> = scene.marker_ids().iter().map(|&id| center(&scene, id)).collect();
    // A stale id makes measurement fail after the group opened
    let request = LayoutRequest {
        kind: LayoutKind::AlignLeft,
        selection: vec![MarkerId(1), MarkerId(99)],
    };
    assert!(run_layout(&mut scene, &request, &RunConfig::default()).is_err());
    let after: Vec<Point2> = scene.marker_ids().iter().map(|&id| center(&scene, id)).collect();
    assert_eq!(before, after);
}

#[test]
fn test_align_is_idempotent() {
    let mut scene = sample_scene();
    run(&mut scene, LayoutKind::AlignDown);
    let once: Vec<Point2> = scene.marker_ids().iter().map(|&id| center(&scene, id)).collect();
    let summary = run(&mut scene, LayoutKind::AlignDown);
    let twice: Vec<Point2> = scene.marker_ids().iter().map(|&id| center(&scene, id)).collect();
    assert_eq!(once, twice);
    assert_eq!(summary.moved, 0);
}
