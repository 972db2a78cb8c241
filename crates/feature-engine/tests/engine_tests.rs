use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use cad_types::{PlaneOrientation, Point2D, SketchData, SketchPlane};
use feature_engine::*;
use sketch_engine::SketchSession;
use solid_kernel::{MockKernel, SolidKernel};
use uuid::Uuid;

// ── Helpers ──────────────────────────────────────────────────────────

fn engine() -> Engine<MockKernel> {
    Engine::new(MockKernel::initialized(), &EngineConfig::default())
}

fn box_kind(width: f64, height: f64, depth: f64) -> FeatureKind {
    box_at(width, height, depth, [0.0; 3])
}

fn box_at(width: f64, height: f64, depth: f64, position: [f64; 3]) -> FeatureKind {
    FeatureKind::Primitive {
        shape: PrimitiveShape::Box {
            width,
            height,
            depth,
        },
        position,
    }
}

fn rect_sketch_data(a: (f64, f64), b: (f64, f64)) -> SketchData {
    let mut session = SketchSession::default();
    session.enter(None).unwrap();
    session.add_rectangle(a.into(), b.into()).unwrap();
    session.finish().unwrap()
}

fn rect_sketch(plane: SketchPlane, a: (f64, f64), b: (f64, f64)) -> FeatureKind {
    FeatureKind::Sketch {
        plane,
        data: rect_sketch_data(a, b),
    }
}

fn extrude(sketch_id: FeatureId, distance: f64) -> ExtrudeParams {
    ExtrudeParams {
        sketch_id,
        distance,
        direction: ExtrudeDirection::Normal,
        mode: ExtrudeMode::New,
        target: None,
    }
}

fn boolean(target: FeatureId, tool: FeatureId, operation: BooleanOp) -> FeatureKind {
    FeatureKind::Boolean(BooleanParams {
        target,
        tool,
        operation,
    })
}

fn only_body(result: &RebuildResult) -> CachedBody {
    assert_eq!(result.bodies.len(), 1, "expected exactly one body");
    result.bodies.values().next().unwrap().clone()
}

fn bounds(engine: &Engine<MockKernel>, body: &CachedBody) -> ([f64; 3], [f64; 3]) {
    engine.kernel().bounding_box(&body.handle).unwrap()
}

// ── Feature list ─────────────────────────────────────────────────────

#[test]
fn list_add_and_find() {
    let mut list = FeatureList::new();
    let a = list.add_feature("Box", box_kind(1.0, 1.0, 1.0));
    let b = list.add_feature("Box 2", box_kind(2.0, 2.0, 2.0));

    assert_eq!(list.len(), 2);
    assert_eq!(list.feature_index(b), Some(1));
    assert_eq!(list.find_feature(a).unwrap().name, "Box");
    assert!(list.find_feature(a).unwrap().dirty);
}

#[test]
fn list_remove_unknown_feature_errors() {
    let mut list = FeatureList::new();
    assert!(matches!(
        list.remove_feature(Uuid::new_v4()),
        Err(EngineError::FeatureNotFound { .. })
    ));
}

#[test]
fn list_reorder_clamps_position() {
    let mut list = FeatureList::new();
    let a = list.add_feature("A", box_kind(1.0, 1.0, 1.0));
    let b = list.add_feature("B", box_kind(1.0, 1.0, 1.0));
    list.reorder_feature(a, 99).unwrap();
    assert_eq!(list.feature_index(a), Some(1));
    assert_eq!(list.feature_index(b), Some(0));
}

#[test]
fn rename_does_not_invalidate() {
    let mut engine = engine();
    let id = engine.add_feature("Box", box_kind(1.0, 1.0, 1.0));
    engine.rebuild().unwrap();
    engine.rename_feature(id, "Base").unwrap();

    let feature = engine.features().find_feature(id).unwrap();
    assert_eq!(feature.name, "Base");
    assert!(!feature.dirty);
    assert!(feature.cached.is_some());
}

#[test]
fn edit_invalidates_feature_and_everything_after() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(1.0, 1.0, 1.0));
    let b = engine.add_feature("B", box_kind(1.0, 1.0, 1.0));
    let c = engine.add_feature("C", box_kind(1.0, 1.0, 1.0));
    engine.rebuild().unwrap();

    engine.edit_feature(b, box_kind(3.0, 3.0, 3.0)).unwrap();
    let list = engine.features();
    assert!(!list.find_feature(a).unwrap().dirty);
    assert!(list.find_feature(b).unwrap().dirty);
    assert!(list.find_feature(c).unwrap().dirty);
    assert!(list.find_feature(c).unwrap().cached.is_none());
}

// ── Rebuild basics ───────────────────────────────────────────────────

#[test]
fn rebuild_requires_initialized_kernel() {
    let mut engine = Engine::new(MockKernel::new(), &EngineConfig::default());
    engine.add_feature("Box", box_kind(1.0, 1.0, 1.0));
    assert!(matches!(engine.rebuild(), Err(EngineError::UninitializedKernel)));

    engine.initialize_kernel().unwrap();
    assert!(engine.rebuild().unwrap().success);
}

#[test]
fn primitive_is_translated_to_position() {
    let mut engine = engine();
    engine.add_feature("Box", box_at(1.0, 2.0, 3.0, [5.0, 0.0, 0.0]));
    let result = engine.rebuild().unwrap();

    let body = only_body(&result);
    assert_eq!(bounds(&engine, &body), ([5.0, 0.0, 0.0], [6.0, 2.0, 3.0]));
}

#[test]
fn second_rebuild_is_served_from_cache() {
    let mut engine = engine();
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (0.0, 0.0), (10.0, 10.0)));
    engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch, 5.0)));
    engine.add_feature("Box", box_at(1.0, 1.0, 1.0, [20.0, 0.0, 0.0]));

    let first = engine.rebuild().unwrap();
    assert!(first.success);
    assert_eq!(first.bodies.len(), 2);

    engine.kernel_mut().reset_calls();
    let second = engine.rebuild().unwrap();
    assert_eq!(engine.kernel().calls(), 0);
    assert_eq!(second.bodies, first.bodies);
}

#[test]
fn editing_one_feature_only_rebuilds_from_there() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(1.0, 1.0, 1.0));
    let b = engine.add_feature("B", box_at(1.0, 1.0, 1.0, [3.0, 0.0, 0.0]));
    let first = engine.rebuild().unwrap();
    let a_body = first
        .bodies
        .values()
        .find(|body| body.origin_feature_id == a)
        .unwrap()
        .body_id;

    engine.edit_feature(b, box_kind(2.0, 2.0, 2.0)).unwrap();
    engine.kernel_mut().reset_calls();
    let second = engine.rebuild().unwrap();

    assert_eq!(engine.kernel().calls(), 1, "only B's create_box should run");
    assert!(second.bodies.contains_key(&a_body));
    assert_eq!(second.bodies.len(), 2);
}

#[test]
fn suppressed_feature_is_skipped() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(1.0, 1.0, 1.0));
    engine.add_feature("B", box_at(1.0, 1.0, 1.0, [3.0, 0.0, 0.0]));
    engine.set_suppressed(a, true).unwrap();

    let result = engine.rebuild().unwrap();
    assert!(result.success);
    let body = only_body(&result);
    assert_ne!(body.origin_feature_id, a);
}

// ── Extrude ──────────────────────────────────────────────────────────

#[test]
fn extrude_rectangle_profile() {
    let mut engine = engine();
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (0.0, 0.0), (10.0, 10.0)));
    let ext = engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch, 5.0)));
    let result = engine.rebuild().unwrap();

    let body = only_body(&result);
    assert_eq!(body.origin_feature_id, ext);
    assert_eq!(bounds(&engine, &body), ([0.0, 0.0, 0.0], [10.0, 10.0, 5.0]));
    let volume = engine.kernel_mut().volume(&body.handle).unwrap();
    assert_relative_eq!(volume, 500.0, epsilon = 1e-9);
}

#[test]
fn extrude_reverse_and_symmetric() {
    let mut engine = engine();
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (0.0, 0.0), (10.0, 10.0)));
    let reverse = engine.add_feature(
        "Reverse",
        FeatureKind::Extrude(ExtrudeParams {
            direction: ExtrudeDirection::Reverse,
            ..extrude(sketch, 5.0)
        }),
    );
    let symmetric = engine.add_feature(
        "Symmetric",
        FeatureKind::Extrude(ExtrudeParams {
            direction: ExtrudeDirection::Symmetric,
            ..extrude(sketch, 5.0)
        }),
    );
    let result = engine.rebuild().unwrap();

    let by_origin = |id: FeatureId| {
        result
            .bodies
            .values()
            .find(|b| b.origin_feature_id == id)
            .unwrap()
            .clone()
    };
    let (min, max) = bounds(&engine, &by_origin(reverse));
    assert_eq!((min[2], max[2]), (-5.0, 0.0));
    let (min, max) = bounds(&engine, &by_origin(symmetric));
    assert_eq!((min[2], max[2]), (-2.5, 2.5));
}

#[test]
fn extrude_on_offset_xz_plane() {
    let mut engine = engine();
    let plane = SketchPlane::new(PlaneOrientation::XZ, [0.0, 0.0, 10.0]);
    let sketch = engine.add_feature("Sketch", rect_sketch(plane, (0.0, 0.0), (2.0, 3.0)));
    engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch, 1.0)));
    let result = engine.rebuild().unwrap();

    let body = only_body(&result);
    assert_eq!(bounds(&engine, &body), ([0.0, -1.0, 10.0], [2.0, 0.0, 13.0]));
}

#[test]
fn extrude_yz_plane_points_along_x() {
    let mut engine = engine();
    let plane = SketchPlane::new(PlaneOrientation::YZ, [0.0; 3]);
    let sketch = engine.add_feature("Sketch", rect_sketch(plane, (0.0, 0.0), (2.0, 3.0)));
    engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch, 4.0)));
    let result = engine.rebuild().unwrap();

    let body = only_body(&result);
    assert_eq!(bounds(&engine, &body), ([0.0, 0.0, 0.0], [4.0, 2.0, 3.0]));
}

#[test]
fn every_profile_becomes_its_own_body() {
    let mut session = SketchSession::default();
    session.enter(None).unwrap();
    session.add_rectangle(Point2D::new(0.0, 0.0), Point2D::new(10.0, 10.0)).unwrap();
    session.add_circle(Point2D::new(30.0, 0.0), 4.0).unwrap();

    let mut engine = engine();
    let sketch = engine
        .commit_sketch(&mut session, "Sketch", SketchPlane::xy())
        .unwrap();
    engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch, 2.0)));
    let result = engine.rebuild().unwrap();
    assert_eq!(result.bodies.len(), 2);
}

#[test]
fn extrude_of_sketch_without_profiles_fails() {
    let mut session = SketchSession::default();
    session.enter(None).unwrap();
    session.add_line(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)).unwrap();

    let mut engine = engine();
    let sketch = engine
        .commit_sketch(&mut session, "Open sketch", SketchPlane::xy())
        .unwrap();
    let ext = engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch, 2.0)));
    let result = engine.rebuild().unwrap();

    assert!(!result.success);
    assert!(result.errors[&ext].contains("no closed profiles"));
}

#[test]
fn extrude_of_non_sketch_fails() {
    let mut engine = engine();
    let boxed = engine.add_feature("Box", box_kind(1.0, 1.0, 1.0));
    let ext = engine.add_feature("Extrude", FeatureKind::Extrude(extrude(boxed, 2.0)));
    let result = engine.rebuild().unwrap();

    assert!(result.errors[&ext].contains("not a sketch"));
    assert_eq!(result.bodies.len(), 1);
}

#[test]
fn forward_sketch_reference_still_resolves() {
    let mut engine = engine();
    let sketch_id = Uuid::new_v4();
    let ext = engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch_id, 1.0)));
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (0.0, 0.0), (1.0, 1.0)));
    engine
        .edit_feature(ext, FeatureKind::Extrude(extrude(sketch, 1.0)))
        .unwrap();

    let result = engine.rebuild().unwrap();
    assert!(result.success);
    assert_eq!(only_body(&result).origin_feature_id, ext);
}

// ── Join / cut ───────────────────────────────────────────────────────

#[test]
fn join_keeps_target_body_id() {
    let mut engine = engine();
    let base = engine.add_feature("Base", box_kind(10.0, 10.0, 10.0));
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (5.0, 0.0), (15.0, 10.0)));
    engine.add_feature(
        "Join",
        FeatureKind::Extrude(ExtrudeParams {
            mode: ExtrudeMode::Join,
            target: Some(base),
            ..extrude(sketch, 10.0)
        }),
    );
    let result = engine.rebuild().unwrap();

    let body = only_body(&result);
    assert_eq!(body.origin_feature_id, base);
    let base_body = engine.features().find_feature(base).unwrap().cached.as_ref().unwrap().bodies[0].body_id;
    assert_eq!(body.body_id, base_body);
    let volume = engine.kernel_mut().volume(&body.handle).unwrap();
    assert_relative_eq!(volume, 1500.0, epsilon = 1e-9);
}

#[test]
fn cut_keeps_target_body_id() {
    let mut engine = engine();
    let base = engine.add_feature("Base", box_kind(10.0, 10.0, 10.0));
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (0.0, 0.0), (5.0, 10.0)));
    engine.add_feature(
        "Cut",
        FeatureKind::Extrude(ExtrudeParams {
            mode: ExtrudeMode::Cut,
            target: Some(base),
            ..extrude(sketch, 10.0)
        }),
    );
    let result = engine.rebuild().unwrap();

    let body = only_body(&result);
    assert_eq!(body.origin_feature_id, base);
    let volume = engine.kernel_mut().volume(&body.handle).unwrap();
    assert_relative_eq!(volume, 500.0, epsilon = 1e-9);
}

#[test]
fn join_without_resolvable_target_creates_new_body() {
    let mut engine = engine();
    engine.add_feature("Base", box_kind(10.0, 10.0, 10.0));
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (20.0, 0.0), (25.0, 5.0)));
    engine.add_feature(
        "Join",
        FeatureKind::Extrude(ExtrudeParams {
            mode: ExtrudeMode::Join,
            target: Some(Uuid::new_v4()),
            ..extrude(sketch, 10.0)
        }),
    );
    let result = engine.rebuild().unwrap();
    assert!(result.success);
    assert_eq!(result.bodies.len(), 2);
}

// ── Boolean ──────────────────────────────────────────────────────────

#[test]
fn boolean_retires_inputs_and_mints_new_body() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(2.0, 2.0, 2.0));
    let b = engine.add_feature("B", box_at(2.0, 2.0, 2.0, [1.0, 0.0, 0.0]));
    let op = engine.add_feature("Union", boolean(a, b, BooleanOp::Union));
    let result = engine.rebuild().unwrap();

    let body = only_body(&result);
    assert_eq!(body.origin_feature_id, op);
    let volume = engine.kernel_mut().volume(&body.handle).unwrap();
    assert_relative_eq!(volume, 12.0, epsilon = 1e-9);
}

#[test]
fn cache_replay_reproduces_retirement() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(2.0, 2.0, 2.0));
    let b = engine.add_feature("B", box_at(2.0, 2.0, 2.0, [1.0, 0.0, 0.0]));
    engine.add_feature("Intersect", boolean(a, b, BooleanOp::Intersect));
    let first = engine.rebuild().unwrap();

    engine.kernel_mut().reset_calls();
    let second = engine.rebuild().unwrap();
    assert_eq!(engine.kernel().calls(), 0);
    assert_eq!(second.bodies.len(), 1);
    assert_eq!(second.bodies, first.bodies);
}

#[test]
fn boolean_on_suppressed_input_fails() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(2.0, 2.0, 2.0));
    let b = engine.add_feature("B", box_kind(1.0, 1.0, 1.0));
    let op = engine.add_feature("Cut", boolean(a, b, BooleanOp::Difference));
    engine.set_suppressed(b, true).unwrap();

    let result = engine.rebuild().unwrap();
    assert!(!result.success);
    assert!(result.errors.contains_key(&op));
    assert_eq!(only_body(&result).origin_feature_id, a);
}

// ── Failure isolation ────────────────────────────────────────────────

#[test]
fn unresolved_reference_is_recorded_against_feature() {
    let mut engine = engine();
    let ext = engine.add_feature("Extrude", FeatureKind::Extrude(extrude(Uuid::new_v4(), 1.0)));
    let boxed = engine.add_feature("Box", box_kind(1.0, 1.0, 1.0));
    let result = engine.rebuild().unwrap();

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[&ext].contains("sketch not found"));
    assert_eq!(only_body(&result).origin_feature_id, boxed);
    assert_eq!(engine.errors(), &result.errors);
}

#[test]
fn failed_feature_stays_dirty_and_retries() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(2.0, 2.0, 2.0));
    let b = engine.add_feature("B", box_at(2.0, 2.0, 2.0, [5.0, 0.0, 0.0]));
    let op = engine.add_feature("Union", boolean(a, b, BooleanOp::Union));

    engine.kernel_mut().set_fail_booleans(true);
    let failed = engine.rebuild().unwrap();
    assert!(failed.errors.contains_key(&op));
    assert_eq!(failed.bodies.len(), 2, "inputs stay live when the boolean fails");
    let feature = engine.features().find_feature(op).unwrap();
    assert!(feature.dirty);
    assert!(feature.cached.is_none());

    engine.kernel_mut().set_fail_booleans(false);
    engine.kernel_mut().reset_calls();
    let retried = engine.rebuild().unwrap();
    assert!(retried.success);
    assert_eq!(engine.kernel().calls(), 1);
    assert_eq!(only_body(&retried).origin_feature_id, op);
}

#[test]
fn features_after_a_retried_feature_are_re_evaluated() {
    let mut engine = engine();
    let a = engine.add_feature("A", box_kind(2.0, 2.0, 2.0));
    let b = engine.add_feature("B", box_at(2.0, 2.0, 2.0, [1.0, 0.0, 0.0]));
    let union = engine.add_feature("Union", boolean(a, b, BooleanOp::Union));
    let sketch = engine.add_feature("Sketch", rect_sketch(SketchPlane::xy(), (0.0, 0.0), (2.0, 2.0)));
    engine.add_feature(
        "Join",
        FeatureKind::Extrude(ExtrudeParams {
            mode: ExtrudeMode::Join,
            target: Some(union),
            ..extrude(sketch, 4.0)
        }),
    );

    engine.kernel_mut().set_fail_booleans(true);
    let failed = engine.rebuild().unwrap();
    assert_eq!(failed.errors.len(), 1);
    assert_eq!(failed.bodies.len(), 3, "join fell back to a new body");

    engine.kernel_mut().set_fail_booleans(false);
    let retried = engine.rebuild().unwrap();
    assert!(retried.success);
    let body = only_body(&retried);
    assert_eq!(body.origin_feature_id, union);
    assert_eq!(bounds(&engine, &body), ([0.0, 0.0, 0.0], [3.0, 2.0, 4.0]));

    engine.kernel_mut().reset_calls();
    let replayed = engine.rebuild().unwrap();
    assert_eq!(engine.kernel().calls(), 0);
    assert_eq!(replayed.bodies, retried.bodies);
}

// ── Sketch commit ────────────────────────────────────────────────────

#[test]
fn commit_sketch_into_updates_existing_feature() {
    let mut engine = engine();
    let plane = SketchPlane::new(PlaneOrientation::XY, [0.0, 0.0, 2.0]);
    let sketch = engine.add_feature("Sketch", rect_sketch(plane, (0.0, 0.0), (4.0, 4.0)));
    engine.add_feature("Extrude", FeatureKind::Extrude(extrude(sketch, 1.0)));
    assert_eq!(engine.rebuild().unwrap().bodies.len(), 1);

    let mut session = SketchSession::default();
    session.enter(Some(engine.sketch_data(sketch).unwrap())).unwrap();
    session.add_circle(Point2D::new(20.0, 20.0), 2.0).unwrap();
    engine.commit_sketch_into(sketch, &mut session).unwrap();

    let result = engine.rebuild().unwrap();
    assert_eq!(result.bodies.len(), 2);
    for body in result.bodies.values() {
        let (min, _) = bounds(&engine, body);
        assert_eq!(min[2], 2.0);
    }
}

#[test]
fn commit_requires_active_session() {
    let mut engine = engine();
    let mut session = SketchSession::default();
    assert!(matches!(
        engine.commit_sketch(&mut session, "Sketch", SketchPlane::xy()),
        Err(EngineError::Sketch(_))
    ));
    let boxed = engine.add_feature("Box", box_kind(1.0, 1.0, 1.0));
    assert!(matches!(
        engine.sketch_data(boxed),
        Err(EngineError::NotASketch { .. })
    ));
}

// ── Debounce ─────────────────────────────────────────────────────────

#[test]
fn debounced_rebuild_runs_once_after_quiet_period() {
    let mut engine = engine();
    engine.add_feature("Box", box_kind(1.0, 1.0, 1.0));

    let t0 = Instant::now();
    engine.request_rebuild(t0);
    engine.request_rebuild(t0 + Duration::from_millis(100));
    assert!(engine.poll_rebuild(t0 + Duration::from_millis(200)).is_none());
    assert!(engine.bodies().is_empty());

    let result = engine
        .poll_rebuild(t0 + Duration::from_millis(250))
        .expect("rebuild should be due")
        .unwrap();
    assert!(result.success);
    assert_eq!(engine.bodies().len(), 1);
    assert!(!engine.rebuild_pending());
    assert!(engine.poll_rebuild(t0 + Duration::from_secs(5)).is_none());
}

// ── Rendering ────────────────────────────────────────────────────────

#[test]
fn tessellate_live_body() {
    let mut engine = engine();
    engine.add_feature("Box", box_kind(1.0, 1.0, 1.0));
    let result = engine.rebuild().unwrap();
    let body = only_body(&result);

    let mesh = engine.tessellate_body(body.body_id).unwrap();
    assert_eq!(mesh.triangle_count(), 12);
    assert!(matches!(
        engine.tessellate_body(BodyId::new()),
        Err(EngineError::UnknownBody { .. })
    ));
}
