//! Property-based tests for profile detection and session editing.

use std::collections::HashSet;

use cad_types::{signed_area, Point2D, SketchEntity};
use proptest::prelude::*;
use sketch_engine::{detect_profiles, DetectorConfig, SketchSession};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Grid-aligned coordinate so random lines actually share endpoints.
fn arb_grid_coord() -> impl Strategy<Value = f64> {
    (0i32..5).prop_map(|v| v as f64 * 10.0)
}

fn arb_line_set() -> impl Strategy<Value = Vec<SketchEntity>> {
    prop::collection::vec(
        (arb_grid_coord(), arb_grid_coord(), arb_grid_coord(), arb_grid_coord()),
        0..8,
    )
    .prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (x0, y0, x1, y1))| SketchEntity::Line {
                id: i as u32 + 1,
                start: Point2D::new(x0, y0),
                end: Point2D::new(x1, y1),
                construction: false,
            })
            .collect()
    })
}

fn arb_rect() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, 2.0f64..50.0, 2.0f64..50.0)
}

// ---------------------------------------------------------------------------
// Detector properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn detected_loops_are_counter_clockwise(entities in arb_line_set()) {
        for profile in detect_profiles(&entities, &DetectorConfig::default()) {
            prop_assert!(signed_area(&profile.outer_loop) > 0.0);
            prop_assert!(profile.area > 0.0);
        }
    }

    #[test]
    fn detection_is_deterministic(entities in arb_line_set()) {
        let config = DetectorConfig::default();
        prop_assert_eq!(detect_profiles(&entities, &config), detect_profiles(&entities, &config));
    }

    #[test]
    fn line_rectangle_area_matches((x, y, w, h) in arb_rect()) {
        let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        let entities: Vec<SketchEntity> = (0..4)
            .map(|i| SketchEntity::Line {
                id: i as u32 + 1,
                start: corners[i].into(),
                end: corners[(i + 1) % 4].into(),
                construction: false,
            })
            .collect();
        let profiles = detect_profiles(&entities, &DetectorConfig::default());
        prop_assert_eq!(profiles.len(), 1);
        prop_assert!((profiles[0].area - w * h).abs() < 1e-6);
    }
}

// ---------------------------------------------------------------------------
// Session properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn created_ids_are_unique(points in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 1..20)) {
        let mut session = SketchSession::default();
        session.enter(None).unwrap();
        let mut ids = HashSet::new();
        for (i, (x, y)) in points.into_iter().enumerate() {
            let entity = if i % 2 == 0 {
                session.add_point(Point2D::new(x, y)).unwrap()
            } else {
                session.add_circle(Point2D::new(x, y), 1.0 + i as f64).unwrap()
            };
            prop_assert!(ids.insert(entity.id()));
            if i % 3 == 0 {
                session.remove_entity(entity.id()).unwrap();
            }
        }
    }

    #[test]
    fn trim_never_lengthens(click in 0.0f64..20.0, cut in 1.0f64..19.0) {
        let mut session = SketchSession::default();
        session.enter(None).unwrap();
        let target = session.add_line(Point2D::new(0.0, 0.0), Point2D::new(20.0, 0.0)).unwrap();
        session.add_line(Point2D::new(cut, -5.0), Point2D::new(cut, 5.0)).unwrap();

        let outcome = session.trim_line_at(target.id(), Point2D::new(click, 0.0)).unwrap().unwrap();
        let total: f64 = outcome
            .added
            .iter()
            .map(|e| match e {
                SketchEntity::Line { start, end, .. } => start.distance_to(end),
                _ => 0.0,
            })
            .sum();
        prop_assert!(total < 20.0);
        prop_assert!(outcome.added.len() <= 1);
    }
}
