//! Parallel copies of lines, circles and rectangles.
//!
//! The side is chosen by a reference point (usually the cursor). Results
//! are returned as geometry only; the session assigns ids.

use cad_types::{rectangle_bounds, rectangle_corners, Point2D, SketchEntity};

use crate::intersect::project_onto_segment;

/// Nearest line, circle or rectangle outline to `point` within `max_distance`.
pub fn find_nearest_offsetable_entity(
    entities: &[SketchEntity],
    point: Point2D,
    max_distance: f64,
) -> Option<u32> {
    entities
        .iter()
        .filter_map(|entity| {
            let dist = match entity {
                SketchEntity::Line { start, end, .. } => project_onto_segment(point, *start, *end).2,
                SketchEntity::Circle { center, radius, .. } => {
                    (point.distance_to(center) - radius).abs()
                }
                SketchEntity::Rectangle {
                    corner_a, corner_b, ..
                } => {
                    let c = rectangle_corners(*corner_a, *corner_b);
                    (0..4)
                        .map(|i| project_onto_segment(point, c[i], c[(i + 1) % 4]).2)
                        .fold(f64::INFINITY, f64::min)
                }
                _ => return None,
            };
            (dist <= max_distance).then_some((dist, entity.id()))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

fn valid_distance(distance: f64) -> bool {
    distance.is_finite() && distance > 0.0
}

/// Line shifted `distance` along its normal, toward `reference`.
pub fn offset_line(
    start: Point2D,
    end: Point2D,
    distance: f64,
    reference: Point2D,
) -> Option<(Point2D, Point2D)> {
    if !valid_distance(distance) {
        return None;
    }
    let normal = (end - start).normalized()?.perp();
    let side = if normal.dot(&(reference - start.midpoint(&end))) >= 0.0 {
        1.0
    } else {
        -1.0
    };
    let shift = normal * (side * distance);
    Some((start + shift, end + shift))
}

/// Concentric radius: larger when `reference` is outside the circle,
/// smaller when inside. `None` if the result would be under `min_size`.
pub fn offset_circle(
    center: Point2D,
    radius: f64,
    distance: f64,
    reference: Point2D,
    min_size: f64,
) -> Option<f64> {
    if !valid_distance(distance) {
        return None;
    }
    let new_radius = if reference.distance_to(&center) > radius {
        radius + distance
    } else {
        radius - distance
    };
    (new_radius >= min_size).then_some(new_radius)
}

/// Rectangle grown outward when `reference` is outside, shrunk when inside.
/// `None` if either side would end up under `min_size`.
pub fn offset_rectangle(
    corner_a: Point2D,
    corner_b: Point2D,
    distance: f64,
    reference: Point2D,
    min_size: f64,
) -> Option<(Point2D, Point2D)> {
    if !valid_distance(distance) {
        return None;
    }
    let bounds = rectangle_bounds(corner_a, corner_b);
    let delta = if bounds.contains(&reference) {
        -distance
    } else {
        distance
    };
    let min = Point2D::new(bounds.min.x - delta, bounds.min.y - delta);
    let max = Point2D::new(bounds.max.x + delta, bounds.max.y + delta);
    (max.x - min.x >= min_size && max.y - min.y >= min_size).then_some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_moves_toward_reference_side() {
        let (a, b) = offset_line(
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            3.0,
            Point2D::new(5.0, -20.0),
        )
        .unwrap();
        assert_relative_eq!(a.y, -3.0);
        assert_relative_eq!(b.y, -3.0);
        assert_relative_eq!(b.x, 10.0);
    }

    #[test]
    fn zero_length_line_has_no_offset() {
        let p = Point2D::new(1.0, 1.0);
        assert!(offset_line(p, p, 1.0, Point2D::ORIGIN).is_none());
    }

    #[test]
    fn circle_grows_outside_and_shrinks_inside() {
        let c = Point2D::ORIGIN;
        assert_eq!(offset_circle(c, 5.0, 2.0, Point2D::new(20.0, 0.0), 0.1), Some(7.0));
        assert_eq!(offset_circle(c, 5.0, 2.0, Point2D::new(1.0, 0.0), 0.1), Some(3.0));
        assert_eq!(offset_circle(c, 5.0, 4.95, Point2D::new(1.0, 0.0), 0.1), None);
    }

    #[test]
    fn rectangle_collapse_is_rejected() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(10.0, 4.0);
        let (min, max) = offset_rectangle(a, b, 1.0, Point2D::new(30.0, 30.0), 0.1).unwrap();
        assert_eq!((min, max), (Point2D::new(-1.0, -1.0), Point2D::new(11.0, 5.0)));
        assert!(offset_rectangle(a, b, 2.0, Point2D::new(5.0, 2.0), 0.1).is_none());
    }

    #[test]
    fn nearest_offsetable_ignores_points() {
        let entities = vec![
            SketchEntity::Point {
                id: 1,
                position: Point2D::new(0.0, 0.0),
                construction: false,
            },
            SketchEntity::Circle {
                id: 2,
                center: Point2D::new(0.0, 0.0),
                radius: 5.0,
                construction: false,
            },
        ];
        assert_eq!(find_nearest_offsetable_entity(&entities, Point2D::new(0.5, 0.0), 10.0), Some(2));
    }
}
