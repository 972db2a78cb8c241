//! Segment intersection and projection helpers.
//!
//! Every intersection is reported as a parameter `t` along the query segment
//! `start + t * (end - start)`, restricted to `[0, 1]`.

use cad_types::{arc_contains_angle, rectangle_corners, Point2D, SketchEntity};

const PARALLEL_EPSILON: f64 = 1e-12;
const RANGE_EPSILON: f64 = 1e-9;

/// Closest point on segment `a`-`b` to `p`: `(t, point, distance)`, with `t`
/// clamped to `[0, 1]`. A zero-length segment projects everything onto `a`.
pub fn project_onto_segment(p: Point2D, a: Point2D, b: Point2D) -> (f64, Point2D, f64) {
    let ab = b - a;
    let len_sq = ab.dot(&ab);
    let t = if len_sq <= PARALLEL_EPSILON {
        0.0
    } else {
        ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a.lerp(&b, t);
    (t, closest, p.distance_to(&closest))
}

fn in_unit_range(t: f64) -> bool {
    (-RANGE_EPSILON..=1.0 + RANGE_EPSILON).contains(&t)
}

/// Parameter along `a`-`b` where it crosses segment `c`-`d`, if they cross.
/// Parallel and collinear segments report nothing.
pub fn segment_segment(a: Point2D, b: Point2D, c: Point2D, d: Point2D) -> Option<f64> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(&s);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let ac = c - a;
    let t = ac.cross(&s) / denom;
    let u = ac.cross(&r) / denom;
    (in_unit_range(t) && in_unit_range(u)).then(|| t.clamp(0.0, 1.0))
}

/// Parameters along `a`-`b` where it meets the circle, with the angle of each
/// hit around `center`.
fn segment_circle_hits(a: Point2D, b: Point2D, center: Point2D, radius: f64) -> Vec<(f64, f64)> {
    let d = b - a;
    let f = a - center;
    let qa = d.dot(&d);
    if qa <= PARALLEL_EPSILON {
        return Vec::new();
    }
    let qb = 2.0 * f.dot(&d);
    let qc = f.dot(&f) - radius * radius;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return Vec::new();
    }

    let root = disc.sqrt();
    let mut ts = vec![(-qb - root) / (2.0 * qa)];
    if root > 0.0 {
        ts.push((-qb + root) / (2.0 * qa));
    }
    ts.into_iter()
        .filter(|t| in_unit_range(*t))
        .map(|t| {
            let t = t.clamp(0.0, 1.0);
            let hit = a.lerp(&b, t) - center;
            (t, hit.y.atan2(hit.x))
        })
        .collect()
}

/// Parameters along `a`-`b` where it meets a full circle.
pub fn segment_circle(a: Point2D, b: Point2D, center: Point2D, radius: f64) -> Vec<f64> {
    segment_circle_hits(a, b, center, radius)
        .into_iter()
        .map(|(t, _)| t)
        .collect()
}

/// Parameters along `a`-`b` where it meets the counter-clockwise arc.
pub fn segment_arc(
    a: Point2D,
    b: Point2D,
    center: Point2D,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
) -> Vec<f64> {
    segment_circle_hits(a, b, center, radius)
        .into_iter()
        .filter(|(_, angle)| arc_contains_angle(start_angle, end_angle, *angle))
        .map(|(t, _)| t)
        .collect()
}

/// Parameters along `a`-`b` where it crosses any rectangle edge.
pub fn segment_rectangle(a: Point2D, b: Point2D, corner_a: Point2D, corner_b: Point2D) -> Vec<f64> {
    let corners = rectangle_corners(corner_a, corner_b);
    (0..4)
        .filter_map(|i| segment_segment(a, b, corners[i], corners[(i + 1) % 4]))
        .collect()
}

/// Parameters along `a`-`b` where it meets `other`. Points never intersect.
pub fn segment_entity(a: Point2D, b: Point2D, other: &SketchEntity) -> Vec<f64> {
    match other {
        SketchEntity::Point { .. } => Vec::new(),
        SketchEntity::Line { start, end, .. } => {
            segment_segment(a, b, *start, *end).into_iter().collect()
        }
        SketchEntity::Rectangle {
            corner_a, corner_b, ..
        } => segment_rectangle(a, b, *corner_a, *corner_b),
        SketchEntity::Circle { center, radius, .. } => segment_circle(a, b, *center, *radius),
        SketchEntity::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            ..
        } => segment_arc(a, b, *center, *radius, *start_angle, *end_angle),
    }
}
