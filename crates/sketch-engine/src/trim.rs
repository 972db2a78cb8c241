use cad_types::{Point2D, SketchEntity};

use crate::intersect::{project_onto_segment, segment_entity};

/// Nearest line to `point` within `max_distance`, measured to the segment.
pub fn find_nearest_line_entity(
    entities: &[SketchEntity],
    point: Point2D,
    max_distance: f64,
) -> Option<u32> {
    entities
        .iter()
        .filter_map(|entity| match entity {
            SketchEntity::Line { id, start, end, .. } => {
                let (_, _, dist) = project_onto_segment(point, *start, *end);
                (dist <= max_distance).then_some((dist, *id))
            }
            _ => None,
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

/// Parametric pieces of a line that survive a trim at `click`.
///
/// The line is cut at every intersection with the other entities. The
/// interval around the click's projection is removed; the pieces on either
/// side are kept when their span exceeds `epsilon`. With no intersections
/// the whole line goes. Returns `None` for a zero-length line.
pub fn trim_spans(
    entities: &[SketchEntity],
    line_id: u32,
    start: Point2D,
    end: Point2D,
    click: Point2D,
    epsilon: f64,
) -> Option<Vec<(f64, f64)>> {
    if start.distance_to(&end) <= f64::EPSILON {
        return None;
    }

    let cuts: Vec<f64> = entities
        .iter()
        .filter(|e| e.id() != line_id)
        .flat_map(|e| segment_entity(start, end, e))
        .collect();

    let (t_click, _, _) = project_onto_segment(click, start, end);
    let left = cuts
        .iter()
        .copied()
        .filter(|t| *t <= t_click)
        .fold(0.0, f64::max);
    let right = cuts
        .iter()
        .copied()
        .filter(|t| *t >= t_click)
        .fold(1.0, f64::min);

    let mut spans = Vec::new();
    if left > epsilon {
        spans.push((0.0, left));
    }
    if 1.0 - right > epsilon {
        spans.push((right, 1.0));
    }
    Some(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: u32, a: (f64, f64), b: (f64, f64)) -> SketchEntity {
        SketchEntity::Line {
            id,
            start: a.into(),
            end: b.into(),
            construction: false,
        }
    }

    #[test]
    fn middle_click_keeps_both_ends() {
        let entities = vec![
            line(1, (0.0, 0.0), (30.0, 0.0)),
            line(2, (10.0, -5.0), (10.0, 5.0)),
            line(3, (20.0, -5.0), (20.0, 5.0)),
        ];
        let spans = trim_spans(
            &entities,
            1,
            Point2D::new(0.0, 0.0),
            Point2D::new(30.0, 0.0),
            Point2D::new(15.0, 1.0),
            0.001,
        )
        .unwrap();
        assert_eq!(spans.len(), 2);
        assert!((spans[0].1 - 1.0 / 3.0).abs() < 1e-9);
        assert!((spans[1].0 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn isolated_line_is_removed_entirely() {
        let entities = vec![line(1, (0.0, 0.0), (30.0, 0.0))];
        let spans = trim_spans(
            &entities,
            1,
            Point2D::new(0.0, 0.0),
            Point2D::new(30.0, 0.0),
            Point2D::new(5.0, 0.0),
            0.001,
        )
        .unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn nearest_line_respects_max_distance() {
        let entities = vec![
            line(1, (0.0, 0.0), (10.0, 0.0)),
            line(2, (0.0, 4.0), (10.0, 4.0)),
        ];
        assert_eq!(find_nearest_line_entity(&entities, Point2D::new(5.0, 3.0), 5.0), Some(2));
        assert_eq!(find_nearest_line_entity(&entities, Point2D::new(5.0, 30.0), 5.0), None);
    }
}
