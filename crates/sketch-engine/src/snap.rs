//! Cursor snapping.
//!
//! Precedence: the sketch origin when within range, then the nearest
//! candidate among entity snap points and the grid, then nothing.

use cad_types::{arc_sweep, rectangle_corners, Point2D, SketchEntity};

use crate::types::{SnapKind, SnapResult};

/// Inputs that control a snap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    pub radius: f64,
    pub grid_size: f64,
    pub grid_enabled: bool,
}

/// Characteristic points of an entity a cursor can lock onto.
pub fn entity_snap_points(entity: &SketchEntity) -> Vec<(Point2D, SnapKind)> {
    match entity {
        SketchEntity::Point { position, .. } => vec![(*position, SnapKind::Point)],
        SketchEntity::Line { start, end, .. } => vec![
            (*start, SnapKind::Endpoint),
            (*end, SnapKind::Endpoint),
            (start.midpoint(end), SnapKind::Midpoint),
        ],
        SketchEntity::Rectangle {
            corner_a, corner_b, ..
        } => {
            let corners = rectangle_corners(*corner_a, *corner_b);
            let mut points: Vec<_> = corners.iter().map(|c| (*c, SnapKind::Corner)).collect();
            points.extend((0..4).map(|i| {
                (corners[i].midpoint(&corners[(i + 1) % 4]), SnapKind::Midpoint)
            }));
            points.push((corners[0].midpoint(&corners[2]), SnapKind::Center));
            points
        }
        SketchEntity::Circle { center, radius, .. } => {
            let mut points = vec![(*center, SnapKind::Center)];
            points.extend(quadrants(*center, *radius).map(|q| (q, SnapKind::Quadrant)));
            points
        }
        SketchEntity::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            ..
        } => {
            let mid_angle = start_angle + arc_sweep(*start_angle, *end_angle) / 2.0;
            vec![
                (*center, SnapKind::Center),
                (Point2D::from_polar(*center, *radius, *start_angle), SnapKind::Endpoint),
                (Point2D::from_polar(*center, *radius, *end_angle), SnapKind::Endpoint),
                (Point2D::from_polar(*center, *radius, mid_angle), SnapKind::Midpoint),
            ]
        }
    }
}

fn quadrants(center: Point2D, radius: f64) -> [Point2D; 4] {
    [
        Point2D::new(center.x + radius, center.y),
        Point2D::new(center.x, center.y + radius),
        Point2D::new(center.x - radius, center.y),
        Point2D::new(center.x, center.y - radius),
    ]
}

/// Nearest grid intersection to `position`.
pub fn nearest_grid_point(position: Point2D, grid_size: f64) -> Point2D {
    Point2D::new(
        (position.x / grid_size).round() * grid_size,
        (position.y / grid_size).round() * grid_size,
    )
}

/// Find the point the cursor should lock onto, skipping `exclude_id`
/// (usually the entity being drawn).
pub fn find_snap_point(
    entities: &[SketchEntity],
    position: Point2D,
    exclude_id: Option<u32>,
    settings: &SnapSettings,
) -> Option<SnapResult> {
    if position.distance_to(&Point2D::ORIGIN) <= settings.radius {
        return Some(SnapResult {
            point: Point2D::ORIGIN,
            kind: SnapKind::Origin,
            entity_id: None,
        });
    }

    let mut best: Option<(f64, SnapResult)> = None;
    for entity in entities.iter().filter(|e| Some(e.id()) != exclude_id) {
        for (point, kind) in entity_snap_points(entity) {
            let dist = position.distance_to(&point);
            if dist <= settings.radius && best.map_or(true, |(d, _)| dist < d) {
                best = Some((
                    dist,
                    SnapResult {
                        point,
                        kind,
                        entity_id: Some(entity.id()),
                    },
                ));
            }
        }
    }

    if settings.grid_enabled && settings.grid_size > 0.0 {
        let grid = nearest_grid_point(position, settings.grid_size);
        let dist = position.distance_to(&grid);
        if dist <= settings.radius && best.map_or(true, |(d, _)| dist < d) {
            best = Some((
                dist,
                SnapResult {
                    point: grid,
                    kind: SnapKind::Grid,
                    entity_id: None,
                },
            ));
        }
    }

    best.map(|(_, snap)| snap)
}
