use cad_types::{Point2D, SketchConstraint, SketchEntity};

use crate::config::HintTolerances;

/// Infer display-only relationships between entities. Nothing here is ever
/// enforced; the list is recomputed from scratch after each edit.
pub fn infer_constraints(entities: &[SketchEntity], tol: &HintTolerances) -> Vec<SketchConstraint> {
    let lines: Vec<(u32, Point2D)> = entities
        .iter()
        .filter_map(|e| match e {
            SketchEntity::Line { id, start, end, .. } => {
                (*end - *start).normalized().map(|dir| (*id, dir))
            }
            _ => None,
        })
        .collect();
    let circles: Vec<(u32, Point2D)> = entities
        .iter()
        .filter_map(|e| match e {
            SketchEntity::Circle { id, center, .. } => Some((*id, *center)),
            _ => None,
        })
        .collect();

    let mut hints = Vec::new();
    for &(id, dir) in &lines {
        if dir.y.abs() < tol.axis_ratio {
            hints.push(SketchConstraint::Horizontal { entity: id });
        } else if dir.x.abs() < tol.axis_ratio {
            hints.push(SketchConstraint::Vertical { entity: id });
        }
    }

    for (i, &(a, center_a)) in circles.iter().enumerate() {
        for &(b, center_b) in &circles[i + 1..] {
            if center_a.distance_to(&center_b) < tol.concentric_distance {
                hints.push(SketchConstraint::Concentric {
                    circle_a: a,
                    circle_b: b,
                });
            }
        }
    }

    for (i, &(a, dir_a)) in lines.iter().enumerate() {
        for &(b, dir_b) in &lines[i + 1..] {
            let cos = dir_a.dot(&dir_b).abs();
            if cos > tol.parallel_dot {
                hints.push(SketchConstraint::Parallel { line_a: a, line_b: b });
            } else if cos < tol.perpendicular_dot {
                hints.push(SketchConstraint::Perpendicular { line_a: a, line_b: b });
            }
        }
    }

    hints
}
