use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::geometry::{BoundingBox, Point2D};

/// A geometric entity in a sketch.
///
/// Geometry is stored inline (no shared point entities); entities never move
/// after creation, editing operations replace them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SketchEntity {
    Point {
        id: u32,
        position: Point2D,
        construction: bool,
    },
    Line {
        id: u32,
        start: Point2D,
        end: Point2D,
        construction: bool,
    },
    /// Axis-aligned rectangle given by two opposite corners.
    Rectangle {
        id: u32,
        corner_a: Point2D,
        corner_b: Point2D,
        construction: bool,
    },
    Circle {
        id: u32,
        center: Point2D,
        radius: f64,
        construction: bool,
    },
    /// Counter-clockwise arc from `start_angle` to `end_angle` (radians).
    Arc {
        id: u32,
        center: Point2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        construction: bool,
    },
}

impl SketchEntity {
    pub fn id(&self) -> u32 {
        match self {
            SketchEntity::Point { id, .. }
            | SketchEntity::Line { id, .. }
            | SketchEntity::Rectangle { id, .. }
            | SketchEntity::Circle { id, .. }
            | SketchEntity::Arc { id, .. } => *id,
        }
    }

    pub fn is_construction(&self) -> bool {
        match self {
            SketchEntity::Point { construction, .. }
            | SketchEntity::Line { construction, .. }
            | SketchEntity::Rectangle { construction, .. }
            | SketchEntity::Circle { construction, .. }
            | SketchEntity::Arc { construction, .. } => *construction,
        }
    }

    pub fn set_construction(&mut self, value: bool) {
        match self {
            SketchEntity::Point { construction, .. }
            | SketchEntity::Line { construction, .. }
            | SketchEntity::Rectangle { construction, .. }
            | SketchEntity::Circle { construction, .. }
            | SketchEntity::Arc { construction, .. } => *construction = value,
        }
    }

    /// Short lowercase name of the entity kind, used in logs and hints.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SketchEntity::Point { .. } => "point",
            SketchEntity::Line { .. } => "line",
            SketchEntity::Rectangle { .. } => "rectangle",
            SketchEntity::Circle { .. } => "circle",
            SketchEntity::Arc { .. } => "arc",
        }
    }
}

/// Normalized bounds of a rectangle given by two arbitrary opposite corners.
pub fn rectangle_bounds(corner_a: Point2D, corner_b: Point2D) -> BoundingBox {
    BoundingBox {
        min: Point2D::new(corner_a.x.min(corner_b.x), corner_a.y.min(corner_b.y)),
        max: Point2D::new(corner_a.x.max(corner_b.x), corner_a.y.max(corner_b.y)),
    }
}

/// Rectangle corners in counter-clockwise order starting at the minimum corner.
pub fn rectangle_corners(corner_a: Point2D, corner_b: Point2D) -> [Point2D; 4] {
    let b = rectangle_bounds(corner_a, corner_b);
    [
        b.min,
        Point2D::new(b.max.x, b.min.y),
        b.max,
        Point2D::new(b.min.x, b.max.y),
    ]
}

/// Counter-clockwise angular span of an arc, in `(0, 2π]`.
pub fn arc_sweep(start_angle: f64, end_angle: f64) -> f64 {
    let sweep = (end_angle - start_angle).rem_euclid(TAU);
    if sweep == 0.0 {
        TAU
    } else {
        sweep
    }
}

/// Whether `angle` lies on the counter-clockwise span from `start_angle` to `end_angle`.
pub fn arc_contains_angle(start_angle: f64, end_angle: f64, angle: f64) -> bool {
    let offset = (angle - start_angle).rem_euclid(TAU);
    offset <= arc_sweep(start_angle, end_angle) + 1e-9
}

/// A closed 2D loop usable as an extrusion cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Ordered boundary points, always counter-clockwise.
    pub outer_loop: Vec<Point2D>,
    /// Hole loops. Part of the data model; the detector never fills it.
    #[serde(default)]
    pub inner_loops: Vec<Vec<Point2D>>,
    /// Enclosed area (absolute value of the signed area).
    pub area: f64,
    pub bounding_box: BoundingBox,
}

/// Presentation-only geometric relationship inferred from the geometry.
/// Never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SketchConstraint {
    Horizontal { entity: u32 },
    Vertical { entity: u32 },
    Concentric { circle_a: u32, circle_b: u32 },
    Parallel { line_a: u32, line_b: u32 },
    Perpendicular { line_a: u32, line_b: u32 },
}

/// One sketch's entities, inferred constraints, and detected profiles.
/// The unit of persistence and exchange for a sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchData {
    pub entities: Vec<SketchEntity>,
    #[serde(default)]
    pub constraints: Vec<SketchConstraint>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    pub grid_size: f64,
    pub snap_enabled: bool,
}

impl SketchData {
    pub fn new(grid_size: f64, snap_enabled: bool) -> Self {
        Self {
            entities: Vec::new(),
            constraints: Vec::new(),
            profiles: Vec::new(),
            grid_size,
            snap_enabled,
        }
    }

    pub fn find_entity(&self, id: u32) -> Option<&SketchEntity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Largest entity id in use, or 0 for an empty sketch.
    pub fn max_entity_id(&self) -> u32 {
        self.entities.iter().map(SketchEntity::id).max().unwrap_or(0)
    }
}

impl Default for SketchData {
    fn default() -> Self {
        Self::new(10.0, true)
    }
}
