use serde::{Deserialize, Serialize};

/// Which principal plane a sketch lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaneOrientation {
    #[default]
    XY,
    XZ,
    YZ,
}

/// The plane a sketch is drawn on: a principal orientation plus an origin offset.
///
/// Sketch-local `(u, v)` with extrusion height `h` maps to world space as:
/// - `XY`: `(u, v, h)`
/// - `XZ`: `(u, -h, v)`
/// - `YZ`: `(h, u, v)`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SketchPlane {
    pub orientation: PlaneOrientation,
    #[serde(default)]
    pub origin: [f64; 3],
}

impl SketchPlane {
    pub fn new(orientation: PlaneOrientation, origin: [f64; 3]) -> Self {
        Self {
            orientation,
            origin,
        }
    }

    pub fn xy() -> Self {
        Self::new(PlaneOrientation::XY, [0.0; 3])
    }

    /// Euler rotation in degrees (applied X, then Y, then Z) that carries the
    /// local XY frame onto this plane. `None` when no rotation is needed.
    pub fn rotation_degrees(&self) -> Option<[f64; 3]> {
        match self.orientation {
            PlaneOrientation::XY => None,
            PlaneOrientation::XZ => Some([90.0, 0.0, 0.0]),
            PlaneOrientation::YZ => Some([90.0, 0.0, 90.0]),
        }
    }

    /// Translation applied after rotation, `None` when the origin is zero.
    pub fn translation(&self) -> Option<[f64; 3]> {
        if self.origin.iter().any(|c| *c != 0.0) {
            Some(self.origin)
        } else {
            None
        }
    }

    /// World-space direction of positive extrusion height.
    pub fn normal(&self) -> [f64; 3] {
        match self.orientation {
            PlaneOrientation::XY => [0.0, 0.0, 1.0],
            PlaneOrientation::XZ => [0.0, -1.0, 0.0],
            PlaneOrientation::YZ => [1.0, 0.0, 0.0],
        }
    }

    /// Map a sketch-local point at height `h` into world coordinates.
    pub fn to_world(&self, u: f64, v: f64, h: f64) -> [f64; 3] {
        let local = match self.orientation {
            PlaneOrientation::XY => [u, v, h],
            PlaneOrientation::XZ => [u, -h, v],
            PlaneOrientation::YZ => [h, u, v],
        };
        [
            local[0] + self.origin[0],
            local[1] + self.origin[1],
            local[2] + self.origin[2],
        ]
    }
}
