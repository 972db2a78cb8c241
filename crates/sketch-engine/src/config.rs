//! Tunable constants for sketch editing and profile detection.
//!
//! Every struct deserializes from partial JSON; missing fields take the
//! defaults below.

use serde::{Deserialize, Serialize};

/// Profile detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Endpoints that round to the same multiple of this value are merged
    /// into one graph vertex. Coarse on purpose: freehand endpoints rarely
    /// land exactly on each other.
    pub merge_tolerance: f64,
    /// Depth cap for the cycle search.
    pub max_depth: usize,
    /// Number of polygon segments used for circle profiles.
    pub circle_segments: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            merge_tolerance: 1.0,
            max_depth: 100,
            circle_segments: 64,
        }
    }
}

/// Thresholds for the display-only constraint hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintTolerances {
    /// Max |dy|/length for horizontal (|dx|/length for vertical).
    pub axis_ratio: f64,
    /// Max center distance for concentric circles.
    pub concentric_distance: f64,
    /// Min |cos| between two line directions for parallel.
    pub parallel_dot: f64,
    /// Max |cos| between two line directions for perpendicular.
    pub perpendicular_dot: f64,
}

impl Default for HintTolerances {
    fn default() -> Self {
        Self {
            axis_ratio: 0.01,
            concentric_distance: 0.01,
            parallel_dot: 0.999,
            perpendicular_dot: 0.01,
        }
    }
}

/// Settings for a sketch editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Cursor lock radius in sketch units.
    pub snap_radius: f64,
    /// Grid spacing for sketches created without a seed.
    pub grid_size: f64,
    /// Grid snapping for sketches created without a seed.
    pub snap_enabled: bool,
    /// Trim pieces with a parametric span at or below this are dropped.
    pub trim_epsilon: f64,
    /// Smallest radius / rectangle side an offset may produce.
    pub min_offset_size: f64,
    pub hints: HintTolerances,
    pub detector: DetectorConfig,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            snap_radius: 10.0,
            grid_size: 10.0,
            snap_enabled: true,
            trim_epsilon: 0.001,
            min_offset_size: 0.1,
            hints: HintTolerances::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl SketchConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
