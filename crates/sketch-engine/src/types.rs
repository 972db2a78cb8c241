use cad_types::{Point2D, SketchEntity};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a sketch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Active,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Active => f.write_str("active"),
        }
    }
}

/// What kind of feature a snap locked onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapKind {
    Origin,
    Grid,
    Point,
    Endpoint,
    Midpoint,
    Corner,
    Center,
    Quadrant,
}

/// A snapped cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub point: Point2D,
    pub kind: SnapKind,
    /// Entity that produced the snap; `None` for origin and grid snaps.
    pub entity_id: Option<u32>,
}

/// Outcome of trimming a line.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimOutcome {
    /// The deleted original line.
    pub removed: SketchEntity,
    /// Surviving pieces re-added with fresh ids (0, 1 or 2 lines).
    pub added: Vec<SketchEntity>,
}

/// Errors from sketch operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SketchError {
    #[error("sketch session is {found}, operation requires {expected}")]
    SessionState {
        expected: SessionState,
        found: SessionState,
    },

    #[error("sketch entity not found: {id}")]
    EntityNotFound { id: u32 },

    #[error("sketch entity {id} is a {found}, expected a {expected}")]
    WrongEntityKind {
        id: u32,
        expected: &'static str,
        found: &'static str,
    },

    #[error("degenerate geometry: {reason}")]
    Degenerate { reason: String },

    #[error("no entity ids left in this sketch")]
    IdsExhausted,
}
