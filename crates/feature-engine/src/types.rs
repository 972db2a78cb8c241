use std::time::Instant;

use cad_types::{SketchData, SketchPlane};
use serde::{Deserialize, Serialize};
use solid_kernel::SolidHandle;
use uuid::Uuid;

pub type FeatureId = Uuid;

/// Stable identity of a body across rebuilds. Join and cut extrudes keep
/// the id of the body they modify; booleans mint a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub Uuid);

impl BodyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BodyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A body in the live body map.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBody {
    pub handle: SolidHandle,
    pub body_id: BodyId,
    /// Feature that first created this body.
    pub origin_feature_id: FeatureId,
}

/// What a feature contributed the last time it was evaluated.
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub bodies: Vec<CachedBody>,
    /// Body ids this feature removed from the live map.
    pub retired: Vec<BodyId>,
    pub timestamp: Instant,
}

/// One entry of the ordered feature list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    pub suppressed: bool,
    /// Needs re-evaluation on the next rebuild.
    #[serde(skip)]
    pub dirty: bool,
    #[serde(skip)]
    pub cached: Option<CachedResult>,
    pub kind: FeatureKind,
}

impl Feature {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            suppressed: false,
            dirty: true,
            cached: None,
            kind,
        }
    }

    /// Drop any cached result and flag for re-evaluation.
    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.cached = None;
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FeatureKind::Primitive { .. } => "primitive",
            FeatureKind::Sketch { .. } => "sketch",
            FeatureKind::Extrude(_) => "extrude",
            FeatureKind::Boolean(_) => "boolean",
        }
    }
}

/// What a feature does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeatureKind {
    Primitive {
        shape: PrimitiveShape,
        #[serde(default)]
        position: [f64; 3],
    },
    Sketch {
        plane: SketchPlane,
        data: SketchData,
    },
    Extrude(ExtrudeParams),
    Boolean(BooleanParams),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum PrimitiveShape {
    Box { width: f64, height: f64, depth: f64 },
    Cylinder { radius: f64, height: f64 },
    Sphere { radius: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrudeDirection {
    /// Along the sketch plane normal.
    #[default]
    Normal,
    /// Against the sketch plane normal.
    Reverse,
    /// Centered on the sketch plane.
    Symmetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrudeMode {
    /// Every profile becomes its own body.
    #[default]
    New,
    /// Union into the target body.
    Join,
    /// Subtract from the target body.
    Cut,
}

/// Parameters for an extrude feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeParams {
    pub sketch_id: FeatureId,
    pub distance: f64,
    #[serde(default)]
    pub direction: ExtrudeDirection,
    #[serde(default)]
    pub mode: ExtrudeMode,
    /// Feature whose body a join or cut modifies.
    #[serde(default)]
    pub target: Option<FeatureId>,
}

/// Parameters for a boolean feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanParams {
    pub target: FeatureId,
    pub tool: FeatureId,
    pub operation: BooleanOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersect,
}

/// Errors from the feature engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("feature not found: {id}")]
    FeatureNotFound { id: FeatureId },

    #[error("sketch not found: {id}")]
    SketchNotFound { id: FeatureId },

    #[error("feature {id} is a {kind}, not a sketch")]
    NotASketch { id: FeatureId, kind: &'static str },

    #[error("sketch {sketch_id} has no closed profiles")]
    NoProfiles { sketch_id: FeatureId },

    #[error("no live body produced by feature {feature_id}")]
    BodyNotFound { feature_id: FeatureId },

    #[error("body {id} is not in the live body map")]
    UnknownBody { id: BodyId },

    #[error("solid kernel is not initialized")]
    UninitializedKernel,

    #[error("kernel error: {0}")]
    Kernel(#[from] solid_kernel::KernelError),

    #[error("sketch error: {0}")]
    Sketch(#[from] sketch_engine::SketchError),
}
