use std::collections::HashMap;
use std::time::{Duration, Instant};

use solid_kernel::{SolidHandle, SolidKernel};
use tracing::{debug, info, instrument, warn};

use crate::placement::{extrude_height, place_on_plane, symmetric_offset};
use crate::resolve::{find_sketch, resolve_body};
use crate::types::{
    BodyId, BooleanOp, BooleanParams, CachedBody, CachedResult, EngineError, ExtrudeMode,
    ExtrudeParams, Feature, FeatureId, FeatureKind, PrimitiveShape,
};

/// Outcome of one pass over the feature list.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildResult {
    /// True when no feature failed.
    pub success: bool,
    /// Every live body after the pass, including those from features that
    /// succeeded after an earlier failure.
    pub bodies: HashMap<BodyId, CachedBody>,
    /// Error message per failed feature.
    pub errors: HashMap<FeatureId, String>,
    pub duration: Duration,
}

/// Bodies a single feature added and removed.
#[derive(Debug, Default)]
struct FeatureOutput {
    bodies: Vec<CachedBody>,
    retired: Vec<BodyId>,
}

impl FeatureOutput {
    fn apply(&self, live: &mut HashMap<BodyId, CachedBody>) {
        for id in &self.retired {
            live.remove(id);
        }
        for body in &self.bodies {
            live.insert(body.body_id, body.clone());
        }
    }
}

/// Evaluate the feature list in order.
///
/// Clean features replay their cached result without touching the kernel,
/// up to the first feature that needs evaluation; from there on every
/// feature is evaluated, since list order is dependency order. A failure is
/// recorded against the feature and the pass continues with the rest.
#[instrument(skip(features, kernel), fields(count = features.len()))]
pub fn rebuild(
    features: &mut [Feature],
    kernel: &mut dyn SolidKernel,
) -> Result<RebuildResult, EngineError> {
    if !kernel.is_initialized() {
        return Err(EngineError::UninitializedKernel);
    }

    let started = Instant::now();
    let mut live: HashMap<BodyId, CachedBody> = HashMap::new();
    let mut errors: HashMap<FeatureId, String> = HashMap::new();
    let mut evaluated = 0usize;
    let mut upstream_changed = false;

    for index in 0..features.len() {
        let feature = &features[index];
        if feature.suppressed {
            debug!(feature = %feature.name, "skipping suppressed feature");
            continue;
        }

        if !feature.dirty && !upstream_changed {
            if let Some(cached) = &feature.cached {
                debug!(feature = %feature.name, bodies = cached.bodies.len(), "replaying cached result");
                for id in &cached.retired {
                    live.remove(id);
                }
                for body in &cached.bodies {
                    live.insert(body.body_id, body.clone());
                }
                continue;
            }
        }

        evaluated += 1;
        upstream_changed = true;
        match evaluate(features, index, &live, kernel) {
            Ok(output) => {
                output.apply(&mut live);
                let feature = &mut features[index];
                debug!(
                    feature = %feature.name,
                    kind = feature.kind_name(),
                    bodies = output.bodies.len(),
                    retired = output.retired.len(),
                    "evaluated feature"
                );
                feature.dirty = false;
                feature.cached = Some(CachedResult {
                    bodies: output.bodies,
                    retired: output.retired,
                    timestamp: Instant::now(),
                });
            }
            Err(e) => {
                let feature = &mut features[index];
                warn!(feature = %feature.name, id = %feature.id, error = %e, "feature failed to rebuild");
                errors.insert(feature.id, e.to_string());
                feature.invalidate();
            }
        }
    }

    let duration = started.elapsed();
    info!(
        evaluated,
        bodies = live.len(),
        errors = errors.len(),
        duration_ms = duration.as_secs_f64() * 1000.0,
        "rebuild complete"
    );

    Ok(RebuildResult {
        success: errors.is_empty(),
        bodies: live,
        errors,
        duration,
    })
}

/// Evaluate the feature at `index` against the current live bodies.
fn evaluate(
    features: &[Feature],
    index: usize,
    live: &HashMap<BodyId, CachedBody>,
    kernel: &mut dyn SolidKernel,
) -> Result<FeatureOutput, EngineError> {
    let feature = &features[index];
    match &feature.kind {
        FeatureKind::Primitive { shape, position } => {
            let handle = build_primitive(kernel, shape, *position)?;
            Ok(FeatureOutput {
                bodies: vec![CachedBody {
                    handle,
                    body_id: BodyId::new(),
                    origin_feature_id: feature.id,
                }],
                retired: Vec::new(),
            })
        }
        // Sketches only feed extrudes.
        FeatureKind::Sketch { .. } => Ok(FeatureOutput::default()),
        FeatureKind::Extrude(params) => execute_extrude(features, index, params, live, kernel),
        FeatureKind::Boolean(params) => execute_boolean(features, feature.id, params, live, kernel),
    }
}

fn build_primitive(
    kernel: &mut dyn SolidKernel,
    shape: &PrimitiveShape,
    position: [f64; 3],
) -> Result<SolidHandle, EngineError> {
    let handle = match *shape {
        PrimitiveShape::Box {
            width,
            height,
            depth,
        } => kernel.create_box(width, height, depth)?,
        PrimitiveShape::Cylinder { radius, height } => kernel.create_cylinder(radius, height)?,
        PrimitiveShape::Sphere { radius } => kernel.create_sphere(radius)?,
    };
    if position.iter().any(|c| *c != 0.0) {
        Ok(kernel.translate(&handle, position)?)
    } else {
        Ok(handle)
    }
}

fn execute_extrude(
    features: &[Feature],
    index: usize,
    params: &ExtrudeParams,
    live: &HashMap<BodyId, CachedBody>,
    kernel: &mut dyn SolidKernel,
) -> Result<FeatureOutput, EngineError> {
    let feature_id = features[index].id;
    let (plane, sketch) = find_sketch(features, index, params.sketch_id)?;
    if sketch.profiles.is_empty() {
        return Err(EngineError::NoProfiles {
            sketch_id: params.sketch_id,
        });
    }

    let height = extrude_height(params.distance, params.direction);
    let mut target = match (params.mode, params.target) {
        (ExtrudeMode::New, _) | (_, None) => None,
        (_, Some(target_id)) => match resolve_body(features, live, target_id) {
            Ok(body) => Some(body),
            Err(e) => {
                debug!(error = %e, "extrude target unresolved, creating new bodies");
                None
            }
        },
    };

    let mut output = FeatureOutput::default();
    if let Some(body) = &target {
        output.retired.push(body.body_id);
    }

    for profile in &sketch.profiles {
        let polygon: Vec<(f64, f64)> = profile.outer_loop.iter().map(|p| (p.x, p.y)).collect();
        let mut solid = kernel.extrude(&polygon, height)?;
        if let Some(dz) = symmetric_offset(height, params.direction) {
            solid = kernel.translate(&solid, [0.0, 0.0, dz])?;
        }
        let solid = place_on_plane(kernel, solid, &plane)?;

        match target.as_mut() {
            Some(body) => {
                body.handle = match params.mode {
                    ExtrudeMode::Cut => kernel.difference(&body.handle, &solid)?,
                    _ => kernel.union(&body.handle, &solid)?,
                };
            }
            None => output.bodies.push(CachedBody {
                handle: solid,
                body_id: BodyId::new(),
                origin_feature_id: feature_id,
            }),
        }
    }

    if let Some(body) = target {
        output.bodies.push(body);
    }
    Ok(output)
}

fn execute_boolean(
    features: &[Feature],
    feature_id: FeatureId,
    params: &BooleanParams,
    live: &HashMap<BodyId, CachedBody>,
    kernel: &mut dyn SolidKernel,
) -> Result<FeatureOutput, EngineError> {
    let target = resolve_body(features, live, params.target)?;
    let tool = resolve_body(features, live, params.tool)?;

    let handle = match params.operation {
        BooleanOp::Union => kernel.union(&target.handle, &tool.handle)?,
        BooleanOp::Difference => kernel.difference(&target.handle, &tool.handle)?,
        BooleanOp::Intersect => kernel.intersect(&target.handle, &tool.handle)?,
    };

    Ok(FeatureOutput {
        bodies: vec![CachedBody {
            handle,
            body_id: BodyId::new(),
            origin_feature_id: feature_id,
        }],
        retired: vec![target.body_id, tool.body_id],
    })
}
