//! Reference resolution: feature ids to sketches and live bodies.

use std::collections::HashMap;

use cad_types::{SketchData, SketchPlane};
use tracing::warn;

use crate::types::{BodyId, CachedBody, EngineError, Feature, FeatureId, FeatureKind};

/// Find the sketch an extrude at `from_index` refers to.
///
/// The whole list is scanned, so a sketch placed after the extrude still
/// resolves; that case is logged.
pub fn find_sketch(
    features: &[Feature],
    from_index: usize,
    sketch_id: FeatureId,
) -> Result<(SketchPlane, &SketchData), EngineError> {
    let (index, feature) = features
        .iter()
        .enumerate()
        .find(|(_, f)| f.id == sketch_id)
        .ok_or(EngineError::SketchNotFound { id: sketch_id })?;

    let FeatureKind::Sketch { plane, data } = &feature.kind else {
        return Err(EngineError::NotASketch {
            id: sketch_id,
            kind: feature.kind_name(),
        });
    };

    if index > from_index {
        warn!(
            %sketch_id,
            sketch_index = index,
            extrude_index = from_index,
            "extrude references a sketch later in the feature list"
        );
    }
    Ok((*plane, data))
}

/// Resolve the live body a feature reference points at.
///
/// The referenced feature's last cached bodies are tried first, looked up in
/// the live map so a body modified in place by a later join or cut resolves
/// to its current solid. Failing that, the live map is scanned for a body
/// whose origin is the referenced feature.
pub fn resolve_body(
    features: &[Feature],
    live: &HashMap<BodyId, CachedBody>,
    feature_id: FeatureId,
) -> Result<CachedBody, EngineError> {
    let feature = features
        .iter()
        .find(|f| f.id == feature_id)
        .ok_or(EngineError::FeatureNotFound { id: feature_id })?;

    if let Some(cached) = &feature.cached {
        if let Some(body) = cached.bodies.iter().find_map(|b| live.get(&b.body_id)) {
            return Ok(body.clone());
        }
    }

    // Lowest body id wins so the choice does not depend on map order.
    live.values()
        .filter(|b| b.origin_feature_id == feature_id)
        .min_by_key(|b| b.body_id)
        .cloned()
        .ok_or(EngineError::BodyNotFound { feature_id })
}
