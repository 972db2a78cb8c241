pub mod config;
pub mod debounce;
pub mod placement;
pub mod rebuild;
pub mod resolve;
pub mod tree;
pub mod types;

use std::collections::HashMap;
use std::time::Instant;

use cad_types::{SketchData, SketchPlane};
use sketch_engine::SketchSession;
use solid_kernel::{RenderMesh, SolidKernel};
use tracing::debug;

pub use config::EngineConfig;
pub use debounce::RebuildScheduler;
pub use rebuild::{rebuild, RebuildResult};
pub use tree::FeatureList;
pub use types::*;

/// The parametric modeling engine.
///
/// Owns the feature list and the kernel, and keeps the body map and errors
/// from the most recent rebuild. Edits only invalidate; geometry is rebuilt
/// by [`Engine::rebuild`] or through the debounced
/// [`request_rebuild`](Engine::request_rebuild)/[`poll_rebuild`](Engine::poll_rebuild) pair.
pub struct Engine<K: SolidKernel> {
    features: FeatureList,
    kernel: K,
    scheduler: RebuildScheduler,
    bodies: HashMap<BodyId, CachedBody>,
    errors: HashMap<FeatureId, String>,
}

impl<K: SolidKernel> Engine<K> {
    pub fn new(kernel: K, config: &EngineConfig) -> Self {
        Self {
            features: FeatureList::new(),
            kernel,
            scheduler: RebuildScheduler::new(config.debounce()),
            bodies: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    /// One-time kernel start-up. Must succeed before the first rebuild.
    pub fn initialize_kernel(&mut self) -> Result<(), EngineError> {
        self.kernel.initialize()?;
        Ok(())
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }

    pub fn features(&self) -> &FeatureList {
        &self.features
    }

    /// Live bodies from the last rebuild.
    pub fn bodies(&self) -> &HashMap<BodyId, CachedBody> {
        &self.bodies
    }

    /// Per-feature errors from the last rebuild.
    pub fn errors(&self) -> &HashMap<FeatureId, String> {
        &self.errors
    }

    // ── Feature list ────────────────────────────────────────────

    pub fn add_feature(&mut self, name: impl Into<String>, kind: FeatureKind) -> FeatureId {
        self.features.add_feature(name, kind)
    }

    pub fn remove_feature(&mut self, id: FeatureId) -> Result<Feature, EngineError> {
        self.features.remove_feature(id)
    }

    pub fn edit_feature(&mut self, id: FeatureId, kind: FeatureKind) -> Result<(), EngineError> {
        self.features.edit_feature(id, kind)
    }

    pub fn rename_feature(&mut self, id: FeatureId, name: impl Into<String>) -> Result<(), EngineError> {
        self.features.rename_feature(id, name)
    }

    pub fn set_suppressed(&mut self, id: FeatureId, suppressed: bool) -> Result<(), EngineError> {
        self.features.set_suppressed(id, suppressed)
    }

    pub fn reorder_feature(&mut self, id: FeatureId, new_pos: usize) -> Result<(), EngineError> {
        self.features.reorder_feature(id, new_pos)
    }

    // ── Sketches ────────────────────────────────────────────────

    /// Commit an active sketch session as a new sketch feature.
    pub fn commit_sketch(
        &mut self,
        session: &mut SketchSession,
        name: impl Into<String>,
        plane: SketchPlane,
    ) -> Result<FeatureId, EngineError> {
        let data = session.finish()?;
        let id = self.features.add_feature(name, FeatureKind::Sketch { plane, data });
        debug!(%id, "committed sketch as new feature");
        Ok(id)
    }

    /// Commit an active sketch session over an existing sketch feature,
    /// keeping its plane.
    pub fn commit_sketch_into(
        &mut self,
        id: FeatureId,
        session: &mut SketchSession,
    ) -> Result<(), EngineError> {
        let (plane, _) = self.sketch(id)?;
        let data = session.finish()?;
        self.features.edit_feature(id, FeatureKind::Sketch { plane, data })
    }

    /// Stored data of a sketch feature, e.g. to seed a new editing session.
    pub fn sketch_data(&self, id: FeatureId) -> Result<&SketchData, EngineError> {
        self.sketch(id).map(|(_, data)| data)
    }

    fn sketch(&self, id: FeatureId) -> Result<(SketchPlane, &SketchData), EngineError> {
        let feature = self
            .features
            .find_feature(id)
            .ok_or(EngineError::SketchNotFound { id })?;
        match &feature.kind {
            FeatureKind::Sketch { plane, data } => Ok((*plane, data)),
            _ => Err(EngineError::NotASketch {
                id,
                kind: feature.kind_name(),
            }),
        }
    }

    // ── Rebuild ─────────────────────────────────────────────────

    /// Rebuild now. Clean features replay from cache.
    pub fn rebuild(&mut self) -> Result<RebuildResult, EngineError> {
        self.scheduler.cancel();
        let result = rebuild::rebuild(&mut self.features.features, &mut self.kernel)?;
        self.bodies = result.bodies.clone();
        self.errors = result.errors.clone();
        Ok(result)
    }

    /// Ask for a rebuild once edits go quiet. Replaces any pending request.
    pub fn request_rebuild(&mut self, now: Instant) {
        self.scheduler.request(now);
    }

    /// Run the pending rebuild if its idle window has elapsed.
    pub fn poll_rebuild(&mut self, now: Instant) -> Option<Result<RebuildResult, EngineError>> {
        if self.scheduler.poll(now) {
            Some(self.rebuild())
        } else {
            None
        }
    }

    pub fn rebuild_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Render mesh of a live body.
    pub fn tessellate_body(&mut self, body_id: BodyId) -> Result<RenderMesh, EngineError> {
        let body = self
            .bodies
            .get(&body_id)
            .ok_or(EngineError::UnknownBody { id: body_id })?;
        Ok(self.kernel.tessellate(&body.handle)?)
    }
}
