use serde::{Deserialize, Serialize};

use crate::types::{EngineError, Feature, FeatureId, FeatureKind};

/// The ordered list of modeling features. List order is dependency order:
/// a change at index N invalidates N and everything after it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureList {
    pub features: Vec<Feature>,
}

impl FeatureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Append a feature. Returns its id.
    pub fn add_feature(&mut self, name: impl Into<String>, kind: FeatureKind) -> FeatureId {
        let feature = Feature::new(name, kind);
        let id = feature.id;
        self.features.push(feature);
        id
    }

    /// Remove a feature by ID. Returns the removed feature.
    pub fn remove_feature(&mut self, id: FeatureId) -> Result<Feature, EngineError> {
        let pos = self.index_of(id)?;
        let feature = self.features.remove(pos);
        self.mark_dirty_from(pos);
        Ok(feature)
    }

    /// Replace a feature's definition.
    pub fn edit_feature(&mut self, id: FeatureId, kind: FeatureKind) -> Result<(), EngineError> {
        let pos = self.index_of(id)?;
        self.features[pos].kind = kind;
        self.mark_dirty_from(pos);
        Ok(())
    }

    /// Rename a feature. Geometry is unaffected, so nothing is invalidated.
    pub fn rename_feature(&mut self, id: FeatureId, name: impl Into<String>) -> Result<(), EngineError> {
        let feature = self
            .find_feature_mut(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        feature.name = name.into();
        Ok(())
    }

    /// Suppress or unsuppress a feature.
    pub fn set_suppressed(&mut self, id: FeatureId, suppressed: bool) -> Result<(), EngineError> {
        let pos = self.index_of(id)?;
        if self.features[pos].suppressed != suppressed {
            self.features[pos].suppressed = suppressed;
            self.mark_dirty_from(pos);
        }
        Ok(())
    }

    /// Move a feature to `new_pos` (clamped to the end of the list).
    pub fn reorder_feature(&mut self, id: FeatureId, new_pos: usize) -> Result<(), EngineError> {
        let old_pos = self.index_of(id)?;
        let feature = self.features.remove(old_pos);
        let clamped_pos = new_pos.min(self.features.len());
        self.features.insert(clamped_pos, feature);
        self.mark_dirty_from(old_pos.min(clamped_pos));
        Ok(())
    }

    /// Invalidate the feature at `index` and every later one.
    pub fn mark_dirty_from(&mut self, index: usize) {
        for feature in self.features.iter_mut().skip(index) {
            feature.invalidate();
        }
    }

    pub fn find_feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn find_feature_mut(&mut self, id: FeatureId) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.id == id)
    }

    pub fn feature_index(&self, id: FeatureId) -> Option<usize> {
        self.features.iter().position(|f| f.id == id)
    }

    fn index_of(&self, id: FeatureId) -> Result<usize, EngineError> {
        self.feature_index(id).ok_or(EngineError::FeatureNotFound { id })
    }
}
