//! ModelState: the live parameter, part and drawable state of one model instance.
//!
//! Every animation producer reads and writes through this type. Writes use
//! three primitives (overwrite, additive, multiply), each taking a weight in
//! [0, 1]; see [`ModelState::apply_blend`].

use log::{debug, warn};

use crate::backend::{ModelBackend, ModelLayout};
use crate::config::Config;
use crate::drawables::DrawableOverrides;
use crate::error::{Result, RigError};
use crate::expression::BlendOp;
use crate::ids::{DrawableIndex, ParamIndex, PartIndex};
use crate::registry::{ParameterRegistry, PartRegistry};

#[derive(Clone, Debug)]
pub struct ModelState {
    parameters: ParameterRegistry,
    parts: PartRegistry,
    drawables: DrawableOverrides,
    model_opacity: f32,
    moc_version: u32,
}

impl ModelState {
    /// Build state from a layout with no backend attached.
    pub fn from_layout(layout: &ModelLayout, cfg: &Config) -> Self {
        Self {
            parameters: ParameterRegistry::new(&layout.parameters, cfg.shadow_capacity_hint),
            parts: PartRegistry::new(&layout.parts, cfg.shadow_capacity_hint),
            drawables: DrawableOverrides::new(&layout.drawables),
            model_opacity: 1.0,
            moc_version: 0,
        }
    }

    /// Read the backend's arrays once. Fails if the payload is inconsistent.
    pub fn from_backend(backend: &dyn ModelBackend, cfg: &Config) -> Result<Self> {
        let version = backend.moc_version();
        if !backend.is_consistent() {
            return Err(RigError::InconsistentModel { version });
        }
        if version == 0 {
            warn!("model backend reports unknown moc version");
        }
        let mut state = Self::from_layout(&backend.layout(), cfg);
        state.moc_version = version;
        debug!(
            "model state loaded: {} parameters, {} parts, {} drawables (moc v{version})",
            state.parameters.len(),
            state.parts.len(),
            state.drawables.len()
        );
        Ok(state)
    }

    /// Push parameter values, part opacities and drawable state to the
    /// backend, then run its deformation step.
    pub fn sync_to(&self, backend: &mut dyn ModelBackend) -> Result<()> {
        check_len("parameter", self.parameters.len(), backend.parameter_count())?;
        check_len("part", self.parts.len(), backend.part_count())?;
        check_len("drawable", self.drawables.len(), backend.drawable_count())?;

        backend.write_parameters(self.parameters.values());
        backend.write_part_opacities(self.parts.opacities());
        backend.write_drawables(&self.drawables.states());
        backend.update();
        Ok(())
    }

    pub fn moc_version(&self) -> u32 {
        self.moc_version
    }

    // ----- parameters -----

    pub fn parameters(&self) -> &ParameterRegistry {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Stable slot for `id`. Unknown ids get a shadow slot; this never fails.
    /// Callers touching a parameter every frame should keep the returned index.
    pub fn parameter_index(&mut self, id: &str) -> ParamIndex {
        self.parameters.index_of(id)
    }

    pub fn parameter_id(&self, index: ParamIndex) -> Option<&str> {
        self.parameters.id(index)
    }

    pub fn parameter_min(&self, index: ParamIndex) -> Option<f32> {
        self.parameters.min(index)
    }

    pub fn parameter_max(&self, index: ParamIndex) -> Option<f32> {
        self.parameters.max(index)
    }

    pub fn parameter_default(&self, index: ParamIndex) -> Option<f32> {
        self.parameters.default_value(index)
    }

    pub fn parameter_value(&self, index: ParamIndex) -> f32 {
        self.parameters.value(index)
    }

    pub fn set_parameter_value(&mut self, index: ParamIndex, value: f32, weight: f32) {
        self.parameters.set_value(index, value, weight);
    }

    pub fn add_parameter_value(&mut self, index: ParamIndex, delta: f32, weight: f32) {
        self.parameters.add_value(index, delta, weight);
    }

    pub fn multiply_parameter_value(&mut self, index: ParamIndex, factor: f32, weight: f32) {
        self.parameters.multiply_value(index, factor, weight);
    }

    pub fn parameter_value_by_id(&mut self, id: &str) -> f32 {
        let index = self.parameter_index(id);
        self.parameter_value(index)
    }

    pub fn set_parameter_value_by_id(&mut self, id: &str, value: f32, weight: f32) {
        let index = self.parameter_index(id);
        self.set_parameter_value(index, value, weight);
    }

    pub fn add_parameter_value_by_id(&mut self, id: &str, delta: f32, weight: f32) {
        let index = self.parameter_index(id);
        self.add_parameter_value(index, delta, weight);
    }

    pub fn multiply_parameter_value_by_id(&mut self, id: &str, factor: f32, weight: f32) {
        let index = self.parameter_index(id);
        self.multiply_parameter_value(index, factor, weight);
    }

    /// Apply one contribution with the given operator. This is the contract
    /// every motion producer (expressions included) writes through.
    pub fn apply_blend(&mut self, index: ParamIndex, op: BlendOp, value: f32, weight: f32) {
        match op {
            BlendOp::Overwrite => self.set_parameter_value(index, value, weight),
            BlendOp::Additive => self.add_parameter_value(index, value, weight),
            BlendOp::Multiply => self.multiply_parameter_value(index, value, weight),
        }
    }

    pub fn reset_parameters_to_default(&mut self) {
        self.parameters.reset_to_default();
    }

    /// Snapshot real parameter values.
    pub fn save_parameters(&mut self) {
        self.parameters.save();
        debug!("saved {} parameter values", self.parameters.len());
    }

    /// Restore the last snapshot taken by [`Self::save_parameters`].
    pub fn load_parameters(&mut self) {
        self.parameters.load();
        debug!("restored {} parameter values", self.parameters.len());
    }

    // ----- parts -----

    pub fn parts(&self) -> &PartRegistry {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part_index(&mut self, id: &str) -> PartIndex {
        self.parts.index_of(id)
    }

    pub fn part_id(&self, index: PartIndex) -> Option<&str> {
        self.parts.id(index)
    }

    pub fn part_opacity(&self, index: PartIndex) -> f32 {
        self.parts.opacity(index)
    }

    pub fn set_part_opacity(&mut self, index: PartIndex, opacity: f32) {
        self.parts.set_opacity(index, opacity);
    }

    pub fn part_opacity_by_id(&mut self, id: &str) -> f32 {
        let index = self.part_index(id);
        self.part_opacity(index)
    }

    pub fn set_part_opacity_by_id(&mut self, id: &str, opacity: f32) {
        let index = self.part_index(id);
        self.set_part_opacity(index, opacity);
    }

    // ----- drawables & model -----

    pub fn drawables(&self) -> &DrawableOverrides {
        &self.drawables
    }

    pub fn drawables_mut(&mut self) -> &mut DrawableOverrides {
        &mut self.drawables
    }

    pub fn drawable_index(&self, id: &str) -> Option<DrawableIndex> {
        self.drawables.index_of(id)
    }

    pub fn model_opacity(&self) -> f32 {
        self.model_opacity
    }

    pub fn set_model_opacity(&mut self, opacity: f32) {
        self.model_opacity = opacity;
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RigError::LayoutMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ParameterEntry, PartEntry, StaticModel};

    fn layout() -> ModelLayout {
        ModelLayout {
            parameters: vec![ParameterEntry {
                id: "ParamMouthOpenY".into(),
                value: 0.0,
                min: 0.0,
                max: 1.0,
                default: 0.0,
            }],
            parts: vec![PartEntry {
                id: "PartMouth".into(),
                opacity: 1.0,
            }],
            drawables: vec![],
        }
    }

    #[test]
    fn inconsistent_backend_is_rejected() {
        let mut backend = StaticModel::new(layout());
        backend.consistent = false;
        let err = ModelState::from_backend(&backend, &Config::default()).unwrap_err();
        assert!(matches!(err, RigError::InconsistentModel { version: 5 }));
    }

    #[test]
    fn sync_writes_values_and_updates() {
        let mut backend = StaticModel::new(layout());
        let mut state = ModelState::from_backend(&backend, &Config::default()).unwrap();
        assert_eq!(state.moc_version(), 5);
        state.set_parameter_value_by_id("ParamMouthOpenY", 0.7, 1.0);
        state.set_part_opacity_by_id("PartMouth", 0.25);
        state.set_part_opacity_by_id("PartNotInModel", 0.5);
        state.sync_to(&mut backend).unwrap();
        assert_eq!(backend.parameters, vec![0.7]);
        assert_eq!(backend.part_opacities, vec![0.25]);
        assert_eq!(backend.updates, 1);
    }

    #[test]
    fn sync_reports_layout_drift() {
        let mut backend = StaticModel::new(layout());
        let state = ModelState::from_backend(&backend, &Config::default()).unwrap();
        backend.parameters.push(0.0);
        let err = state.sync_to(&mut backend).unwrap_err();
        assert!(matches!(
            err,
            RigError::LayoutMismatch {
                what: "parameter",
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn apply_blend_dispatches() {
        let mut state = ModelState::from_layout(&layout(), &Config::default());
        let i = state.parameter_index("ParamMouthOpenY");
        state.apply_blend(i, BlendOp::Overwrite, 0.4, 1.0);
        state.apply_blend(i, BlendOp::Additive, 0.2, 0.5);
        assert!((state.parameter_value(i) - 0.5).abs() < 1e-6);
        state.apply_blend(i, BlendOp::Multiply, 2.0, 1.0);
        assert_eq!(state.parameter_value(i), 1.0);
    }
}
