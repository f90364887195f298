//! Per-parameter blend accumulator shared by all active expressions.
//!
//! Each tracked slot carries three channels. The frame contract is:
//! `reset` once, let every active expression contribute in a fixed order,
//! then `apply` once (overwrite, then additive, then multiply).

use crate::expression::BlendOp;
use crate::ids::ParamIndex;
use crate::model::ModelState;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChannelValues {
    pub index: ParamIndex,
    pub additive: f32,
    pub multiply: f32,
    pub overwrite: f32,
}

impl ChannelValues {
    /// Neutral channels for a parameter whose current value is `current`.
    #[inline]
    pub fn neutral(index: ParamIndex, current: f32) -> Self {
        Self {
            index,
            additive: BlendOp::NEUTRAL_ADDITIVE,
            multiply: BlendOp::NEUTRAL_MULTIPLY,
            overwrite: current,
        }
    }

    /// Replace all channels outright.
    #[inline]
    pub fn set(&mut self, (additive, multiply, overwrite): (f32, f32, f32)) {
        self.additive = additive;
        self.multiply = multiply;
        self.overwrite = overwrite;
    }

    /// Move each channel toward the target by `weight`.
    #[inline]
    pub fn blend_toward(&mut self, (additive, multiply, overwrite): (f32, f32, f32), weight: f32) {
        self.additive = lerp(self.additive, additive, weight);
        self.multiply = lerp(self.multiply, multiply, weight);
        self.overwrite = lerp(self.overwrite, overwrite, weight);
    }
}

/// `a*(1-w) + b*w`; exact at both ends.
#[inline]
pub(crate) fn lerp(a: f32, b: f32, w: f32) -> f32 {
    if w == 0.0 {
        a
    } else if w == 1.0 {
        b
    } else {
        a * (1.0 - w) + b * w
    }
}

/// Ordered set of tracked parameter slots. Order is insertion order and is
/// the same for every expression in a composition pass.
#[derive(Clone, Debug, Default)]
pub struct BlendAccumulator {
    entries: Vec<ChannelValues>,
}

impl BlendAccumulator {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Start tracking `index`. Returns false if it was already tracked.
    pub fn track(&mut self, index: ParamIndex, current: f32) -> bool {
        if self.contains(index) {
            return false;
        }
        self.entries.push(ChannelValues::neutral(index, current));
        true
    }

    pub fn contains(&self, index: ParamIndex) -> bool {
        self.entries.iter().any(|e| e.index == index)
    }

    /// Drop slots for which `keep` returns false, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(ParamIndex) -> bool) {
        self.entries.retain(|e| keep(e.index));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChannelValues] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [ChannelValues] {
        &mut self.entries
    }

    pub fn get(&self, index: ParamIndex) -> Option<&ChannelValues> {
        self.entries.iter().find(|e| e.index == index)
    }

    /// Reset every slot to neutral against the model's current values.
    pub fn reset(&mut self, model: &ModelState) {
        for e in &mut self.entries {
            *e = ChannelValues::neutral(e.index, model.parameter_value(e.index));
        }
    }

    /// Write the composed channels into the model: overwrite, then additive,
    /// then multiply, each at full weight.
    pub fn apply(&self, model: &mut ModelState) {
        for e in &self.entries {
            model.apply_blend(e.index, BlendOp::Overwrite, e.overwrite, 1.0);
            model.apply_blend(e.index, BlendOp::Additive, e.additive, 1.0);
            model.apply_blend(e.index, BlendOp::Multiply, e.multiply, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ModelLayout, ParameterEntry};
    use crate::config::Config;

    fn model() -> ModelState {
        let layout = ModelLayout {
            parameters: vec![ParameterEntry {
                id: "ParamA".into(),
                value: 0.25,
                min: -10.0,
                max: 10.0,
                default: 0.0,
            }],
            ..ModelLayout::default()
        };
        ModelState::from_layout(&layout, &Config::default())
    }

    #[test]
    fn track_is_idempotent() {
        let mut acc = BlendAccumulator::new();
        assert!(acc.track(ParamIndex(0), 0.0));
        assert!(!acc.track(ParamIndex(0), 5.0));
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.entries()[0].overwrite, 0.0);
    }

    #[test]
    fn reset_reads_current_value() {
        let m = model();
        let mut acc = BlendAccumulator::new();
        acc.track(ParamIndex(0), 0.0);
        acc.entries_mut()[0].set((3.0, 2.0, 1.0));
        acc.reset(&m);
        assert_eq!(acc.entries()[0], ChannelValues::neutral(ParamIndex(0), 0.25));
    }

    #[test]
    fn apply_order_is_overwrite_add_multiply() {
        let mut m = model();
        let mut acc = BlendAccumulator::new();
        acc.track(ParamIndex(0), 0.0);
        acc.entries_mut()[0].set((1.0, 3.0, 2.0));
        acc.apply(&mut m);
        assert_eq!(m.parameter_value(ParamIndex(0)), 9.0);
    }

    #[test]
    fn apply_clamps_after_each_step() {
        let mut m = model();
        let mut acc = BlendAccumulator::new();
        acc.track(ParamIndex(0), 0.0);
        // Overwrite saturates at the max before the additive step runs.
        acc.entries_mut()[0].set((-5.0, 1.0, 20.0));
        acc.apply(&mut m);
        assert_eq!(m.parameter_value(ParamIndex(0)), 5.0);
    }

    #[test]
    fn neutral_apply_is_noop() {
        let mut m = model();
        let mut acc = BlendAccumulator::new();
        acc.track(ParamIndex(0), 0.0);
        acc.reset(&m);
        acc.apply(&mut m);
        assert_eq!(m.parameter_value(ParamIndex(0)), 0.25);
    }

    #[test]
    fn lerp_exact_at_ends() {
        assert_eq!(lerp(0.1, 0.7, 0.0), 0.1);
        assert_eq!(lerp(0.1, 0.7, 1.0), 0.7);
    }
}
