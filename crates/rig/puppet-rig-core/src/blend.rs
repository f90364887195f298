//! Per-expression contribution into the shared [`BlendAccumulator`].
//!
//! The expression at position 0 of the active list is the base layer: it
//! replaces every tracked slot outright. Later expressions move each slot
//! toward their own contribution (or toward neutral for parameters they do
//! not reference) by their fade weight.

use crate::accumulate::BlendAccumulator;
use crate::config::FadeCurve;
use crate::expression::BlendOp;
use crate::model::ModelState;
use crate::playback::ExpressionEntry;

/// Contribute `entry` into `acc` at time `now`.
///
/// Starts the entry on its first call. Returns the fade weight used, or
/// `None` when the entry is no longer available; in that case neither the
/// entry nor the accumulator is touched.
pub fn blend_expression(
    entry: &mut ExpressionEntry,
    model: &ModelState,
    now: f32,
    curve: FadeCurve,
    acc: &mut BlendAccumulator,
    expression_index: usize,
) -> Option<f32> {
    if !entry.is_available() {
        return None;
    }
    if !entry.is_started() {
        entry.start(now);
    }
    let weight = entry.update_fade_weight(curve, now);
    let base_layer = expression_index == 0;

    for slot in acc.entries_mut() {
        let current = model.parameter_value(slot.index);
        let target = match entry.binding(slot.index) {
            Some(b) => b.blend.channels(b.value, current),
            None => (BlendOp::NEUTRAL_ADDITIVE, BlendOp::NEUTRAL_MULTIPLY, current),
        };
        if base_layer {
            slot.set(target);
        } else {
            slot.blend_toward(target, weight);
        }
    }
    Some(weight)
}
