//! Identifier-to-slot tables for parameters and parts.
//!
//! Real entries come from the model layout and keep their layout order.
//! Identifiers the model does not know are given shadow slots appended after
//! the last real slot; shadow values are stored unclamped and never fail.

use hashbrown::HashMap;
use log::{debug, warn};

use crate::backend::{ParameterEntry, PartEntry};
use crate::ids::{ParamIndex, PartIndex};

/// Append-only table of synthetic slots for identifiers missing from the model.
#[derive(Clone, Debug, Default)]
pub struct ShadowTable {
    /// First slot handed out; equals the number of real entries.
    base: usize,
    lookup: HashMap<String, usize>,
    ids: Vec<String>,
    values: Vec<f32>,
}

impl ShadowTable {
    pub fn with_capacity(base: usize, capacity: usize) -> Self {
        Self {
            base,
            lookup: HashMap::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Return the slot for `id`, allocating one (value 0) on first sight.
    /// The boolean is true when the slot was created by this call.
    pub fn resolve(&mut self, id: &str) -> (usize, bool) {
        if let Some(slot) = self.lookup.get(id) {
            return (*slot, false);
        }
        let slot = self.base + self.ids.len();
        self.lookup.insert(id.to_string(), slot);
        self.ids.push(id.to_string());
        self.values.push(0.0);
        (slot, true)
    }

    pub fn find(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    #[inline]
    pub fn contains(&self, slot: usize) -> bool {
        slot >= self.base && slot - self.base < self.values.len()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<f32> {
        slot.checked_sub(self.base)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut f32> {
        slot.checked_sub(self.base)
            .and_then(move |i| self.values.get_mut(i))
    }

    pub fn id(&self, slot: usize) -> Option<&str> {
        slot.checked_sub(self.base)
            .and_then(|i| self.ids.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Real identifiers plus their shadow table.
#[derive(Clone, Debug, Default)]
struct SlotTable {
    ids: Vec<String>,
    lookup: HashMap<String, usize>,
    shadow: ShadowTable,
}

impl SlotTable {
    fn new<'a>(ids: impl Iterator<Item = &'a str>, shadow_capacity: usize) -> Self {
        let ids: Vec<String> = ids.map(str::to_string).collect();
        let mut lookup = HashMap::with_capacity(ids.len());
        for (slot, id) in ids.iter().enumerate() {
            // First occurrence wins for duplicated identifiers.
            lookup.entry(id.clone()).or_insert(slot);
        }
        let shadow = ShadowTable::with_capacity(ids.len(), shadow_capacity);
        Self {
            ids,
            lookup,
            shadow,
        }
    }

    fn resolve(&mut self, id: &str, kind: &str) -> usize {
        if let Some(slot) = self.lookup.get(id) {
            return *slot;
        }
        let (slot, created) = self.shadow.resolve(id);
        if created {
            debug!("{kind} '{id}' not present in model; using shadow slot {slot}");
        }
        slot
    }

    fn find(&self, id: &str) -> Option<usize> {
        self.lookup
            .get(id)
            .copied()
            .or_else(|| self.shadow.find(id))
    }

    fn id(&self, slot: usize) -> Option<&str> {
        self.ids
            .get(slot)
            .map(String::as_str)
            .or_else(|| self.shadow.id(slot))
    }

    #[inline]
    fn real_len(&self) -> usize {
        self.ids.len()
    }
}

/// Report an index that is neither a real nor a shadow slot.
/// Panics in debug builds; release builds log and carry on.
#[inline]
fn invalid_slot(kind: &str, slot: usize, real: usize, shadow: usize) {
    debug_assert!(
        false,
        "{kind} slot {slot} out of range ({real} real, {shadow} shadow)"
    );
    warn!("{kind} slot {slot} out of range ({real} real, {shadow} shadow); ignored");
}

/// Live parameter arrays of one model instance.
#[derive(Clone, Debug, Default)]
pub struct ParameterRegistry {
    table: SlotTable,
    values: Vec<f32>,
    minimums: Vec<f32>,
    maximums: Vec<f32>,
    defaults: Vec<f32>,
    saved: Vec<f32>,
}

impl ParameterRegistry {
    pub fn new(entries: &[ParameterEntry], shadow_capacity: usize) -> Self {
        let table = SlotTable::new(entries.iter().map(|e| e.id.as_str()), shadow_capacity);
        let minimums: Vec<f32> = entries.iter().map(|e| e.min).collect();
        let maximums: Vec<f32> = entries.iter().map(|e| e.max).collect();
        let values = entries
            .iter()
            .map(|e| clamp_to(e.value, e.min, e.max))
            .collect();
        Self {
            table,
            values,
            minimums,
            maximums,
            defaults: entries
                .iter()
                .map(|e| clamp_to(e.default, e.min, e.max))
                .collect(),
            saved: Vec::new(),
        }
    }

    /// Number of real parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.real_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.real_len() == 0
    }

    /// Number of shadow slots handed out so far.
    pub fn shadow_len(&self) -> usize {
        self.table.shadow.len()
    }

    /// Resolve `id` to a stable slot, allocating a shadow slot when unknown.
    pub fn index_of(&mut self, id: &str) -> ParamIndex {
        ParamIndex(self.table.resolve(id, "parameter"))
    }

    /// Resolve without allocating.
    pub fn find(&self, id: &str) -> Option<ParamIndex> {
        self.table.find(id).map(ParamIndex)
    }

    pub fn id(&self, index: ParamIndex) -> Option<&str> {
        self.table.id(index.0)
    }

    #[inline]
    pub fn is_shadow(&self, index: ParamIndex) -> bool {
        self.table.shadow.contains(index.0)
    }

    pub fn min(&self, index: ParamIndex) -> Option<f32> {
        self.minimums.get(index.0).copied()
    }

    pub fn max(&self, index: ParamIndex) -> Option<f32> {
        self.maximums.get(index.0).copied()
    }

    pub fn default_value(&self, index: ParamIndex) -> Option<f32> {
        self.defaults.get(index.0).copied()
    }

    /// Real parameter values in layout order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn value(&self, index: ParamIndex) -> f32 {
        if let Some(v) = self.values.get(index.0) {
            return *v;
        }
        if let Some(v) = self.table.shadow.get(index.0) {
            return v;
        }
        invalid_slot("parameter", index.0, self.len(), self.shadow_len());
        0.0
    }

    /// Write `value` with `weight`: 1 replaces, anything else lerps from the
    /// stored value. Real slots are clamped to their range afterwards.
    pub fn set_value(&mut self, index: ParamIndex, value: f32, weight: f32) {
        let slot = index.0;
        if slot < self.values.len() {
            let blended = weighted(self.values[slot], value, weight);
            self.values[slot] = clamp_to(blended, self.minimums[slot], self.maximums[slot]);
            return;
        }
        if let Some(stored) = self.table.shadow.get_mut(slot) {
            *stored = weighted(*stored, value, weight);
            return;
        }
        invalid_slot("parameter", slot, self.len(), self.shadow_len());
    }

    pub fn add_value(&mut self, index: ParamIndex, delta: f32, weight: f32) {
        let current = self.value(index);
        self.set_value(index, current + delta * weight, 1.0);
    }

    pub fn multiply_value(&mut self, index: ParamIndex, factor: f32, weight: f32) {
        let current = self.value(index);
        self.set_value(index, current * (1.0 + (factor - 1.0) * weight), 1.0);
    }

    pub fn reset_to_default(&mut self) {
        self.values.copy_from_slice(&self.defaults);
    }

    /// Snapshot real parameter values. Shadow values are not included.
    pub fn save(&mut self) {
        self.saved.clear();
        self.saved.extend_from_slice(&self.values);
    }

    /// Restore the last snapshot. Without a snapshot this is a no-op.
    pub fn load(&mut self) {
        if self.saved.len() == self.values.len() {
            self.values.copy_from_slice(&self.saved);
        }
    }
}

/// Live part opacities of one model instance.
#[derive(Clone, Debug, Default)]
pub struct PartRegistry {
    table: SlotTable,
    opacities: Vec<f32>,
}

impl PartRegistry {
    pub fn new(entries: &[PartEntry], shadow_capacity: usize) -> Self {
        Self {
            table: SlotTable::new(entries.iter().map(|e| e.id.as_str()), shadow_capacity),
            opacities: entries.iter().map(|e| e.opacity).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.real_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.real_len() == 0
    }

    pub fn shadow_len(&self) -> usize {
        self.table.shadow.len()
    }

    pub fn index_of(&mut self, id: &str) -> PartIndex {
        PartIndex(self.table.resolve(id, "part"))
    }

    pub fn find(&self, id: &str) -> Option<PartIndex> {
        self.table.find(id).map(PartIndex)
    }

    pub fn id(&self, index: PartIndex) -> Option<&str> {
        self.table.id(index.0)
    }

    #[inline]
    pub fn is_shadow(&self, index: PartIndex) -> bool {
        self.table.shadow.contains(index.0)
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }

    pub fn opacity(&self, index: PartIndex) -> f32 {
        if let Some(v) = self.opacities.get(index.0) {
            return *v;
        }
        if let Some(v) = self.table.shadow.get(index.0) {
            return v;
        }
        invalid_slot("part", index.0, self.len(), self.shadow_len());
        0.0
    }

    /// Opacity is stored as given; the 0..1 range is not enforced here.
    pub fn set_opacity(&mut self, index: PartIndex, opacity: f32) {
        if let Some(v) = self.opacities.get_mut(index.0) {
            *v = opacity;
            return;
        }
        if let Some(v) = self.table.shadow.get_mut(index.0) {
            *v = opacity;
            return;
        }
        invalid_slot("part", index.0, self.len(), self.shadow_len());
    }
}

#[inline]
fn weighted(stored: f32, value: f32, weight: f32) -> f32 {
    if weight == 1.0 {
        value
    } else {
        stored * (1.0 - weight) + value * weight
    }
}

#[inline]
fn clamp_to(value: f32, min: f32, max: f32) -> f32 {
    // Malformed ranges (min > max) must not panic like f32::clamp would.
    value.max(min).min(max)
}
