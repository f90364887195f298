//! Per-drawable color and culling overrides.
//!
//! The engine supplies base multiply/screen colors and culling flags at load.
//! Callers may override each per drawable or model-wide; the model-wide flag
//! takes precedence when set.

use hashbrown::HashMap;
use log::warn;

use crate::backend::{DrawableEntry, DrawableState, Rgba};
use crate::ids::DrawableIndex;

/// A value the engine provides plus a caller override and its flag.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Overridable<T: Copy> {
    base: T,
    user: T,
    overridden: bool,
}

impl<T: Copy> Overridable<T> {
    fn new(base: T) -> Self {
        Self {
            base,
            user: base,
            overridden: false,
        }
    }

    #[inline]
    fn effective(&self, model_wide: bool) -> T {
        if model_wide || self.overridden {
            self.user
        } else {
            self.base
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct DrawableSlot {
    multiply: Overridable<Rgba>,
    screen: Overridable<Rgba>,
    culling: Overridable<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct DrawableOverrides {
    ids: Vec<String>,
    lookup: HashMap<String, usize>,
    slots: Vec<DrawableSlot>,
    model_multiply: bool,
    model_screen: bool,
    model_culling: bool,
}

impl DrawableOverrides {
    pub fn new(entries: &[DrawableEntry]) -> Self {
        let mut lookup = HashMap::with_capacity(entries.len());
        for (slot, e) in entries.iter().enumerate() {
            lookup.entry(e.id.clone()).or_insert(slot);
        }
        Self {
            ids: entries.iter().map(|e| e.id.clone()).collect(),
            lookup,
            slots: entries
                .iter()
                .map(|e| DrawableSlot {
                    multiply: Overridable::new(e.multiply_color),
                    screen: Overridable::new(e.screen_color),
                    culling: Overridable::new(e.culling),
                })
                .collect(),
            model_multiply: false,
            model_screen: false,
            model_culling: false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Unknown identifiers resolve to `None`.
    pub fn index_of(&self, id: &str) -> Option<DrawableIndex> {
        self.lookup.get(id).copied().map(DrawableIndex)
    }

    pub fn id(&self, index: DrawableIndex) -> Option<&str> {
        self.ids.get(index.0).map(String::as_str)
    }

    fn slot(&self, index: DrawableIndex) -> Option<&DrawableSlot> {
        let slot = self.slots.get(index.0);
        if slot.is_none() {
            debug_assert!(false, "drawable slot {} out of range ({})", index.0, self.len());
            warn!("drawable slot {} out of range ({}); ignored", index.0, self.len());
        }
        slot
    }

    fn slot_mut(&mut self, index: DrawableIndex) -> Option<&mut DrawableSlot> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(index.0);
        if slot.is_none() {
            debug_assert!(false, "drawable slot {} out of range ({len})", index.0);
            warn!("drawable slot {} out of range ({len}); ignored", index.0);
        }
        slot
    }

    // --- model-wide flags ---

    pub fn model_multiply_override(&self) -> bool {
        self.model_multiply
    }

    pub fn set_model_multiply_override(&mut self, value: bool) {
        self.model_multiply = value;
    }

    pub fn model_screen_override(&self) -> bool {
        self.model_screen
    }

    pub fn set_model_screen_override(&mut self, value: bool) {
        self.model_screen = value;
    }

    pub fn model_culling_override(&self) -> bool {
        self.model_culling
    }

    pub fn set_model_culling_override(&mut self, value: bool) {
        self.model_culling = value;
    }

    // --- per-drawable flags ---

    pub fn multiply_override(&self, index: DrawableIndex) -> bool {
        self.slot(index).is_some_and(|s| s.multiply.overridden)
    }

    pub fn set_multiply_override(&mut self, index: DrawableIndex, value: bool) {
        if let Some(s) = self.slot_mut(index) {
            s.multiply.overridden = value;
        }
    }

    pub fn screen_override(&self, index: DrawableIndex) -> bool {
        self.slot(index).is_some_and(|s| s.screen.overridden)
    }

    pub fn set_screen_override(&mut self, index: DrawableIndex, value: bool) {
        if let Some(s) = self.slot_mut(index) {
            s.screen.overridden = value;
        }
    }

    pub fn culling_override(&self, index: DrawableIndex) -> bool {
        self.slot(index).is_some_and(|s| s.culling.overridden)
    }

    pub fn set_culling_override(&mut self, index: DrawableIndex, value: bool) {
        if let Some(s) = self.slot_mut(index) {
            s.culling.overridden = value;
        }
    }

    // --- values ---

    /// Store a caller multiply color. It only takes effect while overridden.
    pub fn set_multiply_color(&mut self, index: DrawableIndex, color: Rgba) {
        if let Some(s) = self.slot_mut(index) {
            s.multiply.user = color;
        }
    }

    pub fn set_screen_color(&mut self, index: DrawableIndex, color: Rgba) {
        if let Some(s) = self.slot_mut(index) {
            s.screen.user = color;
        }
    }

    pub fn set_culling(&mut self, index: DrawableIndex, culling: bool) {
        if let Some(s) = self.slot_mut(index) {
            s.culling.user = culling;
        }
    }

    /// Refresh the engine-side colors, e.g. after a deformation step.
    pub fn set_base_colors(&mut self, index: DrawableIndex, multiply: Rgba, screen: Rgba) {
        if let Some(s) = self.slot_mut(index) {
            s.multiply.base = multiply;
            s.screen.base = screen;
        }
    }

    pub fn multiply_color(&self, index: DrawableIndex) -> Rgba {
        self.slot(index)
            .map_or(crate::backend::WHITE, |s| s.multiply.effective(self.model_multiply))
    }

    pub fn screen_color(&self, index: DrawableIndex) -> Rgba {
        self.slot(index)
            .map_or(crate::backend::BLACK, |s| s.screen.effective(self.model_screen))
    }

    pub fn culling(&self, index: DrawableIndex) -> bool {
        self.slot(index)
            .is_some_and(|s| s.culling.effective(self.model_culling))
    }

    /// Effective state of every drawable, in layout order.
    pub fn states(&self) -> Vec<DrawableState> {
        self.slots
            .iter()
            .map(|s| DrawableState {
                multiply_color: s.multiply.effective(self.model_multiply),
                screen_color: s.screen.effective(self.model_screen),
                culling: s.culling.effective(self.model_culling),
            })
            .collect()
    }
}
