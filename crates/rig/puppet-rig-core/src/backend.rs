//! Contract with the deformation engine that owns the model payload.
//!
//! The engine hands over its parameter/part/drawable arrays once at load via
//! [`ModelLayout`] and receives the blended values back before every
//! deformation step. Hosts implement [`ModelBackend`]; [`StaticModel`] is an
//! in-memory implementation used for headless runs and tests.

use serde::{Deserialize, Serialize};

/// RGBA color, components nominally in 0..1.
pub type Rgba = [f32; 4];

pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];

fn default_max() -> f32 {
    1.0
}

fn default_opacity() -> f32 {
    1.0
}

fn default_multiply() -> Rgba {
    WHITE
}

fn default_screen() -> Rgba {
    BLACK
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub id: String,
    #[serde(default)]
    pub value: f32,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "default_max")]
    pub max: f32,
    #[serde(default)]
    pub default: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartEntry {
    pub id: String,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawableEntry {
    pub id: String,
    #[serde(default = "default_multiply")]
    pub multiply_color: Rgba,
    #[serde(default = "default_screen")]
    pub screen_color: Rgba,
    #[serde(default)]
    pub culling: bool,
}

/// Authoritative arrays of a loaded model, in engine order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelLayout {
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    #[serde(default)]
    pub parts: Vec<PartEntry>,
    #[serde(default)]
    pub drawables: Vec<DrawableEntry>,
}

/// Effective per-drawable render state written back to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawableState {
    pub multiply_color: Rgba,
    pub screen_color: Rgba,
    pub culling: bool,
}

/// Deformation engine seen from the parameter core.
pub trait ModelBackend {
    /// Arrays captured once when a [`crate::ModelState`] is built.
    fn layout(&self) -> ModelLayout;

    /// Opaque consistency verdict on the loaded payload.
    fn is_consistent(&self) -> bool {
        true
    }

    /// Opaque payload version; 0 means unknown.
    fn moc_version(&self) -> u32 {
        0
    }

    fn parameter_count(&self) -> usize;
    fn part_count(&self) -> usize;
    fn drawable_count(&self) -> usize;

    fn write_parameters(&mut self, values: &[f32]);
    fn write_part_opacities(&mut self, opacities: &[f32]);
    fn write_drawables(&mut self, drawables: &[DrawableState]);

    /// Run one deformation step with the values written so far.
    fn update(&mut self);
}

/// In-memory backend built from a [`ModelLayout`]. Records what it receives.
#[derive(Clone, Debug, Default)]
pub struct StaticModel {
    pub layout: ModelLayout,
    pub consistent: bool,
    pub version: u32,
    pub parameters: Vec<f32>,
    pub part_opacities: Vec<f32>,
    pub drawables: Vec<DrawableState>,
    pub updates: u64,
}

impl StaticModel {
    pub fn new(layout: ModelLayout) -> Self {
        let parameters = layout.parameters.iter().map(|p| p.value).collect();
        let part_opacities = layout.parts.iter().map(|p| p.opacity).collect();
        let drawables = layout
            .drawables
            .iter()
            .map(|d| DrawableState {
                multiply_color: d.multiply_color,
                screen_color: d.screen_color,
                culling: d.culling,
            })
            .collect();
        Self {
            layout,
            consistent: true,
            version: 5,
            parameters,
            part_opacities,
            drawables,
            updates: 0,
        }
    }

    pub fn from_json(s: &str) -> crate::Result<Self> {
        let layout: ModelLayout = serde_json::from_str(s)?;
        Ok(Self::new(layout))
    }
}

impl ModelBackend for StaticModel {
    fn layout(&self) -> ModelLayout {
        self.layout.clone()
    }

    fn is_consistent(&self) -> bool {
        self.consistent
    }

    fn moc_version(&self) -> u32 {
        self.version
    }

    fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    fn part_count(&self) -> usize {
        self.part_opacities.len()
    }

    fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    fn write_parameters(&mut self, values: &[f32]) {
        self.parameters.copy_from_slice(values);
    }

    fn write_part_opacities(&mut self, opacities: &[f32]) {
        self.part_opacities.copy_from_slice(opacities);
    }

    fn write_drawables(&mut self, drawables: &[DrawableState]) {
        self.drawables.copy_from_slice(drawables);
    }

    fn update(&mut self) {
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_json_applies_defaults() {
        let model = StaticModel::from_json(
            r#"{
                "parameters": [{ "id": "ParamAngleX", "min": -30, "max": 30 }],
                "parts": [{ "id": "PartFace" }],
                "drawables": [{ "id": "ArtMesh0" }]
            }"#,
        )
        .unwrap();
        let p = &model.layout.parameters[0];
        assert_eq!((p.min, p.max, p.value, p.default), (-30.0, 30.0, 0.0, 0.0));
        assert_eq!(model.part_opacities, vec![1.0]);
        assert_eq!(model.drawables[0].multiply_color, WHITE);
        assert_eq!(model.drawables[0].screen_color, BLACK);
        assert!(model.is_consistent());
    }
}
