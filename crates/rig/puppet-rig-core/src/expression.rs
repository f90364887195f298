//! Expression assets: named lists of (parameter, operator, value) plus fade times.
//!
//! JSON shape (extra keys are ignored):
//!
//! ```json
//! { "FadeInTime": 0.5, "FadeOutTime": 0.5,
//!   "Parameters": [ { "Id": "ParamEyeLOpen", "Value": 0.0, "Blend": "Multiply" } ] }
//! ```

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, RigError};

/// How a declared value combines with the current parameter value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendOp {
    #[default]
    #[serde(rename = "Add")]
    Additive,
    Multiply,
    Overwrite,
}

impl BlendOp {
    /// Parse an authored tag. Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Add" => Some(BlendOp::Additive),
            "Multiply" => Some(BlendOp::Multiply),
            "Overwrite" => Some(BlendOp::Overwrite),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            BlendOp::Additive => "Add",
            BlendOp::Multiply => "Multiply",
            BlendOp::Overwrite => "Overwrite",
        }
    }

    /// Neutral channel values `(additive, multiply)`; the overwrite neutral is
    /// the parameter's current value.
    pub const NEUTRAL_ADDITIVE: f32 = 0.0;
    pub const NEUTRAL_MULTIPLY: f32 = 1.0;

    /// Split a declared value into `(additive, multiply, overwrite)` channels.
    #[inline]
    pub fn channels(self, value: f32, current: f32) -> (f32, f32, f32) {
        match self {
            BlendOp::Additive => (value, Self::NEUTRAL_MULTIPLY, current),
            BlendOp::Multiply => (Self::NEUTRAL_ADDITIVE, value, current),
            BlendOp::Overwrite => (Self::NEUTRAL_ADDITIVE, Self::NEUTRAL_MULTIPLY, value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionParameter {
    pub id: String,
    pub blend: BlendOp,
    pub value: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionAsset {
    pub name: String,
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    /// Playback length; `<= 0` loops until stopped.
    pub duration_seconds: f32,
    pub parameters: Vec<ExpressionParameter>,
}

impl ExpressionAsset {
    pub fn new(name: impl Into<String>, cfg: &Config) -> Self {
        Self {
            name: name.into(),
            fade_in_seconds: cfg.default_fade_in_seconds,
            fade_out_seconds: cfg.default_fade_out_seconds,
            duration_seconds: -1.0,
            parameters: Vec::new(),
        }
    }

    pub fn with_fade_in(mut self, seconds: f32) -> Self {
        self.fade_in_seconds = seconds;
        self
    }

    pub fn with_fade_out(mut self, seconds: f32) -> Self {
        self.fade_out_seconds = seconds;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_parameter(mut self, id: impl Into<String>, blend: BlendOp, value: f32) -> Self {
        self.parameters.push(ExpressionParameter {
            id: id.into(),
            blend,
            value,
        });
        self
    }

    #[inline]
    pub fn loops(&self) -> bool {
        self.duration_seconds <= 0.0
    }
}

/// Parse an expression asset. Missing or negative fade times fall back to
/// the config defaults; unknown `Blend` tags are read as `Add`.
pub fn parse_expression_json(name: &str, s: &str, cfg: &Config) -> Result<ExpressionAsset> {
    let raw: RawExpression = serde_json::from_str(s).map_err(|e| RigError::ExpressionParse {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let parameters = raw
        .parameters
        .into_iter()
        .map(|p| {
            let blend = match p.blend.as_deref() {
                None => BlendOp::Additive,
                Some(tag) => BlendOp::from_tag(tag).unwrap_or_else(|| {
                    warn!(
                        "expression '{name}': unknown blend '{tag}' for '{}', using Add",
                        p.id
                    );
                    BlendOp::Additive
                }),
            };
            ExpressionParameter {
                id: p.id,
                blend,
                value: p.value.unwrap_or(0.0) as f32,
            }
        })
        .collect();

    Ok(ExpressionAsset {
        name: name.to_string(),
        fade_in_seconds: non_negative_or(raw.fade_in_time, cfg.default_fade_in_seconds),
        fade_out_seconds: non_negative_or(raw.fade_out_time, cfg.default_fade_out_seconds),
        duration_seconds: -1.0,
        parameters,
    })
}

fn non_negative_or(v: Option<f64>, fallback: f32) -> f32 {
    match v {
        Some(x) if x >= 0.0 => x as f32,
        _ => fallback,
    }
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawExpression {
    #[serde(rename = "FadeInTime", default)]
    fade_in_time: Option<f64>,
    #[serde(rename = "FadeOutTime", default)]
    fade_out_time: Option<f64>,
    #[serde(rename = "Parameters", default)]
    parameters: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Value", default)]
    value: Option<f64>,
    #[serde(rename = "Blend", default)]
    blend: Option<String>,
}
