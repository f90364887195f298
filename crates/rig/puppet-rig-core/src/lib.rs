//! Puppet Rig Core (engine-agnostic)
//!
//! Parameter state and expression blending for rigged 2D puppets. This crate
//! maps parameter/part identifiers to dense slots (with shadow slots for
//! identifiers the loaded model lacks), holds the live values the deformation
//! engine consumes, and composes concurrently active expressions into one
//! additive/multiplicative/overwrite contribution per parameter each frame.
//!
//! Frame flow: [`ExpressionManager::update`] resets the [`BlendAccumulator`],
//! folds every active entry through [`blend_expression`] in order, then
//! applies the result to the [`ModelState`], which is finally pushed to a
//! [`ModelBackend`] via [`ModelState::sync_to`].

pub mod accumulate;
pub mod backend;
pub mod blend;
pub mod config;
pub mod drawables;
pub mod error;
pub mod expression;
pub mod ids;
pub mod manager;
pub mod model;
pub mod outputs;
pub mod playback;
pub mod registry;

// Re-exports for consumers (hosts/adapters)
pub use accumulate::{BlendAccumulator, ChannelValues};
pub use backend::{
    DrawableEntry, DrawableState, ModelBackend, ModelLayout, ParameterEntry, PartEntry, Rgba,
    StaticModel,
};
pub use blend::blend_expression;
pub use config::{Config, FadeCurve};
pub use drawables::DrawableOverrides;
pub use error::{Result, RigError};
pub use expression::{parse_expression_json, BlendOp, ExpressionAsset, ExpressionParameter};
pub use ids::{DrawableIndex, EntryId, IdAllocator, ParamIndex, PartIndex};
pub use manager::ExpressionManager;
pub use model::ModelState;
pub use outputs::{ExpressionEvent, Outputs};
pub use playback::{fade_weight, Binding, ExpressionEntry, PlaybackState};
pub use registry::{ParameterRegistry, PartRegistry, ShadowTable};
