//! Error types for puppet-rig-core.
//!
//! Only load-time and asset-parse failures surface here. Identifiers missing
//! from the model and unknown blend operators are absorbed where they occur.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RigError {
    /// The backend reported its model payload as inconsistent.
    #[error("model payload failed consistency check (moc version {version})")]
    InconsistentModel { version: u32 },

    /// A backend array no longer matches the layout captured at load time.
    #[error("{what} length mismatch: expected {expected}, backend has {actual}")]
    LayoutMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("expression '{name}' parse error: {reason}")]
    ExpressionParse { name: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RigError>;
