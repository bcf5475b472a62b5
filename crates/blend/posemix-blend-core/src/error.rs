//! Error taxonomy. Everything here is recoverable: a failed binding yields a
//! disabled blender, a rejected asset leaves the active one untouched.

use thiserror::Error;

/// Rig binding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RigError {
    #[error("skeleton has no bones")]
    EmptySkeleton,
    #[error("bone '{bone}' references a parent at or after its own index")]
    BadParentOrder { bone: String },
}

/// Blend asset (authoring data) errors.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("bone '{bone}' appears in more than one layered blend chain")]
    OverlappingChains { bone: String },
    #[error("blend asset JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
