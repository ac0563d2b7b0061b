/// Convenience result type used across the engine.
pub type MorphResult<T> = Result<T, MorphError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MorphError {
    /// A caller broke a precondition: mismatched mesh sizes, resolution below 2, a frame
    /// count that cannot be mapped to a blend factor, and so on.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Persisted mesh text was malformed or did not describe a square grid.
    #[error("mesh format error: {0}")]
    MeshFormat(String),

    /// Rasterizer failures (unknown handles, bad target dimensions, readback).
    #[error("render error: {0}")]
    Render(String),

    /// Frame or animation encoding failures.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing project data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MorphError {
    /// Build a [`MorphError::InvalidConfiguration`] value.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Build a [`MorphError::MeshFormat`] value.
    pub fn mesh_format(msg: impl Into<String>) -> Self {
        Self::MeshFormat(msg.into())
    }

    /// Build a [`MorphError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MorphError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`MorphError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for precondition violations, as opposed to recoverable IO/codec failures.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
