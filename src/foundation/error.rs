/// Convenience result type used across the crate.
pub type AnimResult<T> = Result<T, AnimError>;

/// Top-level error taxonomy.
///
/// Trait lookups that miss (a value with no dictionary entry, an absent category) are not errors:
/// they are logged and the layer is skipped. Only the variants below ever cross an API boundary.
#[derive(thiserror::Error, Debug)]
pub enum AnimError {
    /// Invalid user-provided, configuration or metadata values.
    #[error("validation error: {0}")]
    Validation(String),

    /// The token has no resolvable skin tone, so no base figure can be built.
    #[error("missing base trait: {0}")]
    MissingBaseTrait(String),

    /// An image asset could not be read or decoded.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// The video encoder could not be started, fed or finalized.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// A recording session is already in flight.
    #[error("a recording session is already active")]
    RecordingBusy,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnimError {
    /// Build an [`AnimError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`AnimError::MissingBaseTrait`] value.
    pub fn missing_base_trait(msg: impl Into<String>) -> Self {
        Self::MissingBaseTrait(msg.into())
    }

    /// Build an [`AnimError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build an [`AnimError::Encoder`] value.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Build an [`AnimError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for AnimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
