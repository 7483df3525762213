use std::fmt;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::AnimResult;

/// A trait value as supplied by the metadata provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    /// Textual value, e.g. `"Light Skin - Light"`.
    Text(String),
    /// Numeric value, e.g. a generation number.
    Number(f64),
}

impl TraitValue {
    /// The value as text. Whole numbers render without a fractional part.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TraitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for TraitValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// One `{ trait_type, value }` entry from token metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitAttribute {
    /// Trait category name as spelled upstream.
    #[serde(alias = "traitType")]
    pub trait_type: String,
    /// Trait value.
    pub value: TraitValue,
}

impl TraitAttribute {
    /// Convenience constructor for textual values.
    pub fn text(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: TraitValue::Text(value.into()),
        }
    }
}

/// Immutable metadata of the selected token.
///
/// Deserializes from either a bare `{ "attributes": [...] }` document or the provider envelope
/// `{ "name", "tokenId", "raw": { "metadata": { "attributes": [...] } } }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TokenMetadata {
    /// Display name of the token, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Token id, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    /// Trait attributes in provider order.
    pub attributes: Vec<TraitAttribute>,
}

impl TokenMetadata {
    /// Metadata with only attributes.
    pub fn from_attributes(attributes: Vec<TraitAttribute>) -> Self {
        Self {
            name: None,
            token_id: None,
            attributes,
        }
    }

    /// Parse metadata JSON from a string.
    pub fn from_json_str(s: &str) -> AnimResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a metadata JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> AnimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read token metadata '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}

impl<'de> Deserialize<'de> for TokenMetadata {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Attributes {
            #[serde(default)]
            attributes: Vec<TraitAttribute>,
        }

        #[derive(Deserialize)]
        struct Raw {
            metadata: Attributes,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Envelope {
                #[serde(default)]
                name: Option<String>,
                #[serde(default, alias = "tokenId")]
                token_id: Option<String>,
                raw: Raw,
            },
            Bare {
                #[serde(default)]
                name: Option<String>,
                #[serde(default, alias = "tokenId")]
                token_id: Option<String>,
                attributes: Vec<TraitAttribute>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Envelope {
                name,
                token_id,
                raw,
            } => Self {
                name,
                token_id,
                attributes: raw.metadata.attributes,
            },
            Repr::Bare {
                name,
                token_id,
                attributes,
            } => Self {
                name,
                token_id,
                attributes,
            },
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/traits/metadata.rs"]
mod tests;
