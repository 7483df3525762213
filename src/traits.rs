//! Token trait metadata and its resolution into an ordered stack of image layers.

pub mod dictionary;
pub mod layer_key;
pub mod metadata;
pub mod names;
pub mod resolver;
