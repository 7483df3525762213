//! Asset loading: image decode into premultiplied pixels, per-stack image handles and bubble text
//! layout.

pub mod decode;
pub mod store;
