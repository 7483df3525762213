//! User-adjustable animation settings shared by the compositor and the recorder.

pub mod color;
pub mod shared;
