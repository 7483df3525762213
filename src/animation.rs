//! Time-driven animation: the procedural arm wave and the typewriter bubble.

pub mod bubble;
pub mod wave;
