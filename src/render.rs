//! Raster output: the drawing surface, frame scheduling, the layer compositor and the bubble
//! painter.

pub mod bubble_paint;
pub mod compositor;
pub mod frame_loop;
pub mod surface;
