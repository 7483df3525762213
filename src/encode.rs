//! Video encoding sinks for recorded frames.

pub mod ffmpeg;
pub mod sink;
