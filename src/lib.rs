//! nft-anim composites layered avatar images, animates them and exports clips.
//!
//! The pipeline runs in one direction:
//!
//! - Resolve a token's [`TokenMetadata`] into an ordered [`LayerStack`] with [`TraitResolver`]
//! - Paint the stack every frame with a [`RenderSession`], waving the left arm
//! - Type the speech bubble with a [`BubbleTicker`] and place it with a [`BubbleOverlay`]
//! - Capture frames plus a redrawn bubble into a [`FrameSink`] with the [`Recorder`]
//!
//! [`Studio`] drives all of it cooperatively from one [`FrameClock`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

pub mod animation;
pub mod assets;
/// Studio configuration.
pub mod config;
/// Single writer of the shared animation settings.
pub mod controls;
pub mod encode;
pub mod overlay;
/// Clip recording.
pub mod record;
pub mod render;
/// Cooperative driver for the compositor, bubble and recorder.
pub mod session;
pub mod settings;
pub mod traits;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Size, Vec2,
};
pub use crate::foundation::error::{AnimError, AnimResult};

pub use crate::animation::bubble::{BubblePhase, BubbleScript, BubbleState, BubbleTicker};
pub use crate::animation::wave::{wave_angle, wave_transform};
pub use crate::config::StudioConfig;
pub use crate::controls::{Controls, RecordButton};
pub use crate::encode::ffmpeg::{Container, EncoderSettings, FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::overlay::{BubbleOverlay, BubbleStyle};
pub use crate::record::{RecordTick, Recorder, RecorderState, RecordingSummary};
pub use crate::render::bubble_paint::BubblePainter;
pub use crate::render::compositor::RenderSession;
pub use crate::render::frame_loop::{FrameClock, FrameLoop, SteppedClock, WallClock};
pub use crate::render::surface::FrameRGBA;
pub use crate::session::{StepOutcome, Studio};
pub use crate::settings::color::CssColor;
pub use crate::settings::shared::{AnimationSettings, SharedSettings};
pub use crate::traits::dictionary::{
    DictionarySource, DirDictionarySource, InMemoryDictionarySource, TraitDictionaries,
};
pub use crate::traits::layer_key::{LayerKey, LayerOrderTable};
pub use crate::traits::metadata::{TokenMetadata, TraitAttribute};
pub use crate::traits::resolver::{LayerStack, ResolvedLayer, TraitResolver};
