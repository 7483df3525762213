use std::path::Path;
use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::encode::sink::{InMemorySink, SinkConfig};
use crate::foundation::core::{FrameIndex, Point};
use crate::render::frame_loop::SteppedClock;
use crate::settings::color::CssColor;
use crate::settings::shared::AnimationSettings;
use crate::traits::dictionary::InMemoryDictionarySource;
use crate::traits::metadata::TraitAttribute;

const PARTS: [(&str, [u8; 4]); 7] = [
    ("body", [10, 10, 10, 255]),
    ("arm-left", [0, 200, 0, 255]),
    ("arm-right", [20, 20, 20, 255]),
    ("ear-left", [30, 30, 30, 255]),
    ("ear-right", [40, 40, 40, 255]),
    ("head", [50, 50, 50, 255]),
    ("face", [60, 60, 60, 255]),
];

fn assets(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nft_anim_studio_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(dir.join("skin")).unwrap();
    for (name, rgba) in PARTS {
        image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba))
            .save(dir.join("skin").join(format!("{name}.png")))
            .unwrap();
    }
    dir
}

fn dictionaries() -> TraitDictionaries {
    let parts: serde_json::Map<String, serde_json::Value> = PARTS
        .iter()
        .map(|(name, _)| ((*name).to_owned(), json!(format!("skin/{name}.png"))))
        .collect();
    TraitDictionaries::load(&InMemoryDictionarySource::new().with("skin", json!({ "light": parts })))
}

fn studio(root: &Path, text: &str, looping: bool) -> Studio<SteppedClock> {
    let config = StudioConfig {
        canvas_size: 200,
        fps: 10,
        assets_root: root.to_path_buf(),
        output_dir: root.join("out"),
        system_fonts: false,
        settings: AnimationSettings {
            bubble_text: text.to_owned(),
            is_typing_loop: looping,
            typing_duration_secs: 0.5,
            background_color: CssColor::BLACK,
        },
        ..StudioConfig::default()
    };
    Studio::with_dictionaries(config, dictionaries(), SteppedClock::new()).unwrap()
}

fn light() -> TokenMetadata {
    TokenMetadata::from_attributes(vec![TraitAttribute::text("Skin", "Light Skin - Light")])
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<InMemorySink>>);

impl FrameSink for SharedSink {
    fn begin(&mut self, cfg: SinkConfig) -> AnimResult<()> {
        self.0.lock().unwrap().begin(cfg)
    }
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> AnimResult<()> {
        self.0.lock().unwrap().push_frame(idx, frame)
    }
    fn end(&mut self) -> AnimResult<()> {
        self.0.lock().unwrap().end()
    }
    fn abort(&mut self) {
        self.0.lock().unwrap().abort()
    }
}

struct BrokenPipe;

impl FrameSink for BrokenPipe {
    fn begin(&mut self, _cfg: SinkConfig) -> AnimResult<()> {
        Ok(())
    }
    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> AnimResult<()> {
        Err(AnimError::encoder("broken pipe"))
    }
    fn end(&mut self) -> AnimResult<()> {
        Ok(())
    }
    fn abort(&mut self) {}
}

#[test]
fn loaded_token_is_painted_by_the_loop() {
    let root = assets("paint");
    let mut s = studio(&root, "Hi", false);
    let stack = s.load_token(&light()).unwrap();
    assert_eq!(stack.len(), 7);

    s.start();
    let out = s.step().unwrap();
    let frame = out.frame.expect("first frame is due at start");
    // Arm-left is the top layer and, at t = 0, unrotated.
    assert_eq!(frame.pixel(0, 0), [0, 200, 0, 255]);
    assert_eq!(out.recording, RecordTick::Idle);
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn unresolvable_token_clears_the_stack() {
    let root = assets("missing");
    let mut s = studio(&root, "Hi", false);
    s.load_token(&light()).unwrap();
    let err = s
        .load_token(&TokenMetadata::from_attributes(vec![TraitAttribute::text(
            "Skin",
            "Alien Skin - Green",
        )]))
        .unwrap_err();
    assert!(matches!(err, AnimError::MissingBaseTrait(_)));
    assert!(s.compositor().layers().is_empty());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn interactive_bubble_types_and_follows_settings() {
    let root = assets("bubble");
    let mut s = studio(&root, "Hi", false);
    s.start();
    s.step().unwrap();
    assert_eq!(s.bubble_text(), "");

    while s.bubble_text() != "Hi" {
        s.wait_and_step().unwrap();
    }
    assert_eq!(s.clock().now(), Duration::from_millis(500));

    s.controls().set_bubble_text("Yo!");
    let out = s.step().unwrap();
    assert!(out.bubble_changed);
    assert_eq!(s.bubble_text(), "");
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn record_with_runs_for_the_duration_policy() {
    let root = assets("record");
    let mut s = studio(&root, "Hi", true);
    s.load_token(&light()).unwrap();
    let sink = SharedSink::default();

    let summary = s.record_with(Box::new(sink.clone()), None).unwrap();
    assert_eq!(summary.frames, 11);
    assert_eq!(summary.duration, Duration::from_secs(1));
    assert_eq!(s.clock().now(), Duration::from_secs(1));
    assert_eq!(s.recorder_state(), RecorderState::Idle);
    assert!(s.record_button().enabled);

    let inner = sink.0.lock().unwrap();
    assert!(inner.is_ended());
    assert_eq!(inner.frames().len(), 11);
    assert_eq!(inner.frames()[0].1.pixel(0, 199), [0, 200, 0, 255]);
    drop(inner);
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn record_button_disables_while_recording() {
    let root = assets("button");
    let mut s = studio(&root, "Hi", false);
    s.start_recording(Box::new(SharedSink::default()), None).unwrap();
    let button = s.record_button();
    assert_eq!(button.label, "Recording...");
    assert!(!button.enabled);
    assert!(matches!(
        s.start_recording(Box::new(SharedSink::default()), None),
        Err(AnimError::RecordingBusy)
    ));

    let summary = s.stop_recording().unwrap();
    assert!(summary.is_some());
    assert_eq!(s.stop_recording().unwrap(), None);
    assert_eq!(s.record_button().label, "Record Animation");
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn encoder_failure_surfaces_and_resets() {
    let root = assets("broken");
    let mut s = studio(&root, "Hi", false);
    let err = s.record_with(Box::new(BrokenPipe), None).unwrap_err();
    assert!(matches!(err, AnimError::Encoder(_)));
    assert_eq!(s.recorder_state(), RecorderState::Idle);
    assert!(!s.settings().is_frozen());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn preview_draws_bubble_at_overlay_position() {
    let root = assets("preview");
    let mut s = studio(&root, "Hi there", false);
    s.load_token(&light()).unwrap();

    let frame = s.preview_frame(10.0).unwrap();
    // Layers fill the canvas; the bubble body is clamped to (20, 130).
    assert_eq!(frame.pixel(5, 5)[3], 255);
    assert_ne!(frame.pixel(5, 5), [255, 255, 255, 255]);
    assert_eq!(s.overlay().position(), Point::new(20.0, 130.0));
    assert_eq!(frame.pixel(100, 145), [255, 255, 255, 255]);
    assert!(s.preview_frame(-1.0).is_err());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn preview_rejects_unrepresentable_times_and_folds_loops() {
    let root = assets("far_preview");
    let mut s = studio(&root, "Hi", true);
    s.load_token(&light()).unwrap();
    s.set_wave_enabled(false);

    assert!(matches!(s.preview_frame(1e20), Err(AnimError::Validation(_))));
    assert!(matches!(s.preview_frame(f64::NAN), Err(AnimError::Validation(_))));

    // "Hi" over 0.5s plus the 1s pause repeats every 1.5s; 1e12 cycles later looks the same.
    let near = s.preview_frame(0.3).unwrap();
    let far = s.preview_frame(1.5e12 + 0.3).unwrap();
    assert_eq!(near.data, far.data);
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn dragging_moves_the_interactive_bubble() {
    let root = assets("drag");
    let mut s = studio(&root, "Hi", false);
    let start = s.overlay().position();
    let grab = Point::new(start.x + 5.0, start.y + 5.0);
    assert!(s.overlay_mut().drag_start(grab));
    s.overlay_mut().drag_move(Point::new(grab.x + 10.0, grab.y - 20.0));
    s.overlay_mut().drag_end();
    assert_eq!(s.overlay().position(), Point::new(start.x + 10.0, start.y - 20.0));
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn output_path_uses_stem_timestamp_and_container() {
    let root = assets("path");
    let s = studio(&root, "Hi", false);
    assert_eq!(
        s.output_path(1234),
        root.join("out").join("animation_1234.webm")
    );
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn stop_is_idempotent() {
    let root = assets("stop");
    let mut s = studio(&root, "Hi", false);
    s.load_token(&light()).unwrap();
    s.start_recording(Box::new(SharedSink::default()), None).unwrap();
    s.stop();
    s.stop();
    assert_eq!(s.next_deadline(), None);
    assert_eq!(s.recorder_state(), RecorderState::Idle);
    std::fs::remove_dir_all(&root).ok();
}
