use super::*;
use crate::traits::layer_key::LayerKey;
use crate::traits::resolver::ResolvedLayer;

fn temp_root(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nft_anim_store_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(dir.join("skin")).unwrap();
    dir
}

fn layer(src: &str, key: LayerKey) -> ResolvedLayer {
    ResolvedLayer {
        image_source: src.to_owned(),
        rank: key.standard_rank(),
        key,
        tag: format!("skin:{key}:light"),
    }
}

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(normalize_rel_path("a/./b//c.png").unwrap(), "a/b/c.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("../up.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn failed_images_become_blank_at_same_index() {
    let root = temp_root("blank");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]))
        .save(root.join("skin/body.png"))
        .unwrap();
    std::fs::write(root.join("skin/head.png"), b"broken").unwrap();

    let stack = LayerStack::from_layers(vec![
        layer("skin/body.png", LayerKey::Body),
        layer("skin/head.png", LayerKey::Head),
        layer("skin/missing.png", LayerKey::Face),
    ]);

    let mut store = ImageStore::new(&root);
    let slots = store.load_stack(&stack);
    assert_eq!(slots.len(), 3);
    let body = slots[0].image().unwrap();
    assert_eq!((body.width, body.height), (4, 4));
    assert_eq!(slots[1], ImageSlot::Blank);
    assert_eq!(slots[2], ImageSlot::Blank);
    assert_eq!(store.cached_len(), 1);

    let again = store.load_stack(&stack);
    assert_eq!(again, slots);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn shared_paths_decode_once() {
    let root = temp_root("shared");
    image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]))
        .save(root.join("skin/part.png"))
        .unwrap();
    let stack = LayerStack::from_layers(vec![
        layer("skin/part.png", LayerKey::Body),
        layer("skin/part.png", LayerKey::Head),
    ]);

    let mut store = ImageStore::new(&root);
    let slots = store.load_stack(&stack);
    assert_eq!(store.cached_len(), 1);
    assert!(slots.iter().all(|s| s.image().is_some()));

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn measure_without_font_approximates() {
    let mut engine = TextLayoutEngine::new();
    assert!(!engine.has_font());
    assert_eq!(engine.measure("", 18.0, None), Size::ZERO);

    let short = engine.measure("Hi", 20.0, None);
    assert!((short.width - 22.0).abs() < 1e-9);
    assert!((short.height - 24.0).abs() < 1e-9);

    let long = "x".repeat(100);
    let wrapped = engine.measure(&long, 20.0, Some(300.0));
    assert!((wrapped.width - 300.0).abs() < 1e-9);
    assert!(wrapped.height > 24.0);
    assert!(engine.layout("Hi", 20.0, TextBrushRgba8::default(), None).unwrap().is_none());
}

#[test]
fn bad_font_file_falls_back_to_no_font() {
    let bad = Path::new("/definitely/not/a/font.ttf");
    assert!(!TextLayoutEngine::from_config(Some(bad), false).has_font());
    // A configured file wins over the system fallback, even when it cannot be read.
    assert!(!TextLayoutEngine::from_config(Some(bad), true).has_font());
    assert!(TextLayoutEngine::with_font_bytes(b"nope".to_vec()).is_err());
}

#[test]
fn system_fonts_are_used_only_when_enabled() {
    assert!(!TextLayoutEngine::from_config(None, false).has_font());

    let system = TextLayoutEngine::system_default();
    let engine = TextLayoutEngine::from_config(None, true);
    assert_eq!(engine.has_font(), system.is_ok());
}

#[test]
fn swapping_stacks_drops_unused_images_and_retries_failures() {
    let root = temp_root("swap");
    image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]))
        .save(root.join("skin/body.png"))
        .unwrap();
    image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]))
        .save(root.join("skin/arm.png"))
        .unwrap();

    let mut store = ImageStore::new(&root);
    let first = LayerStack::from_layers(vec![
        layer("skin/body.png", LayerKey::Body),
        layer("skin/late.png", LayerKey::Head),
    ]);
    let slots = store.load_stack(&first);
    assert_eq!(slots[1], ImageSlot::Blank);
    assert_eq!(store.cached_len(), 1);

    let second = LayerStack::from_layers(vec![layer("skin/arm.png", LayerKey::ArmLeft)]);
    store.load_stack(&second);
    assert_eq!(store.cached_len(), 1);

    // The image that was missing earlier now exists and loads on the next swap.
    image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]))
        .save(root.join("skin/late.png"))
        .unwrap();
    let slots = store.load_stack(&first);
    assert!(slots.iter().all(|s| s.image().is_some()));
    assert_eq!(store.cached_len(), 2);

    std::fs::remove_dir_all(&root).ok();
}
