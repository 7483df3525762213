use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_conversions() {
    let fps = Fps::whole(60).unwrap();
    assert_eq!(fps.secs_to_frames_round(4.0), 240);
    assert_eq!(fps.secs_to_frames_round(2.0), 120);
    assert!((fps.frames_to_secs(30) - 0.5).abs() < 1e-12);
    assert!((fps.frame_duration().as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
}

#[test]
fn canvas_validation_and_center() {
    assert!(Canvas::square(0).validate().is_err());
    assert!(Canvas::square(70_000).validate().is_err());
    let c = Canvas::square(828);
    c.validate().unwrap();
    assert_eq!(c.center(), Point::new(414.0, 414.0));
    assert_eq!(c.rgba_len(), 828 * 828 * 4);
}

#[test]
fn premul_from_straight_rounds() {
    let p = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(p.to_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8Premul::transparent().a, 0);
}
