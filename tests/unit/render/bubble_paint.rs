use super::*;
use crate::foundation::core::Canvas;
use crate::settings::color::CssColor;

fn inside(path: &BezPath, p: Point) -> bool {
    path.winding(p) != 0
}

#[test]
fn path_has_body_and_tail_inside_rect() {
    let style = BubbleStyle::default();
    let rect = Rect::new(10.0, 10.0, 110.0, 70.0);
    let path = bubble_path(rect, &style);

    let bounds = path.bounding_box();
    assert!(bounds.x0 >= rect.x0 - 1e-9 && bounds.x1 <= rect.x1 + 1e-9);
    assert!(bounds.y0 >= rect.y0 - 1e-9 && bounds.y1 <= rect.y1 + 1e-9);

    assert!(inside(&path, Point::new(60.0, 30.0)));
    // Tail apex region, below the body.
    assert!(inside(&path, Point::new(30.0, 62.0)));
    // Bottom-right corner is below the body and away from the tail.
    assert!(!inside(&path, Point::new(100.0, 65.0)));
    // Rounded corners are cut.
    assert!(!inside(&path, Point::new(10.5, 10.5)));
}

#[test]
fn painted_bubble_has_outline_and_fill() {
    let canvas = Canvas::square(200);
    let style = BubbleStyle::default();
    let mut surface = Surface::new(canvas).unwrap();
    let mut painter = BubblePainter::new(TextLayoutEngine::new());
    assert!(!painter.has_font());

    surface.begin();
    surface.fill_background(CssColor::rgb(0, 0, 255));
    let rect = Rect::new(20.0, 20.0, 120.0, 85.0);
    painter.paint(&mut surface, rect, "Hello", &style, false);
    let frame = surface.finish();

    assert_eq!(frame.pixel(70, 40), [255, 255, 255, 255]);
    assert_eq!(frame.pixel(5, 5), [0, 0, 255, 255]);
    assert_eq!(frame.pixel(110, 80), [0, 0, 255, 255]);
}

#[test]
fn cursor_is_drawn_without_font() {
    let canvas = Canvas::square(200);
    let style = BubbleStyle::default();
    let mut surface = Surface::new(canvas).unwrap();
    let mut painter = BubblePainter::new(TextLayoutEngine::new());

    let rect = Rect::new(20.0, 20.0, 120.0, 85.0);
    surface.begin();
    painter.paint(&mut surface, rect, "", &style, true);
    let with_cursor = surface.finish();

    surface.begin();
    painter.paint(&mut surface, rect, "", &style, false);
    let without = surface.finish();

    assert_ne!(with_cursor, without);
}

#[test]
fn measure_uses_wrap_width() {
    let mut painter = BubblePainter::new(TextLayoutEngine::new());
    let style = BubbleStyle::default();
    let long = "word ".repeat(60);
    let size = painter.measure(&long, &style, Canvas::square(828));
    assert!(size.width <= style.wrap_width(Canvas::square(828)) + 1e-9);
    assert!(size.height > style.font_px());
}
