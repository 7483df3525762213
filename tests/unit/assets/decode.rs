use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let prepared = decode_image(&buf).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn garbage_bytes_are_an_asset_load_error() {
    let err = decode_image(b"not an image").unwrap_err();
    assert!(matches!(err, AnimError::AssetLoad(_)));
}

#[test]
fn blank_is_transparent() {
    let b = PreparedImage::blank(3, 2);
    assert_eq!(b.rgba8_premul.len(), 24);
    assert!(b.rgba8_premul.iter().all(|&x| x == 0));
}
