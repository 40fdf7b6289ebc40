use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use smilegen_engine::{render_placeholder, BAND_HEIGHT};

fn white_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn placeholder_darkens_bottom_band_only() {
    let data_url = render_placeholder(&white_png(64, 200)).unwrap();
    assert_eq!(data_url.mime_type(), Some("image/jpeg"));

    let decoded = image::load_from_memory(&data_url.decode().unwrap())
        .unwrap()
        .to_rgb8();
    assert_eq!(decoded.dimensions(), (64, 200));

    let top = decoded.get_pixel(32, 10).0[0];
    let band = decoded.get_pixel(32, 200 - BAND_HEIGHT / 2).0[0];
    assert!(top > 230, "top pixel should stay light, got {top}");
    assert!(band < 110, "band pixel should be dark, got {band}");
}

#[test]
fn image_shorter_than_band_is_fully_darkened() {
    let data_url = render_placeholder(&white_png(16, 20)).unwrap();
    let decoded = image::load_from_memory(&data_url.decode().unwrap())
        .unwrap()
        .to_rgb8();
    assert!(decoded.get_pixel(8, 2).0[0] < 110);
}

#[test]
fn undecodable_input_is_an_error() {
    assert!(render_placeholder(b"definitely not an image").is_err());
}
