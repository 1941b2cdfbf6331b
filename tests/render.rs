use std::fs;
use std::path::PathBuf;

use qrcraft::helper::{save_png, save_svg, to_ascii, to_image_buffer, to_svg_string};
use qrcraft::{render, EncodeOptions, OutputFormat, QrCode, QrCodeEcc, RenderError, RenderOptions};

fn sample(border: u8) -> QrCode {
    let opts = EncodeOptions::default().with_ecl(QrCodeEcc::Medium).with_border(border);
    QrCode::encode_text("render me", &opts).unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("qrcraft-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn image_matches_modules() {
    let qr = sample(4);
    let box_size = 5;
    let img = to_image_buffer(&qr, box_size).unwrap();
    let side = qr.dimension_with_border() as u32 * box_size;
    assert_eq!(img.dimensions(), (side, side));
    for y in 0..qr.size() {
        for x in 0..qr.size() {
            let px = (x as u32 + 4) * box_size + 2;
            let py = (y as u32 + 4) * box_size + 2;
            let expected = if qr.get_module(x, y) { 0 } else { 255 };
            assert_eq!(img.get_pixel(px, py).0[0], expected, "module ({x}, {y})");
        }
    }
}

#[test]
fn svg_has_one_square_per_dark_module() {
    let qr = sample(1);
    let svg = to_svg_string(&qr);
    let dark = qr.matrix().dark_count();
    assert_eq!(svg.matches("h1v1h-1z").count(), dark);
    let side = qr.dimension_with_border();
    assert!(svg.contains(&format!("viewBox=\"0 0 {side} {side}\"")));
}

#[test]
fn ascii_covers_border_rows() {
    let qr = sample(2);
    let art = to_ascii(&qr);
    let side = qr.dimension_with_border();
    assert_eq!(art.lines().count(), side.div_ceil(2));
    let dark_halves: usize = art
        .chars()
        .map(|c| match c {
            '█' => 2,
            '▀' | '▄' => 1,
            _ => 0,
        })
        .sum();
    assert_eq!(dark_halves, qr.matrix().dark_count());
}

#[test]
fn render_dispatches_by_format() {
    let qr = sample(4);
    let opts = RenderOptions::default();
    let svg = render(&qr, OutputFormat::Svg, &opts).unwrap();
    assert_eq!(svg, to_svg_string(&qr).into_bytes());
    let ascii = render(&qr, OutputFormat::Ascii, &opts).unwrap();
    assert_eq!(String::from_utf8(ascii).unwrap(), to_ascii(&qr));
    let png = render(&qr, OutputFormat::Png, &opts).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_luma8();
    assert_eq!(decoded, to_image_buffer(&qr, 10).unwrap());
}

#[test]
fn zero_box_size_is_an_error() {
    let qr = sample(4);
    let opts = RenderOptions::default().with_box_size(0);
    assert!(matches!(render(&qr, OutputFormat::Png, &opts), Err(RenderError::InvalidBoxSize)));
    // text formats ignore the box size
    assert!(render(&qr, OutputFormat::Svg, &opts).is_ok());
}

#[test]
fn save_creates_parent_directories() {
    let qr = sample(4);
    let dir = scratch_dir("save");
    let png_path = dir.join("nested").join("code.png");
    let svg_path = dir.join("nested").join("code.svg");

    save_png(&qr, &png_path, 2).unwrap();
    save_svg(&qr, &svg_path).unwrap();

    let img = image::open(&png_path).unwrap().to_luma8();
    assert_eq!(img.width(), qr.dimension_with_border() as u32 * 2);
    assert_eq!(fs::read_to_string(&svg_path).unwrap(), to_svg_string(&qr));

    fs::remove_dir_all(&dir).unwrap();
}
