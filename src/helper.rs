//! Renderers for finished symbols: SVG, ASCII art and PNG.
//!
//! Every renderer draws the quiet zone stored on the [`QrCode`] (its `border`), so the
//! same symbol renders consistently across formats.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageBuffer, ImageFormat, Luma};
use tracing::debug;

use crate::error::RenderError;
use crate::qrcode::QrCode;

/// Default pixels per module for raster output.
pub const DEFAULT_BOX_SIZE: u32 = 10;

/// Largest raster side length, in pixels, that [`to_image_buffer`] will allocate.
pub const MAX_IMAGE_SIDE: u32 = 32_768;

/// Output formats understood by [`render`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OutputFormat {
    Png,
    Svg,
    Ascii,
}

/// Renderer settings.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RenderOptions {
    /// Pixels per module, raster formats only.
    pub box_size: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            box_size: DEFAULT_BOX_SIZE,
        }
    }
}

impl RenderOptions {
    pub fn with_box_size(mut self, box_size: u32) -> Self {
        self.box_size = box_size;
        self
    }
}

// Returns a string of SVG code for an image depicting the given QR Code, including its
// border. The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(qr: &QrCode) -> String {
    let border = i32::from(qr.border());
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        qr.dimension_with_border()
    );
    result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    result += "\t<path d=\"";
    let mut first = true;
    for y in 0..qr.size() {
        for x in 0..qr.size() {
            if qr.get_module(x, y) {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += "\" fill=\"#000000\"/>\n";
    result += "</svg>\n";
    result
}

/// Renders the symbol as text, two module rows per line.
///
/// Each character covers one column of a row pair: `█` both dark, `▀` top dark, `▄` bottom
/// dark, and a non-breaking space when both are light. Lines end with `\n`.
pub fn to_ascii(qr: &QrCode) -> String {
    const BLOCKS: [char; 4] = ['\u{a0}', '▀', '▄', '█'];
    let border = i32::from(qr.border());
    let end = qr.size() + border;
    let mut result = String::new();
    for y in (-border..end).step_by(2) {
        for x in -border..end {
            let pos = usize::from(qr.get_module(x, y)) | (usize::from(qr.get_module(x, y + 1)) << 1);
            result.push(BLOCKS[pos]);
        }
        result.push('\n');
    }
    result
}

/// Rasterizes the symbol, black on white, `box_size` pixels per module.
///
/// # Errors
///
/// Returns [`RenderError::InvalidBoxSize`] if `box_size` is zero and
/// [`RenderError::ImageTooLarge`] if the image side would exceed [`MAX_IMAGE_SIDE`].
pub fn to_image_buffer(qr: &QrCode, box_size: u32) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, RenderError> {
    if box_size == 0 {
        return Err(RenderError::InvalidBoxSize);
    }
    let border = i32::from(qr.border());
    let side = qr.dimension_with_border() as u64 * u64::from(box_size);
    let size = u32::try_from(side)
        .ok()
        .filter(|&size| size <= MAX_IMAGE_SIDE)
        .ok_or(RenderError::ImageTooLarge {
            box_size,
            side,
            limit: MAX_IMAGE_SIDE,
        })?;
    let mut img = ImageBuffer::new(size, size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let qr_x = (x / box_size) as i32 - border;
        let qr_y = (y / box_size) as i32 - border;
        *pixel = if qr.get_module(qr_x, qr_y) {
            Luma([0u8]) // Black
        } else {
            Luma([255u8]) // White
        };
    }
    Ok(img)
}

/// Encodes the rasterized symbol as PNG in memory.
pub fn to_png_bytes(qr: &QrCode, box_size: u32) -> Result<Vec<u8>, RenderError> {
    let img = to_image_buffer(qr, box_size)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn create_parent_dir(path: &Path) -> Result<(), RenderError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            fs::create_dir_all(dir)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes the symbol as a PNG file, creating missing parent directories.
///
/// # Example
///
/// ```no_run
/// use qrcraft::helper::save_png;
/// use qrcraft::qrcode::{EncodeOptions, QrCode};
///
/// let qr = QrCode::encode_text("Hello, World!", &EncodeOptions::default()).unwrap();
/// save_png(&qr, "images/qr_code.png", 10).unwrap();
/// ```
pub fn save_png(qr: &QrCode, path: impl AsRef<Path>, box_size: u32) -> Result<(), RenderError> {
    let path = path.as_ref();
    let img = to_image_buffer(qr, box_size)?;
    create_parent_dir(path)?;
    img.save_with_format(path, ImageFormat::Png)?;
    debug!(path = %path.display(), "wrote PNG");
    Ok(())
}

/// Writes the symbol as an SVG file, creating missing parent directories.
pub fn save_svg(qr: &QrCode, path: impl AsRef<Path>) -> Result<(), RenderError> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    fs::write(path, to_svg_string(qr))?;
    debug!(path = %path.display(), "wrote SVG");
    Ok(())
}

/// Renders the symbol in the requested format. Text formats are returned as UTF-8 bytes.
pub fn render(qr: &QrCode, format: OutputFormat, opts: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    match format {
        OutputFormat::Png => to_png_bytes(qr, opts.box_size),
        OutputFormat::Svg => Ok(to_svg_string(qr).into_bytes()),
        OutputFormat::Ascii => Ok(to_ascii(qr).into_bytes()),
    }
}
