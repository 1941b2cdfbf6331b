#![forbid(unsafe_code)]
//! QR code encoding pipeline.
//!
//! Ties the stages together: segmentation, version selection, bit stream construction,
//! error correction, module placement and masking. Every call owns all of its
//! intermediate state, so encodes can run concurrently without coordination.

use rayon::prelude::*;
use tracing::debug;

use crate::bitstream::build_data_codewords;
use crate::ecc::add_ecc_and_interleave;
use crate::error::EncodingError;
use crate::mask::{finalize, Mask};
use crate::matrix::{Matrix, Module};
use crate::segment::{make_segments, make_segments_from_bytes, QrSegment};
use crate::version::{select_version, QrCodeEcc, Version};

/// Default quiet zone width in modules.
pub const DEFAULT_BORDER: u8 = 4;

/// Parameters for one encode.
///
/// # Example
///
/// ```rust
/// use qrcraft::qrcode::{EncodeOptions, QrCode};
/// use qrcraft::version::{QrCodeEcc, Version};
///
/// let opts = EncodeOptions::default()
///     .with_ecl(QrCodeEcc::Medium)
///     .with_version(Version::new(2))
///     .with_border(2);
/// let qr = QrCode::encode_text("Hello, World!", &opts).unwrap();
/// assert_eq!(qr.version(), Version::new(2));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EncodeOptions {
    /// Error correction level.
    pub ecl: QrCodeEcc,
    /// Smallest version to use. `None` starts at version 1.
    pub version: Option<Version>,
    /// Whether a larger version may be chosen when the data does not fit.
    pub fit: bool,
    /// Fixed mask, or `None` to pick the lowest-penalty mask.
    pub mask: Option<Mask>,
    /// Quiet zone width in modules, used by renderers.
    pub border: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ecl: QrCodeEcc::Low,
            version: None,
            fit: true,
            mask: None,
            border: DEFAULT_BORDER,
        }
    }
}

impl EncodeOptions {
    pub fn with_ecl(mut self, ecl: QrCodeEcc) -> Self {
        self.ecl = ecl;
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_fit(mut self, fit: bool) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_border(mut self, border: u8) -> Self {
        self.border = border;
        self
    }
}

/// A QR Code symbol, representing a square grid of dark and light modules.
///
/// Instances are immutable after creation and carry the metadata renderers need:
/// version, error correction level, mask and quiet zone width.
///
/// # Example
///
/// ```rust
/// use qrcraft::qrcode::{EncodeOptions, QrCode};
///
/// let qr = QrCode::encode_text("Hello, World!", &EncodeOptions::default()).unwrap();
/// println!("Version: {}", qr.version().value());
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    ecl: QrCodeEcc,
    mask: Mask,
    border: u8,
    matrix: Matrix,
}

impl QrCode {
    /// Encodes a text string, choosing segment modes automatically.
    ///
    /// # Errors
    ///
    /// [`EncodingError::EmptyInput`] for `""`, [`EncodingError::DataTooLarge`] when no
    /// allowed version holds the data.
    pub fn encode_text(text: &str, opts: &EncodeOptions) -> Result<Self, EncodingError> {
        let segs = make_segments(text)?;
        Self::encode_segments(&segs, opts)
    }

    /// Encodes binary data, choosing segment modes automatically.
    pub fn encode_binary(data: &[u8], opts: &EncodeOptions) -> Result<Self, EncodingError> {
        let segs = make_segments_from_bytes(data)?;
        Self::encode_segments(&segs, opts)
    }

    /// Encodes caller-built segments in the given order.
    pub fn encode_segments(segs: &[QrSegment], opts: &EncodeOptions) -> Result<Self, EncodingError> {
        if segs.is_empty() {
            return Err(EncodingError::EmptyInput);
        }
        let minversion = opts.version.unwrap_or(Version::MIN);
        let (version, usedbits) = select_version(segs, opts.ecl, minversion, opts.fit)?;

        let data = build_data_codewords(segs, version, opts.ecl)?;
        let allcodewords = add_ecc_and_interleave(&data, version, opts.ecl)?;

        let mut matrix = Matrix::with_function_patterns(version);
        matrix.draw_codewords(&allcodewords)?;
        let (matrix, mask) = finalize(matrix, opts.ecl, opts.mask);

        debug!(
            version = version.value(),
            ecl = %opts.ecl.letter(),
            mask = mask.value(),
            segments = segs.len(),
            used_bits = usedbits,
            "encoded QR code"
        );
        Ok(Self {
            ecl: opts.ecl,
            mask,
            border: opts.border,
            matrix,
        })
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.matrix.version()
    }

    /// Returns this QR Code's size in modules, in the range [21, 177], excluding the border.
    pub fn size(&self) -> i32 {
        self.matrix.size() as i32
    }

    /// Returns this QR Code's error correction level.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Returns this QR Code's mask, in the range [0, 7].
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Quiet zone width in modules.
    pub fn border(&self) -> u8 {
        self.border
    }

    /// Side length including the quiet zone on both sides.
    pub fn dimension_with_border(&self) -> usize {
        self.matrix.size() + 2 * usize::from(self.border)
    }

    /// The finished module grid.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the QR
    /// code's bounds (the quiet zone) return `false`.
    ///
    /// # Arguments
    ///
    /// * `x` - X-coordinate (0 is left).
    /// * `y` - Y-coordinate (0 is top).
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size();
        range.contains(&x) && range.contains(&y) && self.matrix.is_dark(x as usize, y as usize)
    }

    /// Module state at the given coordinates, `None` outside the symbol.
    pub fn module(&self, x: i32, y: i32) -> Option<Module> {
        let range = 0..self.size();
        (range.contains(&x) && range.contains(&y)).then(|| self.matrix.get(x as usize, y as usize))
    }
}

/// Encodes `text` with the given error correction level, minimum version and quiet zone.
///
/// The version grows past `version` as needed; `None` starts at version 1.
///
/// # Example
///
/// ```rust
/// use qrcraft::encode;
/// use qrcraft::version::{QrCodeEcc, Version};
///
/// let qr = encode("HELLO", QrCodeEcc::Medium, Some(Version::new(1)), 4).unwrap();
/// assert_eq!(qr.size(), 21);
/// ```
pub fn encode(
    text: &str,
    ecl: QrCodeEcc,
    version: Option<Version>,
    border: u8,
) -> Result<QrCode, EncodingError> {
    let opts = EncodeOptions {
        ecl,
        version,
        border,
        ..EncodeOptions::default()
    };
    QrCode::encode_text(text, &opts)
}

/// Encodes many texts in parallel. Results keep the input order.
pub fn encode_batch<S>(texts: &[S], opts: &EncodeOptions) -> Vec<Result<QrCode, EncodingError>>
where
    S: AsRef<str> + Sync,
{
    texts
        .par_iter()
        .map(|text| QrCode::encode_text(text.as_ref(), opts))
        .collect()
}
