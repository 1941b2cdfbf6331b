//! Error types for encoding and rendering.

use thiserror::Error;

use crate::segment::QrSegmentMode;

/// Errors produced while turning data into a QR Code symbol.
///
/// Ways to handle [`EncodingError::DataTooLarge`] include lowering the error correction
/// level, allowing the version to grow (`fit = true`), or shortening the data.
/// [`EncodingError::InternalInvariant`] is never caused by the caller; see
/// [`EncodingError::is_internal`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input contained no data.
    #[error("input data is empty")]
    EmptyInput,

    /// No allowed version can hold the data at the requested error correction level.
    ///
    /// `needed_bits` is `None` when a segment's character count does not fit in its
    /// count indicator.
    #[error("data too large: needed {needed_bits:?} bits, capacity {capacity_bits} bits")]
    DataTooLarge {
        needed_bits: Option<usize>,
        capacity_bits: usize,
    },

    /// A character cannot be represented in the requested segment mode.
    #[error("character {ch:?} cannot be encoded in {mode:?} mode")]
    UnsupportedCharacter { mode: QrSegmentMode, ch: char },

    /// Version number outside 1..=40.
    #[error("invalid version {0} (must be 1-40)")]
    InvalidVersion(u8),

    /// Mask number outside 0..=7.
    #[error("invalid mask {0} (must be 0-7)")]
    InvalidMask(u8),

    /// Codeword or block accounting mismatch. Indicates a bug in the engine.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl EncodingError {
    /// Returns `true` for engine bugs, `false` for errors caused by the input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalInvariant(_))
    }

    #[inline]
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(%msg, "QR engine invariant violated");
        debug_assert!(false, "QR engine invariant violated: {msg}");
        Self::InternalInvariant(msg)
    }
}

/// Errors produced by the renderer adapters in [`crate::helper`].
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pixels per module must be at least 1.
    #[error("box size must be at least 1 pixel")]
    InvalidBoxSize,

    /// The raster side length would exceed [`crate::helper::MAX_IMAGE_SIDE`].
    #[error("box size {box_size} gives a {side} pixel wide image (limit {limit})")]
    ImageTooLarge { box_size: u32, side: u64, limit: u32 },
}
