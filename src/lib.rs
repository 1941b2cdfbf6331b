//! # qrcraft
//!
//! A Rust library for generating QR codes and rendering them as PNG, SVG or ASCII art.
//!
//! `qrcraft` encodes text or binary data into QR Code Model 2 symbols. It supports versions
//! 1 to 40, four error correction levels, and numeric, alphanumeric and byte segments, which
//! are chosen automatically per run of input. Encoding is deterministic: the same input and
//! options always give the same module grid.
//!
//! ## Features
//!
//! - Automatic segmentation into numeric, alphanumeric and byte runs.
//! - Smallest-fitting version selection, or a fixed version.
//! - Reed-Solomon error correction with block interleaving.
//! - Lowest-penalty mask selection over all eight masks.
//! - Render to PNG (file, bytes or in-memory image buffer), SVG or ASCII art.
//! - Parallel batch encoding.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrcraft = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Encode a string and render it as SVG:
//!
//! ```rust
//! use qrcraft::{encode, helper::to_svg_string, QrCodeEcc};
//!
//! let qr = encode("https://example.com", QrCodeEcc::Medium, None, 4).unwrap();
//! let svg = to_svg_string(&qr);
//! assert!(svg.contains("<svg"));
//! ```
//!
//! Generate an in-memory image buffer:
//!
//! ```rust
//! use qrcraft::helper::to_image_buffer;
//! use qrcraft::{EncodeOptions, QrCode};
//!
//! let qr = QrCode::encode_text("Hello, World!", &EncodeOptions::default()).unwrap();
//! let img = to_image_buffer(&qr, 10).unwrap();
//! assert_eq!(img.width(), qr.dimension_with_border() as u32 * 10);
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: The encoding pipeline and the finished symbol.
//! - [`segment`]: Segment modes and automatic segmentation.
//! - [`version`]: Versions, error correction levels and capacity tables.
//! - [`bitstream`]: Data codeword construction and padding.
//! - [`ecc`]: Reed-Solomon error correction and interleaving.
//! - [`matrix`]: Function patterns and codeword placement.
//! - [`mask`]: Masking, penalty scoring and format information.
//! - [`helper`]: Utilities for rendering QR codes in various formats.
//! - [`error`]: Error types.

pub mod bitstream;
pub mod ecc;
pub mod error;
pub mod helper;
pub mod mask;
pub mod matrix;
pub mod qrcode;
pub mod segment;
pub mod version;

pub use error::{EncodingError, RenderError};
pub use helper::{render, OutputFormat, RenderOptions};
pub use mask::Mask;
pub use matrix::{Matrix, Module};
pub use qrcode::{encode, encode_batch, EncodeOptions, QrCode};
pub use segment::{QrSegment, QrSegmentMode};
pub use version::{QrCodeEcc, Version};
