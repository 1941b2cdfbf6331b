//! Data segments and automatic segmentation of input text.

use tracing::trace;

use crate::error::EncodingError;
use crate::version::Version;

/// Runs shorter than this stay inside the surrounding wider-mode segment. Input no longer
/// than this is always a single segment.
const MIN_RUN_LEN: usize = 20;

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// A segment of data in a QR code.
///
/// Segments are immutable and created using factory functions like [`QrSegment::make_numeric`],
/// [`QrSegment::make_alphanumeric`] or [`QrSegment::make_bytes`], or by [`make_segments`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: Vec<u8>,
    bitlength: usize,
}

impl QrSegment {
    /// Creates a segment for binary data in byte mode.
    pub fn make_bytes(data: &[u8]) -> Self {
        QrSegment::new(QrSegmentMode::Byte, data.len(), data.to_vec(), data.len() * 8)
    }

    /// Creates a segment for a string of decimal digits in numeric mode.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnsupportedCharacter`] if `text` contains a non-digit.
    pub fn make_numeric(text: &str) -> Result<Self, EncodingError> {
        if let Some(ch) = text.chars().find(|c| !c.is_ascii_digit()) {
            return Err(EncodingError::UnsupportedCharacter {
                mode: QrSegmentMode::Numeric,
                ch,
            });
        }
        Ok(Self::numeric_from_ascii(text.as_bytes()))
    }

    /// Creates a segment for alphanumeric text.
    ///
    /// Allowed characters: 0–9, A–Z (uppercase), space, `$`, `%`, `*`, `+`, `-`, `.`, `/`, `:`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnsupportedCharacter`] for any other character.
    pub fn make_alphanumeric(text: &str) -> Result<Self, EncodingError> {
        if let Some(ch) = text.chars().find(|&c| !ALPHANUMERIC_CHARSET.contains(c)) {
            return Err(EncodingError::UnsupportedCharacter {
                mode: QrSegmentMode::Alphanumeric,
                ch,
            });
        }
        Ok(Self::alphanumeric_from_ascii(text.as_bytes()))
    }

    // Callers guarantee every byte is an ASCII digit.
    fn numeric_from_ascii(digits: &[u8]) -> Self {
        let mut bb = BitBuffer::new();
        for chunk in digits.chunks(3) {
            let value = chunk
                .iter()
                .fold(0u32, |acc, &b| acc * 10 + u32::from(b - b'0'));
            bb.append_bits(value, chunk.len() as u8 * 3 + 1);
        }
        QrSegment::new(QrSegmentMode::Numeric, digits.len(), bb.data, bb.length)
    }

    // Callers guarantee every byte is in the alphanumeric charset.
    fn alphanumeric_from_ascii(text: &[u8]) -> Self {
        let mut bb = BitBuffer::new();
        for pair in text.chunks(2) {
            match *pair {
                [a, b] => bb.append_bits(alphanumeric_index(a) * 45 + alphanumeric_index(b), 11),
                [a] => bb.append_bits(alphanumeric_index(a), 6),
                _ => unreachable!(),
            }
        }
        QrSegment::new(QrSegmentMode::Alphanumeric, text.len(), bb.data, bb.length)
    }

    pub(crate) fn new(mode: QrSegmentMode, numchars: usize, data: Vec<u8>, bitlength: usize) -> Self {
        debug_assert!(bitlength == 0 || (bitlength - 1) / 8 < data.len());
        Self {
            mode,
            numchars,
            data,
            bitlength,
        }
    }

    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    /// Number of characters (bytes for byte mode) this segment encodes.
    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// Length of the packed payload in bits, excluding mode and count indicators.
    pub fn bit_length(&self) -> usize {
        self.bitlength
    }

    /// The bit-packed payload, MSB first.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterates the payload bits in order.
    pub(crate) fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bitlength).map(move |i| (self.data[i >> 3] >> (7 - (i & 7))) & 1 != 0)
    }

    /// Total bits needed to encode `segs` at `version`, including mode and count
    /// indicators. Returns `None` if a segment has too many characters for its count
    /// indicator at that version.
    pub fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits: u8 = seg.mode.num_char_count_bits(version);
            if seg.numchars >= 1usize << ccbits {
                return None;
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.bitlength)?;
        }
        Some(result)
    }

    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

fn is_alphanumeric_byte(b: u8) -> bool {
    b.is_ascii() && ALPHANUMERIC_CHARSET.as_bytes().contains(&b)
}

fn alphanumeric_index(b: u8) -> u32 {
    ALPHANUMERIC_CHARSET
        .bytes()
        .position(|c| c == b)
        .map_or(0, |i| i as u32)
}

/// Splits `text` into segments of the narrowest usable mode.
///
/// The text is encoded as UTF-8. See [`make_segments_from_bytes`] for the policy.
///
/// # Errors
///
/// Returns [`EncodingError::EmptyInput`] for an empty string.
pub fn make_segments(text: &str) -> Result<Vec<QrSegment>, EncodingError> {
    make_segments_from_bytes(text.as_bytes())
}

/// Splits raw bytes into segments.
///
/// Input of at most twenty bytes becomes a single segment in the narrowest mode covering
/// all of it. Longer input is split into maximal runs: runs of twenty or more digits are
/// numeric, runs of twenty or more alphanumeric characters between them are alphanumeric,
/// and everything else is byte mode. If the split needs more bits than one segment for
/// the whole input, the single segment is used instead.
pub fn make_segments_from_bytes(data: &[u8]) -> Result<Vec<QrSegment>, EncodingError> {
    if data.is_empty() {
        return Err(EncodingError::EmptyInput);
    }

    let whole = single_segment(data);
    if data.len() <= MIN_RUN_LEN {
        return Ok(vec![whole]);
    }

    let mut segs = Vec::new();
    for (is_num, chunk) in split_runs(data, |b| b.is_ascii_digit()) {
        if is_num {
            segs.push(QrSegment::numeric_from_ascii(chunk));
            continue;
        }
        for (is_alnum, sub) in split_runs(chunk, is_alphanumeric_byte) {
            if is_alnum {
                segs.push(QrSegment::alphanumeric_from_ascii(sub));
            } else {
                segs.push(QrSegment::make_bytes(sub));
            }
        }
    }

    // Compared at the widest count indicators; extra headers only cost more there
    let cost = |segs: &[QrSegment]| QrSegment::get_total_bits(segs, Version::MAX).unwrap_or(usize::MAX);
    if segs.len() > 1 && cost(&segs) >= cost(core::slice::from_ref(&whole)) {
        trace!(bytes = data.len(), "split costs more than one segment, keeping whole input");
        return Ok(vec![whole]);
    }
    trace!(
        modes = ?segs.iter().map(QrSegment::mode).collect::<Vec<_>>(),
        "segmented {} bytes",
        data.len()
    );
    Ok(segs)
}

/// One segment in the narrowest mode that covers every byte.
fn single_segment(data: &[u8]) -> QrSegment {
    if data.iter().all(u8::is_ascii_digit) {
        QrSegment::numeric_from_ascii(data)
    } else if data.iter().all(|&b| is_alphanumeric_byte(b)) {
        QrSegment::alphanumeric_from_ascii(data)
    } else {
        QrSegment::make_bytes(data)
    }
}

/// Partitions `data` into alternating pieces, flagging maximal runs of at least
/// [`MIN_RUN_LEN`] bytes matching `pred`.
fn split_runs(data: &[u8], pred: impl Fn(u8) -> bool) -> Vec<(bool, &[u8])> {
    let mut pieces = Vec::new();
    let mut gap_start = 0;
    let mut i = 0;
    while i < data.len() {
        if !pred(data[i]) {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < data.len() && pred(data[i]) {
            i += 1;
        }
        if i - run_start >= MIN_RUN_LEN {
            if gap_start < run_start {
                pieces.push((false, &data[gap_start..run_start]));
            }
            pieces.push((true, &data[run_start..i]));
            gap_start = i;
        }
    }
    if gap_start < data.len() {
        pieces.push((false, &data[gap_start..]));
    }
    pieces
}

/// Data encoding mode of a segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl QrSegmentMode {
    /// The 4-bit mode indicator.
    pub(crate) fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
        }
    }

    /// Inverse of [`QrSegmentMode::mode_bits`].
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        use QrSegmentMode::*;
        match bits {
            0x1 => Some(Numeric),
            0x2 => Some(Alphanumeric),
            0x4 => Some(Byte),
            _ => None,
        }
    }

    /// Width of the character count indicator at the given version.
    pub fn num_char_count_bits(self, ver: Version) -> u8 {
        use QrSegmentMode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
        })[ver.range_index()]
    }
}

/// An appendable sequence of bits, packed MSB first into bytes.
#[derive(Clone, Default, Debug)]
pub struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_bits(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity(bits.div_ceil(8)),
            length: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends the low `len` bits of `val`, most significant first.
    ///
    /// # Panics
    ///
    /// Panics if `len > 31` or `val` has bits set above `len`.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0);
        for i in (0..len).rev() {
            let shift: u8 = 7 - ((self.length & 7) as u8);
            let bit: u8 = ((val >> i) as u8) & 1;
            if shift == 7 {
                self.data.push(bit << shift);
            } else if let Some(last) = self.data.last_mut() {
                *last |= bit << shift;
            }
            self.length += 1;
        }
    }

    /// Consumes the buffer, returning the packed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
