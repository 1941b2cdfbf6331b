//! Symbol versions, error correction levels, and the standard lookup tables.
//!
//! The block table, alignment pattern coordinates and version information words are
//! reproduced from ISO/IEC 18004 Annex tables rather than derived, and tests check them
//! against the capacity arithmetic.

use core::str::FromStr;

use tracing::debug;

use crate::error::EncodingError;
use crate::segment::QrSegment;

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Creates a version object, returning [`EncodingError::InvalidVersion`] when out of range.
    pub fn try_new(ver: u8) -> Result<Self, EncodingError> {
        if (Version::MIN.value()..=Version::MAX.value()).contains(&ver) {
            Ok(Self(ver))
        } else {
            Err(EncodingError::InvalidVersion(ver))
        }
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length of the symbol in modules: `17 + 4 * version`.
    pub const fn size(self) -> usize {
        (self.0 as usize) * 4 + 17
    }

    /// Index into the character-count width tables: 0 for 1–9, 1 for 10–26, 2 for 27–40.
    pub(crate) fn range_index(self) -> usize {
        usize::from((self.0 + 7) / 17)
    }

    /// The next larger version, if any.
    pub fn next(self) -> Option<Version> {
        if self < Version::MAX {
            Some(Version(self.0 + 1))
        } else {
            None
        }
    }

    /// Iterates all versions from `self` to 40 inclusive.
    pub fn up_to_max(self) -> impl Iterator<Item = Version> {
        (self.0..=Version::MAX.0).map(Version)
    }
}

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    #[default]
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// All levels, from lowest to highest redundancy.
    pub const ALL: [QrCodeEcc; 4] = [
        QrCodeEcc::Low,
        QrCodeEcc::Medium,
        QrCodeEcc::Quartile,
        QrCodeEcc::High,
    ];

    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    pub(crate) fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// The two EC level bits of the format information.
    pub(crate) fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }

    /// Inverse of the format information EC bits.
    pub fn from_format_bits(bits: u8) -> Option<Self> {
        use QrCodeEcc::*;
        match bits {
            1 => Some(Low),
            0 => Some(Medium),
            3 => Some(Quartile),
            2 => Some(High),
            _ => None,
        }
    }

    /// Single-letter name used by the standard: L, M, Q or H.
    pub fn letter(self) -> char {
        ['L', 'M', 'Q', 'H'][self.ordinal()]
    }
}

impl FromStr for QrCodeEcc {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "LOW" => Ok(QrCodeEcc::Low),
            "M" | "MEDIUM" => Ok(QrCodeEcc::Medium),
            "Q" | "QUARTILE" => Ok(QrCodeEcc::Quartile),
            "H" | "HIGH" => Ok(QrCodeEcc::High),
            other => Err(format!("unknown error correction level '{other}' (expected L, M, Q or H)")),
        }
    }
}

/// Error correction block layout for one (version, level) pair.
///
/// Group 2 blocks, when present, carry exactly one more data codeword than group 1 blocks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockSpec {
    pub ecc_per_block: u8,
    pub group1_blocks: u8,
    pub group1_data: u8,
    pub group2_blocks: u8,
    pub group2_data: u8,
}

impl BlockSpec {
    pub fn num_blocks(&self) -> usize {
        usize::from(self.group1_blocks) + usize::from(self.group2_blocks)
    }

    pub fn data_codewords(&self) -> usize {
        usize::from(self.group1_blocks) * usize::from(self.group1_data)
            + usize::from(self.group2_blocks) * usize::from(self.group2_data)
    }

    pub fn ecc_codewords(&self) -> usize {
        self.num_blocks() * usize::from(self.ecc_per_block)
    }

    pub fn total_codewords(&self) -> usize {
        self.data_codewords() + self.ecc_codewords()
    }

    /// Data length of each block, in block order.
    pub fn block_data_lengths(&self) -> impl Iterator<Item = usize> {
        let g1 = core::iter::repeat(usize::from(self.group1_data)).take(self.group1_blocks.into());
        let g2 = core::iter::repeat(usize::from(self.group2_data)).take(self.group2_blocks.into());
        g1.chain(g2)
    }
}

const fn b(ecc_per_block: u8, group1_blocks: u8, group1_data: u8, group2_blocks: u8, group2_data: u8) -> BlockSpec {
    BlockSpec {
        ecc_per_block,
        group1_blocks,
        group1_data,
        group2_blocks,
        group2_data,
    }
}

/// Block layout per version, indexed `[version - 1][level]` with levels in L, M, Q, H order.
static BLOCK_TABLE: [[BlockSpec; 4]; 40] = [
    [b(7, 1, 19, 0, 0), b(10, 1, 16, 0, 0), b(13, 1, 13, 0, 0), b(17, 1, 9, 0, 0)], // 1
    [b(10, 1, 34, 0, 0), b(16, 1, 28, 0, 0), b(22, 1, 22, 0, 0), b(28, 1, 16, 0, 0)], // 2
    [b(15, 1, 55, 0, 0), b(26, 1, 44, 0, 0), b(18, 2, 17, 0, 0), b(22, 2, 13, 0, 0)], // 3
    [b(20, 1, 80, 0, 0), b(18, 2, 32, 0, 0), b(26, 2, 24, 0, 0), b(16, 4, 9, 0, 0)], // 4
    [b(26, 1, 108, 0, 0), b(24, 2, 43, 0, 0), b(18, 2, 15, 2, 16), b(22, 2, 11, 2, 12)], // 5
    [b(18, 2, 68, 0, 0), b(16, 4, 27, 0, 0), b(24, 4, 19, 0, 0), b(28, 4, 15, 0, 0)], // 6
    [b(20, 2, 78, 0, 0), b(18, 4, 31, 0, 0), b(18, 2, 14, 4, 15), b(26, 4, 13, 1, 14)], // 7
    [b(24, 2, 97, 0, 0), b(22, 2, 38, 2, 39), b(22, 4, 18, 2, 19), b(26, 4, 14, 2, 15)], // 8
    [b(30, 2, 116, 0, 0), b(22, 3, 36, 2, 37), b(20, 4, 16, 4, 17), b(24, 4, 12, 4, 13)], // 9
    [b(18, 2, 68, 2, 69), b(26, 4, 43, 1, 44), b(24, 6, 19, 2, 20), b(28, 6, 15, 2, 16)], // 10
    [b(20, 4, 81, 0, 0), b(30, 1, 50, 4, 51), b(28, 4, 22, 4, 23), b(24, 3, 12, 8, 13)], // 11
    [b(24, 2, 92, 2, 93), b(22, 6, 36, 2, 37), b(26, 4, 20, 6, 21), b(28, 7, 14, 4, 15)], // 12
    [b(26, 4, 107, 0, 0), b(22, 8, 37, 1, 38), b(24, 8, 20, 4, 21), b(22, 12, 11, 4, 12)], // 13
    [b(30, 3, 115, 1, 116), b(24, 4, 40, 5, 41), b(20, 11, 16, 5, 17), b(24, 11, 12, 5, 13)], // 14
    [b(22, 5, 87, 1, 88), b(24, 5, 41, 5, 42), b(30, 5, 24, 7, 25), b(24, 11, 12, 7, 13)], // 15
    [b(24, 5, 98, 1, 99), b(28, 7, 45, 3, 46), b(24, 15, 19, 2, 20), b(30, 3, 15, 13, 16)], // 16
    [b(28, 1, 107, 5, 108), b(28, 10, 46, 1, 47), b(28, 1, 22, 15, 23), b(28, 2, 14, 17, 15)], // 17
    [b(30, 5, 120, 1, 121), b(26, 9, 43, 4, 44), b(28, 17, 22, 1, 23), b(28, 2, 14, 19, 15)], // 18
    [b(28, 3, 113, 4, 114), b(26, 3, 44, 11, 45), b(26, 17, 21, 4, 22), b(26, 9, 13, 16, 14)], // 19
    [b(28, 3, 107, 5, 108), b(26, 3, 41, 13, 42), b(30, 15, 24, 5, 25), b(28, 15, 15, 10, 16)], // 20
    [b(28, 4, 116, 4, 117), b(26, 17, 42, 0, 0), b(28, 17, 22, 6, 23), b(30, 19, 16, 6, 17)], // 21
    [b(28, 2, 111, 7, 112), b(28, 17, 46, 0, 0), b(30, 7, 24, 16, 25), b(24, 34, 13, 0, 0)], // 22
    [b(30, 4, 121, 5, 122), b(28, 4, 47, 14, 48), b(30, 11, 24, 14, 25), b(30, 16, 15, 14, 16)], // 23
    [b(30, 6, 117, 4, 118), b(28, 6, 45, 14, 46), b(30, 11, 24, 16, 25), b(30, 30, 16, 2, 17)], // 24
    [b(26, 8, 106, 4, 107), b(28, 8, 47, 13, 48), b(30, 7, 24, 22, 25), b(30, 22, 15, 13, 16)], // 25
    [b(28, 10, 114, 2, 115), b(28, 19, 46, 4, 47), b(28, 28, 22, 6, 23), b(30, 33, 16, 4, 17)], // 26
    [b(30, 8, 122, 4, 123), b(28, 22, 45, 3, 46), b(30, 8, 23, 26, 24), b(30, 12, 15, 28, 16)], // 27
    [b(30, 3, 117, 10, 118), b(28, 3, 45, 23, 46), b(30, 4, 24, 31, 25), b(30, 11, 15, 31, 16)], // 28
    [b(30, 7, 116, 7, 117), b(28, 21, 45, 7, 46), b(30, 1, 23, 37, 24), b(30, 19, 15, 26, 16)], // 29
    [b(30, 5, 115, 10, 116), b(28, 19, 47, 10, 48), b(30, 15, 24, 25, 25), b(30, 23, 15, 25, 16)], // 30
    [b(30, 13, 115, 3, 116), b(28, 2, 46, 29, 47), b(30, 42, 24, 1, 25), b(30, 23, 15, 28, 16)], // 31
    [b(30, 17, 115, 0, 0), b(28, 10, 46, 23, 47), b(30, 10, 24, 35, 25), b(30, 19, 15, 35, 16)], // 32
    [b(30, 17, 115, 1, 116), b(28, 14, 46, 21, 47), b(30, 29, 24, 19, 25), b(30, 11, 15, 46, 16)], // 33
    [b(30, 13, 115, 6, 116), b(28, 14, 46, 23, 47), b(30, 44, 24, 7, 25), b(30, 59, 16, 1, 17)], // 34
    [b(30, 12, 121, 7, 122), b(28, 12, 47, 26, 48), b(30, 39, 24, 14, 25), b(30, 22, 15, 41, 16)], // 35
    [b(30, 6, 121, 14, 122), b(28, 6, 47, 34, 48), b(30, 46, 24, 10, 25), b(30, 2, 15, 64, 16)], // 36
    [b(30, 17, 122, 4, 123), b(28, 29, 46, 14, 47), b(30, 49, 24, 10, 25), b(30, 24, 15, 46, 16)], // 37
    [b(30, 4, 122, 18, 123), b(28, 13, 46, 32, 47), b(30, 48, 24, 14, 25), b(30, 42, 15, 32, 16)], // 38
    [b(30, 20, 117, 4, 118), b(28, 40, 47, 7, 48), b(30, 43, 24, 22, 25), b(30, 10, 15, 67, 16)], // 39
    [b(30, 19, 118, 6, 119), b(28, 18, 47, 31, 48), b(30, 34, 24, 34, 25), b(30, 20, 15, 61, 16)], // 40
];

/// Alignment pattern centre coordinates per version, indexed `[version - 1]`.
static ALIGNMENT_PATTERN_POSITIONS: [&[u8]; 40] = [
    &[],
    &[6, 18], // 2
    &[6, 22], // 3
    &[6, 26], // 4
    &[6, 30], // 5
    &[6, 34], // 6
    &[6, 22, 38], // 7
    &[6, 24, 42], // 8
    &[6, 26, 46], // 9
    &[6, 28, 50], // 10
    &[6, 30, 54], // 11
    &[6, 32, 58], // 12
    &[6, 34, 62], // 13
    &[6, 26, 46, 66], // 14
    &[6, 26, 48, 70], // 15
    &[6, 26, 50, 74], // 16
    &[6, 30, 54, 78], // 17
    &[6, 30, 56, 82], // 18
    &[6, 30, 58, 86], // 19
    &[6, 34, 62, 90], // 20
    &[6, 28, 50, 72, 94], // 21
    &[6, 26, 50, 74, 98], // 22
    &[6, 30, 54, 78, 102], // 23
    &[6, 28, 54, 80, 106], // 24
    &[6, 32, 58, 84, 110], // 25
    &[6, 30, 58, 86, 114], // 26
    &[6, 34, 62, 90, 118], // 27
    &[6, 26, 50, 74, 98, 122], // 28
    &[6, 30, 54, 78, 102, 126], // 29
    &[6, 26, 52, 78, 104, 130], // 30
    &[6, 30, 56, 82, 108, 134], // 31
    &[6, 34, 60, 86, 112, 138], // 32
    &[6, 30, 58, 86, 114, 142], // 33
    &[6, 34, 62, 90, 118, 146], // 34
    &[6, 30, 54, 78, 102, 126, 150], // 35
    &[6, 24, 50, 76, 102, 128, 154], // 36
    &[6, 28, 54, 80, 106, 132, 158], // 37
    &[6, 32, 58, 84, 110, 136, 162], // 38
    &[6, 26, 54, 82, 110, 138, 166], // 39
    &[6, 30, 58, 86, 114, 142, 170], // 40
];

/// 18-bit version information words (6 data bits + BCH(18,6) remainder) for versions 7–40.
static VERSION_INFO: [u32; 34] = [
    0x07C94, 0x085BC, 0x09A99, 0x0A4D3, 0x0BBF6, 0x0C762,
    0x0D847, 0x0E60D, 0x0F928, 0x10B78, 0x1145D, 0x12A17,
    0x13532, 0x149A6, 0x15683, 0x168C9, 0x177EC, 0x18EC4,
    0x191E1, 0x1AFAB, 0x1B08E, 0x1CC1A, 0x1D33F, 0x1ED75,
    0x1F250, 0x209D5, 0x216F0, 0x228BA, 0x2379F, 0x24B0B,
    0x2542E, 0x26A64, 0x27541, 0x28C69,
];

/// Returns the block layout for the given version and error correction level.
pub fn block_spec(ver: Version, ecl: QrCodeEcc) -> BlockSpec {
    BLOCK_TABLE[usize::from(ver.value()) - 1][ecl.ordinal()]
}

/// Returns the alignment pattern centre coordinates, empty for version 1.
pub fn alignment_pattern_positions(ver: Version) -> &'static [u8] {
    ALIGNMENT_PATTERN_POSITIONS[usize::from(ver.value()) - 1]
}

/// Returns the 18-bit version information word, or `None` below version 7.
pub fn version_info_bits(ver: Version) -> Option<u32> {
    ver.value()
        .checked_sub(7)
        .map(|i| VERSION_INFO[usize::from(i)])
}

/// Number of modules available for data and error correction codewords,
/// including remainder bits.
pub fn num_raw_data_modules(ver: Version) -> usize {
    let ver = usize::from(ver.value());
    let mut result: usize = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign: usize = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

/// Total codewords (data + error correction) in a symbol of this version.
pub fn num_raw_codewords(ver: Version) -> usize {
    num_raw_data_modules(ver) / 8
}

/// Number of data codewords at the given level.
pub fn num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
    block_spec(ver, ecl).data_codewords()
}

/// Finds the smallest version, starting at `minversion`, whose data capacity at `ecl`
/// holds `segs`. With `fit == false` only `minversion` is tried.
///
/// Returns the version together with the number of bits the segments occupy in it.
pub fn select_version(
    segs: &[QrSegment],
    ecl: QrCodeEcc,
    minversion: Version,
    fit: bool,
) -> Result<(Version, usize), EncodingError> {
    let maxversion = if fit { Version::MAX } else { minversion };
    let mut version: Version = minversion;
    loop {
        let capacity_bits: usize = num_data_codewords(version, ecl) * 8;
        let used: Option<usize> = QrSegment::get_total_bits(segs, version);
        match used {
            Some(n) if n <= capacity_bits => {
                debug!(
                    version = version.value(),
                    ecl = %ecl.letter(),
                    used_bits = n,
                    capacity_bits,
                    "selected QR version"
                );
                return Ok((version, n));
            }
            // Count indicator widths change at 10 and 27, so totals are recomputed per version.
            _ => match version.next().filter(|&next| next <= maxversion) {
                Some(next) => version = next,
                None => {
                    return Err(EncodingError::DataTooLarge {
                        needed_bits: used,
                        capacity_bits,
                    });
                }
            },
        }
    }
}
