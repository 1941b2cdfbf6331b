//! Serializes segments into the padded data codeword sequence.

use crate::error::EncodingError;
use crate::segment::{BitBuffer, QrSegment};
use crate::version::{num_data_codewords, QrCodeEcc, Version};

/// First pad codeword; pad bytes alternate `0xEC, 0x11` until capacity is reached.
pub const PAD_BYTES: [u8; 2] = [0xec, 0x11];

/// Concatenates mode indicators, character counts and payloads of `segs`, then adds the
/// terminator, bit padding and pad codewords.
///
/// The result holds exactly `num_data_codewords(version, ecl)` bytes.
///
/// # Errors
///
/// Returns [`EncodingError::DataTooLarge`] if the segments do not fit.
pub fn build_data_codewords(
    segs: &[QrSegment],
    version: Version,
    ecl: QrCodeEcc,
) -> Result<Vec<u8>, EncodingError> {
    let datacapacitybits: usize = num_data_codewords(version, ecl) * 8;
    let datausedbits = QrSegment::get_total_bits(segs, version)
        .filter(|&n| n <= datacapacitybits)
        .ok_or(EncodingError::DataTooLarge {
            needed_bits: QrSegment::get_total_bits(segs, version),
            capacity_bits: datacapacitybits,
        })?;

    let mut bb = BitBuffer::with_capacity_bits(datacapacitybits);
    for seg in segs {
        bb.append_bits(seg.mode().mode_bits(), 4);
        bb.append_bits(seg.num_chars() as u32, seg.mode().num_char_count_bits(version));
        for bit in seg.bits() {
            bb.append_bits(u32::from(bit), 1);
        }
    }
    debug_assert_eq!(bb.len(), datausedbits);

    // Add terminator and pad up to a byte if applicable
    let numzerobits: usize = core::cmp::min(4, datacapacitybits - bb.len());
    bb.append_bits(0, numzerobits as u8);
    let numzerobits: usize = bb.len().wrapping_neg() & 7;
    bb.append_bits(0, numzerobits as u8);
    debug_assert_eq!(bb.len() % 8, 0);

    // Pad with alternating bytes until data capacity is reached
    for &padbyte in PAD_BYTES.iter().cycle() {
        if bb.len() >= datacapacitybits {
            break;
        }
        bb.append_bits(padbyte.into(), 8);
    }

    let codewords = bb.into_bytes();
    if codewords.len() * 8 != datacapacitybits {
        return Err(EncodingError::invariant(format!(
            "data stream is {} codewords, expected {}",
            codewords.len(),
            datacapacitybits / 8
        )));
    }
    Ok(codewords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::make_segments;

    #[test]
    fn test_hello_world_1m_data_codewords() {
        let segs = make_segments("HELLO WORLD").unwrap();
        let data = build_data_codewords(&segs, Version::new(1), QrCodeEcc::Medium).unwrap();
        assert_eq!(
            data,
            vec![32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236, 17, 236, 17]
        );
    }

    #[test]
    fn test_numeric_stream() {
        // 0001 0000001000 0000001100 0101011001 1000011 + terminator, pad
        let segs = make_segments("01234567").unwrap();
        let data = build_data_codewords(&segs, Version::new(1), QrCodeEcc::Medium).unwrap();
        assert_eq!(
            data,
            vec![0x10, 0x20, 0x0c, 0x56, 0x61, 0x80, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11]
        );
    }

    #[test]
    fn test_terminator_truncated_at_capacity() {
        // 17 bytes at 1-L use 4 + 8 + 136 = 148 of 152 bits: the full terminator fits exactly
        let segs = [QrSegment::make_bytes(&[0xff; 17])];
        let data = build_data_codewords(&segs, Version::new(1), QrCodeEcc::Low).unwrap();
        assert_eq!(data.len(), 19);
        assert_eq!(data[0], 0x41);
        assert_eq!(data[18], 0xf0);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let segs = [QrSegment::make_bytes(&[0u8; 18])];
        let err = build_data_codewords(&segs, Version::new(1), QrCodeEcc::Low).unwrap_err();
        assert_eq!(
            err,
            EncodingError::DataTooLarge { needed_bits: Some(4 + 8 + 144), capacity_bits: 152 }
        );
    }
}
