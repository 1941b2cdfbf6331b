//! Reed-Solomon error correction over GF(256) and block interleaving.

use std::sync::OnceLock;

use crate::error::EncodingError;
use crate::version::{block_spec, num_raw_codewords, QrCodeEcc, Version};

/// Primitive polynomial x^8 + x^4 + x^3 + x^2 + 1.
const GF_POLY: u16 = 0x11d;

/// Largest ECC codeword count per block used by any version.
const MAX_DEGREE: usize = 30;

const fn build_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= GF_POLY;
        }
        i += 1;
    }
    exp[255] = exp[0];
    (exp, log)
}

const TABLES: ([u8; 256], [u8; 256]) = build_tables();
static EXP_TABLE: [u8; 256] = TABLES.0;
static LOG_TABLE: [u8; 256] = TABLES.1;

/// Multiplication in GF(256).
pub fn gf_mul(x: u8, y: u8) -> u8 {
    if x == 0 || y == 0 {
        return 0;
    }
    let sum = usize::from(LOG_TABLE[usize::from(x)]) + usize::from(LOG_TABLE[usize::from(y)]);
    EXP_TABLE[sum % 255]
}

/// α^n in GF(256).
pub fn gf_exp(n: usize) -> u8 {
    EXP_TABLE[n % 255]
}

static GENERATORS: OnceLock<Vec<Vec<u8>>> = OnceLock::new();

/// Coefficients of ∏(x − α^i) for i in 0..degree, highest power first, leading 1 omitted.
fn generator(degree: usize) -> &'static [u8] {
    let all = GENERATORS.get_or_init(|| (0..=MAX_DEGREE).map(compute_generator).collect());
    &all[degree]
}

fn compute_generator(degree: usize) -> Vec<u8> {
    let mut divisor = vec![0u8; degree];
    if degree == 0 {
        return divisor;
    }
    divisor[degree - 1] = 1;
    let mut root: u8 = 1;
    for _ in 0..degree {
        for j in 0..degree {
            divisor[j] = gf_mul(divisor[j], root);
            if j + 1 < degree {
                divisor[j] ^= divisor[j + 1];
            }
        }
        root = gf_mul(root, 0x02);
    }
    divisor
}

/// Computes error correction codewords for one block.
#[derive(Clone, Copy, Debug)]
pub struct ReedSolomonGenerator {
    divisor: &'static [u8],
}

impl ReedSolomonGenerator {
    /// # Panics
    ///
    /// Panics if `degree` is not in 1..=30.
    pub fn new(degree: usize) -> Self {
        assert!((1..=MAX_DEGREE).contains(&degree), "Degree out of range");
        Self {
            divisor: generator(degree),
        }
    }

    pub fn degree(&self) -> usize {
        self.divisor.len()
    }

    /// Remainder of `data(x) · x^degree` divided by the generator polynomial.
    pub fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree()];
        for &b in data {
            let factor: u8 = b ^ result[0];
            result.copy_within(1.., 0);
            if let Some(last) = result.last_mut() {
                *last = 0;
            }
            for (x, &y) in result.iter_mut().zip(self.divisor) {
                *x ^= gf_mul(y, factor);
            }
        }
        result
    }
}

/// One error correction block: its data codewords and the ECC codewords computed from them.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CodewordBlock {
    pub data: Vec<u8>,
    pub ecc: Vec<u8>,
}

/// Splits the data codewords into the blocks defined for (`ver`, `ecl`) and computes the
/// ECC codewords of each.
///
/// # Errors
///
/// Returns [`EncodingError::InternalInvariant`] if the block table disagrees with the
/// version's codeword capacity or `data` is not exactly the data capacity.
pub fn split_blocks(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Result<Vec<CodewordBlock>, EncodingError> {
    let spec = block_spec(ver, ecl);
    if spec.total_codewords() != num_raw_codewords(ver) {
        return Err(EncodingError::invariant(format!(
            "block table for version {} level {:?} holds {} codewords, symbol holds {}",
            ver.value(),
            ecl,
            spec.total_codewords(),
            num_raw_codewords(ver)
        )));
    }
    if data.len() != spec.data_codewords() {
        return Err(EncodingError::invariant(format!(
            "got {} data codewords, version {} level {:?} needs {}",
            data.len(),
            ver.value(),
            ecl,
            spec.data_codewords()
        )));
    }

    let rs = ReedSolomonGenerator::new(usize::from(spec.ecc_per_block));
    let mut rest: &[u8] = data;
    let blocks = spec
        .block_data_lengths()
        .map(|len| {
            let (dat, tail) = rest.split_at(len);
            rest = tail;
            CodewordBlock {
                data: dat.to_vec(),
                ecc: rs.compute_remainder(dat),
            }
        })
        .collect();
    debug_assert!(rest.is_empty());
    Ok(blocks)
}

/// Interleaves blocks: data codeword i of every block in block order for each i, skipping
/// blocks that are too short, followed by ECC codeword i of every block.
pub fn interleave(blocks: &[CodewordBlock]) -> Vec<u8> {
    let total: usize = blocks.iter().map(|b| b.data.len() + b.ecc.len()).sum();
    let mut result = Vec::with_capacity(total);
    let maxdata = blocks.iter().map(|b| b.data.len()).max().unwrap_or(0);
    for i in 0..maxdata {
        result.extend(blocks.iter().filter_map(|b| b.data.get(i)));
    }
    let maxecc = blocks.iter().map(|b| b.ecc.len()).max().unwrap_or(0);
    for i in 0..maxecc {
        result.extend(blocks.iter().filter_map(|b| b.ecc.get(i)));
    }
    result
}

/// Returns the final codeword sequence for the given data codewords.
pub fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Result<Vec<u8>, EncodingError> {
    let blocks = split_blocks(data, ver, ecl)?;
    let result = interleave(&blocks);
    if result.len() != num_raw_codewords(ver) {
        return Err(EncodingError::invariant(format!(
            "interleaved {} codewords, version {} holds {}",
            result.len(),
            ver.value(),
            num_raw_codewords(ver)
        )));
    }
    Ok(result)
}
