//! Mask patterns, penalty scoring and format information.

use tracing::debug;

use crate::error::EncodingError;
use crate::matrix::{format_positions, Matrix, Module};
use crate::version::QrCodeEcc;

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// All eight masks in index order.
    pub const ALL: [Mask; 8] = [Mask(0), Mask(1), Mask(2), Mask(3), Mask(4), Mask(5), Mask(6), Mask(7)];

    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Creates a mask object, returning [`EncodingError::InvalidMask`] when out of range.
    pub fn try_new(mask: u8) -> Result<Self, EncodingError> {
        if mask <= 7 {
            Ok(Self(mask))
        } else {
            Err(EncodingError::InvalidMask(mask))
        }
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this mask inverts the module at column `x`, row `y`.
    pub fn inverts(self, x: usize, y: usize) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => ((x * y) % 2) + ((x * y) % 3) == 0,
            6 => (((x * y) % 2) + ((x * y) % 3)) % 2 == 0,
            7 => (((x + y) % 2) + ((x * y) % 3)) % 2 == 0,
            _ => unreachable!(),
        }
    }
}

/// The 15-bit format information word: EC level and mask, BCH(15,5) protected and XORed
/// with `0x5412`.
pub fn format_bits(ecl: QrCodeEcc, mask: Mask) -> u16 {
    let data = u32::from((ecl.format_bits() << 3) | mask.value());
    let mut rem: u32 = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    (((data << 10) | rem) ^ 0x5412) as u16
}

impl Matrix {
    /// XORs every data module with the mask pattern. Applying the same mask twice is a no-op.
    pub fn apply_mask(&mut self, mask: Mask) {
        for (x, y, module) in self.modules_mut() {
            if let Module::Data(dark) = *module {
                *module = Module::Data(dark ^ mask.inverts(x, y));
            }
        }
    }

    /// Writes both copies of the format information.
    pub fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        let bits = format_bits(ecl, mask);
        for copy in format_positions(self.size()) {
            for (i, (x, y)) in copy.into_iter().enumerate() {
                self.set(x, y, Module::Function((bits >> i) & 1 != 0));
            }
        }
    }
}

/// Total penalty of the matrix under the four standard rules.
pub fn penalty_score(matrix: &Matrix) -> u32 {
    let size = matrix.size();
    let mut result: u32 = 0;

    // Adjacent modules in row/column having same color, and finder-like patterns
    for horizontal in [true, false] {
        for a in 0..size {
            let mut runcolor = false;
            let mut runlen: i32 = 0;
            let mut runhistory = FinderPenalty::new(size);
            for b in 0..size {
                let color = if horizontal { matrix.is_dark(b, a) } else { matrix.is_dark(a, b) };
                if color == runcolor {
                    runlen += 1;
                    if runlen == 5 {
                        result += PENALTY_N1;
                    } else if runlen > 5 {
                        result += 1;
                    }
                } else {
                    runhistory.add_history(runlen);
                    if !runcolor {
                        result += runhistory.count_patterns() * PENALTY_N3;
                    }
                    runcolor = color;
                    runlen = 1;
                }
            }
            result += runhistory.terminate_and_count(runcolor, runlen) * PENALTY_N3;
        }
    }

    // 2*2 blocks of modules having same color
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let color = matrix.is_dark(x, y);
            if color == matrix.is_dark(x + 1, y)
                && color == matrix.is_dark(x, y + 1)
                && color == matrix.is_dark(x + 1, y + 1)
            {
                result += PENALTY_N2;
            }
        }
    }

    // Balance of dark and light modules
    let dark = matrix.dark_count() as i64;
    let total = (size * size) as i64;
    // Smallest k such that the dark ratio lies within (45 - 5k)% ..= (55 + 5k)%
    let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
    result += k as u32 * PENALTY_N4;
    result
}

/// Evaluates all eight masks on copies of `matrix` (format information included) and
/// returns the one with the lowest penalty. Ties go to the lowest mask index.
pub fn choose_mask(matrix: &Matrix, ecl: QrCodeEcc) -> (Mask, u32) {
    let mut best = (Mask(0), u32::MAX);
    for mask in Mask::ALL {
        let mut candidate = matrix.clone();
        candidate.apply_mask(mask);
        candidate.draw_format_bits(ecl, mask);
        let penalty = penalty_score(&candidate);
        if penalty < best.1 {
            best = (mask, penalty);
        }
    }
    debug!(mask = best.0.value(), penalty = best.1, "selected mask");
    best
}

/// Applies `mask` (or the best mask when `None`) and writes the format information.
pub fn finalize(mut matrix: Matrix, ecl: QrCodeEcc, mask: Option<Mask>) -> (Matrix, Mask) {
    let mask = mask.unwrap_or_else(|| choose_mask(&matrix, ecl).0);
    matrix.apply_mask(mask);
    matrix.draw_format_bits(ecl, mask);
    (matrix, mask)
}

/// Run-length history of the last seven runs in a row or column, used to detect
/// 1:1:3:1:1 finder-like patterns with four light modules on one side.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: usize) -> Self {
        Self {
            qr_size: size as i32,
            run_history: [0; 7],
        }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        // Add light border to initial run
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size;
        }
        let len: usize = self.run_history.len();
        self.run_history.copy_within(0..len - 1, 1);
        self.run_history[0] = currentrunlength;
    }

    fn count_patterns(&self) -> u32 {
        let rh = &self.run_history;
        let n = rh[1];
        u32::from(
            n > 0
                && rh[2] == n
                && rh[3] == n * 3
                && rh[4] == n
                && rh[5] == n
                && (rh[0] >= n * 4 || rh[6] >= n * 4),
        )
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> u32 {
        // Terminate dark run first
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        // Add light border to final run
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}
