//! The module grid: function patterns and codeword placement.

use crate::error::EncodingError;
use crate::version::{alignment_pattern_positions, num_raw_codewords, version_info_bits, Version};

/// State of one module in the grid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Module {
    /// Not yet assigned. Only present while the matrix is under construction.
    Empty,
    /// Part of a finder, separator, timing, alignment or version pattern, or the dark module.
    Function(bool),
    /// Set aside for format information, which is written after mask selection.
    Reserved,
    /// Carries data or error correction bits (or remainder bits). Subject to masking.
    Data(bool),
}

impl Module {
    pub fn is_dark(self) -> bool {
        matches!(self, Module::Function(true) | Module::Data(true))
    }

    /// `true` for every module that masking must leave alone.
    pub fn is_function(self) -> bool {
        matches!(self, Module::Function(_) | Module::Reserved)
    }
}

/// A square grid of modules for one symbol version. `x` is the column, `y` the row.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Matrix {
    version: Version,
    size: usize,
    modules: Vec<Module>,
}

impl Matrix {
    /// An empty grid with every module [`Module::Empty`].
    pub fn new(version: Version) -> Self {
        let size = version.size();
        Self {
            version,
            size,
            modules: vec![Module::Empty; size * size],
        }
    }

    /// A grid with all function patterns drawn and the format areas reserved.
    pub fn with_function_patterns(version: Version) -> Self {
        let mut matrix = Self::new(version);
        matrix.draw_function_patterns();
        matrix
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// # Panics
    ///
    /// Panics if `x` or `y` is outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Module {
        assert!(x < self.size && y < self.size, "module out of range");
        self.modules[y * self.size + x]
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_dark()
    }

    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_function()
    }

    /// Modules of row `y`, left to right.
    pub fn row(&self, y: usize) -> &[Module] {
        &self.modules[y * self.size..(y + 1) * self.size]
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|m| m.is_dark()).count()
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, module: Module) {
        assert!(x < self.size && y < self.size, "module out of range");
        self.modules[y * self.size + x] = module;
    }

    fn set_function_unbounded(&mut self, x: i32, y: i32, isdark: bool) {
        let range = 0..self.size as i32;
        if range.contains(&x) && range.contains(&y) {
            self.set(x as usize, y as usize, Module::Function(isdark));
        }
    }

    pub(crate) fn modules_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut Module)> {
        let size = self.size;
        self.modules
            .iter_mut()
            .enumerate()
            .map(move |(i, m)| (i % size, i / size, m))
    }

    fn draw_function_patterns(&mut self) {
        let size = self.size;
        for i in 0..size {
            self.set(6, i, Module::Function(i % 2 == 0));
            self.set(i, 6, Module::Function(i % 2 == 0));
        }

        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size as i32 - 4, 3);
        self.draw_finder_pattern(3, size as i32 - 4);

        let alignpatpos = alignment_pattern_positions(self.version);
        let numalign = alignpatpos.len();
        for (i, &pos0) in alignpatpos.iter().enumerate() {
            for (j, &pos1) in alignpatpos.iter().enumerate() {
                // The three corners overlap finder patterns
                if (i == 0 && j == 0) || (i == 0 && j == numalign - 1) || (i == numalign - 1 && j == 0) {
                    continue;
                }
                self.draw_alignment_pattern(usize::from(pos0), usize::from(pos1));
            }
        }

        self.reserve_format_areas();
        self.draw_version_info();
    }

    /// Finder pattern centred at (x, y) together with its light separator.
    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let dist: i32 = dx.abs().max(dy.abs());
                self.set_function_unbounded(x + dx, y + dy, dist != 2 && dist != 4);
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: usize, y: usize) {
        for dy in 0..5usize {
            for dx in 0..5usize {
                let dist = dx.abs_diff(2).max(dy.abs_diff(2));
                self.set(x + dx - 2, y + dy - 2, Module::Function(dist != 1));
            }
        }
    }

    fn reserve_format_areas(&mut self) {
        let size = self.size;
        for (x, y) in format_positions(size).into_iter().flatten() {
            self.set(x, y, Module::Reserved);
        }
        // Always dark
        self.set(8, size - 8, Module::Function(true));
    }

    fn draw_version_info(&mut self) {
        let Some(bits) = version_info_bits(self.version) else {
            return;
        };
        let size = self.size;
        for i in 0..18 {
            let bit = (bits >> i) & 1 != 0;
            let a = size - 11 + i % 3;
            let b = i / 3;
            self.set(a, b, Module::Function(bit));
            self.set(b, a, Module::Function(bit));
        }
    }

    /// Places `data` (the interleaved codewords) into the data region, MSB first, in the
    /// standard two-column zig-zag order. Modules left over afterwards are remainder bits
    /// and become light data modules.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::InternalInvariant`] if `data` does not match the version's
    /// codeword count or the data region.
    pub fn draw_codewords(&mut self, data: &[u8]) -> Result<(), EncodingError> {
        if data.len() != num_raw_codewords(self.version) {
            return Err(EncodingError::invariant(format!(
                "{} codewords supplied, version {} holds {}",
                data.len(),
                self.version.value(),
                num_raw_codewords(self.version)
            )));
        }
        let size = self.size;
        let totalbits = data.len() * 8;
        let mut i: usize = 0;
        let mut right: usize = size - 1;
        loop {
            // Skip the vertical timing pattern
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..size {
                let y = if upward { size - 1 - vert } else { vert };
                for j in 0..2 {
                    let x = right - j;
                    if self.get(x, y) != Module::Empty {
                        continue;
                    }
                    let bit = i < totalbits && (data[i >> 3] >> (7 - (i & 7))) & 1 != 0;
                    self.set(x, y, Module::Data(bit));
                    i += 1;
                }
            }
            if right < 2 {
                break;
            }
            right -= 2;
        }
        if i < totalbits || i - totalbits >= 8 {
            return Err(EncodingError::invariant(format!(
                "data region has {} modules for {} codeword bits",
                i, totalbits
            )));
        }
        Ok(())
    }
}

/// Coordinates of the 15 format bits, both copies, indexed by bit position (bit 0 = LSB).
pub(crate) fn format_positions(size: usize) -> [[(usize, usize); 15]; 2] {
    let mut first = [(0, 0); 15];
    let mut second = [(0, 0); 15];
    for i in 0..15 {
        first[i] = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        second[i] = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
    }
    [first, second]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::num_raw_data_modules;

    #[test]
    fn test_data_region_matches_raw_module_count() {
        for ver in Version::MIN.up_to_max() {
            let matrix = Matrix::with_function_patterns(ver);
            let empty = (0..matrix.size())
                .flat_map(|y| matrix.row(y).iter())
                .filter(|&&m| m == Module::Empty)
                .count();
            assert_eq!(empty, num_raw_data_modules(ver), "version {}", ver.value());
        }
    }

    #[test]
    fn test_finder_patterns_at_three_corners() {
        let matrix = Matrix::with_function_patterns(Version::new(1));
        let size = matrix.size();
        for (cx, cy) in [(3, 3), (size - 4, 3), (3, size - 4)] {
            assert!(matrix.is_dark(cx, cy));
            assert!(matrix.is_dark(cx - 3, cy - 3));
            assert!(!matrix.is_dark(cx - 2, cy - 2));
            assert!(matrix.is_dark(cx - 1, cy + 1));
        }
        // separators
        assert_eq!(matrix.get(7, 7), Module::Function(false));
        assert_eq!(matrix.get(size - 8, 0), Module::Function(false));
        assert_eq!(matrix.get(0, size - 8), Module::Function(false));
        // no finder at the bottom-right
        assert_eq!(matrix.get(size - 1, size - 1), Module::Empty);
    }

    #[test]
    fn test_timing_and_dark_module() {
        let matrix = Matrix::with_function_patterns(Version::new(3));
        let size = matrix.size();
        for i in 8..size - 8 {
            assert_eq!(matrix.get(6, i), Module::Function(i % 2 == 0));
            assert_eq!(matrix.get(i, 6), Module::Function(i % 2 == 0));
        }
        assert_eq!(matrix.get(8, size - 8), Module::Function(true));
        assert_eq!(matrix.get(8, 0), Module::Reserved);
        assert_eq!(matrix.get(size - 1, 8), Module::Reserved);
    }

    #[test]
    fn test_alignment_pattern_version_2() {
        let matrix = Matrix::with_function_patterns(Version::new(2));
        assert_eq!(matrix.get(18, 18), Module::Function(true));
        assert_eq!(matrix.get(17, 17), Module::Function(false));
        assert_eq!(matrix.get(16, 16), Module::Function(true));
        assert_eq!(matrix.get(20, 18), Module::Function(true));
    }

    #[test]
    fn test_version_info_blocks() {
        let matrix = Matrix::with_function_patterns(Version::new(7));
        let size = matrix.size();
        // 0x07C94: bit 0 is 0, bit 2 is 1
        assert_eq!(matrix.get(size - 11, 0), Module::Function(false));
        assert_eq!(matrix.get(size - 9, 0), Module::Function(true));
        assert_eq!(matrix.get(0, size - 9), Module::Function(true));
        assert_eq!(matrix.get(5, size - 9), Module::Function(false));
    }

    #[test]
    fn test_draw_codewords_fills_data_region() {
        let ver = Version::new(2);
        let mut matrix = Matrix::with_function_patterns(ver);
        let data = vec![0xffu8; num_raw_codewords(ver)];
        matrix.draw_codewords(&data).unwrap();
        let data_modules: Vec<Module> = (0..matrix.size())
            .flat_map(|y| matrix.row(y).iter().copied())
            .filter(|m| matches!(m, Module::Data(_) | Module::Empty))
            .collect();
        assert!(!data_modules.contains(&Module::Empty));
        // 7 remainder bits at version 2
        assert_eq!(data_modules.iter().filter(|&&m| m == Module::Data(false)).count(), 7);
        // first bit lands in the bottom-right corner
        let last = matrix.size() - 1;
        assert_eq!(matrix.get(last, last), Module::Data(true));
    }
}
