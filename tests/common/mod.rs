//! A small reference reader for generated symbols.
//!
//! It reconstructs everything from the module grid alone: format and version information,
//! the function pattern layout, unmasking, de-interleaving, a Reed-Solomon syndrome check
//! per block, segment parsing and pad verification. Only the block layout table is taken
//! from the library.

#![allow(dead_code)]

use qrcraft::version::block_spec;
use qrcraft::{QrCode, QrCodeEcc, Version};

#[derive(Debug)]
pub struct Decoded {
    pub version: u8,
    pub ecl: QrCodeEcc,
    pub mask: u8,
    /// (mode indicator, character count) per segment
    pub segments: Vec<(u8, usize)>,
    pub payload: Vec<u8>,
}

impl Decoded {
    pub fn text(&self) -> String {
        String::from_utf8(self.payload.clone()).expect("payload is not UTF-8")
    }
}

fn format_word(data: u32) -> u32 {
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

fn version_word(ver: u32) -> u32 {
    let mut rem = ver;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
    }
    (ver << 12) | rem
}

fn gf_mul(x: u8, y: u8) -> u8 {
    let mut z: u8 = 0;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * 0x1d);
        z ^= ((y >> i) & 1) * x;
    }
    z
}

fn alignment_centers(ver: usize) -> Vec<usize> {
    if ver == 1 {
        return Vec::new();
    }
    let size = ver * 4 + 17;
    let numalign = ver / 7 + 2;
    let step = if ver == 32 {
        26
    } else {
        (ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2) * 2
    };
    let mut result: Vec<usize> = (0..numalign - 1).map(|i| size - 7 - i * step).collect();
    result.push(6);
    result.reverse();
    result
}

fn function_mask(ver: usize) -> Vec<Vec<bool>> {
    let size = ver * 4 + 17;
    let mut f = vec![vec![false; size]; size];
    for y in 0..size {
        for x in 0..size {
            let top_left = x <= 8 && y <= 8;
            let top_right = x >= size - 8 && y <= 8;
            let bottom_left = x <= 8 && y >= size - 8;
            let timing = x == 6 || y == 6;
            let version = ver >= 7 && ((x >= size - 11 && y < 6) || (y >= size - 11 && x < 6));
            f[y][x] = top_left || top_right || bottom_left || timing || version;
        }
    }
    let centers = alignment_centers(ver);
    for &cy in &centers {
        for &cx in &centers {
            let overlaps_finder = (cx < 9 && cy < 9) || (cx > size - 9 && cy < 9) || (cx < 9 && cy > size - 9);
            if overlaps_finder {
                continue;
            }
            for y in cy - 2..=cy + 2 {
                for x in cx - 2..=cx + 2 {
                    f[y][x] = true;
                }
            }
        }
    }
    f
}

fn mask_hit(mask: u8, row: usize, col: usize) -> bool {
    match mask {
        0 => (row + col) % 2 == 0,
        1 => row % 2 == 0,
        2 => col % 3 == 0,
        3 => (row + col) % 3 == 0,
        4 => (row / 2 + col / 3) % 2 == 0,
        5 => (row * col) % 2 + (row * col) % 3 == 0,
        6 => ((row * col) % 2 + (row * col) % 3) % 2 == 0,
        _ => ((row + col) % 2 + (row * col) % 3) % 2 == 0,
    }
}

fn count_bits(mode: u8, ver: usize) -> usize {
    let idx = match ver {
        1..=9 => 0,
        10..=26 => 1,
        _ => 2,
    };
    match mode {
        1 => [10, 12, 14][idx],
        2 => [9, 11, 13][idx],
        _ => [8, 16, 16][idx],
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl BitReader<'_> {
    fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.pos
    }

    fn read(&mut self, n: usize) -> Result<u32, String> {
        if n > self.remaining() {
            return Err(format!("bit stream ended at {} reading {n} bits", self.pos));
        }
        let mut v = 0u32;
        for _ in 0..n {
            let bit = (self.bytes[self.pos / 8] >> (7 - self.pos % 8)) & 1;
            v = (v << 1) | u32::from(bit);
            self.pos += 1;
        }
        Ok(v)
    }
}

const ALNUM: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

pub fn decode(qr: &QrCode) -> Result<Decoded, String> {
    let size = qr.size() as usize;
    if size < 21 || (size - 17) % 4 != 0 {
        return Err(format!("bad size {size}"));
    }
    let ver = (size - 17) / 4;
    let dark = |x: usize, y: usize| qr.get_module(x as i32, y as i32);

    // Format information, both copies
    let mut first = 0u32;
    let mut second = 0u32;
    for i in 0..15 {
        let (x, y) = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        first |= u32::from(dark(x, y)) << i;
        let (x, y) = if i < 8 { (size - 1 - i, 8) } else { (8, size - 15 + i) };
        second |= u32::from(dark(x, y)) << i;
    }
    if first != second {
        return Err(format!("format copies differ: {first:015b} vs {second:015b}"));
    }
    let fdata = (0..32)
        .find(|&d| format_word(d) == first)
        .ok_or_else(|| format!("format word {first:015b} is not a codeword"))?;
    let ecl = match fdata >> 3 {
        1 => QrCodeEcc::Low,
        0 => QrCodeEcc::Medium,
        3 => QrCodeEcc::Quartile,
        _ => QrCodeEcc::High,
    };
    let mask = (fdata & 7) as u8;

    if !dark(8, size - 8) {
        return Err("dark module missing".into());
    }
    for i in 8..size - 8 {
        if dark(i, 6) != (i % 2 == 0) || dark(6, i) != (i % 2 == 0) {
            return Err(format!("timing pattern broken at {i}"));
        }
    }
    if ver >= 7 {
        let expected = version_word(ver as u32);
        for i in 0..18 {
            let bit = (expected >> i) & 1 != 0;
            let (a, b) = (size - 11 + i % 3, i / 3);
            if dark(a, b) != bit || dark(b, a) != bit {
                return Err(format!("version information bit {i} wrong"));
            }
        }
    }

    // Read data modules in placement order and unmask
    let func = function_mask(ver);
    let mut bits = Vec::new();
    let mut right = size - 1;
    loop {
        if right == 6 {
            right = 5;
        }
        let upward = ((right + 1) & 2) == 0;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for j in 0..2 {
                let x = right - j;
                if !func[y][x] {
                    bits.push(dark(x, y) ^ mask_hit(mask, y, x));
                }
            }
        }
        if right < 2 {
            break;
        }
        right -= 2;
    }
    let raw: Vec<u8> = bits
        .chunks_exact(8)
        .map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | u8::from(b)))
        .collect();

    // De-interleave
    let spec = block_spec(Version::new(ver as u8), ecl);
    let lens: Vec<usize> = std::iter::repeat(usize::from(spec.group1_data))
        .take(usize::from(spec.group1_blocks))
        .chain(std::iter::repeat(usize::from(spec.group2_data)).take(usize::from(spec.group2_blocks)))
        .collect();
    let eccn = usize::from(spec.ecc_per_block);
    let total: usize = lens.iter().map(|l| l + eccn).sum();
    if total != raw.len() {
        return Err(format!("block layout holds {total} codewords, symbol has {}", raw.len()));
    }
    let mut blocks: Vec<Vec<u8>> = lens.iter().map(|&l| Vec::with_capacity(l + eccn)).collect();
    let mut it = raw.iter().copied();
    let maxlen = lens.iter().copied().max().unwrap_or(0);
    for i in 0..maxlen {
        for (b, &l) in blocks.iter_mut().zip(&lens) {
            if i < l {
                b.push(it.next().ok_or("ran out of codewords")?);
            }
        }
    }
    for _ in 0..eccn {
        for b in blocks.iter_mut() {
            b.push(it.next().ok_or("ran out of codewords")?);
        }
    }

    // Every block must evaluate to zero at the generator roots
    let mut data = Vec::new();
    for (bi, (block, &l)) in blocks.iter().zip(&lens).enumerate() {
        let mut root = 1u8;
        for r in 0..eccn {
            let syndrome = block.iter().fold(0u8, |acc, &c| gf_mul(acc, root) ^ c);
            if syndrome != 0 {
                return Err(format!("block {bi} syndrome {r} is {syndrome}"));
            }
            root = gf_mul(root, 2);
        }
        data.extend_from_slice(&block[..l]);
    }

    // Segments
    let mut reader = BitReader { bytes: &data, pos: 0 };
    let mut segments = Vec::new();
    let mut payload = Vec::new();
    while reader.remaining() >= 4 {
        let mode = reader.read(4)? as u8;
        if mode == 0 {
            break;
        }
        let count = reader.read(count_bits(mode, ver))? as usize;
        match mode {
            1 => {
                let mut left = count;
                while left > 0 {
                    let (n, w) = match left {
                        1 => (1, 4),
                        2 => (2, 7),
                        _ => (3, 10),
                    };
                    let v = reader.read(w)?;
                    payload.extend(format!("{v:0n$}").bytes());
                    left -= n;
                }
            }
            2 => {
                let mut left = count;
                while left > 0 {
                    if left >= 2 {
                        let v = reader.read(11)? as usize;
                        payload.push(ALNUM[v / 45]);
                        payload.push(ALNUM[v % 45]);
                        left -= 2;
                    } else {
                        payload.push(ALNUM[reader.read(6)? as usize]);
                        left -= 1;
                    }
                }
            }
            4 => {
                for _ in 0..count {
                    payload.push(reader.read(8)? as u8);
                }
            }
            other => return Err(format!("unexpected mode indicator {other:04b}")),
        }
        segments.push((mode, count));
    }

    // Zero bits up to the byte boundary, then alternating pad codewords
    let pad_start = (reader.pos + 7) / 8;
    while reader.pos < pad_start * 8 {
        if reader.read(1)? != 0 {
            return Err("non-zero terminator or bit padding".into());
        }
    }
    for (i, &b) in data[pad_start..].iter().enumerate() {
        let expected = if i % 2 == 0 { 0xec } else { 0x11 };
        if b != expected {
            return Err(format!("pad codeword {i} is {b:#04x}"));
        }
    }

    Ok(Decoded {
        version: ver as u8,
        ecl,
        mask,
        segments,
        payload,
    })
}
