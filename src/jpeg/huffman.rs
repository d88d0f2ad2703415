//! JPEG Huffman tables.
//!
//! Holds the standard tables from ITU T.81 Annex K.3 for single-pass
//! encoding, and builds image-optimal, length-limited tables from pass-one
//! symbol counts (Annex K.2) for two-pass encoding.

/// Longest code length allowed by baseline JPEG.
pub const MAX_CODE_LEN: usize = 16;

/// Number of DC symbols (difference categories 0-11).
pub const DC_TABLE_LEN: usize = 12;

/// Number of AC symbols (run/size bytes).
pub const AC_TABLE_LEN: usize = 256;

/// Standard DC luminance Huffman table (number of codes per bit length).
const DC_LUM_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];

/// Standard DC luminance Huffman values.
const DC_LUM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard DC chrominance Huffman table.
const DC_CHROM_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];

/// Standard DC chrominance Huffman values.
const DC_CHROM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard AC luminance Huffman table.
const AC_LUM_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125];

/// Standard AC luminance Huffman values.
const AC_LUM_VALS: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Standard AC chrominance Huffman table.
const AC_CHROM_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 119];

/// Standard AC chrominance Huffman values.
const AC_CHROM_VALS: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// One Huffman table: symbol codes, the DHT description, and pass-one
/// symbol counts.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Code for each symbol (valid where `code_sizes` is non-zero).
    pub codes: [u32; 256],
    /// Code length in bits for each symbol; 0 if the symbol is unused.
    pub code_sizes: [u8; 256],
    /// Number of codes of each length; index 0 unused.
    pub bits: [u8; 17],
    /// Symbols ordered by code length, then symbol value.
    pub val: [u8; 256],
    /// Pass-one symbol frequencies.
    pub count: [u32; 256],
}

impl Default for HuffmanTable {
    fn default() -> Self {
        Self {
            codes: [0; 256],
            code_sizes: [0; 256],
            bits: [0; 17],
            val: [0; 256],
            count: [0; 256],
        }
    }
}

impl HuffmanTable {
    /// Build a table from a DHT-style description (counts per length 1-16
    /// plus the value list).
    pub fn from_spec(bits: &[u8; 16], vals: &[u8]) -> Self {
        let mut table = Self::default();
        table.bits[1..].copy_from_slice(bits);
        table.val[..vals.len()].copy_from_slice(vals);
        table.compute();
        table
    }

    /// Number of symbols with a code.
    pub fn num_values(&self) -> usize {
        self.bits[1..].iter().map(|&b| b as usize).sum()
    }

    /// Counts per code length 1-16, as written to DHT.
    pub fn dht_bits(&self) -> &[u8] {
        &self.bits[1..]
    }

    /// Symbol list, as written to DHT.
    pub fn dht_values(&self) -> &[u8] {
        &self.val[..self.num_values()]
    }

    /// Code and length for `symbol`.
    #[inline]
    pub fn code(&self, symbol: u8) -> (u32, u32) {
        (
            self.codes[symbol as usize],
            self.code_sizes[symbol as usize] as u32,
        )
    }

    /// Count one occurrence of `symbol`.
    #[inline]
    pub fn record(&mut self, symbol: u8) {
        let c = &mut self.count[symbol as usize];
        *c = c.saturating_add(1);
    }

    /// Assign canonical codes from `bits` and `val`: shorter codes first,
    /// and within one length in `val` order.
    pub fn compute(&mut self) {
        self.codes = [0; 256];
        self.code_sizes = [0; 256];

        let mut code = 0u32;
        let mut k = 0usize;
        for len in 1..=MAX_CODE_LEN {
            for _ in 0..self.bits[len] {
                let symbol = self.val[k] as usize;
                self.codes[symbol] = code;
                self.code_sizes[symbol] = len as u8;
                code += 1;
                k += 1;
            }
            code <<= 1;
        }
    }

    /// Replace `bits`/`val` with an optimal length-limited code for the
    /// first `table_len` symbols of `count`, then recompute codes.
    ///
    /// A reserved pseudo-symbol with frequency 1 takes part in the merge so
    /// that no real symbol gets the all-ones code. When two candidates have
    /// equal frequency the higher symbol index is merged first.
    pub fn optimize(&mut self, table_len: usize) {
        const PSEUDO: usize = 256;

        let table_len = table_len.min(AC_TABLE_LEN);
        let mut freq = [0u64; 257];
        for (f, &c) in freq.iter_mut().zip(&self.count[..table_len]) {
            *f = c as u64;
        }
        freq[PSEUDO] = 1;

        let mut codesize = [0usize; 257];
        let mut others = [usize::MAX; 257];

        loop {
            // c1: least frequency, c2: next least. `<=` lets later symbols win ties.
            let mut c1 = None;
            let mut c2 = None;
            let mut v1 = u64::MAX;
            let mut v2 = u64::MAX;
            for (i, &f) in freq.iter().enumerate() {
                if f == 0 {
                    continue;
                }
                if f <= v1 {
                    c2 = c1;
                    v2 = v1;
                    c1 = Some(i);
                    v1 = f;
                } else if f <= v2 {
                    c2 = Some(i);
                    v2 = f;
                }
            }

            let (Some(c1), Some(c2)) = (c1, c2) else {
                break;
            };

            freq[c1] += freq[c2];
            freq[c2] = 0;

            codesize[c1] += 1;
            let mut node = c1;
            while others[node] != usize::MAX {
                node = others[node];
                codesize[node] += 1;
            }
            others[node] = c2;

            codesize[c2] += 1;
            let mut node = c2;
            while others[node] != usize::MAX {
                node = others[node];
                codesize[node] += 1;
            }
        }

        // Histogram of unlimited lengths. A tree over 257 leaves is at most 256 deep.
        let mut bits = [0u32; 257];
        let mut max_len = 0;
        for &size in codesize.iter().filter(|&&s| s > 0) {
            bits[size] += 1;
            max_len = max_len.max(size);
        }

        // Fold every code longer than 16 bits back into the tree.
        for i in (MAX_CODE_LEN + 1..=max_len).rev() {
            while bits[i] > 0 {
                let mut j = i - 2;
                while j > 0 && bits[j] == 0 {
                    j -= 1;
                }
                if j == 0 {
                    break;
                }
                bits[i] -= 2;
                bits[i - 1] += 1;
                bits[j + 1] += 2;
                bits[j] -= 1;
            }
        }

        // Drop the pseudo-symbol from the longest length.
        if let Some(i) = (1..=MAX_CODE_LEN).rev().find(|&i| bits[i] > 0) {
            bits[i] -= 1;
        }

        self.bits = [0; 17];
        for len in 1..=MAX_CODE_LEN {
            self.bits[len] = bits[len] as u8;
        }

        let mut k = 0;
        for size in 1..=max_len {
            for (symbol, _) in codesize[..table_len]
                .iter()
                .enumerate()
                .filter(|&(_, &s)| s == size)
            {
                self.val[k] = symbol as u8;
                k += 1;
            }
        }

        self.compute();
    }
}

/// Class index of a table: luma or chroma.
pub const LUMA: usize = 0;
/// See [`LUMA`].
pub const CHROMA: usize = 1;

/// DC and AC tables for both component classes.
#[derive(Debug, Clone)]
pub struct HuffmanTables {
    /// DC tables, indexed by class.
    pub dc: [HuffmanTable; 2],
    /// AC tables, indexed by class.
    pub ac: [HuffmanTable; 2],
}

impl HuffmanTables {
    /// The standard Annex K tables.
    pub fn standard() -> Self {
        Self {
            dc: [
                HuffmanTable::from_spec(&DC_LUM_BITS, &DC_LUM_VALS),
                HuffmanTable::from_spec(&DC_CHROM_BITS, &DC_CHROM_VALS),
            ],
            ac: [
                HuffmanTable::from_spec(&AC_LUM_BITS, &AC_LUM_VALS),
                HuffmanTable::from_spec(&AC_CHROM_BITS, &AC_CHROM_VALS),
            ],
        }
    }

    /// Empty tables that only collect statistics.
    pub fn empty() -> Self {
        Self {
            dc: [HuffmanTable::default(), HuffmanTable::default()],
            ac: [HuffmanTable::default(), HuffmanTable::default()],
        }
    }

    /// Build optimal codes for the first `classes` classes from their counts.
    pub fn optimize(&mut self, classes: usize) {
        for class in 0..classes.min(2) {
            self.dc[class].optimize(DC_TABLE_LEN);
            self.ac[class].optimize(AC_TABLE_LEN);
        }
    }
}
