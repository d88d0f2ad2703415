//! JPEG quantization tables and functions.

/// Standard JPEG luminance quantization table (ITU T.81 Annex K.1).
pub const STD_LUMINANCE_TABLE: [u8; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// Standard JPEG chrominance quantization table.
pub const STD_CHROMINANCE_TABLE: [u8; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

/// Zigzag scan order for 8x8 block: `ZIGZAG[i]` is the natural index of
/// the i-th coefficient in scan order.
pub const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// One quantization table, natural (row-major) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizationTable {
    values: [i32; 64],
}

impl QuantizationTable {
    /// Scale a base table by an IJG-style quality factor (1-100).
    pub fn with_quality(base: &[u8; 64], quality: u8) -> Self {
        let quality = quality.clamp(1, 100) as i32;

        // Same scale curve as libjpeg
        let scale = if quality < 50 {
            5000 / quality
        } else {
            200 - 2 * quality
        };

        let mut values = [0i32; 64];
        for (v, &b) in values.iter_mut().zip(base.iter()) {
            *v = ((b as i32 * scale + 50) / 100).clamp(1, 255);
        }
        Self { values }
    }

    /// Entries in natural order.
    pub fn values(&self) -> &[i32; 64] {
        &self.values
    }

    /// Entries in zigzag order, as written to a DQT segment.
    pub fn zigzag_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        for (o, &z) in out.iter_mut().zip(ZIGZAG.iter()) {
            *o = self.values[z] as u8;
        }
        out
    }
}

/// Luma and chroma tables for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizationTables {
    /// Table for the Y component.
    pub luminance: QuantizationTable,
    /// Table for Cb and Cr.
    pub chrominance: QuantizationTable,
    /// Number of distinct tables written to the stream (1 or 2).
    pub count: usize,
}

impl QuantizationTables {
    /// Build both tables for `quality`.
    ///
    /// Without chroma discrimination the chroma table collapses onto the
    /// luma table and only one DQT table is written.
    pub fn new(quality: u8, chroma_discrimination: bool) -> Self {
        let luminance = QuantizationTable::with_quality(&STD_LUMINANCE_TABLE, quality);
        if chroma_discrimination {
            Self {
                luminance,
                chrominance: QuantizationTable::with_quality(&STD_CHROMINANCE_TABLE, quality),
                count: 2,
            }
        } else {
            Self {
                luminance,
                chrominance: luminance,
                count: 1,
            }
        }
    }

    /// Table for a component class (0 = luma, otherwise chroma).
    pub fn for_class(&self, class: usize) -> &QuantizationTable {
        if class == 0 {
            &self.luminance
        } else {
            &self.chrominance
        }
    }
}

/// Divide each DCT coefficient by its table entry, rounding to nearest and
/// clamping to `i16`. Output stays in natural order.
pub fn quantize_block(dct: &[f32; 64], table: &QuantizationTable) -> [i16; 64] {
    let mut result = [0i16; 64];
    for i in 0..64 {
        let q = (dct[i] / table.values[i] as f32).round();
        result[i] = q.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    }
    result
}
