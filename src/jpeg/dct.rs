//! Forward Discrete Cosine Transform (DCT) for JPEG.
//!
//! Uses the separable 2D DCT approach: a 1D transform over rows, then over
//! columns. Output is scaled like the T.81 FDCT, so a flat block of value
//! `v` produces a DC coefficient of `8 * v`.

/// cos(k * PI / 16) for k = 0..=8.
const COS_16THS: [f32; 9] = [
    1.0,
    0.980_785_28,
    0.923_879_53,
    0.831_469_61,
    0.707_106_78,
    0.555_570_23,
    0.382_683_43,
    0.195_090_32,
    0.0,
];

/// Precomputed cosine values for DCT.
/// cos_table[n][k] = cos((2*n + 1) * k * PI / 16)
const COS_TABLE: [[f32; 8]; 8] = precompute_cos_table();

/// Build the cosine table at compile time from the exact 16ths of PI.
const fn precompute_cos_table() -> [[f32; 8]; 8] {
    let mut table = [[0.0f32; 8]; 8];
    let mut n = 0;
    while n < 8 {
        let mut k = 0;
        while k < 8 {
            table[n][k] = cos_16ths((2 * n + 1) * k);
            k += 1;
        }
        n += 1;
    }
    table
}

/// cos(m * PI / 16) for any m, by symmetry onto the first quadrant.
const fn cos_16ths(m: usize) -> f32 {
    let mut m = m % 32;
    if m > 16 {
        m = 32 - m;
    }
    if m > 8 {
        -COS_16THS[16 - m]
    } else {
        COS_16THS[m]
    }
}

/// Normalization factors for DCT.
/// alpha(0) = 1/sqrt(2), alpha(k) = 1 for k > 0
const ALPHA: [f32; 8] = [0.707_106_78, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];

/// Perform 2D DCT on an 8x8 block of level-shifted samples.
pub fn dct_2d(block: &[f32; 64]) -> [f32; 64] {
    let mut temp = [0.0f32; 64];
    let mut result = [0.0f32; 64];

    // 1D DCT on rows
    for row in 0..8 {
        let row_start = row * 8;
        dct_1d(
            &block[row_start..row_start + 8],
            &mut temp[row_start..row_start + 8],
        );
    }

    // 1D DCT on columns
    for col in 0..8 {
        let mut col_in = [0.0f32; 8];
        let mut col_out = [0.0f32; 8];

        for row in 0..8 {
            col_in[row] = temp[row * 8 + col];
        }

        dct_1d(&col_in, &mut col_out);

        for row in 0..8 {
            result[row * 8 + col] = col_out[row];
        }
    }

    result
}

/// Perform 1D DCT on 8 values.
fn dct_1d(input: &[f32], output: &mut [f32]) {
    debug_assert_eq!(input.len(), 8);
    debug_assert_eq!(output.len(), 8);

    for k in 0..8 {
        let mut sum = 0.0f32;
        for n in 0..8 {
            sum += input[n] * COS_TABLE[n][k];
        }
        output[k] = 0.5 * ALPHA[k] * sum;
    }
}
