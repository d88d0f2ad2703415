//! Synthetic test image generation.
//!
//! Deterministic patterns for the encoder tests. Every generator returns
//! interleaved 8-bit samples, RGB unless the name says gray.

#![allow(dead_code)]

/// Generate a solid color image.
pub fn solid_color(width: u32, height: u32, r: u8, g: u8, b: u8) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut pixels = Vec::with_capacity(pixel_count * 3);
    for _ in 0..pixel_count {
        pixels.extend_from_slice(&[r, g, b]);
    }
    pixels
}

/// Generate a grayscale image.
pub fn solid_gray(width: u32, height: u32, gray: u8) -> Vec<u8> {
    vec![gray; (width * height) as usize]
}

/// Generate an RGB gradient (red horizontal, green vertical, blue diagonal).
pub fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            let b = (((x + y) * 127) / (width + height).max(1)) as u8;
            pixels.extend_from_slice(&[r, g, b]);
        }
    }
    pixels
}

/// Generate a gray horizontal gradient.
pub fn gradient_gray(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for _y in 0..height {
        for x in 0..width {
            pixels.push(((x * 255) / width.max(1)) as u8);
        }
    }
    pixels
}

/// Generate a checkerboard pattern.
pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    let cell_size = cell_size.max(1);
    for y in 0..height {
        for x in 0..width {
            let is_white = (x / cell_size + y / cell_size) % 2 == 0;
            let v = if is_white { 255 } else { 0 };
            pixels.extend_from_slice(&[v, v, v]);
        }
    }
    pixels
}

/// Generate pseudo-random noise using a simple LCG.
/// The pattern is deterministic based on the seed.
pub fn noise(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    let mut state = seed;

    for _ in 0..(width * height) {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        let r = (state >> 16) as u8;
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        let g = (state >> 16) as u8;
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        let b = (state >> 16) as u8;
        pixels.extend_from_slice(&[r, g, b]);
    }
    pixels
}

/// Generate grayscale noise.
pub fn noise_gray(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    let mut state = seed;

    for _ in 0..(width * height) {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        pixels.push((state >> 16) as u8);
    }
    pixels
}

/// Dimensions that exercise partial MCUs in every subsampling mode.
pub const EDGE_CASE_DIMENSIONS: &[(u32, u32, &str)] = &[
    (1, 1, "minimum"),
    (2, 2, "tiny"),
    (7, 7, "under_block"),
    (8, 8, "single_block"),
    (9, 9, "just_over_block"),
    (16, 16, "single_420_mcu"),
    (15, 17, "odd_dimensions"),
    (1, 100, "tall_narrow"),
    (100, 1, "wide_short"),
    (33, 47, "ragged"),
];

/// A small suite for smoke tests. Returns (name, width, height, RGB pixels).
pub fn generate_minimal_test_suite() -> Vec<(String, u32, u32, Vec<u8>)> {
    vec![
        (
            "solid".to_string(),
            32,
            32,
            solid_color(32, 32, 128, 128, 128),
        ),
        ("gradient".to_string(), 64, 64, gradient_rgb(64, 64)),
        ("checker".to_string(), 32, 32, checkerboard(32, 32, 8)),
        ("noise".to_string(), 24, 40, noise(24, 40, 42)),
        ("1x1".to_string(), 1, 1, solid_color(1, 1, 255, 0, 0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_size() {
        let pixels = solid_color(10, 20, 255, 128, 0);
        assert_eq!(pixels.len(), 10 * 20 * 3);
    }

    #[test]
    fn test_checkerboard_pattern() {
        let pixels = checkerboard(4, 4, 2);
        assert_eq!(pixels[0], 255);
        assert_eq!(pixels[6], 0);
    }

    #[test]
    fn test_noise_deterministic() {
        assert_eq!(noise(32, 32, 12345), noise(32, 32, 12345));
    }
}
