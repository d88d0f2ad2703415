//! Source color types and color-space conversion.

use crate::error::Error;

/// Supported source pixel layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    /// Grayscale, 1 byte per pixel.
    Gray,
    /// RGB, 3 bytes per pixel.
    Rgb,
}

impl ColorType {
    /// Returns the number of bytes per pixel for this color type.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorType::Gray => 1,
            ColorType::Rgb => 3,
        }
    }
}

impl TryFrom<usize> for ColorType {
    type Error = Error;

    fn try_from(channels: usize) -> Result<Self, Self::Error> {
        match channels {
            1 => Ok(ColorType::Gray),
            3 => Ok(ColorType::Rgb),
            other => Err(Error::UnsupportedChannels(other)),
        }
    }
}

/// Convert RGB to YCbCr (ITU-R BT.601, full range, as used by JFIF).
///
/// Returns unshifted `(Y, Cb, Cr)` in roughly 0.0-255.0.
#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0;
    let cr = 0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0;
    (y, cb, cr)
}
