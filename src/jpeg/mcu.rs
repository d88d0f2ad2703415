//! MCU geometry, MCU-row sample buffers and 8x8 block extraction.
//!
//! Scanlines are converted to planar Y/Cb/Cr floats at full resolution and
//! collected until one MCU row is complete. Chroma is never stored
//! subsampled: the block extractor averages 2 (H2V1) or 4 (H2V2) chroma
//! samples on read.

use super::Subsampling;
use crate::color::{rgb_to_ycbcr, ColorType};
use crate::error::Result;

/// Largest number of 8x8 blocks in one MCU (H2V2: 4 Y + Cb + Cr).
pub const MAX_BLOCKS_PER_MCU: usize = 6;

/// Frame layout derived from the image size, source color type and
/// requested subsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McuGeometry {
    /// Effective subsampling. Gray sources always use [`Subsampling::YOnly`].
    pub subsampling: Subsampling,
    /// Source color layout.
    pub color_type: ColorType,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// MCU width in pixels (8 or 16).
    pub mcu_width: usize,
    /// MCU height in pixels (8 or 16).
    pub mcu_height: usize,
    /// MCUs per MCU row.
    pub mcus_per_row: usize,
    /// Number of MCU rows.
    pub mcu_rows: usize,
}

impl McuGeometry {
    /// Compute the layout for an image.
    pub fn new(width: usize, height: usize, color_type: ColorType, requested: Subsampling) -> Self {
        let subsampling = match color_type {
            ColorType::Gray => Subsampling::YOnly,
            ColorType::Rgb => requested,
        };
        let (mcu_width, mcu_height) = subsampling.mcu_size();
        Self {
            subsampling,
            color_type,
            width,
            height,
            mcu_width,
            mcu_height,
            mcus_per_row: width.div_ceil(mcu_width),
            mcu_rows: height.div_ceil(mcu_height),
        }
    }

    /// Number of JPEG components in the frame (1 or 3).
    pub fn components(&self) -> usize {
        match self.subsampling {
            Subsampling::YOnly => 1,
            _ => 3,
        }
    }

    /// Blocks per MCU: 1, 3, 4 or 6.
    pub fn blocks_per_mcu(&self) -> usize {
        self.subsampling.blocks_per_mcu()
    }

    /// Component index of each block of an MCU, in scan order.
    pub fn block_components(&self) -> &'static [usize] {
        match self.subsampling {
            Subsampling::YOnly => &[0],
            Subsampling::H1V1 => &[0, 1, 2],
            Subsampling::H2V1 => &[0, 0, 1, 2],
            Subsampling::H2V2 => &[0, 0, 0, 0, 1, 2],
        }
    }

    /// Horizontal and vertical sampling factors of a component.
    pub fn sampling_factors(&self, component: usize) -> (u8, u8) {
        if component > 0 {
            return (1, 1);
        }
        match self.subsampling {
            Subsampling::YOnly | Subsampling::H1V1 => (1, 1),
            Subsampling::H2V1 => (2, 1),
            Subsampling::H2V2 => (2, 2),
        }
    }

    /// Width of the plane buffers: whole MCUs.
    pub fn padded_width(&self) -> usize {
        self.mcus_per_row * self.mcu_width
    }

    /// Total MCUs in the image.
    pub fn total_mcus(&self) -> usize {
        self.mcus_per_row * self.mcu_rows
    }

    /// Total 8x8 blocks in the image.
    pub fn total_blocks(&self) -> usize {
        self.total_mcus() * self.blocks_per_mcu()
    }
}

/// Planar sample buffer holding one MCU row.
#[derive(Debug)]
pub struct McuRowBuffer {
    geometry: McuGeometry,
    /// Y, Cb, Cr. Chroma planes stay empty for luma-only frames.
    planes: [Vec<f32>; 3],
    rows: usize,
}

impl McuRowBuffer {
    /// Allocate planes for one MCU row of `geometry`.
    pub fn new(geometry: McuGeometry) -> Result<Self> {
        let plane_len = geometry.padded_width() * geometry.mcu_height;
        let mut planes: [Vec<f32>; 3] = Default::default();
        for plane in &mut planes[..geometry.components()] {
            plane.try_reserve_exact(plane_len)?;
            plane.resize(plane_len, 0.0);
        }
        Ok(Self {
            geometry,
            planes,
            rows: 0,
        })
    }

    /// Rows loaded into the current MCU row.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// True once every row of the MCU row is present.
    pub fn is_full(&self) -> bool {
        self.rows == self.geometry.mcu_height
    }

    /// Start a new MCU row.
    pub fn clear(&mut self) {
        self.rows = 0;
    }

    /// Convert one scanline into the planes and replicate its last pixel
    /// out to the padded width. `src` must hold exactly one source row.
    pub fn load_scanline(&mut self, src: &[u8]) {
        debug_assert!(self.rows < self.geometry.mcu_height);
        debug_assert_eq!(
            src.len(),
            self.geometry.width * self.geometry.color_type.bytes_per_pixel()
        );

        let stride = self.geometry.padded_width();
        let width = self.geometry.width;
        let start = self.rows * stride;

        let [y_plane, cb_plane, cr_plane] = &mut self.planes;
        match (self.geometry.color_type, self.geometry.subsampling) {
            (ColorType::Gray, _) => {
                let row = &mut y_plane[start..start + stride];
                for (dst, &v) in row.iter_mut().zip(src) {
                    *dst = v as f32;
                }
            }
            (ColorType::Rgb, Subsampling::YOnly) => {
                let row = &mut y_plane[start..start + stride];
                for (dst, px) in row.iter_mut().zip(src.chunks_exact(3)) {
                    *dst = rgb_to_ycbcr(px[0], px[1], px[2]).0;
                }
            }
            (ColorType::Rgb, _) => {
                let y_row = &mut y_plane[start..start + stride];
                let cb_row = &mut cb_plane[start..start + stride];
                let cr_row = &mut cr_plane[start..start + stride];
                for (x, px) in src.chunks_exact(3).enumerate() {
                    let (y, cb, cr) = rgb_to_ycbcr(px[0], px[1], px[2]);
                    y_row[x] = y;
                    cb_row[x] = cb;
                    cr_row[x] = cr;
                }
            }
        }

        for plane in &mut self.planes[..self.geometry.components()] {
            let row = &mut plane[start..start + stride];
            let last = row[width - 1];
            row[width..].fill(last);
        }
        self.rows += 1;
    }

    /// Fill the rest of a partial MCU row by repeating its last loaded row.
    pub fn pad_rows(&mut self) {
        if self.rows == 0 || self.is_full() {
            return;
        }
        let stride = self.geometry.padded_width();
        let last = (self.rows - 1) * stride;
        for plane in &mut self.planes[..self.geometry.components()] {
            for r in self.rows..self.geometry.mcu_height {
                plane.copy_within(last..last + stride, r * stride);
            }
        }
        self.rows = self.geometry.mcu_height;
    }

    /// Extract all level-shifted blocks of MCU `mcu_x` in scan order.
    /// Returns the number of blocks written to `out`.
    pub fn extract_mcu(&self, mcu_x: usize, out: &mut [[f32; 64]; MAX_BLOCKS_PER_MCU]) -> usize {
        let x0 = mcu_x * self.geometry.mcu_width;
        match self.geometry.subsampling {
            Subsampling::YOnly => {
                out[0] = self.load_block_8x8(0, x0, 0);
                1
            }
            Subsampling::H1V1 => {
                out[0] = self.load_block_8x8(0, x0, 0);
                out[1] = self.load_block_8x8(1, x0, 0);
                out[2] = self.load_block_8x8(2, x0, 0);
                3
            }
            Subsampling::H2V1 => {
                out[0] = self.load_block_8x8(0, x0, 0);
                out[1] = self.load_block_8x8(0, x0 + 8, 0);
                out[2] = self.load_block_16x8(1, x0);
                out[3] = self.load_block_16x8(2, x0);
                4
            }
            Subsampling::H2V2 => {
                out[0] = self.load_block_8x8(0, x0, 0);
                out[1] = self.load_block_8x8(0, x0 + 8, 0);
                out[2] = self.load_block_8x8(0, x0, 8);
                out[3] = self.load_block_8x8(0, x0 + 8, 8);
                out[4] = self.load_block_16x16(1, x0);
                out[5] = self.load_block_16x16(2, x0);
                6
            }
        }
    }

    /// 8x8 samples at (x, y) within the MCU row.
    fn load_block_8x8(&self, plane: usize, x: usize, y: usize) -> [f32; 64] {
        let stride = self.geometry.padded_width();
        let src = &self.planes[plane];
        let mut block = [0.0f32; 64];
        for dy in 0..8 {
            let row = (y + dy) * stride + x;
            for dx in 0..8 {
                block[dy * 8 + dx] = src[row + dx] - 128.0;
            }
        }
        block
    }

    /// 16x8 samples averaged horizontally in pairs (dual blend).
    fn load_block_16x8(&self, plane: usize, x: usize) -> [f32; 64] {
        let stride = self.geometry.padded_width();
        let src = &self.planes[plane];
        let mut block = [0.0f32; 64];
        for dy in 0..8 {
            let row = dy * stride + x;
            for dx in 0..8 {
                let a = src[row + 2 * dx];
                let b = src[row + 2 * dx + 1];
                block[dy * 8 + dx] = (a + b) * 0.5 - 128.0;
            }
        }
        block
    }

    /// 16x16 samples averaged over 2x2 squares (quad blend).
    fn load_block_16x16(&self, plane: usize, x: usize) -> [f32; 64] {
        let stride = self.geometry.padded_width();
        let src = &self.planes[plane];
        let mut block = [0.0f32; 64];
        for dy in 0..8 {
            let top = 2 * dy * stride + x;
            let bottom = top + stride;
            for dx in 0..8 {
                let sum = src[top + 2 * dx]
                    + src[top + 2 * dx + 1]
                    + src[bottom + 2 * dx]
                    + src[bottom + 2 * dx + 1];
                block[dy * 8 + dx] = sum * 0.25 - 128.0;
            }
        }
        block
    }
}
