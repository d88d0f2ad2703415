//! Streaming baseline JPEG encoder.
//!
//! [`JpegEncoder`] accepts one scanline at a time and writes a baseline
//! sequential (SOF0) JFIF stream to an [`OutputSink`]. Scanlines are
//! buffered one MCU row at a time; each full row is transformed, quantized
//! and either entropy coded straight away (single pass) or cached with its
//! symbol statistics so optimal Huffman tables can be built before anything
//! is written (two pass).
//!
//! Supports:
//! - Grayscale and RGB sources
//! - Luma-only, 4:4:4, 4:2:2 (H2V1) and 4:2:0 (H2V2) output
//! - Standard or image-optimized Huffman tables

pub mod dct;
pub mod entropy;
pub mod huffman;
pub mod marker;
pub mod mcu;
pub mod quantize;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::{debug, trace, warn};

use crate::bits::BitWriter;
use crate::color::ColorType;
use crate::error::{Error, ErrorKind, Result};
use crate::sink::{MemorySink, OutputSink, WriterSink};

use dct::dct_2d;
use entropy::{count_block, encode_block, Component};
use huffman::{HuffmanTables, CHROMA, LUMA};
use mcu::{McuGeometry, McuRowBuffer, MAX_BLOCKS_PER_MCU};
use quantize::{quantize_block, QuantizationTables};

/// Maximum supported image dimension for JPEG.
pub const MAX_DIMENSION: u32 = 65535;

/// Smallest output region accepted by [`compress_image_to_jpeg_file_in_memory`].
pub const MIN_MEMORY_BUFFER_SIZE: usize = 1024;

/// Chroma subsampling modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Subsampling {
    /// Luma only: the image is written as grayscale.
    YOnly = 0,
    /// 4:4:4, no subsampling.
    H1V1 = 1,
    /// 4:2:2, chroma halved horizontally.
    H2V1 = 2,
    /// 4:2:0, chroma halved in both directions.
    #[default]
    H2V2 = 3,
}

impl Subsampling {
    /// Number of 8x8 blocks in one MCU of an RGB image.
    pub const fn blocks_per_mcu(self) -> usize {
        match self {
            Subsampling::YOnly => 1,
            Subsampling::H1V1 => 3,
            Subsampling::H2V1 => 4,
            Subsampling::H2V2 => 6,
        }
    }

    /// MCU width and height in pixels.
    pub const fn mcu_size(self) -> (usize, usize) {
        match self {
            Subsampling::YOnly | Subsampling::H1V1 => (8, 8),
            Subsampling::H2V1 => (16, 8),
            Subsampling::H2V2 => (16, 16),
        }
    }
}

impl TryFrom<u8> for Subsampling {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Subsampling::YOnly),
            1 => Ok(Subsampling::H1V1),
            2 => Ok(Subsampling::H2V1),
            3 => Ok(Subsampling::H2V2),
            other => Err(Error::InvalidSubsampling(other)),
        }
    }
}

impl From<Subsampling> for u8 {
    fn from(s: Subsampling) -> Self {
        s as u8
    }
}

/// JPEG encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    /// Quality level 1-100.
    pub quality: u8,
    /// Chroma subsampling. Ignored for grayscale sources.
    pub subsampling: Subsampling,
    /// If true, chroma shares the luma quantization and Huffman tables.
    pub no_chroma_discrimination: bool,
    /// If true, build image-optimized Huffman tables in a first pass.
    pub two_pass: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            quality: 85,
            subsampling: Subsampling::H2V2,
            no_chroma_discrimination: false,
            two_pass: false,
        }
    }
}

impl Params {
    /// Preset 0: Fast - standard Huffman tables, 4:2:0, single pass.
    pub fn fast(quality: u8) -> Self {
        Self {
            quality,
            subsampling: Subsampling::H2V2,
            no_chroma_discrimination: false,
            two_pass: false,
        }
    }

    /// Preset 1: Balanced - optimized Huffman tables, 4:2:0, two passes.
    pub fn balanced(quality: u8) -> Self {
        Self {
            quality,
            subsampling: Subsampling::H2V2,
            no_chroma_discrimination: false,
            two_pass: true,
        }
    }

    /// Create from preset (0=fast, anything else=balanced).
    pub fn from_preset(quality: u8, preset: u8) -> Self {
        match preset {
            0 => Self::fast(quality),
            _ => Self::balanced(quality),
        }
    }

    /// Set the quality level.
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the chroma subsampling mode.
    pub fn subsampling(mut self, subsampling: Subsampling) -> Self {
        self.subsampling = subsampling;
        self
    }

    /// Share luma tables with chroma.
    pub fn no_chroma_discrimination(mut self, enabled: bool) -> Self {
        self.no_chroma_discrimination = enabled;
        self
    }

    /// Enable two-pass Huffman optimization.
    pub fn two_pass(mut self, enabled: bool) -> Self {
        self.two_pass = enabled;
        self
    }

    /// Validate the parameters.
    pub fn check(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(Error::InvalidQuality(self.quality));
        }
        Ok(())
    }
}

/// Lifecycle of a [`JpegEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// No image set up.
    Uninitialized,
    /// `init` succeeded; no scanline yet.
    Initialized,
    /// Scanlines (or the second pass) in progress.
    Encoding,
    /// Building final Huffman tables between the two passes.
    ///
    /// Held only inside [`JpegEncoder::process_end_of_image`]; that call
    /// leaves the encoder `Finalized` or `Failed`, so [`JpegEncoder::state`]
    /// never reports it.
    PassBoundary,
    /// EOI written.
    Finalized,
    /// An error aborted the image. Only `init` or `deinit` are accepted.
    Failed,
}

/// Per-image state, created by `init` and dropped by `deinit`.
struct Image<S: OutputSink> {
    writer: BitWriter<S>,
    params: Params,
    geometry: McuGeometry,
    components: [Component; 3],
    num_components: usize,
    /// Distinct quantization/Huffman table classes written (1 or 2).
    table_classes: usize,
    quant: QuantizationTables,
    huff: HuffmanTables,
    rows: McuRowBuffer,
    /// Quantized blocks in scan order, kept for the second pass.
    coefficients: Vec<[i16; 64]>,
    lines_in: usize,
    mcu_rows_done: usize,
    pass: u8,
    headers_written: bool,
    trailer_bytes: usize,
}

impl<S: OutputSink> Image<S> {
    fn new(sink: S, geometry: McuGeometry, params: Params) -> Result<Self> {
        let num_components = geometry.components();
        let table_classes = if num_components == 1 || params.no_chroma_discrimination {
            1
        } else {
            2
        };

        let components = std::array::from_fn(|i| {
            let (h_samp, v_samp) = geometry.sampling_factors(i);
            let class = if i > 0 && table_classes == 2 {
                CHROMA
            } else {
                LUMA
            };
            Component {
                id: i as u8 + 1,
                h_samp,
                v_samp,
                quant_table: class as u8,
                huff_class: class,
                last_dc: 0,
            }
        });

        let quant = QuantizationTables::new(params.quality, table_classes == 2);
        let huff = if params.two_pass {
            HuffmanTables::empty()
        } else {
            HuffmanTables::standard()
        };

        let rows = McuRowBuffer::new(geometry)?;
        let mut coefficients = Vec::new();
        if params.two_pass {
            coefficients.try_reserve_exact(geometry.total_blocks())?;
        }
        let writer = BitWriter::new(sink)?;

        Ok(Self {
            writer,
            params,
            geometry,
            components,
            num_components,
            table_classes,
            quant,
            huff,
            rows,
            coefficients,
            lines_in: 0,
            mcu_rows_done: 0,
            pass: 1,
            headers_written: false,
            trailer_bytes: 0,
        })
    }

    fn write_headers(&mut self) -> Result<()> {
        let comps = &self.components[..self.num_components];
        let w = &mut self.writer;
        marker::write_soi(w)?;
        marker::write_app0(w)?;
        marker::write_dqt(w, &self.quant, self.table_classes)?;
        marker::write_sof0(
            w,
            self.geometry.width as u16,
            self.geometry.height as u16,
            comps,
        )?;
        marker::write_dht(w, &self.huff, self.table_classes)?;
        marker::write_sos(w, comps)?;
        self.headers_written = true;
        Ok(())
    }

    fn add_scanline(&mut self, row: &[u8]) -> Result<()> {
        if self.lines_in == self.geometry.height {
            return Err(Error::SequenceViolation("more scanlines than image height"));
        }
        let expected = self.geometry.width * self.geometry.color_type.bytes_per_pixel();
        if row.len() != expected {
            return Err(Error::InvalidScanlineLength {
                expected,
                actual: row.len(),
            });
        }

        self.rows.load_scanline(row);
        self.lines_in += 1;
        if self.rows.is_full() {
            self.process_mcu_row()?;
        }
        Ok(())
    }

    /// Transform, quantize and code (or count and cache) one MCU row.
    fn process_mcu_row(&mut self) -> Result<()> {
        if !self.params.two_pass && !self.headers_written {
            self.write_headers()?;
        }

        let block_components = self.geometry.block_components();
        let mut blocks = [[0.0f32; 64]; MAX_BLOCKS_PER_MCU];

        for mcu_x in 0..self.geometry.mcus_per_row {
            let n = self.rows.extract_mcu(mcu_x, &mut blocks);
            for (block, &ci) in blocks[..n].iter().zip(block_components) {
                let comp = &mut self.components[ci];
                let table = self.quant.for_class(comp.quant_table as usize);
                let coefs = quantize_block(&dct_2d(block), table);
                let class = comp.huff_class;

                if self.params.two_pass {
                    let (dc, ac) = (&mut self.huff.dc[class], &mut self.huff.ac[class]);
                    count_block(&coefs, &mut comp.last_dc, dc, ac);
                    self.coefficients.push(coefs);
                } else {
                    encode_block(
                        &mut self.writer,
                        &coefs,
                        &mut comp.last_dc,
                        &self.huff.dc[class],
                        &self.huff.ac[class],
                    )?;
                }
            }
        }

        self.rows.clear();
        self.mcu_rows_done += 1;
        trace!(
            "MCU row {}/{} done (pass {})",
            self.mcu_rows_done,
            self.geometry.mcu_rows,
            self.pass
        );
        Ok(())
    }

    /// Re-code every cached block with the final tables.
    fn code_cached_blocks(&mut self) -> Result<()> {
        let block_components = self.geometry.block_components();
        for mcu in self.coefficients.chunks_exact(block_components.len()) {
            for (coefs, &ci) in mcu.iter().zip(block_components) {
                let comp = &mut self.components[ci];
                let class = comp.huff_class;
                encode_block(
                    &mut self.writer,
                    coefs,
                    &mut comp.last_dc,
                    &self.huff.dc[class],
                    &self.huff.ac[class],
                )?;
            }
        }
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.writer.bytes_flushed() + self.trailer_bytes
    }
}

/// Streaming baseline JPEG encoder.
///
/// Typical use:
///
/// ```
/// use baseline_jpeg::jpeg::{JpegEncoder, Params};
///
/// let (width, height) = (16u32, 4u32);
/// let row = vec![200u8; width as usize * 3];
///
/// let mut encoder = JpegEncoder::new();
/// encoder.init(Vec::new(), width, height, 3, Params::default()).unwrap();
/// for _ in 0..height {
///     encoder.process_scanline(&row).unwrap();
/// }
/// encoder.process_end_of_image().unwrap();
/// let out = encoder.deinit().unwrap();
///
/// assert_eq!(&out[..2], &[0xFF, 0xD8]);
/// ```
pub struct JpegEncoder<S: OutputSink> {
    state: EncoderState,
    image: Option<Image<S>>,
}

impl<S: OutputSink> Default for JpegEncoder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OutputSink> JpegEncoder<S> {
    /// Create an uninitialized encoder.
    pub fn new() -> Self {
        Self {
            state: EncoderState::Uninitialized,
            image: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Parameters of the current image, if any.
    pub fn params(&self) -> Option<&Params> {
        self.image.as_ref().map(|img| &img.params)
    }

    /// Current pass: 0 without an image, 1 for the first (or only) pass,
    /// 2 while re-coding cached blocks.
    pub fn pass(&self) -> u8 {
        self.image.as_ref().map_or(0, |img| img.pass)
    }

    /// Bytes handed to the sink so far for the current image.
    pub fn bytes_written(&self) -> usize {
        self.image.as_ref().map_or(0, Image::bytes_written)
    }

    /// Set up a new image. Writes nothing to `sink`.
    ///
    /// `channels` is 1 (gray) or 3 (RGB). Gray sources always produce a
    /// single-component frame. Any previous image is discarded.
    pub fn init(
        &mut self,
        sink: S,
        width: u32,
        height: u32,
        channels: usize,
        params: Params,
    ) -> Result<()> {
        self.deinit();

        let result = Self::validate(width, height, channels, &params).and_then(|color_type| {
            let geometry = McuGeometry::new(
                width as usize,
                height as usize,
                color_type,
                params.subsampling,
            );
            Image::new(sink, geometry, params)
        });

        match result {
            Ok(image) => {
                debug!(
                    "JPEG init: {}x{} {:?} -> {:?}, {} blocks/MCU, {}x{} MCUs, q={}, {}",
                    width,
                    height,
                    image.geometry.color_type,
                    image.geometry.subsampling,
                    image.geometry.blocks_per_mcu(),
                    image.geometry.mcus_per_row,
                    image.geometry.mcu_rows,
                    params.quality,
                    if params.two_pass {
                        "two-pass"
                    } else {
                        "single-pass"
                    }
                );
                self.image = Some(image);
                self.state = EncoderState::Initialized;
                Ok(())
            }
            Err(e) => {
                self.state = EncoderState::Failed;
                Err(e)
            }
        }
    }

    fn validate(width: u32, height: u32, channels: usize, params: &Params) -> Result<ColorType> {
        params.check()?;

        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::ImageTooLarge {
                width,
                height,
                max: MAX_DIMENSION,
            });
        }

        ColorType::try_from(channels)
    }

    /// Feed the next scanline: `width * channels` bytes, top to bottom.
    pub fn process_scanline(&mut self, row: &[u8]) -> Result<()> {
        let image = self.active("process_scanline")?;
        let result = image.add_scanline(row);
        match result {
            Ok(()) => {
                self.state = EncoderState::Encoding;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Finish the image: flush the last partial MCU row, run the second
    /// pass if enabled, and write EOI.
    pub fn process_end_of_image(&mut self) -> Result<()> {
        let image = self.active("process_end_of_image")?;
        if image.lines_in != image.geometry.height {
            return Err(self.fail(Error::SequenceViolation(
                "end of image before all scanlines",
            )));
        }

        match self.finish() {
            Ok(()) => {
                self.state = EncoderState::Finalized;
                debug!("JPEG finalized: {} bytes", self.bytes_written());
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn finish(&mut self) -> Result<()> {
        let two_pass = self.image.as_ref().is_some_and(|img| img.params.two_pass);
        let image = self
            .image
            .as_mut()
            .ok_or(Error::SequenceViolation("no image"))?;

        if image.rows.rows() > 0 {
            image.rows.pad_rows();
            image.process_mcu_row()?;
        }

        if two_pass {
            self.state = EncoderState::PassBoundary;
            image.huff.optimize(image.table_classes);
            debug!(
                "JPEG pass boundary: {} cached blocks, {} DC / {} AC luma symbols",
                image.coefficients.len(),
                image.huff.dc[LUMA].num_values(),
                image.huff.ac[LUMA].num_values()
            );

            image.write_headers()?;
            for comp in &mut image.components {
                comp.reset_dc();
            }
            image.pass = 2;
            self.state = EncoderState::Encoding;
            image.code_cached_blocks()?;
        } else if !image.headers_written {
            image.write_headers()?;
        }

        image.writer.flush_bits()?;
        image.writer.flush()?;
        marker::write_eoi(image.writer.sink_mut())?;
        image.trailer_bytes = 2;
        Ok(())
    }

    /// Release the current image and return its sink, if any.
    ///
    /// Safe in any state. After a failure, the bytes already in the sink
    /// are not a valid image.
    pub fn deinit(&mut self) -> Option<S> {
        self.state = EncoderState::Uninitialized;
        self.image.take().map(|img| img.writer.into_sink())
    }

    /// The current image, if calls are accepted in this state.
    fn active(&mut self, op: &'static str) -> Result<&mut Image<S>> {
        match self.state {
            EncoderState::Initialized | EncoderState::Encoding => {}
            EncoderState::Failed => {
                warn!("JPEG {} rejected: encoder is in the failed state", op);
                return Err(Error::SequenceViolation("encoder failed; reinitialize"));
            }
            EncoderState::Finalized => {
                return Err(Error::SequenceViolation("image already finalized"));
            }
            EncoderState::PassBoundary => {
                return Err(Error::SequenceViolation("encoder is between passes"));
            }
            EncoderState::Uninitialized => {
                return Err(Error::SequenceViolation("encoder not initialized"));
            }
        }
        self.image
            .as_mut()
            .ok_or(Error::SequenceViolation("encoder not initialized"))
    }

    fn fail(&mut self, e: Error) -> Error {
        if e.kind() == ErrorKind::SinkWrite {
            warn!("JPEG sink write failed: {}", e);
        }
        self.state = EncoderState::Failed;
        e
    }
}

/// Encode a whole image held in memory into `sink`, returning the sink.
///
/// `data` is row-major with a pitch of `width * channels` bytes.
pub fn compress_image_to_stream<S: OutputSink>(
    sink: S,
    width: u32,
    height: u32,
    channels: usize,
    data: &[u8],
    params: &Params,
) -> Result<S> {
    let mut encoder = JpegEncoder::new();
    encoder.init(sink, width, height, channels, *params)?;

    let pitch = width as usize * channels;
    let expected = pitch * height as usize;
    if data.len() != expected {
        return Err(Error::InvalidScanlineLength {
            expected,
            actual: data.len(),
        });
    }

    for row in data.chunks_exact(pitch) {
        encoder.process_scanline(row)?;
    }
    encoder.process_end_of_image()?;
    encoder
        .deinit()
        .ok_or(Error::SequenceViolation("encoder lost its sink"))
}

/// Encode a whole image to a JPEG file.
pub fn compress_image_to_jpeg_file<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    channels: usize,
    data: &[u8],
    params: &Params,
) -> Result<()> {
    let file = File::create(path)?;
    let sink = WriterSink::new(BufWriter::new(file));
    let mut sink = compress_image_to_stream(sink, width, height, channels, data, params)?;
    sink.flush()
}

/// Encode a whole image into a caller-provided buffer.
///
/// Returns the encoded size. Fails with [`Error::BufferTooSmall`] if `buf`
/// is shorter than [`MIN_MEMORY_BUFFER_SIZE`] or the image does not fit.
pub fn compress_image_to_jpeg_file_in_memory(
    buf: &mut [u8],
    width: u32,
    height: u32,
    channels: usize,
    data: &[u8],
    params: &Params,
) -> Result<usize> {
    if buf.len() < MIN_MEMORY_BUFFER_SIZE {
        return Err(Error::BufferTooSmall {
            required: MIN_MEMORY_BUFFER_SIZE,
            actual: buf.len(),
        });
    }
    let sink = MemorySink::new(buf);
    let sink = compress_image_to_stream(sink, width, height, channels, data, params)?;
    Ok(sink.len())
}

/// Encode raw pixel data as JPEG.
///
/// # Arguments
/// * `data` - Raw pixel data (gray or RGB, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 1 for gray, 3 for RGB
/// * `params` - Encoding parameters
///
/// # Returns
/// Complete JPEG file as bytes.
pub fn encode(
    data: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    params: &Params,
) -> Result<Vec<u8>> {
    compress_image_to_stream(Vec::new(), width, height, channels, data, params)
}
