//! Baseline entropy coding of quantized blocks.
//!
//! [`count_block`] walks a block exactly like [`encode_block`] but only
//! updates symbol frequencies, which is what pass one of two-pass encoding
//! needs. Both advance the component's DC predictor.

use super::huffman::HuffmanTable;
use super::quantize::ZIGZAG;
use crate::bits::BitWriter;
use crate::error::Result;
use crate::sink::OutputSink;

/// Zero-run-length escape: 16 zeros.
const ZRL: u8 = 0xF0;

/// End of block: only zeros remain.
const EOB: u8 = 0x00;

/// Per-component frame and scan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Component identifier written to SOF0/SOS (1 = Y, 2 = Cb, 3 = Cr).
    pub id: u8,
    /// Horizontal sampling factor.
    pub h_samp: u8,
    /// Vertical sampling factor.
    pub v_samp: u8,
    /// Quantization table selector.
    pub quant_table: u8,
    /// Huffman table class (0 = luma tables, 1 = chroma tables).
    pub huff_class: usize,
    /// DC value of the previous block of this component.
    pub last_dc: i32,
}

impl Component {
    /// Reset the DC predictor, as at the start of a scan.
    pub fn reset_dc(&mut self) {
        self.last_dc = 0;
    }
}

/// Number of magnitude bits needed for a value (0 for zero).
#[inline]
pub fn category(value: i32) -> u32 {
    32 - value.unsigned_abs().leading_zeros()
}

/// Magnitude bits for a non-zero value: the value itself if positive,
/// otherwise `value - 1` masked to its category.
#[inline]
pub fn encode_value(value: i32) -> (u32, u32) {
    let cat = category(value);
    if cat == 0 {
        return (0, 0);
    }
    let bits = (if value < 0 { value - 1 } else { value }) as u32;
    (bits & ((1 << cat) - 1), cat)
}

/// Record the symbols of one block into `dc` and `ac`.
pub fn count_block(block: &[i16; 64], last_dc: &mut i32, dc: &mut HuffmanTable, ac: &mut HuffmanTable) {
    let value = block[0] as i32;
    dc.record(category(value - *last_dc) as u8);
    *last_dc = value;

    let mut zero_run = 0u32;
    for &z in &ZIGZAG[1..] {
        let coef = block[z] as i32;
        if coef == 0 {
            zero_run += 1;
            continue;
        }
        while zero_run >= 16 {
            ac.record(ZRL);
            zero_run -= 16;
        }
        ac.record(((zero_run << 4) | category(coef)) as u8);
        zero_run = 0;
    }
    if zero_run > 0 {
        ac.record(EOB);
    }
}

/// Huffman-code one block into `writer`.
pub fn encode_block<S: OutputSink>(
    writer: &mut BitWriter<S>,
    block: &[i16; 64],
    last_dc: &mut i32,
    dc: &HuffmanTable,
    ac: &HuffmanTable,
) -> Result<()> {
    let value = block[0] as i32;
    let diff = value - *last_dc;
    *last_dc = value;

    let (val_bits, cat) = encode_value(diff);
    let (code, len) = dc.code(cat as u8);
    writer.put_bits(code, len)?;
    if cat > 0 {
        writer.put_bits(val_bits, cat)?;
    }

    let mut zero_run = 0u32;
    for &z in &ZIGZAG[1..] {
        let coef = block[z] as i32;
        if coef == 0 {
            zero_run += 1;
            continue;
        }
        while zero_run >= 16 {
            let (code, len) = ac.code(ZRL);
            writer.put_bits(code, len)?;
            zero_run -= 16;
        }
        let (val_bits, cat) = encode_value(coef);
        let (code, len) = ac.code(((zero_run << 4) | cat) as u8);
        writer.put_bits(code, len)?;
        writer.put_bits(val_bits, cat)?;
        zero_run = 0;
    }
    if zero_run > 0 {
        let (code, len) = ac.code(EOB);
        writer.put_bits(code, len)?;
    }
    Ok(())
}
