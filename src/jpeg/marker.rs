//! JPEG marker segments.
//!
//! Everything here is byte-aligned and written through the same cache as
//! the entropy-coded data, so headers always reach the sink first.

use super::entropy::Component;
use super::huffman::HuffmanTables;
use super::quantize::QuantizationTables;
use crate::bits::BitWriter;
use crate::error::Result;
use crate::sink::{put_obj, OutputSink};

/// Start of Image.
pub const SOI: u16 = 0xFFD8;
/// End of Image.
pub const EOI: u16 = 0xFFD9;
/// JFIF application segment.
pub const APP0: u16 = 0xFFE0;
/// Define Quantization Table.
pub const DQT: u16 = 0xFFDB;
/// Start of Frame (baseline DCT).
pub const SOF0: u16 = 0xFFC0;
/// Define Huffman Table.
pub const DHT: u16 = 0xFFC4;
/// Start of Scan.
pub const SOS: u16 = 0xFFDA;

/// Write SOI (Start of Image) marker.
pub fn write_soi<S: OutputSink>(w: &mut BitWriter<S>) -> Result<()> {
    w.emit_word(SOI)
}

/// Write APP0 (JFIF) segment.
pub fn write_app0<S: OutputSink>(w: &mut BitWriter<S>) -> Result<()> {
    w.emit_word(APP0)?;
    // Length (16 bytes including length field)
    w.emit_word(16)?;
    w.emit_bytes(b"JFIF\0")?;
    // Version 1.1
    w.emit_bytes(&[1, 1])?;
    // Units: 0 = no units (aspect ratio only)
    w.emit_byte(0)?;
    // X and Y density
    w.emit_word(1)?;
    w.emit_word(1)?;
    // No thumbnail
    w.emit_bytes(&[0, 0])
}

/// Write one DQT segment per table, `count` tables (1 or 2).
pub fn write_dqt<S: OutputSink>(
    w: &mut BitWriter<S>,
    tables: &QuantizationTables,
    count: usize,
) -> Result<()> {
    for id in 0..count.min(2) {
        w.emit_word(DQT)?;
        w.emit_word(67)?; // Length: 2 + 1 + 64
        w.emit_byte(id as u8)?; // 8-bit precision, table id
        w.emit_bytes(&tables.for_class(id).zigzag_bytes())?;
    }
    Ok(())
}

/// Write SOF0 (Start of Frame - baseline) segment.
pub fn write_sof0<S: OutputSink>(
    w: &mut BitWriter<S>,
    width: u16,
    height: u16,
    components: &[Component],
) -> Result<()> {
    w.emit_word(SOF0)?;
    // Length: 8 + 3*num_components
    w.emit_word(8 + 3 * components.len() as u16)?;
    // Precision: 8 bits
    w.emit_byte(8)?;
    w.emit_word(height)?;
    w.emit_word(width)?;
    w.emit_byte(components.len() as u8)?;
    for c in components {
        w.emit_byte(c.id)?;
        w.emit_byte((c.h_samp << 4) | c.v_samp)?;
        w.emit_byte(c.quant_table)?;
    }
    Ok(())
}

/// Write DHT segments for the first `classes` table classes: DC then AC
/// for luma, then the same for chroma.
pub fn write_dht<S: OutputSink>(
    w: &mut BitWriter<S>,
    tables: &HuffmanTables,
    classes: usize,
) -> Result<()> {
    for class in 0..classes.min(2) {
        write_huffman_table(
            w,
            class as u8,
            tables.dc[class].dht_bits(),
            tables.dc[class].dht_values(),
        )?;
        write_huffman_table(
            w,
            0x10 | class as u8,
            tables.ac[class].dht_bits(),
            tables.ac[class].dht_values(),
        )?;
    }
    Ok(())
}

/// Write a single Huffman table segment.
fn write_huffman_table<S: OutputSink>(
    w: &mut BitWriter<S>,
    table_id: u8,
    bits: &[u8],
    vals: &[u8],
) -> Result<()> {
    w.emit_word(DHT)?;
    // Length: 2 + 1 + 16 + num_values
    w.emit_word((2 + 1 + 16 + vals.len()) as u16)?;
    // Table class and ID
    w.emit_byte(table_id)?;
    w.emit_bytes(bits)?;
    w.emit_bytes(vals)
}

/// Write SOS (Start of Scan) segment for a single interleaved baseline scan.
pub fn write_sos<S: OutputSink>(w: &mut BitWriter<S>, components: &[Component]) -> Result<()> {
    w.emit_word(SOS)?;
    // Length: 6 + 2*num_components
    w.emit_word(6 + 2 * components.len() as u16)?;
    w.emit_byte(components.len() as u8)?;
    for c in components {
        w.emit_byte(c.id)?;
        let class = c.huff_class as u8;
        w.emit_byte((class << 4) | class)?;
    }
    // Spectral selection 0-63, no successive approximation
    w.emit_bytes(&[0, 63, 0])
}

/// Write EOI straight to the sink. The writer's cache must already be flushed.
pub fn write_eoi<S: OutputSink + ?Sized>(sink: &mut S) -> Result<()> {
    put_obj(sink, &EOI.to_be_bytes())
}
