//! Bit-level output for JPEG entropy coding.
//!
//! [`BitWriter`] packs variable-length codes MSB first into a 32-bit
//! accumulator and moves whole bytes into a fixed output cache, stuffing a
//! `0x00` after every `0xFF`. The cache goes to the [`OutputSink`] whenever it
//! fills. Marker segments share the same cache (unstuffed) so headers and
//! scan data reach the sink in order.

use crate::error::Result;
use crate::sink::OutputSink;

/// Size of the output byte cache handed to the sink in one piece.
pub const OUT_BUF_SIZE: usize = 2048;

/// MSB-first bit packer with JPEG byte stuffing.
#[derive(Debug)]
pub struct BitWriter<S: OutputSink> {
    sink: S,
    out_buf: Vec<u8>,
    /// Pending bits, left-aligned at bit 23.
    bit_buffer: u32,
    bits_in: u32,
    bytes_flushed: usize,
}

impl<S: OutputSink> BitWriter<S> {
    /// Create a writer over `sink`. Allocates the output cache.
    pub fn new(sink: S) -> Result<Self> {
        let mut out_buf = Vec::new();
        out_buf.try_reserve_exact(OUT_BUF_SIZE)?;
        Ok(Self {
            sink,
            out_buf,
            bit_buffer: 0,
            bits_in: 0,
            bytes_flushed: 0,
        })
    }

    /// Append the low `len` bits of `bits` (1-16 bits per call).
    #[inline]
    pub fn put_bits(&mut self, bits: u32, len: u32) -> Result<()> {
        debug_assert!(len <= 16);
        debug_assert!(self.bits_in < 8);

        let bits = bits & ((1u32 << len) - 1);
        self.bits_in += len;
        self.bit_buffer |= bits << (24 - self.bits_in);

        while self.bits_in >= 8 {
            let c = (self.bit_buffer >> 16) as u8;
            self.emit_byte(c)?;
            if c == 0xFF {
                self.emit_byte(0x00)?;
            }
            self.bit_buffer = (self.bit_buffer << 8) & 0x00FF_FFFF;
            self.bits_in -= 8;
        }
        Ok(())
    }

    /// Pad the final partial byte with 1-bits and reset the accumulator.
    pub fn flush_bits(&mut self) -> Result<()> {
        self.put_bits(0x7F, 7)?;
        self.bit_buffer = 0;
        self.bits_in = 0;
        Ok(())
    }

    /// Append one raw byte (no stuffing). Must be byte-aligned.
    #[inline]
    pub fn emit_byte(&mut self, byte: u8) -> Result<()> {
        self.out_buf.push(byte);
        if self.out_buf.len() == OUT_BUF_SIZE {
            self.flush()?;
        }
        Ok(())
    }

    /// Append a big-endian 16-bit word.
    pub fn emit_word(&mut self, word: u16) -> Result<()> {
        self.emit_bytes(&word.to_be_bytes())
    }

    /// Append raw bytes (no stuffing).
    pub fn emit_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &b in bytes {
            self.emit_byte(b)?;
        }
        Ok(())
    }

    /// Hand everything cached so far to the sink.
    pub fn flush(&mut self) -> Result<()> {
        if !self.out_buf.is_empty() {
            self.sink.put_buf(&self.out_buf)?;
            self.bytes_flushed += self.out_buf.len();
            self.out_buf.clear();
        }
        Ok(())
    }

    /// Bytes handed to the sink so far.
    pub fn bytes_flushed(&self) -> usize {
        self.bytes_flushed
    }

    /// Mutable access to the sink, for writes that bypass the cache.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Recover the sink. Cached bytes that were never flushed are dropped.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
