//! # baseline-jpeg
//!
//! A streaming, baseline-sequential JPEG encoder.
//!
//! Pixels go in one scanline at a time; a standards-conformant JFIF byte
//! stream comes out through an [`OutputSink`]. Everything from color
//! conversion to Huffman coding is implemented here, with no external codec.
//!
//! ## Features
//!
//! - **Streaming**: only one MCU row of samples is held in memory
//! - **Grayscale and RGB** input, with luma-only, 4:4:4, 4:2:2 or 4:2:0 output
//! - **Two-pass mode** builds image-optimal Huffman tables
//! - Pluggable output: `Vec<u8>`, any `std::io::Write`, a fixed memory
//!   region, or a closure
//!
//! ## Example
//!
//! ```rust
//! use baseline_jpeg::jpeg::{self, Params, Subsampling};
//!
//! // 2x2 RGB image
//! let pixels: Vec<u8> = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
//! let params = Params::default().quality(90).subsampling(Subsampling::H1V1);
//! let jpeg_data = jpeg::encode(&pixels, 2, 2, 3, &params).unwrap();
//! assert_eq!(&jpeg_data[..2], &[0xFF, 0xD8]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bits;
pub mod color;
pub mod error;
pub mod jpeg;
pub mod sink;

pub use color::ColorType;
pub use error::{Error, ErrorKind, Result};
pub use jpeg::{EncoderState, JpegEncoder, Params, Subsampling};
pub use sink::{put_obj, CallbackSink, MemorySink, OutputSink, WriterSink};
