//! Fuzz target for JPEG encoding.
//!
//! Streams arbitrary pixels and parameters through the encoder and checks
//! that it never panics and always produces a framed stream.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use baseline_jpeg::jpeg::{JpegEncoder, Params, Subsampling};

/// Structured input for JPEG encoding fuzzing.
#[derive(Arbitrary, Debug)]
struct JpegInput {
    /// Image width (clamped to reasonable range)
    width: u8,
    /// Image height (clamped to reasonable range)
    height: u8,
    /// Quality level, passed through unclamped
    quality: u8,
    /// Raw subsampling mode
    subsampling: u8,
    /// Use grayscale
    grayscale: bool,
    two_pass: bool,
    no_chroma_discrimination: bool,
    /// Raw pixel data
    data: Vec<u8>,
}

fuzz_target!(|input: JpegInput| {
    let width = (input.width as u32 % 64).max(1);
    let height = (input.height as u32 % 64).max(1);
    let channels = if input.grayscale { 1 } else { 3 };
    let pitch = width as usize * channels;

    if input.data.len() < pitch * height as usize {
        return;
    }

    let Ok(subsampling) = Subsampling::try_from(input.subsampling % 4) else {
        return;
    };
    let params = Params {
        quality: input.quality,
        subsampling,
        no_chroma_discrimination: input.no_chroma_discrimination,
        two_pass: input.two_pass,
    };

    let mut encoder = JpegEncoder::new();
    if encoder
        .init(Vec::new(), width, height, channels, params)
        .is_err()
    {
        assert!(input.quality == 0 || input.quality > 100);
        return;
    }

    for row in input.data.chunks_exact(pitch).take(height as usize) {
        encoder.process_scanline(row).expect("valid scanline rejected");
    }
    encoder.process_end_of_image().expect("end of image rejected");

    let encoded = encoder.deinit().expect("finished encoder lost its sink");
    assert_eq!(&encoded[..2], &[0xFF, 0xD8], "Invalid JPEG SOI marker");
    assert_eq!(
        &encoded[encoded.len() - 2..],
        &[0xFF, 0xD9],
        "Invalid JPEG EOI marker"
    );
});
