//! JPEG conformance tests.
//!
//! Encodes synthetic images in every mode, walks the marker structure of
//! the output and decodes it with the `image` crate.

use baseline_jpeg::jpeg::{self, Params, Subsampling};
use baseline_jpeg::Error;
use image::GenericImageView;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

mod support;
use support::synthetic;

const ALL_MODES: [Subsampling; 4] = [
    Subsampling::YOnly,
    Subsampling::H1V1,
    Subsampling::H2V1,
    Subsampling::H2V2,
];

/// A marker segment: marker byte and payload (length field excluded).
struct Segment<'a> {
    marker: u8,
    payload: &'a [u8],
}

/// Walk the header segments up to and including SOS.
/// Returns the segments and the offset where entropy-coded data begins.
fn walk_headers(jpeg: &[u8]) -> (Vec<Segment<'_>>, usize) {
    assert!(jpeg.starts_with(&[0xFF, 0xD8]), "missing SOI");

    let mut segments = Vec::new();
    let mut offset = 2;
    loop {
        assert!(offset + 4 <= jpeg.len(), "truncated header at {offset}");
        assert_eq!(jpeg[offset], 0xFF, "marker sync lost at {offset}");
        let marker = jpeg[offset + 1];
        let len = u16::from_be_bytes([jpeg[offset + 2], jpeg[offset + 3]]) as usize;
        assert!(len >= 2, "invalid length for marker 0x{:02X}", marker);
        let start = offset + 4;
        let end = offset + 2 + len;
        assert!(end <= jpeg.len(), "segment 0x{:02X} overruns buffer", marker);

        segments.push(Segment {
            marker,
            payload: &jpeg[start..end],
        });
        offset = end;
        if marker == 0xDA {
            return (segments, offset);
        }
    }
}

fn count_markers(segments: &[Segment<'_>], marker: u8) -> usize {
    segments.iter().filter(|s| s.marker == marker).count()
}

fn sof0<'a>(segments: &'a [Segment<'a>]) -> &'a [u8] {
    segments
        .iter()
        .find(|s| s.marker == 0xC0)
        .map(|s| s.payload)
        .expect("SOF0 not found")
}

/// Entropy-coded bytes between the SOS header and EOI.
fn scan_data(jpeg: &[u8]) -> &[u8] {
    let (_, start) = walk_headers(jpeg);
    assert!(jpeg.ends_with(&[0xFF, 0xD9]), "missing EOI");
    &jpeg[start..jpeg.len() - 2]
}

fn mean_abs_error(a: &[u8], b: &[u8]) -> f64 {
    assert_eq!(a.len(), b.len());
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs() as u64)
        .sum();
    total as f64 / a.len() as f64
}

/// Test that JPEG output starts with SOI + APP0 and ends with EOI.
#[test]
fn test_jpeg_markers() {
    let pixels = vec![128u8; 8 * 8 * 3];
    let result = jpeg::encode(&pixels, 8, 8, 3, &Params::default()).unwrap();

    assert_eq!(&result[0..4], &[0xFF, 0xD8, 0xFF, 0xE0]);
    assert_eq!(&result[6..11], b"JFIF\0");
    assert_eq!(&result[result.len() - 2..], &[0xFF, 0xD9]);
}

/// Every mode produces exactly one frame and one scan.
#[test]
fn test_marker_structure_all_modes() {
    let pixels = synthetic::gradient_rgb(40, 24);
    for two_pass in [false, true] {
        for mode in ALL_MODES {
            let params = Params::default().subsampling(mode).two_pass(two_pass);
            let out = jpeg::encode(&pixels, 40, 24, 3, &params).unwrap();
            let (segments, _) = walk_headers(&out);

            assert_eq!(segments[0].marker, 0xE0, "APP0 must follow SOI");
            assert_eq!(count_markers(&segments, 0xC0), 1, "{mode:?}");
            assert_eq!(count_markers(&segments, 0xDA), 1, "{mode:?}");
            assert_eq!(out.windows(2).filter(|w| *w == [0xFF, 0xD8]).count(), 1);
            assert!(out.ends_with(&[0xFF, 0xD9]));

            let (dqt, dht) = if mode == Subsampling::YOnly {
                (1, 2)
            } else {
                (2, 4)
            };
            assert_eq!(count_markers(&segments, 0xDB), dqt, "{mode:?}");
            assert_eq!(count_markers(&segments, 0xC4), dht, "{mode:?}");
        }
    }
}

/// SOF0 sampling factors follow the subsampling mode.
#[test]
fn test_sof0_sampling_factors() {
    let pixels = synthetic::gradient_rgb(16, 16);
    let expected: [(Subsampling, &[u8]); 4] = [
        (Subsampling::YOnly, &[1, 0x11, 0]),
        (Subsampling::H1V1, &[1, 0x11, 0, 2, 0x11, 1, 3, 0x11, 1]),
        (Subsampling::H2V1, &[1, 0x21, 0, 2, 0x11, 1, 3, 0x11, 1]),
        (Subsampling::H2V2, &[1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]),
    ];

    for (mode, components) in expected {
        let out = jpeg::encode(&pixels, 16, 16, 3, &Params::default().subsampling(mode)).unwrap();
        let (segments, _) = walk_headers(&out);
        let sof = sof0(&segments);
        assert_eq!(sof[0], 8, "precision");
        assert_eq!(&sof[1..5], &[0, 16, 0, 16]);
        assert_eq!(sof[5] as usize, components.len() / 3);
        assert_eq!(&sof[6..], components, "{mode:?}");
    }
}

/// A white 16x16 image at q90 decodes back to white.
#[test]
fn test_white_h2v2_decodes_white() {
    let pixels = synthetic::solid_color(16, 16, 255, 255, 255);
    let params = Params::default().quality(90);
    let out = jpeg::encode(&pixels, 16, 16, 3, &params).unwrap();

    assert_eq!(&out[..4], &[0xFF, 0xD8, 0xFF, 0xE0]);
    let (segments, _) = walk_headers(&out);
    assert_eq!(&sof0(&segments)[6..], &[1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);

    let decoded = image::load_from_memory(&out).expect("decode").to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 16));
    assert!(decoded.as_raw().iter().all(|&v| v >= 250));
}

/// Gray input yields a single-component frame with one table class.
#[test]
fn test_gray_single_component() {
    let pixels = synthetic::solid_gray(8, 8, 77);
    let out = jpeg::encode(&pixels, 8, 8, 1, &Params::default()).unwrap();
    let (segments, _) = walk_headers(&out);

    assert_eq!(sof0(&segments)[5], 1);
    assert_eq!(count_markers(&segments, 0xDB), 1);
    assert_eq!(count_markers(&segments, 0xC4), 2);

    let decoded = image::load_from_memory(&out).expect("decode").to_luma8();
    assert!(decoded.as_raw().iter().all(|&v| (v as i32 - 77).abs() <= 2));
}

/// Gray sources ignore the requested subsampling.
#[test]
fn test_gray_ignores_subsampling() {
    let pixels = synthetic::gradient_gray(20, 12);
    let reference = jpeg::encode(&pixels, 20, 12, 1, &Params::default()).unwrap();
    for mode in ALL_MODES {
        let out = jpeg::encode(&pixels, 20, 12, 1, &Params::default().subsampling(mode)).unwrap();
        assert_eq!(out, reference, "{mode:?}");
    }
}

/// Turning off chroma discrimination collapses the tables into one class.
#[test]
fn test_no_chroma_discrimination_tables() {
    let pixels = synthetic::gradient_rgb(32, 32);
    let params = Params::default().no_chroma_discrimination(true);
    let out = jpeg::encode(&pixels, 32, 32, 3, &params).unwrap();
    let (segments, _) = walk_headers(&out);

    assert_eq!(count_markers(&segments, 0xDB), 1);
    assert_eq!(count_markers(&segments, 0xC4), 2);
    // Every component points at table 0
    let sof = sof0(&segments);
    assert_eq!(sof[8], 0);
    assert_eq!(sof[11], 0);
    assert_eq!(sof[14], 0);

    let sos = segments.last().unwrap();
    assert_eq!(sos.payload, &[3, 1, 0x00, 2, 0x00, 3, 0x00, 0, 63, 0]);

    let decoded = image::load_from_memory(&out).expect("decode");
    assert_eq!(decoded.dimensions(), (32, 32));
}

/// DQT carries the libjpeg-scaled tables in zigzag order.
#[test]
fn test_dqt_quality_scaling() {
    let pixels = synthetic::solid_gray(8, 8, 128);

    let out = jpeg::encode(&pixels, 8, 8, 1, &Params::default().quality(50)).unwrap();
    let (segments, _) = walk_headers(&out);
    let dqt = segments.iter().find(|s| s.marker == 0xDB).unwrap().payload;
    assert_eq!(dqt.len(), 65);
    assert_eq!(dqt[0], 0);
    assert_eq!(&dqt[1..5], &[16, 11, 12, 14]);

    let out = jpeg::encode(&pixels, 8, 8, 1, &Params::default().quality(100)).unwrap();
    let (segments, _) = walk_headers(&out);
    let dqt = segments.iter().find(|s| s.marker == 0xDB).unwrap().payload;
    assert!(dqt[1..].iter().all(|&q| q == 1));

    let out = jpeg::encode(&pixels, 8, 8, 1, &Params::default().quality(1)).unwrap();
    let (segments, _) = walk_headers(&out);
    let dqt = segments.iter().find(|s| s.marker == 0xDB).unwrap().payload;
    assert!(dqt[1..].iter().all(|&q| (1..=255).contains(&q)));
    assert_eq!(dqt[1], 255);
}

/// Every 0xFF in entropy-coded data is followed by a stuffed zero.
#[test]
fn test_scan_data_byte_stuffing() {
    for (name, w, h, pixels) in synthetic::generate_minimal_test_suite() {
        for two_pass in [false, true] {
            let params = Params::default().quality(95).two_pass(two_pass);
            let out = jpeg::encode(&pixels, w, h, 3, &params).unwrap();
            let scan = scan_data(&out);
            for (i, &b) in scan.iter().enumerate() {
                if b == 0xFF {
                    assert_eq!(
                        scan.get(i + 1),
                        Some(&0x00),
                        "unstuffed 0xFF in {name} at {i}"
                    );
                }
            }
        }
    }
}

/// Two-pass output is never larger than single-pass on realistic content.
#[test]
fn test_two_pass_not_larger() {
    let images = [
        ("gradient", 64, 64, synthetic::gradient_rgb(64, 64)),
        ("noise", 48, 48, synthetic::noise(48, 48, 7)),
        ("checker", 64, 32, synthetic::checkerboard(64, 32, 4)),
    ];
    for (name, w, h, pixels) in images {
        for mode in ALL_MODES {
            let base = Params::default().subsampling(mode);
            let single = jpeg::encode(&pixels, w, h, 3, &base).unwrap();
            let double = jpeg::encode(&pixels, w, h, 3, &base.two_pass(true)).unwrap();
            assert!(
                double.len() <= single.len(),
                "{name} {mode:?}: two-pass {} > single-pass {}",
                double.len(),
                single.len()
            );
        }
    }
}

/// Two-pass and single-pass decode to the same pixels.
#[test]
fn test_two_pass_same_pixels() {
    let pixels = synthetic::gradient_rgb(37, 29);
    let single = jpeg::encode(&pixels, 37, 29, 3, &Params::default()).unwrap();
    let double = jpeg::encode(&pixels, 37, 29, 3, &Params::default().two_pass(true)).unwrap();

    let a = image::load_from_memory(&single).unwrap().to_rgb8();
    let b = image::load_from_memory(&double).unwrap().to_rgb8();
    assert_eq!(a.as_raw(), b.as_raw());
}

/// Decoded output stays close to the source at high quality.
#[test]
fn test_color_fidelity() {
    let (w, h) = (48u32, 40u32);
    let pixels = synthetic::gradient_rgb(w, h);
    for mode in [Subsampling::H1V1, Subsampling::H2V1, Subsampling::H2V2] {
        let params = Params::default().quality(95).subsampling(mode);
        let out = jpeg::encode(&pixels, w, h, 3, &params).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        let err = mean_abs_error(decoded.as_raw(), &pixels);
        assert!(err < 4.0, "{mode:?}: mean error {err}");
    }
}

/// RGB input with luma-only output decodes as grayscale.
#[test]
fn test_rgb_y_only_is_luma() {
    let pixels = synthetic::solid_color(16, 8, 255, 0, 0);
    let params = Params::default().subsampling(Subsampling::YOnly).quality(95);
    let out = jpeg::encode(&pixels, 16, 8, 3, &params).unwrap();
    let (segments, _) = walk_headers(&out);
    assert_eq!(sof0(&segments)[5], 1);

    // BT.601 luma of pure red
    let decoded = image::load_from_memory(&out).unwrap().to_luma8();
    assert!(decoded.as_raw().iter().all(|&v| (v as i32 - 76).abs() <= 2));
}

/// Sizes that leave partial MCUs in every mode.
#[test]
fn test_edge_case_dimensions() {
    for &(w, h, name) in synthetic::EDGE_CASE_DIMENSIONS {
        let pixels = synthetic::gradient_rgb(w, h);
        for mode in ALL_MODES {
            let params = Params::default().subsampling(mode);
            let out = jpeg::encode(&pixels, w, h, 3, &params)
                .unwrap_or_else(|e| panic!("{name} {mode:?}: {e}"));
            let decoded = image::load_from_memory(&out).expect("decode");
            assert_eq!(decoded.dimensions(), (w, h), "{name} {mode:?}");
        }
    }
}

/// Higher quality never produces a smaller file on the same image.
#[test]
fn test_quality_levels() {
    let pixels = synthetic::gradient_rgb(64, 64);
    let sizes: Vec<(u8, usize)> = [10, 25, 50, 75, 90, 100]
        .iter()
        .map(|&q| {
            let params = Params::default().quality(q);
            (q, jpeg::encode(&pixels, 64, 64, 3, &params).unwrap().len())
        })
        .collect();

    for pair in sizes.windows(2) {
        assert!(
            pair[1].1 >= pair[0].1,
            "Quality {} produced {} bytes, but quality {} produced {} bytes",
            pair[1].0,
            pair[1].1,
            pair[0].0,
            pair[0].1
        );
    }
}

/// Solid content compresses better than noise.
#[test]
fn test_pattern_compression() {
    let solid = synthetic::solid_color(64, 64, 128, 128, 128);
    let noisy = synthetic::noise(64, 64, 42);
    let params = Params::default();
    let solid_result = jpeg::encode(&solid, 64, 64, 3, &params).unwrap();
    let noisy_result = jpeg::encode(&noisy, 64, 64, 3, &params).unwrap();
    assert!(solid_result.len() < noisy_result.len());
}

/// Test that encoding produces deterministic output.
#[test]
fn test_deterministic() {
    let pixels = synthetic::noise(24, 24, 9);
    for two_pass in [false, true] {
        let params = Params::default().two_pass(two_pass);
        let a = jpeg::encode(&pixels, 24, 24, 3, &params).unwrap();
        let b = jpeg::encode(&pixels, 24, 24, 3, &params).unwrap();
        assert_eq!(a, b);
    }
}

/// Test error handling.
#[test]
fn test_error_handling() {
    let pixels = vec![0u8; 8 * 8 * 3];
    let params = Params::default();

    assert!(matches!(
        jpeg::encode(&pixels, 8, 8, 3, &params.quality(0)),
        Err(Error::InvalidQuality(0))
    ));
    assert!(matches!(
        jpeg::encode(&pixels, 8, 8, 3, &params.quality(101)),
        Err(Error::InvalidQuality(101))
    ));
    assert!(matches!(
        jpeg::encode(&pixels, 0, 8, 3, &params),
        Err(Error::InvalidDimensions { .. })
    ));
    assert!(matches!(
        jpeg::encode(&pixels, 8, 8, 4, &params),
        Err(Error::UnsupportedChannels(4))
    ));
    assert!(matches!(
        jpeg::encode(&[0, 0], 8, 8, 3, &params),
        Err(Error::InvalidScanlineLength { .. })
    ));
}

#[test]
fn test_image_too_large() {
    let err = jpeg::encode(&[0u8; 3], 65_536, 1, 3, &Params::default()).unwrap_err();
    assert!(matches!(err, Error::ImageTooLarge { .. }));
}

/// Randomized small-image decode across Gray/RGB and every mode.
#[test]
fn test_jpeg_decode_random_small() {
    let mut rng = StdRng::seed_from_u64(2025);
    let dims = [(1, 1), (2, 3), (5, 4), (8, 8), (16, 9), (17, 33)];

    for &(w, h) in &dims {
        for channels in [1usize, 3] {
            let mut data = vec![0u8; w * h * channels];
            rng.fill(data.as_mut_slice());
            for mode in ALL_MODES {
                let params = Params::default().subsampling(mode).quality(75);
                let out = jpeg::encode(&data, w as u32, h as u32, channels, &params).unwrap();
                let decoded = image::load_from_memory(&out).expect("decode");
                assert_eq!(decoded.dimensions(), (w as u32, h as u32));
            }
        }
    }
}

fn jpeg_case_strategy() -> impl Strategy<Value = (u32, u32, Params, usize, Vec<u8>)> {
    (1u32..40, 1u32..40, 1u8..=100, any::<bool>(), any::<bool>(), any::<bool>())
        .prop_flat_map(|(w, h, quality, gray, two_pass, no_discrimination)| {
            let channels = if gray { 1 } else { 3 };
            let subsampling = prop_oneof![
                Just(Subsampling::YOnly),
                Just(Subsampling::H1V1),
                Just(Subsampling::H2V1),
                Just(Subsampling::H2V2),
            ];
            let len = (w * h) as usize * channels;
            (subsampling, proptest::collection::vec(any::<u8>(), len)).prop_map(
                move |(subsampling, data)| {
                    let params = Params {
                        quality,
                        subsampling,
                        no_chroma_discrimination: no_discrimination,
                        two_pass,
                    };
                    (w, h, params, channels, data)
                },
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]
    #[test]
    fn prop_jpeg_decode_randomized_params(
        (w, h, params, channels, data) in jpeg_case_strategy()
    ) {
        let encoded = jpeg::encode(&data, w, h, channels, &params).unwrap();

        prop_assert!(encoded.starts_with(&[0xFF, 0xD8]));
        prop_assert!(encoded.ends_with(&[0xFF, 0xD9]));

        let decoded = image::load_from_memory(&encoded).expect("decode");
        prop_assert_eq!(decoded.dimensions(), (w, h));
    }
}
