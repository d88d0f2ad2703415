//! bjpeg CLI - streaming baseline JPEG encoder
//!
//! A command-line interface for the baseline-jpeg library.
//! Supports PNG, JPEG, and PPM/PGM input formats.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use baseline_jpeg::jpeg::{JpegEncoder, Params, Subsampling};
use baseline_jpeg::WriterSink;

/// Streaming baseline JPEG encoder.
///
/// Supports PNG, JPEG, and PPM/PGM input formats.
#[derive(Parser, Debug)]
#[command(name = "bjpeg")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input image file (PNG, JPEG, PPM, or PGM)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (defaults to INPUT with a .compressed.jpg extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JPEG quality (1-100, higher = better quality)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Chroma subsampling
    #[arg(long, value_enum)]
    subsampling: Option<SubsamplingArg>,

    /// Build optimized Huffman tables in a first pass
    #[arg(long)]
    two_pass: bool,

    /// Use the luma tables for chroma too
    #[arg(long)]
    no_chroma_discrimination: bool,

    /// Encoding preset (explicit flags override it)
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Convert to grayscale
    #[arg(long)]
    grayscale: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SubsamplingArg {
    /// Luma only (grayscale output)
    YOnly,
    /// 4:4:4 - No subsampling (best quality)
    H1v1,
    /// 4:2:2 - Horizontal chroma downsample
    H2v1,
    /// 4:2:0 - 2x2 chroma downsample (smaller file)
    H2v2,
}

impl From<SubsamplingArg> for Subsampling {
    fn from(arg: SubsamplingArg) -> Self {
        match arg {
            SubsamplingArg::YOnly => Subsampling::YOnly,
            SubsamplingArg::H1v1 => Subsampling::H1V1,
            SubsamplingArg::H2v1 => Subsampling::H2V1,
            SubsamplingArg::H2v2 => Subsampling::H2V2,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    /// Single pass with standard Huffman tables
    Fast,
    /// Two passes with optimized Huffman tables
    Balanced,
}

/// Decoded image data, 1 to 4 interleaved 8-bit channels.
struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    channels: usize,
    input_format: &'static str,
}

/// Detect input format from file header bytes.
fn detect_format(path: &PathBuf) -> Result<&'static str, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 8];
    file.read_exact(&mut header)?;

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if header.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok("png");
    }

    // JPEG: FF D8 FF
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok("jpeg");
    }

    if header.starts_with(b"P6") {
        return Ok("ppm");
    }

    if header.starts_with(b"P5") {
        return Ok("pgm");
    }

    Err("Unknown image format. Supported: PNG, JPEG, PPM (P6), PGM (P5)".into())
}

/// Decode a PNG file, expanding palettes and stripping 16-bit samples.
fn decode_png(path: &PathBuf) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut decoder = png::Decoder::new(file);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut pixels = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels)?;
    pixels.truncate(info.buffer_size());

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => return Err("Indexed PNG could not be expanded.".into()),
    };

    Ok(DecodedImage {
        width: info.width,
        height: info.height,
        pixels,
        channels,
        input_format: "PNG",
    })
}

/// Decode a JPEG file.
fn decode_jpeg(path: &PathBuf) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
    let pixels = decoder.decode()?;
    let info = decoder.info().ok_or("Failed to get JPEG info")?;

    let channels = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => 1,
        jpeg_decoder::PixelFormat::L16 => return Err("16-bit grayscale JPEG not supported.".into()),
        jpeg_decoder::PixelFormat::RGB24 => 3,
        jpeg_decoder::PixelFormat::CMYK32 => {
            return Err("CMYK JPEG not supported. Convert to RGB first.".into())
        }
    };

    Ok(DecodedImage {
        width: info.width as u32,
        height: info.height as u32,
        pixels,
        channels,
        input_format: "JPEG",
    })
}

/// Decode a PPM (P6) or PGM (P5) file.
fn decode_pnm(path: &PathBuf) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = String::new();
    read_token(&mut reader, &mut magic)?;

    let (channels, input_format) = match magic.as_str() {
        "P5" => (1, "PGM"),
        "P6" => (3, "PPM"),
        _ => {
            return Err(format!(
                "Unsupported format '{}'. Expected P5 (PGM) or P6 (PPM)",
                magic
            )
            .into())
        }
    };

    let mut token = String::new();

    read_token(&mut reader, &mut token)?;
    let width: u32 = token.parse()?;

    read_token(&mut reader, &mut token)?;
    let height: u32 = token.parse()?;

    read_token(&mut reader, &mut token)?;
    let max_val: u32 = token.parse()?;

    if max_val != 255 {
        return Err(format!(
            "Unsupported max value {}. Only 8-bit (255) supported",
            max_val
        )
        .into());
    }

    let expected_size = width as usize * height as usize * channels;
    let mut pixels = vec![0u8; expected_size];
    reader.read_exact(&mut pixels)?;

    Ok(DecodedImage {
        width,
        height,
        pixels,
        channels,
        input_format,
    })
}

/// Read next whitespace-delimited token, skipping comments.
fn read_token<R: BufRead>(reader: &mut R, token: &mut String) -> std::io::Result<()> {
    token.clear();
    let mut in_comment = false;

    loop {
        let mut byte = [0u8; 1];
        if reader.read(&mut byte)? == 0 {
            break;
        }

        let ch = byte[0] as char;

        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }

        if ch == '#' {
            in_comment = true;
            continue;
        }

        if ch.is_ascii_whitespace() {
            if !token.is_empty() {
                break;
            }
            continue;
        }

        token.push(ch);
    }

    Ok(())
}

/// Load and decode an image file.
fn load_image(path: &PathBuf) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    match detect_format(path)? {
        "png" => decode_png(path),
        "jpeg" => decode_jpeg(path),
        "ppm" | "pgm" => decode_pnm(path),
        other => Err(format!("Unsupported format: {}", other).into()),
    }
}

/// Reduce any decoded layout to what the encoder accepts: 1 or 3 channels.
fn to_encoder_layout(pixels: Vec<u8>, channels: usize, grayscale: bool) -> (Vec<u8>, usize) {
    let luma = |r: u8, g: u8, b: u8| -> u8 {
        // ITU-R BT.601 luma coefficients
        ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
    };

    match (channels, grayscale) {
        (1, _) => (pixels, 1),
        (2, _) => (pixels.iter().step_by(2).copied().collect(), 1),
        (3, false) => (pixels, 3),
        (3, true) => (
            pixels
                .chunks_exact(3)
                .map(|p| luma(p[0], p[1], p[2]))
                .collect(),
            1,
        ),
        (_, false) => (
            pixels
                .chunks_exact(channels)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect(),
            3,
        ),
        (_, true) => (
            pixels
                .chunks_exact(channels)
                .map(|p| luma(p[0], p[1], p[2]))
                .collect(),
            1,
        ),
    }
}

fn build_params(args: &Args) -> Params {
    let mut params = match args.preset {
        Some(PresetArg::Fast) => Params::fast(85),
        Some(PresetArg::Balanced) => Params::balanced(85),
        None => Params::default(),
    };
    if let Some(quality) = args.quality {
        params = params.quality(quality);
    }
    if let Some(subsampling) = args.subsampling {
        params = params.subsampling(subsampling.into());
    }
    if args.two_pass {
        params = params.two_pass(true);
    }
    if args.no_chroma_discrimination {
        params = params.no_chroma_discrimination(true);
    }
    params
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load input image
    let start = Instant::now();
    let img = load_image(&args.input)?;
    let load_time = start.elapsed();

    let width = img.width;
    let height = img.height;

    if args.verbose {
        eprintln!("Loaded: {:?}", args.input);
        eprintln!("  Input format: {}", img.input_format);
        eprintln!("  Dimensions: {}x{}", width, height);
        eprintln!("  Channels: {}", img.channels);
        eprintln!("  Load time: {:.2?}", load_time);
    }

    let output_path = args.output.clone().unwrap_or_else(|| {
        let mut path = args.input.clone();
        path.set_extension("compressed.jpg");
        path
    });

    let (pixels, channels) = to_encoder_layout(img.pixels, img.channels, args.grayscale);
    let params = build_params(&args);

    // Encode, one scanline at a time
    let encode_start = Instant::now();
    let sink = WriterSink::new(BufWriter::new(File::create(&output_path)?));
    let mut encoder = JpegEncoder::new();
    encoder.init(sink, width, height, channels, params)?;
    for row in pixels.chunks_exact(width as usize * channels) {
        encoder.process_scanline(row)?;
    }
    encoder.process_end_of_image()?;
    let output_size = encoder.bytes_written() as u64;
    if let Some(mut sink) = encoder.deinit() {
        sink.flush()?;
    }
    let encode_time = encode_start.elapsed();

    // Report results
    let input_size = fs::metadata(&args.input)?.len();
    let ratio = if input_size > 0 {
        (output_size as f64 / input_size as f64) * 100.0
    } else {
        0.0
    };

    if args.verbose {
        eprintln!("Output: {:?}", output_path);
        eprintln!("  Channels: {}", channels);
        eprintln!("  Quality: {}", params.quality);
        eprintln!("  Subsampling: {:?}", params.subsampling);
        eprintln!("  Two-pass: {}", params.two_pass);
        eprintln!(
            "  Chroma discrimination: {}",
            !params.no_chroma_discrimination
        );
        eprintln!("  Encode time: {:.2?}", encode_time);
        eprintln!(
            "  Size: {} -> {} ({:.1}%)",
            format_size(input_size),
            format_size(output_size),
            ratio
        );
    } else {
        println!(
            "{} -> {} ({:.1}%)",
            format_size(input_size),
            format_size(output_size),
            ratio
        );
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
