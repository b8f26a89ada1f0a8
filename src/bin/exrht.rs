//! exrht CLI - HT scanline-block compression of raw half-float images.
//!
//! Raw input holds the whole data window in scanline-block layout: for every
//! row, each channel's samples follow one another in channel order, as
//! native-endian 16-bit values.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

use exrht_rs::engine::EngineConfig;
use exrht_rs::engine::header::read_codestream;
use exrht_rs::{
    ChannelSet, CompressedImage, Compression, CompressorConfig, DataWindow, ImageHeader,
    compress_image, uncompress_image,
};

/// HT scanline-block compressor for half-float EXR samples
#[derive(Parser)]
#[command(name = "exrht")]
#[command(version)]
#[command(about = "Compress and decompress EXR scanline blocks with the HT codecs", long_about = None)]
#[command(after_help = "EXAMPLES:
    exrht encode -i pixels.raw -o pixels.htc -w 1371 -H 159 --channels R,G,B,A -c htk
    exrht decode -i pixels.htc -o pixels.raw -w 1371 -H 159 --channels R,G,B,A -c htk
    exrht info -i pixels.htc")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ImageArgs {
    /// Image width in pixels
    #[arg(short, long)]
    width: usize,

    /// Image height in pixels
    #[arg(short = 'H', long)]
    height: usize,

    /// Comma separated channel names in file order
    #[arg(long, value_delimiter = ',', default_value = "R,G,B,A")]
    channels: Vec<String>,

    /// First row of the data window
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    min_y: i32,

    /// HT variant
    #[arg(short, long, default_value = "ht", value_enum)]
    compression: CompressionArg,

    /// Override the variant's rows per block
    #[arg(long)]
    block_height: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a raw sample file into a chunk list
    #[command(visible_alias = "e")]
    Encode {
        #[arg(short, long, help = "Path to raw sample data")]
        input: PathBuf,

        #[arg(short, long, help = "Path for the chunk list")]
        output: PathBuf,

        #[command(flatten)]
        image: ImageArgs,
    },

    /// Decompress a chunk list back to raw samples
    #[command(visible_alias = "d")]
    Decode {
        #[arg(short, long, help = "Path to the chunk list")]
        input: PathBuf,

        #[arg(short, long, help = "Path for the raw sample data")]
        output: PathBuf,

        #[command(flatten)]
        image: ImageArgs,
    },

    /// Show the codestream parameters of every chunk
    #[command(visible_alias = "i")]
    Info {
        #[arg(short, long, help = "Path to the chunk list")]
        input: PathBuf,
    },

    /// List the HT variants
    #[command(visible_alias = "l")]
    List,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompressionArg {
    /// Software backend, 16000-line blocks
    Ht,
    /// Software backend, 256-line blocks
    Ht256,
    /// Proprietary backend, 16000-line blocks
    Htk,
    /// Proprietary backend, 256-line blocks
    Htk256,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Ht => Compression::Ht,
            CompressionArg::Ht256 => Compression::Ht256,
            CompressionArg::Htk => Compression::Htk,
            CompressionArg::Htk256 => Compression::Htk256,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            image,
        } => encode(&input, &output, &image),
        Commands::Decode {
            input,
            output,
            image,
        } => decode(&input, &output, &image),
        Commands::Info { input } => show_info(&input),
        Commands::List => list_compressions(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn image_header(args: &ImageArgs) -> Result<(ImageHeader, CompressorConfig), Box<dyn std::error::Error>> {
    let compression = Compression::from(args.compression);
    let data_window = DataWindow::with_size(args.width, args.height)?;
    let max_y = args
        .min_y
        .checked_add(data_window.max_y)
        .ok_or("--min-y pushes the data window past the last representable row")?;
    let data_window = DataWindow::new(data_window.min_x, args.min_y, data_window.max_x, max_y)?;
    let channels = ChannelSet::from_names(args.channels.iter().map(|s| s.trim().to_string()))?;
    let header = ImageHeader::new(data_window, channels, compression);

    let config = CompressorConfig::new()
        .with_block_height(args.block_height.unwrap_or(compression.scan_lines()));
    Ok((header, config))
}

fn encode(input: &PathBuf, output: &PathBuf, args: &ImageArgs) -> CliResult {
    let samples = fs::read(input)?;
    let (header, config) = image_header(args)?;
    let mut compressor =
        header
            .compression
            .new_compressor_with(&header, header.scan_line_size(), config)?;

    let image = compress_image(compressor.as_mut(), &header, &samples)?;
    fs::write(output, image.to_bytes()?)?;

    println!(
        "✓ Encoded {}x{} ({} channels) with {} into {} chunks: {} -> {} bytes",
        args.width,
        args.height,
        header.channels.len(),
        header.compression,
        image.chunks.len(),
        samples.len(),
        image.total_size()
    );
    Ok(())
}

fn decode(input: &PathBuf, output: &PathBuf, args: &ImageArgs) -> CliResult {
    let image = CompressedImage::from_bytes(&fs::read(input)?)?;
    let (header, config) = image_header(args)?;
    let mut compressor =
        header
            .compression
            .new_compressor_with(&header, header.scan_line_size(), config)?;

    let samples = uncompress_image(compressor.as_mut(), &header, &image)?;
    fs::write(output, &samples)?;

    println!(
        "✓ Decoded {}x{} ({} channels) to {:?}",
        args.width,
        args.height,
        header.channels.len(),
        output
    );
    Ok(())
}

fn show_info(input: &PathBuf) -> CliResult {
    let image = CompressedImage::from_bytes(&fs::read(input)?)?;
    println!("File:   {:?}", input);
    println!("Chunks: {}", image.chunks.len());
    println!("Size:   {} bytes", image.total_size());

    let config = EngineConfig::new();
    for (i, chunk) in image.chunks.iter().enumerate() {
        println!();
        println!("Chunk {i}: {} bytes", chunk.len());
        match read_codestream(chunk, &config) {
            Ok((params, tile)) => {
                println!("  Dimensions:  {}x{}", params.siz.width, params.siz.height);
                println!("  Components:  {}", params.siz.num_components());
                println!("  DWT levels:  {}", params.cod.decomposition_levels);
                println!("  Progression: {:?}", params.cod.progression_order);
                println!(
                    "  Code-block:  {}x{}",
                    params.cod.code_block.width(),
                    params.cod.code_block.height()
                );
                println!("  RCT:         {}", if params.cod.color_transform { "Yes" } else { "No" });
                println!("  NLT:         {:?}", params.nlt);
                println!("  Tile data:   {} bytes", tile.len());
            }
            Err(_) => println!("  Stored raw"),
        }
    }
    Ok(())
}

fn list_compressions() -> CliResult {
    println!("HT variants:");
    println!();
    for compression in Compression::ALL {
        let backend = if compression.is_proprietary() {
            "stripe backend, engine NLT"
        } else {
            "line backend, manual fold"
        };
        println!(
            "  {:<7} {:>5} lines per block, {}",
            compression.name(),
            compression.scan_lines(),
            backend
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(min_y: i32, height: usize) -> ImageArgs {
        ImageArgs {
            width: 8,
            height,
            channels: vec!["R".into(), "G".into(), "B".into()],
            min_y,
            compression: CompressionArg::Htk256,
            block_height: None,
        }
    }

    #[test]
    fn test_data_window_from_args() {
        let (header, config) = image_header(&args(-5, 10)).unwrap();
        assert_eq!((header.data_window.min_y, header.data_window.max_y), (-5, 4));
        assert_eq!(config.block_height(), 256);
    }

    #[test]
    fn test_min_y_overflow_is_an_error() {
        assert!(image_header(&args(i32::MAX, 2)).is_err());
        assert!(image_header(&args(i32::MAX, 1)).is_ok());
    }
}
