// Whole-image round trips through every HT variant.
//
// The image is 1371x159 with channels R, G, B, A and H, filled with zeros, a
// checkerboard, a sine ramp and pseudo-random bit patterns.

use std::sync::{Arc, Mutex};

use half::f16;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use exrht_rs::chunk::BlockIter;
use exrht_rs::engine::MessageLevel;
use exrht_rs::{
    BlockCompressor, Channel, ChannelSet, Compression, CompressorConfig, DataWindow, HtError,
    ImageHeader, PixelType, compress_chunk, compress_image, uncompress_chunk, uncompress_image,
};

const WIDTH: usize = 1371;
const HEIGHT: usize = 159;
const CHANNELS: [&str; 5] = ["R", "G", "B", "A", "H"];

fn header(compression: Compression) -> ImageHeader {
    ImageHeader::new(
        DataWindow::new(-7, 11, -7 + WIDTH as i32 - 1, 11 + HEIGHT as i32 - 1).unwrap(),
        ChannelSet::from_names(CHANNELS).unwrap(),
        compression,
    )
}

/// Samples of the whole data window in scanline-block layout.
fn fill(f: impl Fn(usize, usize, usize) -> f16) -> Vec<u8> {
    let mut out = Vec::with_capacity(WIDTH * HEIGHT * CHANNELS.len() * 2);
    for y in 0..HEIGHT {
        for c in 0..CHANNELS.len() {
            for x in 0..WIDTH {
                out.extend_from_slice(&f(x, y, c).to_bits().to_ne_bytes());
            }
        }
    }
    out
}

fn zeros() -> Vec<u8> {
    fill(|_, _, _| f16::ZERO)
}

fn checker() -> Vec<u8> {
    fill(|x, y, _| f16::from_f32(((x + y) & 1) as f32))
}

fn sine() -> Vec<u8> {
    fill(|x, y, c| f16::from_f32((x as f32 * 0.013 + y as f32 * 0.07 + c as f32).sin() * 4.0))
}

fn random_bits(seed: u64) -> Vec<u8> {
    let mut bytes = vec![0u8; WIDTH * HEIGHT * CHANNELS.len() * 2];
    StdRng::seed_from_u64(seed).fill(&mut bytes[..]);
    bytes
}

fn roundtrip(compression: Compression, samples: &[u8]) -> usize {
    let header = header(compression);
    let mut compressor = compression
        .new_compressor(&header, header.scan_line_size())
        .unwrap();

    let image = compress_image(compressor.as_mut(), &header, samples).unwrap();
    let decoded = uncompress_image(compressor.as_mut(), &header, &image).unwrap();
    assert!(decoded == samples, "{compression} round trip differs");
    image.total_size()
}

#[test]
fn test_zero_image_all_variants() {
    let samples = zeros();
    for compression in Compression::ALL {
        let size = roundtrip(compression, &samples);
        assert!(size * 100 < samples.len(), "{compression}: {size} bytes");
    }
}

#[test]
fn test_checker_image_all_variants() {
    let samples = checker();
    for compression in Compression::ALL {
        let size = roundtrip(compression, &samples);
        assert!(size < samples.len(), "{compression}: {size} bytes");
    }
}

#[test]
fn test_sine_image_all_variants() {
    let samples = sine();
    for compression in Compression::ALL {
        let size = roundtrip(compression, &samples);
        assert!(size < samples.len(), "{compression}: {size} bytes");
    }
}

#[test]
fn test_random_bits_all_variants() {
    let samples = random_bits(0x5EED);
    for compression in Compression::ALL {
        roundtrip(compression, &samples);
    }
}

#[test]
fn test_backends_agree_on_decoded_samples() {
    let samples = sine();
    let header = header(Compression::Ht);
    let mut ht = Compression::Ht.new_compressor(&header, 0).unwrap();
    let mut htk = Compression::Htk.new_compressor(&header, 0).unwrap();

    let from_ht = ht.compress(&samples, 11).unwrap().to_vec();
    let from_htk = htk.compress(&samples, 11).unwrap().to_vec();
    assert_ne!(from_ht, from_htk);

    assert!(htk.uncompress(&from_ht, 11).unwrap() == &samples[..]);
    assert!(ht.uncompress(&from_htk, 11).unwrap() == &samples[..]);
}

#[test]
fn test_block_height_64_clamps_last_block() {
    let samples = sine();
    let header = header(Compression::Htk);
    let config = CompressorConfig::new().with_block_height(64);
    let mut compressor = Compression::Htk
        .new_compressor_with(&header, header.scan_line_size(), config)
        .unwrap();
    assert_eq!(compressor.num_scan_lines(), 64);

    let spans: Vec<_> = BlockIter::new(&header, 64).collect();
    assert_eq!(spans.iter().map(|s| s.rows).collect::<Vec<_>>(), vec![64, 64, 31]);
    assert_eq!(spans[2].start_row, 11 + 128);

    for span in &spans {
        let raw = &samples[span.offset..span.offset + span.len];
        let encoded = compressor.compress(raw, span.start_row).unwrap().to_vec();
        let decoded = compressor.uncompress(&encoded, span.start_row).unwrap();
        assert_eq!(decoded.len(), span.rows * header.scan_line_size());
        assert!(decoded == raw, "block at row {}", span.start_row);
    }
}

#[test]
fn test_seven_channels_rejected() {
    let header = ImageHeader::new(
        DataWindow::with_size(8, 8).unwrap(),
        ChannelSet::from_names(["R", "G", "B", "A", "H", "Z", "W"]).unwrap(),
        Compression::Ht,
    );
    for compression in Compression::ALL {
        let err = compression.new_compressor(&header, header.scan_line_size()).err();
        assert_eq!(err, Some(HtError::TooManyChannels { count: 7, max: 6 }));
    }
}

#[test]
fn test_unsupported_channel_rejected() {
    let mut channels = ChannelSet::from_names(["R", "G"]).unwrap();
    channels.insert(Channel::new("Z", PixelType::Float, 1, 1)).unwrap();
    let header = ImageHeader::new(DataWindow::with_size(8, 8).unwrap(), channels, Compression::Htk);

    let err = header.compression.new_compressor(&header, 64).err();
    assert!(matches!(err, Some(HtError::UnsupportedChannel { ref name, .. }) if name == "Z"));

    let mut subsampled = ChannelSet::new();
    subsampled.insert(Channel::new("Y", PixelType::Half, 2, 2)).unwrap();
    let header = ImageHeader::new(DataWindow::with_size(8, 8).unwrap(), subsampled, Compression::Ht);
    assert!(header.compression.new_compressor(&header, 64).is_err());
}

#[test]
fn test_caller_contract_violations() {
    let header = header(Compression::Ht256);
    let mut compressor = Compression::Ht256.new_compressor(&header, 0).unwrap();

    let short = vec![0u8; header.scan_line_size() * 10];
    assert!(matches!(
        compressor.compress(&short, 11),
        Err(HtError::BufferSizeMismatch { .. })
    ));
    assert!(matches!(
        compressor.compress(&short, 10),
        Err(HtError::RowOutOfRange { row: 10, .. })
    ));
    // The last ten rows of the data window fit exactly.
    assert!(compressor.compress(&short, 11 + 149).is_ok());
}

#[test]
fn test_geometry_mismatch_on_decode() {
    let samples = checker();
    let header = header(Compression::Ht);
    let config = CompressorConfig::new().with_block_height(64);
    let mut compressor = Compression::Ht
        .new_compressor_with(&header, 0, config)
        .unwrap();

    let first = &samples[..64 * header.scan_line_size()];
    let encoded = compressor.compress(first, 11).unwrap().to_vec();
    let err = compressor.uncompress(&encoded, 11 + 128).unwrap_err();
    assert_eq!(
        err,
        HtError::GeometryMismatch {
            expected_width: WIDTH,
            expected_height: 31,
            expected_components: 5,
            actual_width: WIDTH,
            actual_height: 64,
            actual_components: 5,
        }
    );
}

#[test]
fn test_oversized_extent_rejected_by_both_backends() {
    let header = ImageHeader::new(
        DataWindow::with_size(16, 4).unwrap(),
        ChannelSet::from_names(["Y"]).unwrap(),
        Compression::Ht,
    );
    let raw = vec![0x3Cu8; header.scan_line_size() * 4];

    for compression in Compression::ALL {
        let mut compressor = compression.new_compressor(&header, 0).unwrap();
        let mut encoded = compressor.compress(&raw, 0).unwrap().to_vec();
        // Xsiz, Ysiz, XTsiz and YTsiz of the SIZ segment.
        for offset in [8, 12, 24, 28] {
            encoded[offset..offset + 4].copy_from_slice(&60000u32.to_be_bytes());
        }
        assert!(
            matches!(
                compressor.uncompress(&encoded, 0),
                Err(HtError::GeometryMismatch {
                    actual_width: 60000,
                    actual_height: 60000,
                    ..
                })
            ),
            "{compression}"
        );
    }
}

#[test]
fn test_truncated_codestream_fails() {
    let samples = sine();
    let header = header(Compression::Htk);
    let mut compressor = Compression::Htk.new_compressor(&header, 0).unwrap();
    let encoded = compressor.compress(&samples, 11).unwrap().to_vec();

    for cut in [encoded.len() / 2, encoded.len() - 3, 40] {
        assert!(compressor.uncompress(&encoded[..cut], 11).is_err(), "cut at {cut}");
    }
}

#[test]
fn test_raw_fallback_for_incompressible_block() {
    let header = ImageHeader::new(
        DataWindow::with_size(4, 2).unwrap(),
        ChannelSet::from_names(["Y"]).unwrap(),
        Compression::Ht,
    );
    let mut raw = vec![0u8; header.scan_line_size() * 2];
    StdRng::seed_from_u64(7).fill(&mut raw[..]);

    for compression in Compression::ALL {
        let mut compressor = compression.new_compressor(&header, header.scan_line_size()).unwrap();
        let codestream_len = compressor.compress(&raw, 0).unwrap().len();
        assert!(codestream_len >= raw.len());

        let stored = compress_chunk(compressor.as_mut(), &raw, 0).unwrap().to_vec();
        assert_eq!(stored, raw);
        let restored = uncompress_chunk(compressor.as_mut(), &stored, 0, raw.len()).unwrap();
        assert_eq!(restored, &raw[..]);
    }
}

#[test]
fn test_parallel_instances_match_sequential() {
    let samples = random_bits(42);
    let header = header(Compression::Ht);
    let spans: Vec<_> = BlockIter::new(&header, 32).collect();
    let config = CompressorConfig::new().with_block_height(32);

    let encode_all = |compression: Compression| -> Vec<Vec<u8>> {
        let mut compressor = compression
            .new_compressor_with(&header, 0, config.clone())
            .unwrap();
        spans
            .iter()
            .map(|s| {
                compressor
                    .compress(&samples[s.offset..s.offset + s.len], s.start_row)
                    .unwrap()
                    .to_vec()
            })
            .collect()
    };

    for compression in [Compression::Ht, Compression::Htk] {
        let sequential = encode_all(compression);
        let parallel: Vec<Vec<u8>> = spans
            .par_iter()
            .map(|s| {
                let mut compressor = compression
                    .new_compressor_with(&header, 0, config.clone())
                    .unwrap();
                compressor
                    .compress(&samples[s.offset..s.offset + s.len], s.start_row)
                    .unwrap()
                    .to_vec()
            })
            .collect();
        assert_eq!(parallel, sequential, "{compression}");
    }
}

#[test]
fn test_message_handler_is_per_instance() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let config = CompressorConfig::new().with_message_handler(Arc::new(
        move |level: MessageLevel, text: &str| {
            sink.lock().unwrap().push((level, text.to_string()));
        },
    ));

    let header = header(Compression::Ht);
    let samples = checker();
    let mut observed = Compression::Ht
        .new_compressor_with(&header, 0, config)
        .unwrap();
    let mut quiet = Compression::Ht.new_compressor(&header, 0).unwrap();

    let mut encoded = observed.compress(&samples, 11).unwrap().to_vec();
    encoded.extend_from_slice(&[0, 0]);
    assert!(quiet.uncompress(&encoded, 11).unwrap() == &samples[..]);
    assert!(seen.lock().unwrap().is_empty());

    assert!(observed.uncompress(&encoded, 11).unwrap() == &samples[..]);
    assert!(observed.uncompress(&encoded[..20], 11).is_err());

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, MessageLevel::Warning);
    assert!(seen.iter().any(|(level, _)| *level == MessageLevel::Error));
}
