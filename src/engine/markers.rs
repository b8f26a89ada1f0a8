use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Second byte of the codestream marker codes the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MarkerCode {
    /// SOC: Start of codestream.
    StartOfCodestream = 0x4F,

    /// SIZ: Image and tile size.
    ImageAndTileSize = 0x51,

    /// COD: Coding style default.
    CodingStyleDefault = 0x52,

    /// QCD: Quantization default.
    QuantizationDefault = 0x5C,

    /// COM: Comment.
    Comment = 0x64,

    /// NLT: Non-linearity point transform.
    NonLinearTransform = 0x76,

    /// SOT: Start of tile-part.
    StartOfTile = 0x90,

    /// SOD: Start of data.
    StartOfData = 0x93,

    /// EOC: End of codestream.
    EndOfCodestream = 0xD9,
}

impl MarkerCode {
    /// Segments that carry a length field after the marker.
    pub fn has_segment(self) -> bool {
        !matches!(
            self,
            Self::StartOfCodestream | Self::StartOfData | Self::EndOfCodestream
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_from_byte() {
        assert_eq!(MarkerCode::try_from(0x51).unwrap(), MarkerCode::ImageAndTileSize);
        assert_eq!(u8::from(MarkerCode::EndOfCodestream), 0xD9);
        assert!(MarkerCode::try_from(0x00).is_err());
        assert!(!MarkerCode::StartOfData.has_segment());
    }
}
