//! Codestream parameter sets (SIZ, COD and NLT).

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::HtError;

/// Precision and signedness of one component (SIZ Ssiz).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    pub precision: u8,
    pub signed: bool,
}

impl ComponentInfo {
    pub fn to_ssiz(self) -> u8 {
        ((self.signed as u8) << 7) | (self.precision - 1)
    }

    pub fn from_ssiz(ssiz: u8) -> Self {
        Self {
            precision: (ssiz & 0x7F) + 1,
            signed: ssiz & 0x80 != 0,
        }
    }
}

/// Image and tile size. The tile always covers the whole image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizParams {
    pub width: u32,
    pub height: u32,
    pub components: Vec<ComponentInfo>,
}

impl SizParams {
    pub fn set_image_extent(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn set_num_components(&mut self, count: usize) {
        self.components.resize(
            count,
            ComponentInfo {
                precision: 16,
                signed: false,
            },
        );
    }

    pub fn set_component(&mut self, index: usize, precision: u8, signed: bool) {
        self.components[index] = ComponentInfo { precision, signed };
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }
}

/// Order in which packets are laid out in the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ProgressionOrder {
    Lrcp = 0,
    Rlcp = 1,
    Rpcl = 2,
    Pcrl = 3,
    Cprl = 4,
}

impl ProgressionOrder {
    /// Resolution-major orders visit every component at a resolution before
    /// moving on. With one layer and one precinct only this distinction
    /// changes the byte layout.
    pub fn is_resolution_major(self) -> bool {
        matches!(self, Self::Lrcp | Self::Rlcp | Self::Rpcl)
    }
}

/// Code-block dimensions stored as exponents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockSize {
    pub width_exp: u8,
    pub height_exp: u8,
}

impl CodeBlockSize {
    pub fn new(width: u32, height: u32) -> Result<Self, HtError> {
        if !width.is_power_of_two() || !height.is_power_of_two() {
            return Err(HtError::InvalidParameter("code-block size must be a power of two"));
        }
        let width_exp = width.trailing_zeros() as u8;
        let height_exp = height.trailing_zeros() as u8;
        if !(2..=10).contains(&width_exp) || !(2..=10).contains(&height_exp) {
            return Err(HtError::InvalidParameter("code-block size out of range"));
        }
        if width_exp + height_exp > 12 {
            return Err(HtError::InvalidParameter("code-block area exceeds 4096 samples"));
        }
        Ok(Self {
            width_exp,
            height_exp,
        })
    }

    pub fn width(&self) -> usize {
        1 << self.width_exp
    }

    pub fn height(&self) -> usize {
        1 << self.height_exp
    }
}

/// Coding style (COD).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodParams {
    pub progression_order: ProgressionOrder,
    pub color_transform: bool,
    pub decomposition_levels: u8,
    pub code_block: CodeBlockSize,
    pub reversible: bool,
}

impl Default for CodParams {
    fn default() -> Self {
        Self {
            progression_order: ProgressionOrder::Lrcp,
            color_transform: false,
            decomposition_levels: 5,
            code_block: CodeBlockSize {
                width_exp: 6,
                height_exp: 6,
            },
            reversible: true,
        }
    }
}

impl CodParams {
    pub fn set_color_transform(&mut self, enabled: bool) {
        self.color_transform = enabled;
    }

    pub fn set_reversible(&mut self, reversible: bool) {
        self.reversible = reversible;
    }

    pub fn set_num_decomposition(&mut self, levels: u8) {
        self.decomposition_levels = levels;
    }

    pub fn set_progression_order(&mut self, order: ProgressionOrder) {
        self.progression_order = order;
    }

    pub fn set_code_block(&mut self, code_block: CodeBlockSize) {
        self.code_block = code_block;
    }
}

/// Non-linear point transform applied by the engine around the wavelet path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum NltType {
    None = 0,
    SignMagnitude = 3,
}

/// Everything needed to configure one codestream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodestreamParams {
    pub siz: SizParams,
    pub cod: CodParams,
    pub nlt: Option<NltType>,
}

impl CodestreamParams {
    pub fn validate(&self) -> Result<(), HtError> {
        if self.siz.width == 0 || self.siz.height == 0 {
            return Err(HtError::InvalidParameter("image extent must be non-zero"));
        }
        if self.siz.components.is_empty() {
            return Err(HtError::InvalidParameter("at least one component is required"));
        }
        if self.siz.components.len() > u16::MAX as usize {
            return Err(HtError::InvalidParameter("too many components"));
        }
        if self
            .siz
            .components
            .iter()
            .any(|c| c.precision == 0 || c.precision > 16)
        {
            return Err(HtError::InvalidParameter("component precision must be 1..=16"));
        }
        if !self.cod.reversible {
            return Err(HtError::InvalidParameter("only the reversible path is supported"));
        }
        if self.cod.decomposition_levels > 32 {
            return Err(HtError::InvalidParameter("too many decomposition levels"));
        }
        if self.cod.color_transform && self.siz.components.len() < 3 {
            return Err(HtError::InvalidParameter("colour transform needs three components"));
        }
        Ok(())
    }

    /// True when the engine itself folds signed samples.
    pub fn engine_sign_magnitude(&self) -> bool {
        self.nlt == Some(NltType::SignMagnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssiz_roundtrip() {
        let info = ComponentInfo {
            precision: 16,
            signed: true,
        };
        assert_eq!(info.to_ssiz(), 0x8F);
        assert_eq!(ComponentInfo::from_ssiz(0x8F), info);
    }

    #[test]
    fn test_code_block_size() {
        let cb = CodeBlockSize::new(128, 32).unwrap();
        assert_eq!((cb.width(), cb.height()), (128, 32));
        assert!(CodeBlockSize::new(100, 32).is_err());
        assert!(CodeBlockSize::new(1024, 64).is_err());
    }

    #[test]
    fn test_validate_rejects_colour_transform_on_two_components() {
        let mut params = CodestreamParams::default();
        params.siz.set_image_extent(4, 4);
        params.siz.set_num_components(2);
        params.cod.set_color_transform(true);
        assert!(params.validate().is_err());

        params.siz.set_num_components(3);
        assert!(params.validate().is_ok());
    }
}
