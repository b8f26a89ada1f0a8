//! Mapping between file channel order and codestream component order.
//!
//! The engine's reversible colour transform only applies to components 0, 1
//! and 2, so when a part carries channels named exactly `R`, `G` and `B` they
//! are moved to the front in that order. Every other channel keeps its
//! relative file order behind them.

use crate::error::HtError;
use crate::header::{ChannelSet, PixelType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPermutation {
    /// `component_to_file[c]` is the file channel stored as component `c`.
    component_to_file: Vec<usize>,
    /// Inverse of `component_to_file`.
    file_to_component: Vec<usize>,
    is_rgb: bool,
}

impl ChannelPermutation {
    /// Validate the channel list and build the permutation.
    pub fn build(channels: &ChannelSet) -> Result<Self, HtError> {
        let mut r_index = None;
        let mut g_index = None;
        let mut b_index = None;

        for (i, channel) in channels.iter().enumerate() {
            if channel.pixel_type != PixelType::Half
                || channel.x_sampling != 1
                || channel.y_sampling != 1
            {
                return Err(HtError::UnsupportedChannel {
                    name: channel.name.clone(),
                    pixel_type: channel.pixel_type,
                    x_sampling: channel.x_sampling,
                    y_sampling: channel.y_sampling,
                });
            }

            match channel.name.as_str() {
                "R" => r_index = Some(i),
                "G" => g_index = Some(i),
                "B" => b_index = Some(i),
                _ => {}
            }
        }

        let count = channels.len();
        let (component_to_file, is_rgb) = match (r_index, g_index, b_index) {
            (Some(r), Some(g), Some(b)) => {
                let mut map = Vec::with_capacity(count);
                map.extend([r, g, b]);
                map.extend((0..count).filter(|&i| i != r && i != g && i != b));
                (map, true)
            }
            _ => ((0..count).collect(), false),
        };

        let mut file_to_component = vec![0; count];
        for (component, &file) in component_to_file.iter().enumerate() {
            file_to_component[file] = component;
        }

        Ok(Self {
            component_to_file,
            file_to_component,
            is_rgb,
        })
    }

    pub fn is_rgb(&self) -> bool {
        self.is_rgb
    }

    pub fn len(&self) -> usize {
        self.component_to_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.component_to_file.is_empty()
    }

    /// File channel index carried by codestream `component`.
    #[inline]
    pub fn file_channel(&self, component: usize) -> usize {
        self.component_to_file[component]
    }

    /// Codestream component carrying `file_channel`.
    #[inline]
    pub fn component(&self, file_channel: usize) -> usize {
        self.file_to_component[file_channel]
    }

    pub fn component_to_file(&self) -> &[usize] {
        &self.component_to_file
    }

    pub fn file_to_component(&self) -> &[usize] {
        &self.file_to_component
    }
}
