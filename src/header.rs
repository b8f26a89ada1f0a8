//! Container-side image description.
//!
//! This is the small part of an EXR header the HT compressors look at: the
//! data window, the ordered channel list and the compression of the part.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::compressor::Compression;
use crate::error::HtError;

/// Pixel types a container channel may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PixelType {
    Uint = 0,
    Half = 1,
    Float = 2,
}

impl PixelType {
    /// Size in bytes of one sample of this type.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            PixelType::Uint => std::mem::size_of::<u32>(),
            PixelType::Half => std::mem::size_of::<half::f16>(),
            PixelType::Float => std::mem::size_of::<f32>(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub pixel_type: PixelType,
    pub x_sampling: i32,
    pub y_sampling: i32,
}

impl Channel {
    pub fn new(name: impl Into<String>, pixel_type: PixelType, x_sampling: i32, y_sampling: i32) -> Self {
        Self {
            name: name.into(),
            pixel_type,
            x_sampling,
            y_sampling,
        }
    }

    /// Full-resolution half channel, the only kind the HT compressors accept.
    pub fn half(name: impl Into<String>) -> Self {
        Self::new(name, PixelType::Half, 1, 1)
    }
}

/// Channels in file-declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set of half channels from names, keeping their order.
    pub fn from_names<I, S>(names: I) -> Result<Self, HtError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(Channel::half(name))?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, channel: Channel) -> Result<(), HtError> {
        if self.channels.iter().any(|c| c.name == channel.name) {
            return Err(HtError::DuplicateChannel(channel.name));
        }
        self.channels.push(channel);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }
}

impl<'a> IntoIterator for &'a ChannelSet {
    type Item = &'a Channel;
    type IntoIter = std::slice::Iter<'a, Channel>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}

/// Inclusive pixel bounds of the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWindow {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl DataWindow {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Result<Self, HtError> {
        if max_x < min_x || max_y < min_y {
            return Err(HtError::InvalidDataWindow);
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Window of `width` x `height` pixels anchored at the origin.
    pub fn with_size(width: usize, height: usize) -> Result<Self, HtError> {
        if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(HtError::InvalidDataWindow);
        }
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    pub fn width(&self) -> usize {
        (self.max_x as i64 - self.min_x as i64 + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.max_y as i64 - self.min_y as i64 + 1) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    pub data_window: DataWindow,
    pub channels: ChannelSet,
    pub compression: Compression,
}

impl ImageHeader {
    pub fn new(data_window: DataWindow, channels: ChannelSet, compression: Compression) -> Self {
        Self {
            data_window,
            channels,
            compression,
        }
    }

    /// Bytes of one full scanline across all channels.
    pub fn scan_line_size(&self) -> usize {
        let width = self.data_window.width();
        self.channels
            .iter()
            .map(|c| c.pixel_type.bytes_per_sample() * width)
            .sum()
    }
}
