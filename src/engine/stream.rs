//! Big-endian byte stream helpers for marker segments.

use super::markers::MarkerCode;
use crate::constants::MARKER_START_BYTE;
use crate::error::HtError;

/// Appends marker segments to a caller-owned growable buffer.
pub struct ByteWriter<'a> {
    destination: &'a mut Vec<u8>,
}

impl<'a> ByteWriter<'a> {
    pub fn new(destination: &'a mut Vec<u8>) -> Self {
        Self { destination }
    }

    pub fn write_byte(&mut self, value: u8) {
        self.destination.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.destination.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.destination.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.destination.extend_from_slice(data);
    }

    pub fn write_marker(&mut self, marker: MarkerCode) {
        self.write_byte(MARKER_START_BYTE);
        self.write_byte(marker.into());
    }
}

/// Bounds-checked reader over a codestream.
pub struct ByteReader<'a> {
    source: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining_data(&self) -> &'a [u8] {
        &self.source[self.position..]
    }

    pub fn read_u8(&mut self) -> Result<u8, HtError> {
        let b = *self
            .source
            .get(self.position)
            .ok_or(HtError::Codestream("unexpected end of data"))?;
        self.position += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16, HtError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, HtError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], HtError> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.source.len())
            .ok_or(HtError::Codestream("unexpected end of data"))?;
        let bytes = &self.source[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), HtError> {
        self.read_bytes(count).map(|_| ())
    }

    /// Read `FF xx` and return the raw second byte.
    pub fn read_marker_byte(&mut self) -> Result<u8, HtError> {
        if self.read_u8()? != MARKER_START_BYTE {
            return Err(HtError::Codestream("marker start byte not found"));
        }
        self.read_u8()
    }
}
