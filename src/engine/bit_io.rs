use crate::error::HtError;

/// MSB-first bit reader over a code-block segment.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_buffer: u8,
    bits_left: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_buffer: 0,
            bits_left: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<u32, HtError> {
        if self.bits_left == 0 {
            self.bit_buffer = *self
                .data
                .get(self.pos)
                .ok_or(HtError::Codestream("code-block segment truncated"))?;
            self.pos += 1;
            self.bits_left = 8;
        }

        self.bits_left -= 1;
        Ok(((self.bit_buffer >> self.bits_left) & 1) as u32)
    }

    pub fn read_bits(&mut self, count: u32) -> Result<u32, HtError> {
        debug_assert!(count <= 32);
        let mut bits = 0u64;
        for _ in 0..count {
            bits = (bits << 1) | self.read_bit()? as u64;
        }
        Ok(bits as u32)
    }

    /// Count zero bits up to the next one bit, failing past `limit`.
    pub fn read_unary(&mut self, limit: u32) -> Result<u32, HtError> {
        let mut zeros = 0;
        while self.read_bit()? == 0 {
            zeros += 1;
            if zeros > limit {
                return Err(HtError::Codestream("unary code too long"));
            }
        }
        Ok(zeros)
    }
}

/// MSB-first bit writer.
#[derive(Default)]
pub struct BitWriter {
    data: Vec<u8>,
    accumulator: u64,
    bits_count: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`.
    pub fn write_bits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32);
        if count == 0 {
            return;
        }
        let mask = (1u64 << count) - 1;
        self.accumulator = (self.accumulator << count) | (value as u64 & mask);
        self.bits_count += count;
        while self.bits_count >= 8 {
            self.bits_count -= 8;
            self.data.push((self.accumulator >> self.bits_count) as u8);
        }
        self.accumulator &= (1u64 << self.bits_count) - 1;
    }

    /// `count` zero bits followed by a one bit.
    pub fn write_unary(&mut self, count: u32) {
        let mut remaining = count;
        while remaining >= 32 {
            self.write_bits(0, 32);
            remaining -= 32;
        }
        self.write_bits(1, remaining + 1);
    }

    pub fn finish(mut self) -> Vec<u8> {
        if self.bits_count > 0 {
            let pad = 8 - self.bits_count;
            self.write_bits(0, pad);
        }
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3);
        writer.write_unary(5);
        writer.write_bits(u32::MAX, 32);
        writer.write_bits(0x1234, 16);
        let data = writer.finish();

        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_unary(24).unwrap(), 5);
        assert_eq!(reader.read_bits(32).unwrap(), u32::MAX);
        assert_eq!(reader.read_bits(16).unwrap(), 0x1234);
    }

    #[test]
    fn test_reader_reports_truncation() {
        let mut reader = BitReader::new(&[0x00]);
        assert!(reader.read_unary(24).is_err());
    }
}
