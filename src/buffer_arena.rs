//! Buffers owned by one compressor instance and reused across calls.
//!
//! A slice handed out by a compressor borrows from its arena, so it stays valid
//! exactly until the next call on the same instance.

/// Encode output, decode scratch and 16-bit staging storage.
#[derive(Debug, Default)]
pub struct BufferArena {
    output: Vec<u8>,
    scratch: Vec<u8>,
    staging: Vec<i16>,
}

impl BufferArena {
    /// `output_capacity` bytes are reserved for codestreams and
    /// `scratch_len` bytes allocated for decoded blocks.
    pub fn new(output_capacity: usize, scratch_len: usize) -> Self {
        Self {
            output: Vec::with_capacity(output_capacity),
            scratch: vec![0; scratch_len],
            staging: Vec::new(),
        }
    }

    /// Empty the output buffer and hand it out for writing.
    pub fn reset_output(&mut self) -> &mut Vec<u8> {
        self.output.clear();
        &mut self.output
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_capacity(&self) -> usize {
        self.output.capacity()
    }

    /// First `len` bytes of the decode scratch, grown if needed.
    pub fn scratch_mut(&mut self, len: usize) -> &mut [u8] {
        if self.scratch.len() < len {
            self.scratch.resize(len, 0);
        }
        &mut self.scratch[..len]
    }

    pub fn scratch(&self, len: usize) -> &[u8] {
        &self.scratch[..len.min(self.scratch.len())]
    }

    /// Staging samples of exactly `len` entries.
    pub fn staging_mut(&mut self, len: usize) -> &mut [i16] {
        self.staging.resize(len, 0);
        &mut self.staging
    }

    /// Scratch and staging at once, for copying decoded samples out.
    pub fn scratch_and_staging(&mut self, scratch_len: usize) -> (&mut [u8], &[i16]) {
        if self.scratch.len() < scratch_len {
            self.scratch.resize(scratch_len, 0);
        }
        (&mut self.scratch[..scratch_len], &self.staging)
    }
}

/// Read native-endian 16-bit samples out of `bytes`.
pub fn load_samples(bytes: &[u8], samples: &mut [i16]) {
    for (s, b) in samples.iter_mut().zip(bytes.chunks_exact(2)) {
        *s = i16::from_ne_bytes([b[0], b[1]]);
    }
}

/// Write 16-bit samples to `bytes` in native byte order.
pub fn store_samples(samples: &[i16], bytes: &mut [u8]) {
    for (b, s) in bytes.chunks_exact_mut(2).zip(samples) {
        b.copy_from_slice(&s.to_ne_bytes());
    }
}

/// Native-endian sample `index` of a byte buffer.
#[inline]
pub fn sample_at(bytes: &[u8], index: usize) -> i16 {
    i16::from_ne_bytes([bytes[2 * index], bytes[2 * index + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_reset_per_call() {
        let mut arena = BufferArena::new(64, 8);
        arena.reset_output().extend_from_slice(&[1, 2, 3]);
        assert_eq!(arena.output(), &[1, 2, 3]);
        arena.reset_output().push(9);
        assert_eq!(arena.output(), &[9]);
        assert!(arena.output_capacity() >= 64);
    }

    #[test]
    fn test_scratch_grows_on_demand() {
        let mut arena = BufferArena::new(0, 4);
        assert_eq!(arena.scratch_mut(2).len(), 2);
        arena.scratch_mut(10)[9] = 5;
        assert_eq!(arena.scratch(10)[9], 5);
    }

    #[test]
    fn test_sample_byte_order() {
        let samples = [0x3C00i16, -1, i16::MIN];
        let mut bytes = [0u8; 6];
        store_samples(&samples, &mut bytes);
        assert_eq!(&bytes[..2], &0x3C00i16.to_ne_bytes());
        assert_eq!(sample_at(&bytes, 2), i16::MIN);

        let mut back = [0i16; 3];
        load_samples(&bytes, &mut back);
        assert_eq!(back, samples);
    }
}
