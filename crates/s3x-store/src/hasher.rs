use s3x_types::ContentHash;

/// Incremental BLAKE3 hasher producing [`ContentHash`] addresses.
///
/// Feeding the same bytes in any chunking yields the same address as
/// [`ContentHash::from_bytes`] over the whole buffer.
pub struct ContentHasher {
    inner: blake3::Hasher,
    len: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
            len: 0,
        }
    }

    /// Absorb the next chunk of the stream.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Bytes absorbed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finish the stream and return its address and length.
    pub fn finalize(&self) -> (ContentHash, u64) {
        (
            ContentHash::from_digest(*self.inner.finalize().as_bytes()),
            self.len,
        )
    }

    /// Verify that `data` hashes to `expected`.
    pub fn verify(data: &[u8], expected: &ContentHash) -> bool {
        ContentHash::from_bytes(data) == *expected
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
