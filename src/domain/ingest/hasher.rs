use std::hash::Hasher as _;
use twox_hash::XxHash64;

/// Deterministic 64-bit content hash used for item identities and aggregate feed hashes.
///
/// Implementations must agree across processes and platforms: the values are persisted
/// and compared against later cycles.
pub trait ContentHasher: Send + Sync {
    /// Hash a single byte string
    fn hash(&self, bytes: &[u8]) -> i64;

    /// Hash a stream of byte strings as if they were concatenated
    fn hash_chunks(&self, chunks: &[&[u8]]) -> i64;
}

/// xxHash64 with a fixed seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHasher {
    seed: u64,
}

impl XxHasher {
    pub fn new() -> Self {
        Self { seed: 0 }
    }
}

impl ContentHasher for XxHasher {
    fn hash(&self, bytes: &[u8]) -> i64 {
        XxHash64::oneshot(self.seed, bytes) as i64
    }

    fn hash_chunks(&self, chunks: &[&[u8]]) -> i64 {
        let mut state = XxHash64::with_seed(self.seed);
        for chunk in chunks {
            state.write(chunk);
        }
        state.finish() as i64
    }
}
