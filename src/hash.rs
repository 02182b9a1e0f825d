//! Content hashing
//!
//! SHA-256 digests used as the identity key of stored files. Digests are
//! rendered as lowercase hex, 64 characters.

use futures::{Stream, TryStreamExt};
use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Incremental SHA-256 hasher
#[derive(Debug, Clone, Default)]
pub struct ContentHasher {
    hasher: Sha256,
    bytes_hashed: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next slice of input
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes_hashed += data.len() as u64;
    }

    /// Number of bytes fed so far
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    /// Consume the hasher and return the hex digest
    pub fn finalize(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Compute the SHA-256 hash of a byte slice
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Content read from a stream together with its digest
#[derive(Debug, Clone)]
pub struct HashedContent {
    pub hash: String,
    pub content: Vec<u8>,
}

impl HashedContent {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Drain a byte stream, hashing each chunk as it arrives.
///
/// Every chunk is buffered exactly once, so `content` is byte-for-byte the
/// input that produced `hash`. The first read error aborts the whole
/// operation and is returned unchanged.
pub async fn digest_stream<S, B, E>(stream: S) -> Result<HashedContent, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let mut hasher = ContentHasher::new();
    let mut content = Vec::new();

    while let Some(chunk) = stream.try_next().await? {
        let chunk = chunk.as_ref();
        hasher.update(chunk);
        content.extend_from_slice(chunk);
    }

    tracing::trace!(bytes = hasher.bytes_hashed(), "Stream digest complete");

    Ok(HashedContent {
        hash: hasher.finalize(),
        content,
    })
}
