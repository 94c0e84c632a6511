//! Payload compression.

use crate::CacheResult;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Optional gzip stage applied to serialized payloads.
///
/// Decoding detects the gzip header, so entries written before the
/// compression flag was flipped remain readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadCodec {
    compress: bool,
}

impl PayloadCodec {
    /// Creates a codec; `compress` gzips payloads on write.
    #[must_use]
    pub const fn new(compress: bool) -> Self {
        Self { compress }
    }

    /// Returns true when payloads are compressed on write.
    #[must_use]
    pub const fn compresses(&self) -> bool {
        self.compress
    }

    /// Prepares a serialized payload for storage. Empty payloads pass through.
    pub fn encode(&self, raw: Vec<u8>) -> CacheResult<Vec<u8>> {
        if !self.compress || raw.is_empty() {
            return Ok(raw);
        }

        let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
        encoder.write_all(&raw)?;
        Ok(encoder.finish()?)
    }

    /// Restores a stored payload.
    pub fn decode(&self, stored: Vec<u8>) -> CacheResult<Vec<u8>> {
        if !is_gzip(&stored) {
            return Ok(stored);
        }

        let mut raw = Vec::with_capacity(stored.len() * 2);
        GzDecoder::new(stored.as_slice()).read_to_end(&mut raw)?;
        Ok(raw)
    }
}

fn is_gzip(payload: &[u8]) -> bool {
    payload.starts_with(&GZIP_MAGIC)
}
