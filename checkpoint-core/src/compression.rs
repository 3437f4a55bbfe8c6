/*!
Compression adapters for container images.

The encoded node tree is compressed before it reaches the storage adapter. The
algorithm name is written into the container header, so an image can always be
opened regardless of which compressor the reading engine was built with.
*/

use crate::{CheckpointError, Result};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};

/// Compression abstraction for container payloads
///
/// Implementations must be lossless: `decompress(compress(x)) == x` for every input.
pub trait CompressionAdapter {
    /// Compress the encoded node tree
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a payload produced by [`CompressionAdapter::compress`]
    fn decompress(&self, compressed_data: &[u8]) -> Result<Vec<u8>>;

    /// Name recorded in the container header
    fn algorithm_name(&self) -> &str;
}

/// Gzip compression adapter
///
/// Population tables are highly repetitive (membership ids, zeroed timings), so
/// the default level shrinks a day snapshot considerably.
///
/// # Example
/// ```rust
/// use checkpoint_core::{CompressionAdapter, GzipCompressor};
///
/// let compressor = GzipCompressor::new();
/// let rows = vec![0u8; 4096];
/// let compressed = compressor.compress(&rows)?;
/// assert!(compressed.len() < rows.len());
/// assert_eq!(compressor.decompress(&compressed)?, rows);
/// # Ok::<(), checkpoint_core::CheckpointError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GzipCompressor {
    compression_level: Compression,
}

impl GzipCompressor {
    /// Create a new gzip compressor with default compression level (6)
    pub fn new() -> Self {
        Self {
            compression_level: Compression::default(),
        }
    }

    /// Create a new gzip compressor with the specified compression level
    ///
    /// # Arguments
    /// * `level` - Compression level (0-9, where 0 stores and 9 is maximum)
    pub fn with_level(level: u32) -> Self {
        Self {
            compression_level: Compression::new(level),
        }
    }

    /// Create a compressor for fast compression (level 1)
    pub fn fast() -> Self {
        Self::with_level(1)
    }

    /// Configured level
    pub fn level(&self) -> u32 {
        self.compression_level.level()
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionAdapter for GzipCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.compression_level);

        encoder.write_all(data).map_err(|e| {
            CheckpointError::compression(format!("Failed to write container payload: {e}"))
        })?;

        encoder
            .finish()
            .map_err(|e| CheckpointError::compression(format!("Failed to finish compression: {e}")))
    }

    fn decompress(&self, compressed_data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(compressed_data);
        let mut decompressed = Vec::new();

        decoder.read_to_end(&mut decompressed).map_err(|e| {
            CheckpointError::compression(format!("Failed to decompress container payload: {e}"))
        })?;

        Ok(decompressed)
    }

    fn algorithm_name(&self) -> &str {
        GZIP
    }
}

/// Pass-through adapter, used for in-memory containers and tests
#[derive(Debug, Clone, Default)]
pub struct NoCompression;

impl NoCompression {
    pub fn new() -> Self {
        Self
    }
}

impl CompressionAdapter for NoCompression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, compressed_data: &[u8]) -> Result<Vec<u8>> {
        Ok(compressed_data.to_vec())
    }

    fn algorithm_name(&self) -> &str {
        NONE
    }
}

const GZIP: &str = "gzip";
const NONE: &str = "none";

/// Resolve the decompressor for an algorithm name read from a container header.
pub fn decompressor_for(algorithm: &str) -> Result<Box<dyn CompressionAdapter>> {
    match algorithm {
        GZIP => Ok(Box::new(GzipCompressor::new())),
        NONE => Ok(Box::new(NoCompression::new())),
        other => Err(CheckpointError::invalid_format(format!(
            "Unknown compression algorithm '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_roundtrip_on_row_data() {
        let compressor = GzipCompressor::new();
        // 1000 identical person rows compress very well
        let rows: Vec<u8> = (0..1000u32)
            .flat_map(|_| [1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x40, 0x41])
            .collect();

        let compressed = compressor.compress(&rows).unwrap();
        assert!(compressed.len() < rows.len());

        let decompressed = compressor.decompress(&compressed).unwrap();
        assert_eq!(rows, decompressed);
    }

    #[test]
    fn test_gzip_levels() {
        let data = b"Household School Work PrimaryCommunity SecondaryCommunity ".repeat(50);

        let fast = GzipCompressor::fast();
        let max = GzipCompressor::with_level(9);
        assert_eq!(fast.level(), 1);
        assert_eq!(max.level(), 9);

        let fast_compressed = fast.compress(&data).unwrap();
        let max_compressed = max.compress(&data).unwrap();
        assert!(max_compressed.len() <= fast_compressed.len());
        assert_eq!(fast.decompress(&fast_compressed).unwrap(), data);
        assert_eq!(max.decompress(&max_compressed).unwrap(), data);
    }

    #[test]
    fn test_no_compression() {
        let compressor = NoCompression::new();
        let data = b"SCKP";

        assert_eq!(compressor.compress(data).unwrap(), data);
        assert_eq!(compressor.decompress(data).unwrap(), data);
        assert_eq!(compressor.algorithm_name(), "none");
    }

    #[test]
    fn test_decompressor_lookup() {
        let payload = GzipCompressor::new().compress(b"tree").unwrap();
        let decompressor = decompressor_for("gzip").unwrap();
        assert_eq!(decompressor.decompress(&payload).unwrap(), b"tree");

        assert_eq!(decompressor_for("none").unwrap().algorithm_name(), "none");
        assert!(matches!(
            decompressor_for("lz4"),
            Err(CheckpointError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_gzip_invalid_compressed_data() {
        let compressor = GzipCompressor::new();
        let result = compressor.decompress(b"definitely not gzip");
        assert!(matches!(result, Err(CheckpointError::Compression(_))));
    }
}
