/*!
On-disk image of a container.

```text
+-------+--------------+-------------------+------------------------------+
| SCKP  | u32 LE: n    | n bytes: header   | compressed bincode root group |
+-------+--------------+-------------------+------------------------------+
```

The header is JSON so it stays inspectable with ordinary tools; it names the
compression algorithm of the tree and carries the SHA-256 of the uncompressed
tree, which is verified on every decode.
*/

use super::Group;
use crate::compression::{decompressor_for, CompressionAdapter};
use crate::header::{ContainerHeader, CONTAINER_MAGIC};
use crate::{CheckpointError, Result};
use bytes::{Buf, BufMut, BytesMut};

fn encode_tree(root: &Group) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(root, bincode::config::standard())
        .map_err(|e| CheckpointError::invalid_format(format!("Failed to encode node tree: {e}")))
}

fn decode_tree(tree: &[u8]) -> Result<Group> {
    let (root, read) =
        bincode::serde::decode_from_slice::<Group, _>(tree, bincode::config::standard())
            .map_err(|e| {
                CheckpointError::invalid_format(format!("Failed to decode node tree: {e}"))
            })?;
    if read != tree.len() {
        return Err(CheckpointError::invalid_format(format!(
            "{} trailing bytes after node tree",
            tree.len() - read
        )));
    }
    Ok(root)
}

/// Encode a container image
///
/// # Returns
/// The header as written (hash, size, algorithm and modification time updated)
/// together with the image bytes
pub fn encode_image(
    header: &ContainerHeader,
    root: &Group,
    compressor: &dyn CompressionAdapter,
) -> Result<(ContainerHeader, Vec<u8>)> {
    let tree = encode_tree(root)?;
    let mut header = header
        .clone()
        .with_content_hash(&tree)
        .with_compression_algorithm(compressor.algorithm_name());
    header.touch();
    header.validate()?;

    let header_json = serde_json::to_vec(&header)?;
    let header_len = u32::try_from(header_json.len()).map_err(|_| {
        CheckpointError::invalid_format(format!("Header of {} bytes is too large", header_json.len()))
    })?;
    let payload = compressor.compress(&tree)?;

    let mut image = BytesMut::with_capacity(8 + header_json.len() + payload.len());
    image.put_slice(&CONTAINER_MAGIC);
    image.put_u32_le(header_len);
    image.put_slice(&header_json);
    image.put_slice(&payload);

    Ok((header, image.to_vec()))
}

/// Read only the header of an image
pub fn decode_header(image: &[u8]) -> Result<(ContainerHeader, &[u8])> {
    let mut cursor = image;
    if cursor.remaining() < CONTAINER_MAGIC.len() + 4 {
        return Err(CheckpointError::invalid_format(
            "Image too short for a container header",
        ));
    }
    if cursor[..CONTAINER_MAGIC.len()] != CONTAINER_MAGIC {
        return Err(CheckpointError::invalid_format(
            "Not a checkpoint container (bad magic)",
        ));
    }
    cursor.advance(CONTAINER_MAGIC.len());

    let header_len = cursor.get_u32_le() as usize;
    if cursor.remaining() < header_len {
        return Err(CheckpointError::invalid_format(format!(
            "Header claims {} bytes, only {} present",
            header_len,
            cursor.remaining()
        )));
    }
    let header: ContainerHeader = serde_json::from_slice(&cursor[..header_len])?;
    cursor.advance(header_len);

    if !header.is_compatible() {
        return Err(CheckpointError::invalid_format(format!(
            "Incompatible container format version: {} (current: {})",
            header.format_version,
            crate::header::CONTAINER_FORMAT_VERSION
        )));
    }
    Ok((header, cursor))
}

/// Decode a container image and verify its integrity
pub fn decode_image(image: &[u8]) -> Result<(ContainerHeader, Group)> {
    let (header, payload) = decode_header(image)?;
    let decompressor = decompressor_for(&header.compression_algorithm)?;
    let tree = decompressor.decompress(payload)?;
    header.verify_integrity(&tree)?;
    let root = decode_tree(&tree)?;
    Ok((header, root))
}
