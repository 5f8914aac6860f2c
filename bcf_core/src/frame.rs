//! Framed containers: a raw container behind a 24-byte header.
//!
//! The raw layout has no magic, version or checksum, so integrity rests on
//! bounds checks alone. A frame adds all three, plus the codec id and block
//! size, without changing a single byte of the raw container it wraps:
//!
//! ```text
//! [FRAME HEADER: 24 bytes][RAW CONTAINER ...]
//! ```

use log::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::codec::BlockCodec;
use crate::decode::decode;
use crate::encode::encode;
use crate::error::FrameError;
use crate::format::{FrameHeader, FLAG_CHECKSUM, FRAME_HEADER_SIZE, FRAME_VERSION};
use crate::layout::scan;

/// Encode `input` and wrap the container in a frame header.
///
/// Pass [`FLAG_CHECKSUM`] in `flags` to store an xxh3-64 of the container.
pub fn encode_framed<C: BlockCodec + ?Sized>(
    input: &[u8],
    codec: &mut C,
    block_size: u32,
    flags: u32,
) -> Result<Vec<u8>, FrameError> {
    let container = encode(input, codec, block_size)?;
    Ok(seal(&container, codec.id(), block_size, flags))
}

/// Prefix an already encoded raw container with a frame header.
pub fn seal(container: &[u8], codec_id: u16, block_size: u32, flags: u32) -> Vec<u8> {
    let checksum = if flags & FLAG_CHECKSUM != 0 {
        xxh3_64(container)
    } else {
        0
    };
    let header = FrameHeader {
        version: FRAME_VERSION,
        codec_id,
        block_size,
        flags,
        checksum,
    };

    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + container.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(container);
    out
}

/// Read and validate the frame header without touching the body.
///
/// Used to pick a codec before decoding.
pub fn peek_header(bytes: &[u8]) -> Result<FrameHeader, FrameError> {
    let raw: &[u8; FRAME_HEADER_SIZE] = bytes
        .get(..FRAME_HEADER_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or(FrameError::Truncated {
            len: bytes.len(),
            needed: FRAME_HEADER_SIZE,
        })?;
    let header = FrameHeader::from_bytes(raw)?;
    if header.version != FRAME_VERSION {
        return Err(FrameError::UnsupportedVersion(header.version));
    }
    Ok(header)
}

/// Validate a frame and return its header and the raw container inside it.
///
/// Checks magic, version, the checksum when present, and that the record
/// sizes match the header's block size.
pub fn open(bytes: &[u8]) -> Result<(FrameHeader, &[u8]), FrameError> {
    let header = peek_header(bytes)?;
    let body = &bytes[FRAME_HEADER_SIZE..];

    if header.has_flag(FLAG_CHECKSUM) {
        let actual = xxh3_64(body);
        if actual != header.checksum {
            return Err(FrameError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }
    }

    scan(body)?.check_block_size(header.block_size)?;
    Ok((header, body))
}

/// Open a frame and decode its container with `codec`.
///
/// `codec` must match the `codec_id` in the header.
pub fn decode_framed<C: BlockCodec + ?Sized>(
    bytes: &[u8],
    codec: &mut C,
) -> Result<Vec<u8>, FrameError> {
    let header = peek_header(bytes)?;
    if header.codec_id != codec.id() {
        return Err(FrameError::CodecMismatch {
            expected: codec.id(),
            found: header.codec_id,
        });
    }

    let (header, body) = open(bytes)?;
    let data = decode(body, codec)?;
    debug!(
        "opened frame v{} codec {} block size {}: {} bytes",
        header.version,
        header.codec_id,
        header.block_size,
        data.len()
    );
    Ok(data)
}
