use log::{debug, trace};

use crate::codec::BlockCodec;
use crate::error::EncodeError;
use crate::field::write_u32;
use crate::format::{block_count, CONTAINER_HEADER_SIZE, MAX_CONTAINER_SIZE, RECORD_HEADER_SIZE};

/// Split `input` into `block_size` chunks, compress each through `codec`
/// and lay the records out back to back after the size header.
///
/// # Layout written
/// ```text
/// [total_uncompressed_size: u32]
/// [compressed_size: u32][uncompressed_size: u32][payload] ← block 0
/// [compressed_size: u32][uncompressed_size: u32][payload] ← block 1
/// ...
/// ```
///
/// An empty input produces the four-byte header alone.
pub fn encode<C: BlockCodec + ?Sized>(
    input: &[u8],
    codec: &mut C,
    block_size: u32,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode_into(input, codec, block_size, &mut out)?;
    Ok(out)
}

/// [`encode`] into a caller-owned buffer.
///
/// `out` is cleared first; its allocation is reused. On error `out` is left
/// empty.
pub fn encode_into<C: BlockCodec + ?Sized>(
    input: &[u8],
    codec: &mut C,
    block_size: u32,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    out.clear();
    let result = encode_records(input, codec, block_size, out);
    if result.is_err() {
        out.clear();
    }
    result
}

fn encode_records<C: BlockCodec + ?Sized>(
    input: &[u8],
    codec: &mut C,
    block_size: u32,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    if block_size == 0 {
        return Err(EncodeError::InvalidBlockSize);
    }
    let total = u32::try_from(input.len())
        .map_err(|_| EncodeError::InputTooLarge { len: input.len() })?;

    let block_len = block_size as usize;
    let full_blocks = input.len() / block_len;
    let tail_len = input.len() % block_len;

    // The trailing block gets its own bound; codecs are not required to
    // have bounds that grow monotonically with input length.
    let full_cap = codec.max_compressed_size(block_size) as usize;
    let tail_cap = if tail_len > 0 {
        codec.max_compressed_size(tail_len as u32) as usize
    } else {
        0
    };

    let reserved = reserved_size(full_blocks, full_cap, tail_len, tail_cap)
        .ok_or(EncodeError::ContainerTooLarge { size: u64::MAX })?;
    let reserved = usize::try_from(reserved)
        .map_err(|_| EncodeError::ContainerTooLarge { size: reserved })?;
    out.resize(reserved, 0);

    write_u32(out, 0, total).ok_or(EncodeError::CapacityExceeded {
        block: 0,
        needed: CONTAINER_HEADER_SIZE,
        capacity: reserved,
    })?;
    let mut cursor = CONTAINER_HEADER_SIZE;

    for (block, chunk) in input.chunks(block_len).enumerate() {
        let cap = if chunk.len() == block_len {
            full_cap
        } else {
            tail_cap
        };

        let payload_start = cursor + RECORD_HEADER_SIZE;
        if payload_start > out.len() {
            return Err(EncodeError::CapacityExceeded {
                block,
                needed: RECORD_HEADER_SIZE,
                capacity: out.len() - cursor,
            });
        }
        let region_end = out.len().min(payload_start + cap);
        let region = &mut out[payload_start..region_end];
        let capacity = region.len();

        let written = codec
            .compress(chunk, region)
            .map_err(|source| EncodeError::Codec { block, source })?;
        let written = written as usize;
        if written > capacity {
            return Err(EncodeError::CapacityExceeded {
                block,
                needed: written,
                capacity,
            });
        }

        let header_room = out.len() - cursor;
        let no_room = || EncodeError::CapacityExceeded {
            block,
            needed: RECORD_HEADER_SIZE,
            capacity: header_room,
        };
        write_u32(out, cursor, written as u32).ok_or_else(no_room)?;
        write_u32(out, cursor + 4, chunk.len() as u32).ok_or_else(no_room)?;

        trace!(
            "block {}: {} -> {} bytes at offset {}",
            block,
            chunk.len(),
            written,
            cursor
        );
        cursor = payload_start + written;
    }

    out.truncate(cursor);

    if cursor as u64 > MAX_CONTAINER_SIZE {
        return Err(EncodeError::ContainerTooLarge {
            size: cursor as u64,
        });
    }

    debug!(
        "encoded {} bytes into {} blocks, container {} bytes ({} {})",
        input.len(),
        block_count(input.len(), block_size),
        cursor,
        codec.name(),
        block_size
    );
    Ok(())
}

/// Worst-case container size: header plus, per block, a record header and the
/// codec's bound for that block's length.
fn reserved_size(
    full_blocks: usize,
    full_cap: usize,
    tail_len: usize,
    tail_cap: usize,
) -> Option<u64> {
    let record = |cap: usize| (RECORD_HEADER_SIZE as u64).checked_add(cap as u64);
    let full = record(full_cap)?.checked_mul(full_blocks as u64)?;
    let tail = if tail_len > 0 { record(tail_cap)? } else { 0 };
    (CONTAINER_HEADER_SIZE as u64)
        .checked_add(full)?
        .checked_add(tail)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::CodecError;
    use crate::field::read_u32;

    /// Copies input verbatim; bound is the input length.
    struct Verbatim;

    impl BlockCodec for Verbatim {
        fn id(&self) -> u16 {
            0
        }
        fn name(&self) -> &'static str {
            "copy"
        }
        fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
            uncompressed_len
        }
        fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
            let capacity = output.len();
            let dst = output
                .get_mut(..input.len())
                .ok_or(CodecError::BufferTooSmall { capacity })?;
            dst.copy_from_slice(input);
            Ok(input.len() as u32)
        }
        fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError> {
            output.copy_from_slice(input);
            Ok(())
        }
    }

    /// Reports more bytes written than the region it was given.
    struct Liar;

    impl BlockCodec for Liar {
        fn id(&self) -> u16 {
            99
        }
        fn name(&self) -> &'static str {
            "liar"
        }
        fn max_compressed_size(&self, _uncompressed_len: u32) -> u32 {
            2
        }
        fn compress(&mut self, _input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
            Ok(output.len() as u32 + 1)
        }
        fn decompress(&mut self, _input: &[u8], _output: &mut [u8]) -> Result<(), CodecError> {
            Ok(())
        }
    }

    /// Records the lengths its bound was queried for.
    #[derive(Default)]
    struct BoundProbe {
        queried: RefCell<Vec<u32>>,
    }

    impl BlockCodec for BoundProbe {
        fn id(&self) -> u16 {
            98
        }
        fn name(&self) -> &'static str {
            "probe"
        }
        fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
            self.queried.borrow_mut().push(uncompressed_len);
            uncompressed_len
        }
        fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
            Verbatim.compress(input, output)
        }
        fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError> {
            Verbatim.decompress(input, output)
        }
    }

    #[test]
    fn empty_input_is_header_only() {
        assert_eq!(encode(&[], &mut Verbatim, 16).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        assert!(matches!(
            encode(b"abc", &mut Verbatim, 0),
            Err(EncodeError::InvalidBlockSize)
        ));
    }

    #[test]
    fn short_region_is_buffer_too_small() {
        let mut out = [0u8; 3];
        assert!(matches!(
            Verbatim.compress(b"abcd", &mut out),
            Err(CodecError::BufferTooSmall { capacity: 3 })
        ));
    }

    #[test]
    fn records_are_laid_out_back_to_back() {
        let out = encode(b"abcdefghij", &mut Verbatim, 4).unwrap();
        assert_eq!(read_u32(&out, 0), Some(10));
        assert_eq!(out.len(), 4 + 3 * 8 + 10);
        assert_eq!(read_u32(&out, 4), Some(4));
        assert_eq!(read_u32(&out, 8), Some(4));
        assert_eq!(&out[12..16], b"abcd");
        assert_eq!(&out[24..28], b"efgh");
        assert_eq!(read_u32(&out, 28), Some(2));
        assert_eq!(read_u32(&out, 32), Some(2));
        assert_eq!(&out[36..], b"ij");
    }

    #[test]
    fn over_reporting_codec_is_capacity_error() {
        let mut out = vec![1, 2, 3];
        let err = encode_into(b"abcdef", &mut Liar, 3, &mut out).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::CapacityExceeded {
                block: 0,
                needed: 3,
                capacity: 2
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn codec_errors_carry_block_index() {
        struct Refuses;
        impl BlockCodec for Refuses {
            fn id(&self) -> u16 {
                97
            }
            fn name(&self) -> &'static str {
                "refuses"
            }
            fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
                uncompressed_len
            }
            fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
                if input[0] == b'!' {
                    return Err(CodecError::failure("refuses", "bang"));
                }
                Verbatim.compress(input, output)
            }
            fn decompress(&mut self, _: &[u8], _: &mut [u8]) -> Result<(), CodecError> {
                Ok(())
            }
        }

        let err = encode(b"aa!a", &mut Refuses, 2).unwrap_err();
        assert!(matches!(err, EncodeError::Codec { block: 1, .. }));
    }

    #[test]
    fn tail_block_bound_is_queried_separately() {
        let mut probe = BoundProbe::default();
        let out = encode(b"abcdefghij", &mut probe, 4).unwrap();
        assert_eq!(out.len(), 4 + 3 * 8 + 10);
        assert_eq!(*probe.queried.borrow(), vec![4, 2]);

        let mut probe = BoundProbe::default();
        encode(b"abcdefgh", &mut probe, 4).unwrap();
        assert_eq!(*probe.queried.borrow(), vec![4]);
    }

    #[test]
    fn reserved_size_overflow_is_none() {
        assert_eq!(reserved_size(usize::MAX, usize::MAX, 0, 0), None);
        assert_eq!(reserved_size(2, 10, 3, 5), Some(4 + 2 * 18 + 13));
        assert_eq!(reserved_size(0, 10, 0, 0), Some(4));
    }
}
