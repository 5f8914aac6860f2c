use log::{debug, trace};

use crate::codec::BlockCodec;
use crate::error::{Corruption, DecodeError};
use crate::format::RECORD_HEADER_SIZE;
use crate::layout::{Record, Records};

/// Reconstruct the original bytes from a raw container.
///
/// Records are decompressed in order into one output buffer whose final
/// length is the header's `total_uncompressed_size`. Every declared size is
/// checked against the container and the declared total before it is used
/// to slice anything.
pub fn decode<C: BlockCodec + ?Sized>(
    container: &[u8],
    codec: &mut C,
) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    decode_into(container, codec, &mut out)?;
    Ok(out)
}

/// [`decode`] into a caller-owned buffer.
///
/// `out` is cleared first; its allocation is reused. On error `out` is left
/// empty.
pub fn decode_into<C: BlockCodec + ?Sized>(
    container: &[u8],
    codec: &mut C,
    out: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    out.clear();
    let result = decode_records(container, codec, out);
    if result.is_err() {
        out.clear();
    }
    result
}

fn decode_records<C: BlockCodec + ?Sized>(
    container: &[u8],
    codec: &mut C,
    out: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    let records = Records::new(container)?;
    let total = records.total_uncompressed_size();

    // Grown per record, never sized from the header total. A record still
    // zero-fills its claimed range before the codec sees the payload.
    let mut blocks = 0usize;
    for record in records {
        let record = record.map_err(|e| classify_overrun(e, codec))?;
        check_payload_bound(&record, codec)?;

        let range = record.output_range();
        out.resize(range.end, 0);
        codec
            .decompress(record.payload, &mut out[range])
            .map_err(|source| DecodeError::CodecFailure {
                record: record.index,
                source,
            })?;

        trace!(
            "record {}: {} -> {} bytes",
            record.index,
            record.compressed_size,
            record.uncompressed_size
        );
        blocks += 1;
    }

    debug!(
        "decoded {} records into {} bytes ({})",
        blocks,
        total,
        codec.name()
    );
    Ok(())
}

/// Reject a record whose payload is larger than the codec could ever have
/// produced for its uncompressed size.
pub(crate) fn check_payload_bound<C: BlockCodec + ?Sized>(
    record: &Record<'_>,
    codec: &C,
) -> Result<(), DecodeError> {
    let bound = codec.max_compressed_size(record.uncompressed_size);
    if record.compressed_size > bound {
        return Err(Corruption::OversizedPayload {
            record: record.index,
            compressed_size: record.compressed_size,
            bound,
        }
        .into());
    }
    Ok(())
}

/// A payload that runs off the end of the container is a cut-off container
/// when its declared size is one the codec could have produced, and
/// corruption otherwise.
pub(crate) fn classify_overrun<C: BlockCodec + ?Sized>(
    err: DecodeError,
    codec: &C,
) -> DecodeError {
    match err {
        DecodeError::Corrupt(Corruption::PayloadOverrun {
            offset,
            compressed_size,
            uncompressed_size,
            available,
            ..
        }) if compressed_size <= codec.max_compressed_size(uncompressed_size) => {
            DecodeError::Truncated {
                offset: offset + RECORD_HEADER_SIZE,
                needed: compressed_size as usize,
                available,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    /// Payload is the raw bytes; bound is the input length.
    struct Verbatim;

    impl BlockCodec for Verbatim {
        fn id(&self) -> u16 {
            0
        }
        fn name(&self) -> &'static str {
            "verbatim"
        }
        fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
            uncompressed_len
        }
        fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
            output[..input.len()].copy_from_slice(input);
            Ok(input.len() as u32)
        }
        fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError> {
            if input.len() != output.len() {
                return Err(CodecError::failure("verbatim", "length mismatch"));
            }
            output.copy_from_slice(input);
            Ok(())
        }
    }

    fn container(total: u32, records: &[&str]) -> Vec<u8> {
        let mut buf = total.to_le_bytes().to_vec();
        for payload in records {
            buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(payload.as_bytes());
        }
        buf
    }

    #[test]
    fn header_only_container_decodes_empty() {
        assert!(decode(&[0, 0, 0, 0], &mut Verbatim).unwrap().is_empty());
    }

    #[test]
    fn concatenates_records() {
        let buf = container(9, &["abcd", "efgh", "i"]);
        assert_eq!(decode(&buf, &mut Verbatim).unwrap(), b"abcdefghi");
    }

    #[test]
    fn cut_payload_is_truncated() {
        let buf = container(8, &["abcd", "efgh"]);
        let err = decode(&buf[..buf.len() - 2], &mut Verbatim).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                offset: 24,
                needed: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn impossible_payload_size_is_corrupt() {
        let mut buf = container(4, &["abcd"]);
        buf[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode(&buf, &mut Verbatim),
            Err(DecodeError::Corrupt(Corruption::PayloadOverrun { .. }))
        ));
    }

    #[test]
    fn oversized_payload_within_container_is_corrupt() {
        // Record claims 5 payload bytes for 4 raw bytes; verbatim bound is 4.
        let mut buf = 4u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(b"abcde");
        assert!(matches!(
            decode(&buf, &mut Verbatim),
            Err(DecodeError::Corrupt(Corruption::OversizedPayload {
                record: 0,
                compressed_size: 5,
                bound: 4
            }))
        ));
    }

    #[test]
    fn codec_failure_names_record() {
        // Second record declares 3 raw bytes for a 2-byte verbatim payload.
        let mut buf = 5u32.to_le_bytes().to_vec();
        for (payload, raw_len) in [(&b"ab"[..], 2u32), (&b"cd"[..], 3)] {
            buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(&raw_len.to_le_bytes());
            buf.extend_from_slice(payload);
        }
        let err = decode(&buf, &mut Verbatim).unwrap_err();
        assert!(matches!(err, DecodeError::CodecFailure { record: 1, .. }));
    }

    #[test]
    fn empty_payload_claiming_output_is_codec_failure() {
        // The output is grown to the claimed size before the codec rejects it.
        let mut buf = 64u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&64u32.to_le_bytes());
        let mut out = Vec::new();
        let err = decode_into(&buf, &mut Verbatim, &mut out).unwrap_err();
        assert!(matches!(err, DecodeError::CodecFailure { record: 0, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn error_leaves_buffer_empty() {
        let mut out = b"stale".to_vec();
        let buf = container(3, &["abcd"]);
        assert!(decode_into(&buf, &mut Verbatim, &mut out).is_err());
        assert!(out.is_empty());
    }
}
