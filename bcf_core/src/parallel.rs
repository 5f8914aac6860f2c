//! Block-parallel variants of [`encode`](crate::encode) and
//! [`decode`](crate::decode).
//!
//! Codec instances are never shared: `make_codec` is called once per rayon
//! work split and each worker keeps its own.
//!
//! - Encode is two-phase. Every block is compressed into its own record
//!   buffer, then the records are concatenated in block order. For a
//!   deterministic codec the result is byte-identical to `encode`.
//! - Decode scans all record headers first (same checks as `decode`), splits
//!   the output into disjoint per-record slices and fills them in parallel.

use log::debug;
use rayon::prelude::*;

use crate::codec::{bound_for, BlockCodec};
use crate::decode::{check_payload_bound, classify_overrun};
use crate::error::{Corruption, DecodeError, EncodeError};
use crate::field::write_u32;
use crate::format::{CONTAINER_HEADER_SIZE, MAX_CONTAINER_SIZE, RECORD_HEADER_SIZE};
use crate::layout::{Record, Records};

pub fn encode_parallel<C, F>(
    input: &[u8],
    make_codec: F,
    block_size: u32,
) -> Result<Vec<u8>, EncodeError>
where
    C: BlockCodec,
    F: Fn() -> C + Sync + Send,
{
    if block_size == 0 {
        return Err(EncodeError::InvalidBlockSize);
    }
    let total = u32::try_from(input.len())
        .map_err(|_| EncodeError::InputTooLarge { len: input.len() })?;

    let records = input
        .par_chunks(block_size as usize)
        .enumerate()
        .map_init(&make_codec, |codec, (block, chunk)| {
            compress_record(codec, block, chunk)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let size = records
        .iter()
        .fold(CONTAINER_HEADER_SIZE as u64, |acc, r| acc + r.len() as u64);
    if size > MAX_CONTAINER_SIZE {
        return Err(EncodeError::ContainerTooLarge { size });
    }

    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&total.to_le_bytes());
    for record in &records {
        out.extend_from_slice(record);
    }

    debug!(
        "encoded {} bytes into {} blocks in parallel, container {} bytes",
        input.len(),
        records.len(),
        out.len()
    );
    Ok(out)
}

/// One complete record (header + payload) for `chunk`.
fn compress_record<C: BlockCodec>(
    codec: &mut C,
    block: usize,
    chunk: &[u8],
) -> Result<Vec<u8>, EncodeError> {
    let cap = bound_for(codec, chunk.len());
    let mut record = vec![0u8; RECORD_HEADER_SIZE + cap];

    let written = codec
        .compress(chunk, &mut record[RECORD_HEADER_SIZE..])
        .map_err(|source| EncodeError::Codec { block, source })? as usize;
    if written > cap {
        return Err(EncodeError::CapacityExceeded {
            block,
            needed: written,
            capacity: cap,
        });
    }

    let record_len = record.len();
    let no_room = || EncodeError::CapacityExceeded {
        block,
        needed: RECORD_HEADER_SIZE,
        capacity: record_len,
    };
    write_u32(&mut record, 0, written as u32).ok_or_else(no_room)?;
    write_u32(&mut record, 4, chunk.len() as u32).ok_or_else(no_room)?;
    record.truncate(RECORD_HEADER_SIZE + written);
    Ok(record)
}

pub fn decode_parallel<C, F>(container: &[u8], make_codec: F) -> Result<Vec<u8>, DecodeError>
where
    C: BlockCodec,
    F: Fn() -> C + Sync + Send,
{
    let records = Records::new(container)?;
    let total = records.total_uncompressed_size() as usize;

    // Header pass: the sequential walker validates every boundary before any
    // output is allocated.
    let bounds = make_codec();
    let records = records
        .map(|r| {
            let r = r.map_err(|e| classify_overrun(e, &bounds))?;
            check_payload_bound(&r, &bounds)?;
            Ok(r)
        })
        .collect::<Result<Vec<Record<'_>>, DecodeError>>()?;

    let mut out = vec![0u8; total];
    let mut slices = Vec::with_capacity(records.len());
    let mut rest = out.as_mut_slice();
    for record in &records {
        let len = record.uncompressed_size as usize;
        if len > rest.len() {
            return Err(Corruption::OutputOverrun {
                record: record.index,
                claimed_end: (record.output_offset + len) as u64,
                declared_total: total as u32,
            }
            .into());
        }
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
        slices.push(head);
        rest = tail;
    }

    records
        .par_iter()
        .zip(slices.into_par_iter())
        .try_for_each_init(&make_codec, |codec, (record, dst)| {
            codec
                .decompress(record.payload, dst)
                .map_err(|source| DecodeError::CodecFailure {
                    record: record.index,
                    source,
                })
        })?;

    debug!(
        "decoded {} records into {} bytes in parallel",
        records.len(),
        total
    );
    Ok(out)
}
