//! Header-level walk over a raw container.
//!
//! [`Records`] is the single place where record boundaries are parsed and
//! validated. `decode`, `decode_parallel` and [`scan`] all go through it, so
//! the truncation and corruption rules live in exactly one loop:
//!
//! ```text
//! ReadHeader ──► ReadRecord ──► ReadRecord ... ──► Done
//!     │              │
//!     └──────────────┴──► Truncated | Corrupt
//! ```

use crate::error::{Corruption, DecodeError, FrameError};
use crate::field::read_u32;
use crate::format::{CONTAINER_HEADER_SIZE, RECORD_HEADER_SIZE};

/// One parsed block record, borrowing its payload from the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Zero-based position of the record in the container.
    pub index: usize,
    /// Byte offset of the record header within the container.
    pub offset: usize,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    /// Where this record's bytes start in the reconstructed output.
    pub output_offset: usize,
    pub payload: &'a [u8],
}

impl Record<'_> {
    /// Output range this record decompresses into.
    pub fn output_range(&self) -> std::ops::Range<usize> {
        self.output_offset..self.output_offset + self.uncompressed_size as usize
    }

    pub fn span(&self) -> RecordSpan {
        RecordSpan {
            offset: self.offset,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            output_offset: self.output_offset,
        }
    }
}

/// Iterator over the block records of a raw container.
///
/// Yields `Err` at most once and then stops. The declared total is checked
/// when the container is exhausted, so a fully consumed iterator guarantees
/// that every record was in bounds and the sizes add up.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    container: &'a [u8],
    total: u32,
    cursor: usize,
    output_cursor: u64,
    index: usize,
    done: bool,
}

impl<'a> Records<'a> {
    /// Read the container header. Fails with `Truncated` below four bytes.
    pub fn new(container: &'a [u8]) -> Result<Self, DecodeError> {
        let total = read_u32(container, 0).ok_or(DecodeError::Truncated {
            offset: 0,
            needed: CONTAINER_HEADER_SIZE,
            available: container.len(),
        })?;
        Ok(Self {
            container,
            total,
            cursor: CONTAINER_HEADER_SIZE,
            output_cursor: 0,
            index: 0,
            done: false,
        })
    }

    /// `total_uncompressed_size` from the container header.
    pub fn total_uncompressed_size(&self) -> u32 {
        self.total
    }

    fn fail(&mut self, err: impl Into<DecodeError>) -> Option<Result<Record<'a>, DecodeError>> {
        self.done = true;
        Some(Err(err.into()))
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let remaining = self.container.len() - self.cursor;
        if remaining == 0 {
            self.done = true;
            if self.output_cursor != u64::from(self.total) {
                return Some(Err(Corruption::TotalMismatch {
                    declared: self.total,
                    decoded: self.output_cursor,
                }
                .into()));
            }
            return None;
        }

        let truncated = DecodeError::Truncated {
            offset: self.cursor,
            needed: RECORD_HEADER_SIZE,
            available: remaining,
        };
        if remaining < RECORD_HEADER_SIZE {
            return self.fail(truncated);
        }
        let (Some(compressed_size), Some(uncompressed_size)) = (
            read_u32(self.container, self.cursor),
            read_u32(self.container, self.cursor + 4),
        ) else {
            return self.fail(truncated);
        };

        let claimed_end = self.output_cursor + u64::from(uncompressed_size);
        if claimed_end > u64::from(self.total) {
            return self.fail(Corruption::OutputOverrun {
                record: self.index,
                claimed_end,
                declared_total: self.total,
            });
        }

        let payload_start = self.cursor + RECORD_HEADER_SIZE;
        let available = self.container.len() - payload_start;
        if compressed_size as usize > available {
            return self.fail(Corruption::PayloadOverrun {
                record: self.index,
                offset: self.cursor,
                compressed_size,
                uncompressed_size,
                available,
            });
        }
        let payload_end = payload_start + compressed_size as usize;

        let record = Record {
            index: self.index,
            offset: self.cursor,
            compressed_size,
            uncompressed_size,
            output_offset: self.output_cursor as usize,
            payload: &self.container[payload_start..payload_end],
        };

        self.cursor = payload_end;
        self.output_cursor = claimed_end;
        self.index += 1;
        Some(Ok(record))
    }
}

/// Position and sizes of one record, detached from the container bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSpan {
    pub offset: usize,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub output_offset: usize,
}

/// Result of a header-only pass over a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub total_uncompressed_size: u32,
    pub container_size: usize,
    pub records: Vec<RecordSpan>,
}

impl Layout {
    pub fn block_count(&self) -> usize {
        self.records.len()
    }

    /// Sum of all payload sizes (excluding headers).
    pub fn compressed_size(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.compressed_size))
            .sum()
    }

    /// Compression ratio (raw / container).
    pub fn ratio(&self) -> f64 {
        if self.container_size == 0 {
            return 1.0;
        }
        f64::from(self.total_uncompressed_size) / self.container_size as f64
    }

    /// Check that every record but the last holds exactly `block_size` bytes
    /// and the last holds between 1 and `block_size`.
    pub fn check_block_size(&self, block_size: u32) -> Result<(), FrameError> {
        let last = self.records.len().saturating_sub(1);
        for (record, span) in self.records.iter().enumerate() {
            let size = span.uncompressed_size;
            let ok = if record < last {
                size == block_size
            } else {
                size > 0 && size <= block_size
            };
            if !ok {
                return Err(FrameError::BlockLayout {
                    record,
                    size,
                    block_size,
                });
            }
        }
        Ok(())
    }
}

/// Parse every record header without decompressing anything.
///
/// A payload that runs past the end of the container is reported as
/// [`Corruption::PayloadOverrun`] here; `decode` can tell a cut-off payload
/// from an impossible one because it knows the codec's bound.
pub fn scan(container: &[u8]) -> Result<Layout, DecodeError> {
    let records = Records::new(container)?;
    let total_uncompressed_size = records.total_uncompressed_size();
    let records = records
        .map(|r| r.map(|r| r.span()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Layout {
        total_uncompressed_size,
        container_size: container.len(),
        records,
    })
}
