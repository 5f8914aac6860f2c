use thiserror::Error;

/// Failure reported by a [`BlockCodec`](crate::BlockCodec).
///
/// The engine never interprets these; they are wrapped with the block or
/// record index and passed to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The output region cannot hold the compressed block.
    #[error("output buffer too small ({capacity} bytes)")]
    BufferTooSmall { capacity: usize },

    /// The codec rejected its input or hit an internal error.
    #[error("{codec} codec failure: {reason}")]
    CodecFailure { codec: &'static str, reason: String },
}

impl CodecError {
    pub fn failure(codec: &'static str, reason: impl ToString) -> Self {
        CodecError::CodecFailure {
            codec,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("block size must be non-zero")]
    InvalidBlockSize,

    /// `total_uncompressed_size` is a u32; larger inputs must be split by the caller.
    #[error("input of {len} bytes does not fit a 32-bit size field")]
    InputTooLarge { len: usize },

    /// The pre-sized output could not hold a record. Indicates a codec whose
    /// reported bound is smaller than what it actually writes.
    #[error("block {block}: needed {needed} bytes but only {capacity} were reserved")]
    CapacityExceeded {
        block: usize,
        needed: usize,
        capacity: usize,
    },

    #[error("container of {size} bytes exceeds the 32-bit size limit")]
    ContainerTooLarge { size: u64 },

    #[error("block {block}: {source}")]
    Codec {
        block: usize,
        #[source]
        source: CodecError,
    },
}

/// Ways in which the declared sizes of a container contradict each other.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// A record's payload runs past the end of the container.
    #[error("record {record} at offset {offset}: payload of {compressed_size} bytes overruns container ({available} bytes left)")]
    PayloadOverrun {
        record: usize,
        offset: usize,
        compressed_size: u32,
        uncompressed_size: u32,
        available: usize,
    },

    /// A payload larger than the codec's worst case for its raw size.
    #[error("record {record}: payload of {compressed_size} bytes exceeds codec bound {bound}")]
    OversizedPayload {
        record: usize,
        compressed_size: u32,
        bound: u32,
    },

    /// A record expands past the declared total.
    #[error("record {record}: output would end at {claimed_end}, past declared total {declared_total}")]
    OutputOverrun {
        record: usize,
        claimed_end: u64,
        declared_total: u32,
    },

    /// All records consumed but their sizes do not add up to the header.
    #[error("records expand to {decoded} bytes but header declares {declared}")]
    TotalMismatch { declared: u32, decoded: u64 },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The container ends before a complete header or record header.
    #[error("truncated container: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("corrupt container: {0}")]
    Corrupt(#[from] Corruption),

    #[error("record {record}: {source}")]
    CodecFailure {
        record: usize,
        #[source]
        source: CodecError,
    },
}

/// Errors from the framed (magic + checksum) container layer.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame header truncated: {len} bytes, need {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("invalid magic bytes, not a BCF frame")]
    BadMagic,

    #[error("unsupported BCF version {0} (only version 1 is supported)")]
    UnsupportedVersion(u16),

    #[error("codec mismatch: frame uses codec {found} but provided codec has id {expected}")]
    CodecMismatch { expected: u16, found: u16 },

    #[error("checksum mismatch: expected {expected:016x}, got {actual:016x}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    /// Record sizes disagree with the block size recorded in the header.
    #[error("record {record} holds {size} bytes, block size is {block_size}")]
    BlockLayout {
        record: usize,
        size: u32,
        block_size: u32,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
