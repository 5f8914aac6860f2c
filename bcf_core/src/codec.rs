use crate::error::CodecError;

/// Core compression abstraction.
///
/// Each `BlockCodec` implementation:
/// - Is identified by a stable numeric `id()` stored in the frame header.
/// - Must compress/decompress individual blocks independently. No cross-block
///   state is permitted; reusable contexts are fine as long as every call is
///   self-contained.
/// - Works on caller-provided buffers. The engine sizes them from
///   [`max_compressed_size`](BlockCodec::max_compressed_size) and the record
///   headers, so a codec never allocates its output.
///
/// Methods take `&mut self`: a codec instance may own scratch contexts and is
/// not expected to be shared between threads. Give each worker its own.
pub trait BlockCodec {
    /// Stable codec ID stored in the frame header.
    fn id(&self) -> u16;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Worst-case compressed size for a block of `uncompressed_len` bytes.
    ///
    /// Implementations saturate at `u32::MAX` instead of wrapping.
    fn max_compressed_size(&self, uncompressed_len: u32) -> u32;

    /// Compress `input` into the prefix of `output`, returning the number of
    /// bytes written.
    ///
    /// Fails with [`CodecError::BufferTooSmall`] when `output` cannot hold
    /// the result.
    fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError>;

    /// Decompress `input` into exactly `output.len()` bytes.
    ///
    /// A block that is malformed, or expands to any other length, is a
    /// [`CodecError::CodecFailure`].
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError>;
}

impl<C: BlockCodec + ?Sized> BlockCodec for Box<C> {
    fn id(&self) -> u16 {
        (**self).id()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
        (**self).max_compressed_size(uncompressed_len)
    }

    fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
        (**self).compress(input, output)
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError> {
        (**self).decompress(input, output)
    }
}

/// Bound as a `usize`, for slicing.
#[inline]
pub(crate) fn bound_for<C: BlockCodec + ?Sized>(codec: &C, len: usize) -> usize {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    codec.max_compressed_size(len) as usize
}
