use bcf_core::format::CODEC_STORED;
use bcf_core::{BlockCodec, CodecError};

/// No-op codec: stores blocks verbatim, with no compression.
///
/// Useful for:
/// - Verifying the container round-trip independently of any codec.
/// - Data that is already compressed (e.g., JPEG, MP4) where further
///   compression would expand the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredCodec;

impl BlockCodec for StoredCodec {
    fn id(&self) -> u16 {
        CODEC_STORED
    }

    fn name(&self) -> &'static str {
        "stored"
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
        if input.len() != output.len() {
            return Err(CodecError::failure(
                "stored",
                format!("block holds {} bytes, expected {}", input.len(), output.len()),
            ));
        }
        output.copy_from_slice(input);
        Ok(())
    }
}
