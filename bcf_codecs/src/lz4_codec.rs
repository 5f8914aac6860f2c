use bcf_core::format::CODEC_LZ4;
use bcf_core::{BlockCodec, CodecError};
use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};

/// LZ4 block codec.
///
/// Fastest decompression of all bundled codecs. Blocks are raw LZ4 blocks
/// with no size prefix; the record header already carries both sizes.
///
/// Best for: hot data, low-latency workloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Codec;

impl BlockCodec for Lz4Codec {
    fn id(&self) -> u16 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
        u32::try_from(get_maximum_output_size(uncompressed_len as usize)).unwrap_or(u32::MAX)
    }

    fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
        let capacity = output.len();
        let written =
            compress_into(input, output).map_err(|_| CodecError::BufferTooSmall { capacity })?;
        Ok(written as u32)
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError> {
        let written = decompress_into(input, output)
            .map_err(|e| CodecError::failure("lz4", format!("decompress error: {}", e)))?;
        if written != output.len() {
            return Err(CodecError::failure(
                "lz4",
                format!("block expanded to {} bytes, expected {}", written, output.len()),
            ));
        }
        Ok(())
    }
}
