use bcf_core::format::CODEC_ZSTD;
use bcf_core::{BlockCodec, CodecError};
use log::debug;
use zstd::bulk::{Compressor, Decompressor};
use zstd::zstd_safe::compress_bound;

pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Zstandard block codec.
///
/// Each block is compressed independently at the configured level. The
/// compression and decompression contexts are created on first use and
/// reused for every later block handled by this instance.
///
/// Best for: general text, JSON, logs, mixed structured data.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
    compressor: Option<Compressor<'static>>,
    decompressor: Option<Decompressor<'static>>,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_ZSTD_LEVEL)
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self {
            level,
            compressor: None,
            decompressor: None,
        }
    }

    fn compressor(&mut self) -> Result<&mut Compressor<'static>, CodecError> {
        if self.compressor.is_none() {
            let compressor =
                Compressor::new(self.level).map_err(|e| CodecError::failure("zstd", e))?;
            debug!("zstd: compression context created at level {}", self.level);
            self.compressor = Some(compressor);
        }
        self.compressor
            .as_mut()
            .ok_or_else(|| CodecError::failure("zstd", "no compression context"))
    }

    fn decompressor(&mut self) -> Result<&mut Decompressor<'static>, CodecError> {
        if self.decompressor.is_none() {
            let decompressor = Decompressor::new().map_err(|e| CodecError::failure("zstd", e))?;
            self.decompressor = Some(decompressor);
        }
        self.decompressor
            .as_mut()
            .ok_or_else(|| CodecError::failure("zstd", "no decompression context"))
    }
}

impl BlockCodec for ZstdCodec {
    fn id(&self) -> u16 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
        u32::try_from(compress_bound(uncompressed_len as usize)).unwrap_or(u32::MAX)
    }

    fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
        let capacity = output.len();
        let fits = capacity >= compress_bound(input.len());
        match self.compressor()?.compress_to_buffer(input, output) {
            Ok(written) => Ok(written as u32),
            Err(_) if !fits => Err(CodecError::BufferTooSmall { capacity }),
            Err(e) => Err(CodecError::failure("zstd", e)),
        }
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError> {
        let expected = output.len();
        let written = self
            .decompressor()?
            .decompress_to_buffer(input, output)
            .map_err(|e| CodecError::failure("zstd", e))?;
        if written != expected {
            return Err(CodecError::failure(
                "zstd",
                format!("block expanded to {} bytes, expected {}", written, expected),
            ));
        }
        Ok(())
    }
}
