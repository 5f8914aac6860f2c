use bcf_core::format::CODEC_DEFLATE;
use bcf_core::{BlockCodec, CodecError};
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

pub const DEFAULT_DEFLATE_LEVEL: u32 = 6;

/// Raw DEFLATE block codec (no zlib or gzip wrapper), the algorithm behind
/// MSZIP and CAB archives.
///
/// The deflate and inflate streams are kept on the instance and reset before
/// every block, so no state leaks between blocks.
pub struct DeflateCodec {
    pub level: u32,
    deflate: Compress,
    inflate: Decompress,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self::new(DEFAULT_DEFLATE_LEVEL)
    }
}

impl DeflateCodec {
    /// `level` is clamped to 0..=9.
    pub fn new(level: u32) -> Self {
        let level = level.min(9);
        Self {
            level,
            deflate: Compress::new(Compression::new(level), false),
            inflate: Decompress::new(false),
        }
    }
}

impl BlockCodec for DeflateCodec {
    fn id(&self) -> u16 {
        CODEC_DEFLATE
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    /// Stored-block worst case: 5 header bytes per stored block plus the
    /// conservative per-byte slack zlib reserves when it cannot assume
    /// default window and memory settings.
    fn max_compressed_size(&self, uncompressed_len: u32) -> u32 {
        let len = u64::from(uncompressed_len);
        let bound = len + (len + 7) / 8 + (len + 63) / 64 + 5;
        u32::try_from(bound).unwrap_or(u32::MAX)
    }

    fn compress(&mut self, input: &[u8], output: &mut [u8]) -> Result<u32, CodecError> {
        self.deflate.reset();
        let status = self
            .deflate
            .compress(input, output, FlushCompress::Finish)
            .map_err(|e| CodecError::failure("deflate", e))?;
        match status {
            Status::StreamEnd => Ok(self.deflate.total_out() as u32),
            Status::Ok | Status::BufError => Err(CodecError::BufferTooSmall {
                capacity: output.len(),
            }),
        }
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CodecError> {
        self.inflate.reset(false);
        let mut status = self
            .inflate
            .decompress(input, output, FlushDecompress::Finish)
            .map_err(|e| CodecError::failure("deflate", e))?;
        let expected = output.len() as u64;

        // An exactly-full output can stop short of the end-of-block code.
        // Feed the rest of the input with one spare byte of room: a valid
        // block finishes without using it.
        if status != Status::StreamEnd && self.inflate.total_out() == expected {
            let consumed = self.inflate.total_in() as usize;
            let rest = input.get(consumed..).unwrap_or(&[]);
            let mut spare = [0u8; 1];
            status = self
                .inflate
                .decompress(rest, &mut spare, FlushDecompress::Finish)
                .map_err(|e| CodecError::failure("deflate", e))?;
        }

        let produced = self.inflate.total_out();
        if status != Status::StreamEnd || produced != expected {
            return Err(CodecError::failure(
                "deflate",
                format!(
                    "block expanded to at least {} bytes, expected {}",
                    produced, expected
                ),
            ));
        }
        Ok(())
    }
}
