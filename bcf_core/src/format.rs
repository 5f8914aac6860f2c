use crate::error::FrameError;

/// Default block size: 1 MiB.
pub const DEFAULT_BLOCK_SIZE: u32 = 1024 * 1024;

/// Size of the container header: `total_uncompressed_size:u32`.
pub const CONTAINER_HEADER_SIZE: usize = 4;

/// Size of each block record header.
///   compressed_size:u32 + uncompressed_size:u32 = 8
pub const RECORD_HEADER_SIZE: usize = 8;

/// Largest container (and largest input) a 32-bit size field can describe.
pub const MAX_CONTAINER_SIZE: u64 = u32::MAX as u64;

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_STORED: u16 = 0;
pub const CODEC_ZSTD: u16 = 1;
pub const CODEC_LZ4: u16 = 2;
pub const CODEC_DEFLATE: u16 = 3;

// ── Frame header ───────────────────────────────────────────────────────────

/// Magic bytes opening a framed container.
pub const MAGIC: &[u8; 4] = b"BCF1";

pub const FRAME_VERSION: u16 = 1;

/// Fixed size of the frame header in bytes.
///   magic[4] + version:u16 + codec_id:u16 + block_size:u32
///   + flags:u32 + checksum:u64
///   = 4 + 2 + 2 + 4 + 4 + 8 = 24
pub const FRAME_HEADER_SIZE: usize = 24;

/// The header carries an xxh3-64 of the raw container that follows it.
pub const FLAG_CHECKSUM: u32 = 1 << 0;

/// Decoded representation of the 24-byte frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u16,
    pub codec_id: u16,
    /// Nominal raw bytes per block (the last block may be smaller).
    pub block_size: u32,
    pub flags: u32,
    /// xxh3-64 of the raw container; zero when [`FLAG_CHECKSUM`] is clear.
    pub checksum: u64,
}

impl FrameHeader {
    /// Serialize to exactly `FRAME_HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[..4].copy_from_slice(MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.codec_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.block_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.flags.to_le_bytes());
        buf[16..24].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Deserialize from `FRAME_HEADER_SIZE` bytes, checking the magic.
    pub fn from_bytes(buf: &[u8; FRAME_HEADER_SIZE]) -> Result<Self, FrameError> {
        if &buf[..4] != MAGIC {
            return Err(FrameError::BadMagic);
        }
        let mut checksum = [0u8; 8];
        checksum.copy_from_slice(&buf[16..24]);
        Ok(Self {
            version: u16::from_le_bytes([buf[4], buf[5]]),
            codec_id: u16::from_le_bytes([buf[6], buf[7]]),
            block_size: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            flags: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            checksum: u64::from_le_bytes(checksum),
        })
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Number of records `encode` produces for `len` input bytes.
pub fn block_count(len: usize, block_size: u32) -> usize {
    if block_size == 0 {
        return 0;
    }
    len.div_ceil(block_size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_stable() {
        let header = FrameHeader {
            version: FRAME_VERSION,
            codec_id: CODEC_LZ4,
            block_size: DEFAULT_BLOCK_SIZE,
            flags: FLAG_CHECKSUM,
            checksum: 0x0102_0304_0506_0708,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..4], b"BCF1");
        assert_eq!(&bytes[4..6], &[1, 0]);
        assert_eq!(&bytes[6..8], &[2, 0]);
        assert_eq!(&bytes[8..12], &[0, 0, 0x10, 0]);
        assert_eq!(&bytes[16..24], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(FrameHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = FrameHeader {
            version: 1,
            codec_id: 0,
            block_size: 16,
            flags: 0,
            checksum: 0,
        }
        .to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(FrameError::BadMagic)
        ));
    }

    #[test]
    fn block_count_rounds_up() {
        assert_eq!(block_count(0, 1024), 0);
        assert_eq!(block_count(1, 1024), 1);
        assert_eq!(block_count(1024, 1024), 1);
        assert_eq!(block_count(1025, 1024), 2);
        assert_eq!(block_count(2_500_000, DEFAULT_BLOCK_SIZE), 3);
    }
}
