mod deflate_codec;
mod lz4_codec;
mod stored;
mod zstd_codec;

pub use deflate_codec::{DeflateCodec, DEFAULT_DEFLATE_LEVEL};
pub use lz4_codec::Lz4Codec;
pub use stored::StoredCodec;
pub use zstd_codec::{ZstdCodec, DEFAULT_ZSTD_LEVEL};

use bcf_core::format::{CODEC_DEFLATE, CODEC_LZ4, CODEC_STORED, CODEC_ZSTD};
use bcf_core::BlockCodec;

/// A bundled codec together with its tuning, cheap to copy into every worker
/// that needs its own instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Stored,
    Zstd { level: i32 },
    Lz4,
    Deflate { level: u32 },
}

impl CodecKind {
    /// Resolve a codec from its on-disk `codec_id`, with default tuning.
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            CODEC_STORED => Some(CodecKind::Stored),
            CODEC_ZSTD => Some(CodecKind::Zstd {
                level: DEFAULT_ZSTD_LEVEL,
            }),
            CODEC_LZ4 => Some(CodecKind::Lz4),
            CODEC_DEFLATE => Some(CodecKind::Deflate {
                level: DEFAULT_DEFLATE_LEVEL,
            }),
            _ => None,
        }
    }

    /// Resolve a codec from a CLI or config name. `level` applies to zstd and
    /// deflate and is ignored otherwise.
    pub fn from_name(name: &str, level: Option<i32>) -> Option<Self> {
        match name {
            "stored" | "passthrough" | "none" => Some(CodecKind::Stored),
            "zstd" | "z" => Some(CodecKind::Zstd {
                level: level.unwrap_or(DEFAULT_ZSTD_LEVEL),
            }),
            "lz4" | "l" => Some(CodecKind::Lz4),
            "deflate" | "mszip" | "d" => Some(CodecKind::Deflate {
                level: level
                    .map(|l| l.clamp(0, 9) as u32)
                    .unwrap_or(DEFAULT_DEFLATE_LEVEL),
            }),
            _ => None,
        }
    }

    pub fn id(&self) -> u16 {
        match self {
            CodecKind::Stored => CODEC_STORED,
            CodecKind::Zstd { .. } => CODEC_ZSTD,
            CodecKind::Lz4 => CODEC_LZ4,
            CodecKind::Deflate { .. } => CODEC_DEFLATE,
        }
    }

    /// A fresh codec instance.
    pub fn build(&self) -> Box<dyn BlockCodec + Send> {
        match *self {
            CodecKind::Stored => Box::new(StoredCodec),
            CodecKind::Zstd { level } => Box::new(ZstdCodec::new(level)),
            CodecKind::Lz4 => Box::new(Lz4Codec),
            CodecKind::Deflate { level } => Box::new(DeflateCodec::new(level)),
        }
    }
}

/// Resolve a codec instance from its on-disk `codec_id`.
///
/// Called by the CLI when opening an existing framed container, so the
/// decoder is initialized with the right codec automatically.
pub fn codec_by_id(id: u16) -> Option<Box<dyn BlockCodec + Send>> {
    CodecKind::from_id(id).map(|kind| kind.build())
}

pub const CODEC_NAMES: &[&str] = &["stored", "zstd", "lz4", "deflate"];
