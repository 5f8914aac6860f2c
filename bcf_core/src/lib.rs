pub mod codec;
pub mod decode;
pub mod encode;
pub mod error;
pub mod field;
pub mod format;
pub mod frame;
pub mod layout;
pub mod parallel;

pub use codec::BlockCodec;
pub use decode::{decode, decode_into};
pub use encode::{encode, encode_into};
pub use error::{CodecError, Corruption, DecodeError, EncodeError, FrameError};
pub use format::{FrameHeader, DEFAULT_BLOCK_SIZE};
pub use frame::{decode_framed, encode_framed, peek_header};
pub use layout::{scan, Layout, Record, RecordSpan, Records};
pub use parallel::{decode_parallel, encode_parallel};
