//! Bounds-checked little-endian `u32` accessors.
//!
//! Every fixed-width field in a container goes through these helpers, so an
//! out-of-range offset surfaces as `None` instead of a slice panic.

/// Width of every size field in the container.
pub const U32_LEN: usize = 4;

/// Read the little-endian `u32` at `offset`, or `None` if fewer than four
/// bytes are available there.
#[inline]
pub fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(U32_LEN)?;
    let bytes: [u8; U32_LEN] = buf.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Write `value` little-endian at `offset`. Returns `None` and leaves the
/// buffer untouched if the field would not fit.
#[inline]
pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) -> Option<()> {
    let end = offset.checked_add(U32_LEN)?;
    buf.get_mut(offset..end)?.copy_from_slice(&value.to_le_bytes());
    Some(())
}
