//! Bounds-checked byte access helpers.
//!
//! Every read from the package buffer goes through these functions, so an
//! offset or length taken from the file can never index past the end of the
//! buffer.

use byteorder::{BigEndian, ByteOrder};

use super::types::error::{PackageError, Result};

/// Returns `buf[offset..offset + len]`, or an `OutOfBounds` error naming `context`.
pub fn slice<'a>(buf: &'a [u8], offset: u64, len: u64, context: &'static str) -> Result<&'a [u8]> {
    let out_of_bounds = || PackageError::OutOfBounds {
        context,
        offset,
        len,
        available: buf.len() as u64,
    };
    let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
    if end > buf.len() as u64 {
        return Err(out_of_bounds());
    }
    Ok(&buf[offset as usize..end as usize])
}

/// Reads a big-endian u32 at `offset`.
pub fn read_u32_at(buf: &[u8], offset: u64, context: &'static str) -> Result<u32> {
    slice(buf, offset, 4, context).map(BigEndian::read_u32)
}
