//! Part table parsing.
//!
//! The table follows the directory header directly and holds one 32-byte
//! entry per part:
//!
//! ```text
//! [4] offset (relative to the part-data region)
//! [4] size
//! [4] size, repeated
//! [4] type (four characters)
//! [4] reserved
//! [4] flags
//! [2+2] info text reference
//! [4] reserved
//! ```

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, warn};

use crate::package::types::error::Result;
use crate::package::types::models::{
    FourCc, PartEntry, PartFlags, PartKind, TextRef, PART_ENTRY_SIZE,
};
use crate::package::utils;

/// Parses `num_parts` entries starting at absolute offset `table_offset`.
pub fn parse(buf: &[u8], num_parts: u32, table_offset: u64) -> Result<Vec<PartEntry>> {
    let table_len = num_parts as u64 * PART_ENTRY_SIZE as u64;
    let mut reader = utils::slice(buf, table_offset, table_len, "part table")?;

    let mut parts = Vec::with_capacity(num_parts as usize);
    for index in 0..num_parts {
        let part = read_entry(&mut reader)?;
        debug!(
            "Part {}: type='{}', offset={}, size={}, flags={:#010x}",
            index,
            String::from_utf8_lossy(&part.part_type.bytes()),
            part.offset,
            part.size,
            part.flags.0
        );
        if let PartKind::Unknown(bits) = part.flags.kind() {
            warn!("Part {} has unknown part kind {}", index, bits);
        }
        parts.push(part);
    }
    Ok(parts)
}

fn read_entry(reader: &mut &[u8]) -> Result<PartEntry> {
    Ok(PartEntry {
        offset: reader.read_u32::<BigEndian>()?,
        size: reader.read_u32::<BigEndian>()?,
        size2: reader.read_u32::<BigEndian>()?,
        part_type: FourCc(reader.read_u32::<BigEndian>()?),
        reserved1: reader.read_u32::<BigEndian>()?,
        flags: PartFlags(reader.read_u32::<BigEndian>()?),
        info: read_text_ref(reader)?,
        reserved2: reader.read_u32::<BigEndian>()?,
    })
}

/// Reads a `(offset, length)` pair of big-endian u16 values.
pub(crate) fn read_text_ref(reader: &mut &[u8]) -> Result<TextRef> {
    Ok(TextRef {
        offset: reader.read_u16::<BigEndian>()?,
        length: reader.read_u16::<BigEndian>()?,
    })
}
