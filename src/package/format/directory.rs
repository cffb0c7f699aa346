//! Package directory parsing.
//!
//! # Directory Structure
//! ```text
//! [ 8] signature ("package0" or "package1")
//! [ 4] reserved
//! [ 4] flags
//! [ 4] version
//! [2+2] copyright text reference
//! [2+2] name text reference
//! [ 4] declared package size
//! [ 4] creation date (seconds since 1904-01-04)
//! [ 4] reserved
//! [ 4] reserved
//! [ 4] directory size (start of the part-data region)
//! [ 4] number of parts
//! [32 × parts] part table
//! [ .. ] string table, up to the directory size
//! ```

use std::ops::Range;

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info, warn};

use crate::package::format::parts;
use crate::package::types::error::{PackageError, Result};
use crate::package::types::models::{
    PackageFlags, PackageFormat, PackageHeader, PartEntry, HEADER_SIZE,
};
use crate::package::utils;

/// The decoded directory: header, part table and the derived region bounds.
#[derive(Debug, Clone)]
pub struct PackageDirectory {
    pub header: PackageHeader,
    pub parts: Vec<PartEntry>,
    /// Absolute byte range of the string table.
    pub string_table: Range<usize>,
    /// Absolute offset of the part-data region.
    pub data_offset: usize,
}

/// Parses the fixed directory header only.
///
/// Checks that the buffer holds a full header and that the signature is
/// ASCII. Flags are not interpreted here.
pub fn parse_header(buf: &[u8]) -> Result<PackageHeader> {
    let mut reader = utils::slice(buf, 0, HEADER_SIZE as u64, "package header")?;

    let mut signature = [0u8; 8];
    signature.copy_from_slice(&reader[..8]);
    reader = &reader[8..];
    if !signature.is_ascii() {
        return Err(PackageError::InvalidFormat(format!(
            "Package signature is not ASCII: {:02x?}",
            signature
        )));
    }

    Ok(PackageHeader {
        signature,
        reserved1: reader.read_u32::<BigEndian>()?,
        flags: PackageFlags(reader.read_u32::<BigEndian>()?),
        version: reader.read_u32::<BigEndian>()?,
        copyright: parts::read_text_ref(&mut reader)?,
        name: parts::read_text_ref(&mut reader)?,
        size: reader.read_u32::<BigEndian>()?,
        creation_date: reader.read_u32::<BigEndian>()?,
        reserved2: reader.read_u32::<BigEndian>()?,
        reserved3: reader.read_u32::<BigEndian>()?,
        directory_size: reader.read_u32::<BigEndian>()?,
        num_parts: reader.read_u32::<BigEndian>()?,
    })
}

/// Parses the package directory from the whole file buffer.
///
/// # Errors
/// - `UnsupportedRelocation` if the relocation flag is set. The part table is
///   not read in that case.
/// - `OutOfBounds` if the part table or the part-data region start lie
///   outside the buffer.
/// - `InvalidFormat` for a non-ASCII signature.
pub fn parse(buf: &[u8]) -> Result<PackageDirectory> {
    info!("Parsing package directory ({} bytes)", buf.len());
    let header = parse_header(buf)?;

    match header.format() {
        PackageFormat::NoRelocation => {
            debug!("Signature '{}': no relocation info", header.signature_text())
        }
        PackageFormat::MayRelocate => {
            debug!("Signature '{}': may contain relocation info", header.signature_text())
        }
        PackageFormat::Unknown(_) => {
            warn!("Unknown package signature '{}'", header.signature_text())
        }
    }

    if header.flags.has_relocation() {
        info!("Relocation flag set; stopping after the header");
        return Err(PackageError::UnsupportedRelocation {
            header: Box::new(header),
        });
    }

    if header.size as usize != buf.len() {
        warn!(
            "Declared package size {} does not match file length {}",
            header.size,
            buf.len()
        );
    }

    let table_offset = HEADER_SIZE as u64;
    let parts = parts::parse(buf, header.num_parts, table_offset)?;

    let data_offset = header.data_offset();
    if data_offset > buf.len() as u64 {
        return Err(PackageError::OutOfBounds {
            context: "part data region",
            offset: data_offset,
            len: 0,
            available: buf.len() as u64,
        });
    }

    // Part table end is within the buffer, checked by the part table parse.
    let string_start = header.string_table_offset() as usize;
    let data_offset = data_offset as usize;
    if data_offset < string_start {
        warn!(
            "Directory size {} ends inside the part table (ends at {}); string table is empty",
            data_offset, string_start
        );
    }
    let string_table = string_start..data_offset.max(string_start);
    debug!(
        "String table at {:#x}..{:#x}, part data at {:#x}",
        string_table.start, string_table.end, data_offset
    );

    Ok(PackageDirectory {
        header,
        parts,
        string_table,
        data_offset,
    })
}
