//! Human-readable package reports.
//!
//! The layout mirrors the classic `newtonpkg` dump: a directory summary,
//! then every part with its object records, each prefixed by its absolute
//! file offset. Decode failures are written into the report as `error:` lines
//! instead of aborting it.

use std::fmt;
use std::io::{self, Write};

use log::warn;

use super::reader::PackageReader;
use super::types::error::Result;
use super::types::models::*;

/// Options controlling how much of a package is decoded for a report.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Decode the object stream of every part.
    pub decode_objects: bool,
    /// Stop listing a part's objects after this many records.
    pub max_objects_per_part: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            decode_objects: true,
            max_objects_per_part: None,
        }
    }
}

/// Writes the opening line naming the file and its length.
pub fn write_preamble<W: Write>(out: &mut W, file_name: &str, len: usize) -> io::Result<()> {
    writeln!(out, "{} ({} bytes)", file_name, len)?;
    writeln!(out)
}

/// Writes the signature and package flags.
///
/// This is all that is reported for packages with relocation data.
pub fn write_signature_and_flags<W: Write>(out: &mut W, header: &PackageHeader) -> io::Result<()> {
    let classification = match header.format() {
        PackageFormat::NoRelocation => "no relocation info, all Newton OS",
        PackageFormat::MayRelocate => "may contain relocation info, Newton OS 2.0+",
        PackageFormat::Unknown(_) => "unknown format",
    };
    writeln!(out, "    Signature: '{}' ({})", header.signature_text(), classification)?;
    write!(out, "        Flags: {:#010x}", header.flags.0)?;
    write_flag_names(out, &header.flags.names())?;
    writeln!(out)
}

/// Writes the message for a package whose relocation data cannot be decoded.
pub fn write_relocation_notice<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Packages with relocation data can't be parsed yet.")
}

/// Writes a complete report for an opened package.
pub fn write_report<W: Write>(
    out: &mut W,
    file_name: &str,
    reader: &PackageReader,
    options: &DecodeOptions,
) -> io::Result<()> {
    let header = reader.header();
    write_preamble(out, file_name, reader.len())?;
    write_signature_and_flags(out, header)?;

    writeln!(out, "      Version: {:#010x} ({})", header.version, header.version)?;
    writeln!(out, "    Copyright: {}", display_text(reader.text(header.copyright)))?;
    writeln!(out, "         Name: {}", display_text(reader.text(header.name)))?;
    writeln!(out, "         Size: {:#010x} ({})", header.size, header.size)?;
    writeln!(
        out,
        " creationDate: {:#010x} ({}) (Jan 4, 1904 + {} days)",
        header.creation_date,
        header.creation_date,
        header.creation_days()
    )?;
    writeln!(
        out,
        "directorySize: {:#010x} ({})",
        header.directory_size, header.directory_size
    )?;
    writeln!(out, "     numParts: {:#010x} ({})", header.num_parts, header.num_parts)?;

    for (index, part) in reader.parts().iter().enumerate() {
        write_part(out, reader, index, part, options)?;
    }
    Ok(())
}

fn write_part<W: Write>(
    out: &mut W,
    reader: &PackageReader,
    index: usize,
    part: &PartEntry,
    options: &DecodeOptions,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Part {}:", index)?;
    writeln!(out, "       Offset: {:#010x} ({})", part.offset, part.offset)?;
    writeln!(out, "         Size: {:#010x} ({})", part.size, part.size)?;
    write!(out, "        Flags: {:#010x}", part.flags.0)?;
    write_flag_names(out, &part.flags.names())?;
    writeln!(out)?;
    writeln!(out, "         Type: '{}'", part.part_type)?;
    if !part.info.is_empty() {
        writeln!(out, "         Info: {}", display_text(reader.text(part.info)))?;
    }
    writeln!(out)?;

    if !options.decode_objects {
        return Ok(());
    }

    let objects = match reader.objects(index) {
        Ok(objects) => objects,
        Err(e) => {
            warn!("Part {}: {}", index, e);
            return writeln!(out, "error: {}", e);
        }
    };

    // Only decoded records count toward the limit; errors are always written.
    let mut shown = 0usize;
    let mut hidden = 0usize;
    for result in objects {
        match result {
            Ok(_) if options.max_objects_per_part.is_some_and(|max| shown >= max) => hidden += 1,
            Ok(entry) => {
                write_object(out, &entry)?;
                shown += 1;
            }
            Err(e) => {
                write_hidden_count(out, hidden)?;
                hidden = 0;
                warn!("Part {}: object stream stopped: {}", index, e);
                writeln!(out, "error: {}", e)?;
            }
        }
    }
    write_hidden_count(out, hidden)
}

fn write_hidden_count<W: Write>(out: &mut W, hidden: usize) -> io::Result<()> {
    if hidden > 0 {
        writeln!(out, "... ({} more objects not shown)", hidden)?;
    }
    Ok(())
}

/// Writes one object record.
pub fn write_object<W: Write>(out: &mut W, entry: &ObjectEntry) -> io::Result<()> {
    writeln!(out, "[file offset {:08X}]", entry.file_offset)?;
    match &entry.record {
        ObjectRecord::Array { size, class, alignment, first } => {
            writeln!(
                out,
                "Type: Array ({:#X} ({}) bytes, {} byte aligned)",
                size,
                size,
                alignment.bytes()
            )?;
            writeln!(out, "{}", class)?;
            writeln!(out, "  {}", first)?;
        }
        ObjectRecord::Binary { size, class, symbol } => {
            writeln!(out, "Type: Binary object")?;
            writeln!(out, "Size: {:#X} bytes ({})", size, size)?;
            writeln!(out, "{}", class)?;
            if let Some(symbol) = symbol {
                writeln!(out, "Symbol: '{}'", symbol)?;
            }
        }
        ObjectRecord::Frame { size, slots } => {
            writeln!(out, "Type: Frame")?;
            writeln!(out, "Size: {:#X} bytes ({})", size, size)?;
            for slot in slots {
                writeln!(out, "  {}", slot)?;
            }
        }
    }
    writeln!(out)
}

fn write_flag_names<W: Write>(out: &mut W, names: &[&str]) -> io::Result<()> {
    for name in names {
        write!(out, " {}", name)?;
    }
    Ok(())
}

/// Renders decoded text, dropping the stored NUL terminator.
fn display_text(text: Result<String>) -> String {
    match text {
        Ok(text) => text.trim_end_matches('\0').to_string(),
        Err(e) => {
            warn!("Unreadable text: {}", e);
            format!("<error: {}>", e)
        }
    }
}

impl fmt::Display for TaggedRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TaggedRef::Integer(value) => write!(f, "Integer: {:#010X} ({})", value, value),
            TaggedRef::Pointer(index) => write!(f, "Pointer: {:#010X}", index),
            TaggedRef::Character(code) => {
                write!(f, "Character: {:#06x}", code)?;
                match char::from_u32(code as u32) {
                    Some(c) if !c.is_control() => write!(f, " '{}'", c),
                    _ => Ok(()),
                }
            }
            TaggedRef::Special(value) => write!(f, "Special: {:#010X}", value),
            TaggedRef::MagicPointer { table, index } => {
                write!(f, "MagicPtr: table {}, index {}", table, index)
            }
        }
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Class: {:#010X}", self.0)?;
        if let Some(name) = self.name() {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text: String = self
            .bytes()
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        f.write_str(&text)
    }
}
